//! Command Line Interface (CLI) arguments.

use clap::Parser;
use url::Url;

/// NDVI statistics server command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "NDVI_STATS_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "NDVI_STATS_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "NDVI_STATS_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/ndvi-stats/certs/cert.pem",
        env = "NDVI_STATS_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/ndvi-stats/certs/key.pem",
        env = "NDVI_STATS_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "NDVI_STATS_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "NDVI_STATS_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for the CPU-bound NDVI computation.
    #[arg(long, default_value_t = false, env = "NDVI_STATS_USE_RAYON")]
    pub use_rayon: bool,
    /// Root URL of the STAC API to search
    #[arg(
        long,
        default_value = "https://planetarycomputer.microsoft.com/api/stac/v1",
        env = "NDVI_STATS_STAC_URL"
    )]
    pub stac_url: Url,
    /// STAC collection to search
    #[arg(long, default_value = "sentinel-2-l2a", env = "NDVI_STATS_COLLECTION")]
    pub collection: String,
    /// Scenes must have a cloud cover percentage strictly below this value
    #[arg(long, default_value_t = 10.0, env = "NDVI_STATS_MAX_CLOUD_COVER")]
    pub max_cloud_cover: f64,
    /// Asset key of the red band
    #[arg(long, default_value = "B04", env = "NDVI_STATS_RED_BAND")]
    pub red_band: String,
    /// Asset key of the near-infrared band
    #[arg(long, default_value = "B08", env = "NDVI_STATS_NIR_BAND")]
    pub nir_band: String,
    /// Whether to sign asset URLs with a Planetary Computer SAS token
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "NDVI_STATS_SIGN_ASSETS")]
    pub sign_assets: bool,
    /// Endpoint issuing SAS tokens, suffixed with the collection name
    #[arg(
        long,
        default_value = "https://planetarycomputer.microsoft.com/api/sas/v1/token/",
        env = "NDVI_STATS_SAS_TOKEN_URL"
    )]
    pub sas_token_url: Url,
    /// Maximum number of search result pages to follow
    #[arg(long, default_value_t = 10, env = "NDVI_STATS_MAX_PAGES")]
    pub max_pages: usize,
    /// JSON file holding the request served by `GET /`
    #[arg(long, default_value = "input.json", env = "NDVI_STATS_INPUT_FILE")]
    pub input_file: String,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CommandLineArgs::try_parse_from(["ndvi-stats"]).unwrap();
        assert_eq!(8080, args.port);
        assert_eq!("sentinel-2-l2a", args.collection);
        assert_eq!(10.0, args.max_cloud_cover);
        assert_eq!("B04", args.red_band);
        assert_eq!("B08", args.nir_band);
        assert!(args.sign_assets);
        assert!(!args.use_rayon);
        assert_eq!("input.json", args.input_file);
    }

    #[test]
    fn disable_signing() {
        let args =
            CommandLineArgs::try_parse_from(["ndvi-stats", "--sign-assets", "false"]).unwrap();
        assert!(!args.sign_assets);
    }
}
