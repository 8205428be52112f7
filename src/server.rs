//! Web server

use crate::app::Service;
use crate::cli::CommandLineArgs;

use std::{
    net::SocketAddr,
    path::PathBuf,
    process::exit,
    str::FromStr,
    time::Duration,
};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;
use tracing::{event, Level};

/// Serve the NDVI statistics API
///
/// Listens over HTTPS when enabled, otherwise over plain HTTP.
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &CommandLineArgs, service: Service) {
    let addr = SocketAddr::from_str(&format!("{}:{}", args.host, args.port))
        .expect("invalid host name, IP address or port number");

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    event!(Level::INFO, %addr, https = args.https, "listening");
    let result = if args.https {
        let cert_file = tls_file(&args.cert_file, "certificate");
        let key_file = tls_file(&args.key_file, "key");
        let tls_config = RustlsConfig::from_pem_file(cert_file, key_file)
            .await
            .expect("Failed to load TLS certificate files");
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    } else {
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    };
    if let Err(error) = result {
        event!(Level::ERROR, "server failed: {}", error);
        exit(1)
    }
}

/// Resolve a TLS file to an absolute path, exiting if it does not exist.
///
/// # Arguments
///
/// * `path`: Path to the file, possibly starting with `~`
/// * `kind`: Description of the file used in messages
fn tls_file(path: &str, kind: &str) -> PathBuf {
    let expanded = expanduser(path)
        .expect("Failed to expand ~ to user name. Please provide an absolute path instead.");
    match expanded.canonicalize() {
        Ok(abs_path) if abs_path.exists() => abs_path,
        _ => {
            eprintln!(
                "TLS {} file expected at '{}' but not found.",
                kind,
                expanded.display()
            );
            exit(1)
        }
    }
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    event!(Level::INFO, "signal received, starting graceful shutdown");
    // Force shutdown once the timeout expires
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}
