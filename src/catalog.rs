//! Scene catalog: STAC API item search and scene selection.

use crate::cli::CommandLineArgs;
use crate::error::NdviError;
use crate::models::QueryRequest;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use url::Url;

/// One candidate scene returned by a catalog search.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneCandidate {
    /// Scene identifier
    pub id: String,
    /// Percentage of the scene obscured by clouds, if known
    pub cloud_cover: Option<f64>,
    /// Remote location of each asset, keyed by band identifier
    pub assets: HashMap<String, String>,
}

impl SceneCandidate {
    /// Returns the remote location of an asset.
    ///
    /// # Arguments
    ///
    /// * `key`: Asset key, e.g. `B04`
    pub fn asset(&self, key: &str) -> Result<&str, NdviError> {
        self.assets
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| NdviError::AssetMissing {
                scene: self.id.clone(),
                asset: key.to_string(),
            })
    }
}

/// Select the candidate with the smallest cloud cover.
///
/// Candidates without cloud cover metadata are ignored. Ties resolve to the first candidate in
/// search order.
pub fn least_cloudy(candidates: Vec<SceneCandidate>) -> Result<SceneCandidate, NdviError> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.cloud_cover.is_some_and(|cc| !cc.is_nan()))
        .reduce(|best, candidate| {
            if candidate.cloud_cover < best.cloud_cover {
                candidate
            } else {
                best
            }
        })
        .ok_or(NdviError::NoDataFound)
}

/// Scene catalog trait.
///
/// Defines the interface for searching a catalog for scenes covering an area and time.
#[async_trait]
pub trait SceneCatalog: Send + Sync {
    /// Search for scenes.
    ///
    /// Returns every scene matching the request whose cloud cover is below the configured
    /// maximum. Asset locations are ready to be opened.
    ///
    /// # Arguments
    ///
    /// * `request`: QueryRequest object for the request
    async fn search(&self, request: &QueryRequest) -> Result<Vec<SceneCandidate>, NdviError>;
}

/// A STAC Item, reduced to the fields used here.
#[derive(Debug, Deserialize)]
struct Item {
    id: String,
    #[serde(default)]
    properties: ItemProperties,
    #[serde(default)]
    assets: HashMap<String, Asset>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemProperties {
    #[serde(rename = "eo:cloud_cover")]
    cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    href: String,
}

/// A page of STAC API search results.
#[derive(Debug, Deserialize)]
struct ItemCollection {
    #[serde(default)]
    features: Vec<Item>,
    #[serde(default)]
    links: Vec<Link>,
}

/// A STAC link, as used for search pagination.
#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Link {
    rel: String,
    href: Url,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    body: Option<Map<String, Value>>,
    #[serde(default)]
    merge: bool,
}

impl From<Item> for SceneCandidate {
    fn from(item: Item) -> Self {
        SceneCandidate {
            id: item.id,
            cloud_cover: item.properties.cloud_cover,
            assets: item
                .assets
                .into_iter()
                .map(|(key, asset)| (key, asset.href))
                .collect(),
        }
    }
}

/// Next page request derived from a `next` link.
#[derive(Debug, PartialEq)]
enum NextPage {
    Get(Url),
    Post(Url, Map<String, Value>),
}

impl ItemCollection {
    /// Returns the request for the next page of results, if there is one.
    ///
    /// # Arguments
    ///
    /// * `body`: Body of the request that returned this page
    fn next_page(&self, body: &Map<String, Value>) -> Option<NextPage> {
        let link = self.links.iter().find(|link| link.rel == "next")?;
        match link.method.as_deref() {
            Some(method) if method.eq_ignore_ascii_case("POST") => {
                let next_body = match (&link.body, link.merge) {
                    (Some(link_body), true) => {
                        let mut merged = body.clone();
                        merged.extend(link_body.clone());
                        merged
                    }
                    (Some(link_body), false) => link_body.clone(),
                    (None, _) => body.clone(),
                };
                Some(NextPage::Post(link.href.clone(), next_body))
            }
            _ => Some(NextPage::Get(link.href.clone())),
        }
    }
}

/// SAS token issued by the Planetary Computer.
#[derive(Debug, Deserialize)]
struct SasToken {
    token: String,
}

/// Signs Azure Blob Storage asset URLs with a Planetary Computer SAS token.
#[derive(Clone, Debug)]
pub struct SasTokenSigner {
    /// Token endpoint, to which the collection name is appended
    token_url: Url,
}

impl SasTokenSigner {
    /// Return a new SasTokenSigner.
    pub fn new(token_url: Url) -> Self {
        Self { token_url }
    }

    /// Fetch a token granting read access to a collection's assets.
    #[tracing::instrument(level = "DEBUG", skip(self, client))]
    async fn token(&self, client: &reqwest::Client, collection: &str) -> Result<String, NdviError> {
        let url = format!("{}{}", self.token_url, collection);
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(NdviError::CatalogStatus {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(response.json::<SasToken>().await?.token)
    }
}

/// Append a SAS token to an asset href.
///
/// Only Azure Blob Storage URLs without an existing query are signed. Other hrefs are returned
/// unchanged.
fn sign_href(href: &str, token: &str) -> Result<String, NdviError> {
    let mut url = Url::parse(href).map_err(|source| NdviError::AssetUrl {
        href: href.to_string(),
        source,
    })?;
    let is_blob = url
        .host_str()
        .is_some_and(|host| host.ends_with(".blob.core.windows.net"));
    if is_blob && url.query().is_none() {
        url.set_query(Some(token));
    }
    Ok(url.into())
}

/// STAC API client.
///
/// Implements [SceneCatalog] using the STAC API item search endpoint.
#[derive(Debug)]
pub struct StacClient {
    client: reqwest::Client,
    search_url: Url,
    collection: String,
    max_cloud_cover: f64,
    max_pages: usize,
    signer: Option<SasTokenSigner>,
}

impl StacClient {
    /// Create a new STAC client.
    ///
    /// # Arguments
    ///
    /// * `args`: Command line arguments
    pub fn new(args: &CommandLineArgs) -> Self {
        let signer = args
            .sign_assets
            .then(|| SasTokenSigner::new(args.sas_token_url.clone()));
        Self {
            client: reqwest::Client::new(),
            search_url: search_url(&args.stac_url),
            collection: args.collection.clone(),
            max_cloud_cover: args.max_cloud_cover,
            max_pages: args.max_pages,
            signer,
        }
    }

    /// Returns the body of the initial search request.
    fn search_body(&self, request: &QueryRequest) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("collections".to_string(), json!([self.collection]));
        body.insert("intersects".to_string(), json!(request.area_of_interest));
        body.insert("datetime".to_string(), json!(request.time_of_interest));
        body.insert(
            "query".to_string(),
            json!({"eo:cloud_cover": {"lt": self.max_cloud_cover}}),
        );
        body
    }

    /// Send one search request and decode the page of results.
    #[tracing::instrument(level = "DEBUG", skip(self, body))]
    async fn fetch_page(
        &self,
        url: &Url,
        body: Option<&Map<String, Value>>,
    ) -> Result<ItemCollection, NdviError> {
        let request = match body {
            Some(body) => self.client.post(url.clone()).json(body),
            None => self.client.get(url.clone()),
        };
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NdviError::CatalogStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.json::<ItemCollection>().await?)
    }
}

/// Returns the item search endpoint below a STAC API root.
fn search_url(root: &Url) -> Url {
    let mut url = root.clone();
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    // Joining a relative path to a URL ending in '/' cannot fail.
    url.join("search").unwrap_or(url)
}

#[async_trait]
impl SceneCatalog for StacClient {
    #[tracing::instrument(level = "DEBUG", skip(self, request))]
    async fn search(&self, request: &QueryRequest) -> Result<Vec<SceneCandidate>, NdviError> {
        let mut body = self.search_body(request);
        let mut page = self.fetch_page(&self.search_url, Some(&body)).await?;
        let mut candidates = Vec::new();
        for page_number in 1.. {
            let next = page.next_page(&body);
            candidates.extend(page.features.drain(..).map(SceneCandidate::from));
            let next = match next {
                Some(next) if page_number < self.max_pages => next,
                _ => break,
            };
            page = match next {
                NextPage::Get(url) => self.fetch_page(&url, None).await?,
                NextPage::Post(url, next_body) => {
                    body = next_body;
                    self.fetch_page(&url, Some(&body)).await?
                }
            };
        }
        tracing::debug!(count = candidates.len(), "catalog search complete");

        if let (Some(signer), false) = (&self.signer, candidates.is_empty()) {
            let token = signer.token(&self.client, &self.collection).await?;
            for candidate in candidates.iter_mut() {
                for href in candidate.assets.values_mut() {
                    *href = sign_href(href, &token)?;
                }
            }
        }
        Ok(candidates)
    }
}
