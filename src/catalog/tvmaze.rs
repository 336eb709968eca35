/// TVMaze catalog client implementation.
use super::tvmaze_types::{TvMazeEpisode, TvMazeShow};
use super::{CatalogError, CatalogSource, Episode, Show, ShowId, sort_shows};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// API root of the public TVMaze service
pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

/// Connection settings for [`TvMazeClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Value of the `User-Agent` header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("tv_catalog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Replaces the API root, e.g. to point at a mirror or a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Catalog client for the TVMaze API.
///
/// This client fetches the show index from https://api.tvmaze.com/shows,
/// single shows from `/shows/{id}` and per-show episode lists from
/// `/shows/{id}/episodes`. The index endpoint is paginated upstream and
/// only its first page is fetched, so a show missing from `list_shows` may
/// still be reachable by id. It never caches; wrap it in a
/// [`CachedCatalog`](super::CachedCatalog) for that.
#[derive(Debug, Clone)]
pub struct TvMazeClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl TvMazeClient {
    /// Creates a client talking to the public TVMaze API.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom connection settings.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a GET request and returns the body of a successful response.
    ///
    /// `not_found` is the error reported for a 404, which only means
    /// "missing show" on endpoints addressing a single show.
    async fn get_body(&self, path: &str, not_found: Option<ShowId>) -> Result<String, CatalogError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(%url, "requesting catalog resource");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        check_status(response.status(), not_found)?;

        response
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))
    }
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogSource for TvMazeClient {
    async fn list_shows(&self) -> Result<Vec<Show>, CatalogError> {
        let body = self.get_body("/shows", None).await?;
        let mut shows = decode_list::<TvMazeShow, Show>(&body)?;
        sort_shows(&mut shows);
        Ok(shows)
    }

    async fn show(&self, show_id: ShowId) -> Result<Show, CatalogError> {
        let body = self
            .get_body(&format!("/shows/{}", show_id), Some(show_id))
            .await?;
        let show: TvMazeShow =
            serde_json::from_str(&body).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Show::from(show))
    }

    async fn list_episodes(&self, show_id: ShowId) -> Result<Vec<Episode>, CatalogError> {
        let body = self
            .get_body(&format!("/shows/{}/episodes", show_id), Some(show_id))
            .await?;
        decode_list::<TvMazeEpisode, Episode>(&body)
    }
}

/// Maps a response status to the catalog error taxonomy.
fn check_status(status: StatusCode, not_found: Option<ShowId>) -> Result<(), CatalogError> {
    if status.is_success() {
        return Ok(());
    }

    match not_found {
        Some(show_id) if status == StatusCode::NOT_FOUND => Err(CatalogError::NotFound(show_id)),
        _ => Err(CatalogError::Http {
            status: status.as_u16(),
        }),
    }
}

/// Decodes a JSON array, converting each element to the domain type.
///
/// Elements that do not decode (e.g. missing id) are skipped rather than
/// failing the whole list.
fn decode_list<W, T>(body: &str) -> Result<Vec<T>, CatalogError>
where
    W: DeserializeOwned,
    T: From<W>,
{
    let items: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<W>(item) {
            Ok(wire) => Some(T::from(wire)),
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable catalog entry");
                None
            }
        })
        .collect())
}
