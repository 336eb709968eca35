//! Cached catalog implementation
//!
//! This module provides a memoizing wrapper for catalog sources that fetches
//! the show list once and each show's episode list once per session.

use super::{CatalogError, CatalogSource, Episode, Show, ShowId, sort_shows};
use crate::cache::SingleFlight;
use std::sync::Arc;
use tracing::{debug, warn};

/// A caching wrapper for catalog sources
///
/// This wraps another catalog source and memoizes its results for the
/// lifetime of the wrapper. The upstream catalog is assumed not to change
/// during a session, so successful entries are never invalidated. Failed
/// fetches are not remembered.
pub struct CachedCatalog<S>
where
    S: CatalogSource,
{
    /// The underlying catalog source
    source: Arc<S>,
    /// The sorted show list, under the unit key
    shows: SingleFlight<(), Arc<Vec<Show>>>,
    /// Shows looked up by id because they were not in the show list
    show_details: SingleFlight<ShowId, Show>,
    /// Episode lists by show id
    episodes: SingleFlight<ShowId, Arc<Vec<Episode>>>,
}

impl<S> CachedCatalog<S>
where
    S: CatalogSource,
{
    /// Creates a new cached catalog wrapping the given source
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let catalog = CachedCatalog::new(TvMazeClient::new());
    /// let shows = catalog.shows().await?;
    /// ```
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            shows: SingleFlight::new(),
            show_details: SingleFlight::new(),
            episodes: SingleFlight::new(),
        }
    }

    /// Returns all shows sorted by name, fetching them on first use
    pub async fn shows(&self) -> Result<Arc<Vec<Show>>, CatalogError> {
        let source = Arc::clone(&self.source);
        self.shows
            .get_or_fetch((), move || async move {
                debug!("fetching show list");
                let mut shows = source.list_shows().await.inspect_err(|e| {
                    warn!(error = %e, "show list fetch failed");
                })?;
                sort_shows(&mut shows);
                debug!(count = shows.len(), "show list fetched");
                Ok::<_, CatalogError>(Arc::new(shows))
            })
            .await
    }

    /// Returns a single show, fetching it on first use
    ///
    /// Shows from an already fetched show list are served from it; any
    /// other id is looked up upstream, which decides whether it exists.
    pub async fn show(&self, show_id: ShowId) -> Result<Show, CatalogError> {
        if let Some(show) = self
            .cached_shows()
            .and_then(|shows| shows.iter().find(|s| s.id == show_id).cloned())
        {
            return Ok(show);
        }

        let source = Arc::clone(&self.source);
        self.show_details
            .get_or_fetch(show_id, move || async move {
                debug!(show_id, "fetching show");
                source.show(show_id).await.inspect_err(|e| {
                    warn!(show_id, error = %e, "show fetch failed");
                })
            })
            .await
    }

    /// Returns the episodes of a show, fetching them on first use
    pub async fn episodes(&self, show_id: ShowId) -> Result<Arc<Vec<Episode>>, CatalogError> {
        let source = Arc::clone(&self.source);
        self.episodes
            .get_or_fetch(show_id, move || async move {
                debug!(show_id, "fetching episodes");
                let episodes = source.list_episodes(show_id).await.inspect_err(|e| {
                    warn!(show_id, error = %e, "episode fetch failed");
                })?;
                debug!(show_id, count = episodes.len(), "episodes fetched");
                Ok::<_, CatalogError>(Arc::new(episodes))
            })
            .await
    }

    /// The show list, if it has been fetched
    pub fn cached_shows(&self) -> Option<Arc<Vec<Show>>> {
        self.shows.cached(&())
    }

    /// The episodes of a show, if they have been fetched
    pub fn cached_episodes(&self, show_id: ShowId) -> Option<Arc<Vec<Episode>>> {
        self.episodes.cached(&show_id)
    }

    /// Whether an episode fetch for `show_id` is currently running
    pub fn is_fetching_episodes(&self, show_id: ShowId) -> bool {
        self.episodes.is_in_flight(&show_id)
    }

    /// Number of shows whose episodes are cached
    pub fn cached_episode_lists(&self) -> usize {
        self.episodes.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
