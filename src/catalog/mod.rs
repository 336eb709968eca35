/// Data structures and traits for the TV-listings catalog.
///
/// This module provides the show and episode structures handed to every other
/// layer, the display helpers a presentation needs to render them, and the
/// [`CatalogSource`] trait remote catalogs implement.
mod cached;
mod tvmaze;
mod tvmaze_types;

pub use cached::CachedCatalog;
pub use tvmaze::{ClientConfig, DEFAULT_BASE_URL, TvMazeClient};

#[cfg(test)]
pub(crate) use cached::fake;

use std::future::Future;
use thiserror::Error;

/// Identifier of a show, unique and stable across the catalog.
pub type ShowId = u64;

/// Identifier of an episode, unique within its show.
pub type EpisodeId = u64;

/// Placeholder displayed for any field the catalog did not provide.
pub const PLACEHOLDER: &str = "N/A";

/// Credits line every presentation of catalog data has to show.
pub const ATTRIBUTION: &str = "Data originally sourced from TVMaze.com (https://www.tvmaze.com/)";

/// Errors that can occur while fetching catalog data.
///
/// Every variant is retryable by repeating the action that triggered it.
/// The type is `Clone` so that a single failed request can be reported to
/// every caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The request never produced a response (DNS, connect, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The catalog answered with a non-success status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// The requested show does not exist upstream
    #[error("Show not found: {0}")]
    NotFound(ShowId),

    /// The response body could not be decoded
    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

/// Image references attached to shows and episodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    /// Medium sized image, used for grid cards
    pub medium: Option<String>,
    /// Full resolution image
    pub original: Option<String>,
}

/// Audience rating of a show.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rating {
    /// Average rating on a 0-10 scale
    pub average: Option<f64>,
}

/// A TV series in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub id: ShowId,
    pub name: String,
    /// Genres in upstream order
    pub genres: Vec<String>,
    /// Summary as delivered upstream, usually HTML
    pub summary: Option<String>,
    pub image: Option<Image>,
    /// Production status (e.g. "Running", "Ended")
    pub status: Option<String>,
    pub rating: Option<Rating>,
    /// Runtime of an episode in minutes
    pub runtime: Option<u32>,
}

impl Show {
    /// Summary with markup stripped, or the placeholder.
    pub fn summary_text(&self) -> String {
        html_to_text(self.summary.as_deref())
    }

    /// Genres joined for display, or the placeholder.
    pub fn genre_list(&self) -> String {
        if self.genres.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            self.genres.join(", ")
        }
    }

    pub fn status_or_placeholder(&self) -> &str {
        self.status.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Average rating with one decimal, or the placeholder.
    pub fn rating_display(&self) -> String {
        match self.rating.as_ref().and_then(|r| r.average) {
            Some(average) => format!("{:.1}", average),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn runtime_display(&self) -> String {
        match self.runtime {
            Some(minutes) => format!("{} min", minutes),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.medium.as_deref())
    }
}

/// A single installment of a show.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub id: EpisodeId,
    /// The season number this episode belongs to
    pub season: u32,
    /// The episode number within the season
    pub number: u32,
    /// The episode title
    pub name: String,
    /// Summary as delivered upstream, may contain markup
    pub summary: Option<String>,
    pub image: Option<Image>,
}

impl Episode {
    /// Episode code in `SxxExx` form, e.g. `S01E02`.
    pub fn code(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.number)
    }

    /// Text of the episode picker entry, e.g. `S01E02 - Pilot`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code(), self.name)
    }

    /// Summary with markup stripped, or the placeholder.
    pub fn summary_text(&self) -> String {
        html_to_text(self.summary.as_deref())
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.medium.as_deref())
    }
}

/// Sorts shows ascending by name, ignoring case.
///
/// The sort is stable: shows whose names compare equal keep their order.
pub fn sort_shows(shows: &mut [Show]) {
    shows.sort_by_cached_key(|show| show.name.to_lowercase());
}

/// Converts an HTML fragment to trimmed plain text.
pub(crate) fn strip_markup(html: &str) -> String {
    nanohtml2text::html2text(html).trim().to_string()
}

fn html_to_text(html: Option<&str>) -> String {
    match html.map(strip_markup) {
        Some(text) if !text.is_empty() => text,
        _ => PLACEHOLDER.to_string(),
    }
}

/// Trait for remote catalogs that can list shows and their episodes.
///
/// Implementors are pure fetch-and-parse boundaries: they never memoize.
/// Caching is layered on top by [`CachedCatalog`].
pub trait CatalogSource: Send + Sync + 'static {
    /// Fetches every show in the catalog.
    fn list_shows(&self) -> impl Future<Output = Result<Vec<Show>, CatalogError>> + Send;

    /// Fetches a single show, which need not be part of `list_shows`.
    ///
    /// # Errors
    ///
    /// Fails with [`CatalogError::NotFound`] if the show does not exist.
    fn show(&self, show_id: ShowId) -> impl Future<Output = Result<Show, CatalogError>> + Send;

    /// Fetches the episodes of one show in upstream order.
    ///
    /// # Errors
    ///
    /// Fails with [`CatalogError::NotFound`] if the show does not exist.
    fn list_episodes(
        &self,
        show_id: ShowId,
    ) -> impl Future<Output = Result<Vec<Episode>, CatalogError>> + Send;
}
