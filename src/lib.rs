//! tv_catalog - Browse a TV-listings catalog
//!
//! This library provides the headless core of a catalog browser: it lists
//! shows, drills into a show's episodes, and filters both client-side. Remote
//! data is fetched through a [`CatalogSource`] (the TVMaze API by default) and
//! memoized per session by [`CachedCatalog`]. [`Orchestrator`] turns user
//! events into [`ViewState`] transitions and hands a read-only [`Snapshot`]
//! to a [`Renderer`] after each of them.
//!
//! # Examples
//!
//! ```no_run
//! use tv_catalog::{CachedCatalog, Listing, Orchestrator, Renderer, Snapshot, TvMazeClient};
//!
//! struct Printer;
//!
//! impl Renderer for Printer {
//!     fn render(&mut self, snapshot: &Snapshot<'_>) {
//!         if let Listing::Shows(shows) = snapshot.listing {
//!             for show in shows {
//!                 println!("{} ({})", show.name, show.genre_list());
//!             }
//!         }
//!     }
//! }
//!
//! # async fn run() -> Result<(), tv_catalog::CatalogError> {
//! let mut browser = Orchestrator::new(CachedCatalog::new(TvMazeClient::new()), Printer);
//! browser.load_shows().await?;
//! browser.search_shows("comedy");
//! # Ok(())
//! # }
//! ```

mod cache;
mod catalog;
mod filter;
mod view;

// Re-export the catalog model and sources
pub use catalog::{
    ATTRIBUTION, CachedCatalog, CatalogError, CatalogSource, ClientConfig, DEFAULT_BASE_URL,
    Episode, EpisodeId, Image, PLACEHOLDER, Rating, Show, ShowId, TvMazeClient, sort_shows,
};

// Re-export the filter engine
pub use filter::{filter_episodes, filter_shows, normalize_term};

// Re-export view state and orchestration
pub use view::{
    ActiveView, BackPolicy, CompletedSelection, Counts, Listing, LoadTarget, NullRenderer,
    Orchestrator, PendingSelection, Renderer, SelectionOutcome, Snapshot, ViewState,
};
