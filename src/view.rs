//! View state and navigation
//!
//! [`ViewState`] is the synchronous state machine behind the browser: which
//! view is active, which shows or episodes are visible, and what the user
//! searched for. [`Orchestrator`] drives it from user events, fetches through
//! a [`CachedCatalog`], and hands a [`Snapshot`] to a [`Renderer`] after
//! every change.

use crate::catalog::{CachedCatalog, CatalogError, CatalogSource, Episode, EpisodeId, Show, ShowId};
use crate::filter::{filter_episodes, filter_shows};
use futures::future::try_join;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The view currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    /// Grid of all (or all matching) shows
    #[default]
    ShowList,
    /// Episodes of the current show
    EpisodeList,
}

/// What happens to the show search when navigating back to the show list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackPolicy {
    /// Re-apply the search term that was active before opening the show
    #[default]
    RestoreSearch,
    /// Forget the search term and show every show
    ClearSearch,
}

/// A fetch the view is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Shows,
    Episodes(ShowId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub visible: usize,
    pub total: usize,
}

/// The items of the active view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Listing<'a> {
    Shows(&'a [Show]),
    Episodes(&'a [Episode]),
}

/// Read-only projection of the view state handed to a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot<'a> {
    pub active_view: ActiveView,
    pub listing: Listing<'a>,
    pub current_show: Option<&'a Show>,
    /// Visible and total items of the active view
    pub counts: Counts,
    pub show_search: &'a str,
    pub episode_search: &'a str,
    pub selected_episode: Option<EpisodeId>,
    /// Set while a fetch for the active view is outstanding
    pub loading: Option<LoadTarget>,
    /// The last failure, cleared by the next successful transition
    pub error: Option<&'a CatalogError>,
}

/// Presentation of view snapshots
///
/// The orchestrator calls `render` after every state change, including
/// entering and leaving a loading state.
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot<'_>);
}

/// Renderer that discards every snapshot, for headless use
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &Snapshot<'_>) {}
}

/// State of the catalog browser
///
/// Visible lists are recomputed from the full lists on every event, never
/// patched incrementally. Events that do not apply to the active view are
/// ignored and reported as `false`.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    active_view: ActiveView,
    all_shows: Arc<Vec<Show>>,
    visible_shows: Vec<Show>,
    show_search: String,
    current_show: Option<Show>,
    all_episodes: Arc<Vec<Episode>>,
    visible_episodes: Vec<Episode>,
    /// Episode search and episode selection share one filter slot; the
    /// selection, when set, is the more recent of the two.
    episode_search: String,
    selected_episode: Option<EpisodeId>,
    loading: Option<LoadTarget>,
    error: Option<CatalogError>,
    /// Bumped by every navigation; results of older navigations are stale
    epoch: u64,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    pub fn all_shows(&self) -> &[Show] {
        &self.all_shows
    }

    pub fn visible_shows(&self) -> &[Show] {
        &self.visible_shows
    }

    pub fn show_search(&self) -> &str {
        &self.show_search
    }

    pub fn current_show(&self) -> Option<&Show> {
        self.current_show.as_ref()
    }

    pub fn all_episodes(&self) -> &[Episode] {
        &self.all_episodes
    }

    pub fn visible_episodes(&self) -> &[Episode] {
        &self.visible_episodes
    }

    pub fn episode_search(&self) -> &str {
        &self.episode_search
    }

    pub fn selected_episode(&self) -> Option<EpisodeId> {
        self.selected_episode
    }

    pub fn loading(&self) -> Option<LoadTarget> {
        self.loading
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.error.as_ref()
    }

    /// Installs the fetched show list and applies the current show search.
    pub fn apply_shows(&mut self, shows: Arc<Vec<Show>>) {
        self.all_shows = shows;
        self.visible_shows = filter_shows(&self.all_shows, &self.show_search);
        if self.loading == Some(LoadTarget::Shows) {
            self.loading = None;
        }
        self.error = None;
    }

    pub fn search_shows(&mut self, term: &str) -> bool {
        if self.active_view != ActiveView::ShowList {
            debug!(term, "ignoring show search outside the show list");
            return false;
        }

        self.show_search = term.to_string();
        self.visible_shows = filter_shows(&self.all_shows, term);
        self.error = None;
        true
    }

    /// Opens the episode view of `show` with every episode visible.
    pub fn apply_episodes(&mut self, show: Show, episodes: Arc<Vec<Episode>>) {
        self.visible_episodes = episodes.to_vec();
        self.all_episodes = episodes;
        self.current_show = Some(show);
        self.episode_search.clear();
        self.selected_episode = None;
        self.active_view = ActiveView::EpisodeList;
        self.loading = None;
        self.error = None;
    }

    pub fn search_episodes(&mut self, term: &str) -> bool {
        if self.active_view != ActiveView::EpisodeList {
            debug!(term, "ignoring episode search outside the episode list");
            return false;
        }

        self.episode_search = term.to_string();
        self.selected_episode = None;
        self.refilter_episodes();
        self.error = None;
        true
    }

    /// Narrows the episode list to a single episode.
    ///
    /// Ids that are not part of the current show are ignored.
    pub fn select_episode(&mut self, episode_id: EpisodeId) -> bool {
        if self.active_view != ActiveView::EpisodeList {
            return false;
        }

        match self.all_episodes.iter().find(|e| e.id == episode_id) {
            Some(episode) => {
                self.visible_episodes = vec![episode.clone()];
                self.selected_episode = Some(episode_id);
                self.error = None;
                true
            }
            None => {
                debug!(episode_id, "ignoring selection of unknown episode");
                false
            }
        }
    }

    /// Drops the episode selection and re-applies the episode search.
    pub fn clear_episode_selection(&mut self) -> bool {
        if self.active_view != ActiveView::EpisodeList {
            return false;
        }

        self.selected_episode = None;
        self.refilter_episodes();
        self.error = None;
        true
    }

    /// Returns to the show list.
    ///
    /// The show search is re-applied or cleared according to `policy`. Any
    /// outstanding episode fetch becomes stale.
    pub fn back(&mut self, policy: BackPolicy) -> bool {
        if self.active_view != ActiveView::EpisodeList {
            return false;
        }

        self.epoch += 1;
        self.active_view = ActiveView::ShowList;
        self.current_show = None;
        self.all_episodes = Arc::default();
        self.visible_episodes.clear();
        self.episode_search.clear();
        self.selected_episode = None;
        self.loading = None;
        self.error = None;

        if policy == BackPolicy::ClearSearch {
            self.show_search.clear();
        }
        self.visible_shows = filter_shows(&self.all_shows, &self.show_search);
        true
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let (listing, counts) = match self.active_view {
            ActiveView::ShowList => (
                Listing::Shows(&self.visible_shows),
                Counts {
                    visible: self.visible_shows.len(),
                    total: self.all_shows.len(),
                },
            ),
            ActiveView::EpisodeList => (
                Listing::Episodes(&self.visible_episodes),
                Counts {
                    visible: self.visible_episodes.len(),
                    total: self.all_episodes.len(),
                },
            ),
        };

        Snapshot {
            active_view: self.active_view,
            listing,
            current_show: self.current_show.as_ref(),
            counts,
            show_search: &self.show_search,
            episode_search: &self.episode_search,
            selected_episode: self.selected_episode,
            loading: self.loading,
            error: self.error.as_ref(),
        }
    }

    fn refilter_episodes(&mut self) {
        self.visible_episodes = filter_episodes(&self.all_episodes, &self.episode_search);
    }

    /// Starts loading `target`, returning the epoch its result belongs to.
    ///
    /// A repeated request for the target already loading joins it instead of
    /// starting a new navigation.
    fn begin_loading(&mut self, target: LoadTarget) -> u64 {
        if self.loading != Some(target) {
            self.epoch += 1;
            self.loading = Some(target);
        }
        self.error = None;
        self.epoch
    }

    fn fail_loading(&mut self, error: CatalogError) {
        self.loading = None;
        self.error = Some(error);
    }
}

/// Result of applying a finished show selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The episode view of the show is now active
    Applied,
    /// The fetch failed; the previous view is untouched
    Failed(CatalogError),
    /// The user navigated elsewhere before the fetch finished
    Discarded,
}

/// An episode fetch started by [`Orchestrator::begin_selection`]
///
/// Owns everything it needs, so the fetch can run while the orchestrator
/// keeps handling other events.
pub struct PendingSelection<S>
where
    S: CatalogSource,
{
    epoch: u64,
    show_id: ShowId,
    /// The show as found in the loaded show list, if it is listed there
    listed: Option<Show>,
    catalog: Arc<CachedCatalog<S>>,
}

impl<S> PendingSelection<S>
where
    S: CatalogSource,
{
    pub fn show_id(&self) -> ShowId {
        self.show_id
    }

    /// Runs the episode fetch.
    ///
    /// A show missing from the loaded show list is looked up alongside its
    /// episodes, so the catalog decides whether it exists.
    pub async fn fetch(self) -> CompletedSelection {
        let result = match self.listed {
            Some(show) => self
                .catalog
                .episodes(self.show_id)
                .await
                .map(|episodes| (show, episodes)),
            None => {
                try_join(
                    self.catalog.show(self.show_id),
                    self.catalog.episodes(self.show_id),
                )
                .await
            }
        };

        CompletedSelection {
            epoch: self.epoch,
            show_id: self.show_id,
            result,
        }
    }
}

/// A finished episode fetch, ready for [`Orchestrator::finish_selection`]
#[derive(Debug)]
pub struct CompletedSelection {
    epoch: u64,
    show_id: ShowId,
    result: Result<(Show, Arc<Vec<Episode>>), CatalogError>,
}

/// Drives the view state from user events
///
/// Owns the cached catalog, the view state and the renderer. Every operation
/// that changes the state renders a fresh snapshot.
///
/// # Examples
///
/// ```no_run
/// use tv_catalog::{CachedCatalog, NullRenderer, Orchestrator, TvMazeClient};
///
/// # async fn run() -> Result<(), tv_catalog::CatalogError> {
/// let mut browser = Orchestrator::new(CachedCatalog::new(TvMazeClient::new()), NullRenderer);
/// browser.load_shows().await?;
/// browser.search_shows("thrones");
/// browser.select_show(82).await?;
/// browser.select_episode(4952);
/// browser.back();
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<S, R>
where
    S: CatalogSource,
    R: Renderer,
{
    catalog: Arc<CachedCatalog<S>>,
    state: ViewState,
    renderer: R,
    back_policy: BackPolicy,
}

impl<S, R> Orchestrator<S, R>
where
    S: CatalogSource,
    R: Renderer,
{
    pub fn new(catalog: CachedCatalog<S>, renderer: R) -> Self {
        Self {
            catalog: Arc::new(catalog),
            state: ViewState::new(),
            renderer,
            back_policy: BackPolicy::default(),
        }
    }

    pub fn with_back_policy(mut self, back_policy: BackPolicy) -> Self {
        self.back_policy = back_policy;
        self
    }

    pub fn catalog(&self) -> &CachedCatalog<S> {
        &self.catalog
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.state.snapshot()
    }

    /// Fetches the show list (once per session) and displays it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after surfacing it in the snapshot.
    pub async fn load_shows(&mut self) -> Result<(), CatalogError> {
        self.state.begin_loading(LoadTarget::Shows);
        self.render();

        let result = self.catalog.shows().await;
        match result {
            Ok(shows) => {
                info!(count = shows.len(), "show list loaded");
                self.state.apply_shows(shows);
                self.render();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load show list");
                self.state.fail_loading(e.clone());
                self.render();
                Err(e)
            }
        }
    }

    pub fn search_shows(&mut self, term: &str) -> bool {
        self.apply(|state| state.search_shows(term))
    }

    /// Opens the episode view of a show, fetching its episodes if needed.
    ///
    /// The show does not have to be part of the loaded show list.
    ///
    /// # Errors
    ///
    /// Fails with [`CatalogError::NotFound`] if the show does not exist
    /// upstream, or with the fetch error. In both cases the current view
    /// stays as it was.
    pub async fn select_show(&mut self, show_id: ShowId) -> Result<(), CatalogError> {
        let pending = self.begin_selection(show_id);
        let completed = pending.fetch().await;
        match self.finish_selection(completed) {
            SelectionOutcome::Failed(e) => Err(e),
            SelectionOutcome::Applied | SelectionOutcome::Discarded => Ok(()),
        }
    }

    /// First half of [`select_show`](Self::select_show): marks the episodes
    /// of `show_id` as loading and returns the fetch to run.
    ///
    /// Starting a selection makes every earlier pending selection stale,
    /// except one for the same show, which stays valid.
    pub fn begin_selection(&mut self, show_id: ShowId) -> PendingSelection<S> {
        let listed = self.state.all_shows().iter().find(|s| s.id == show_id).cloned();
        let epoch = self.state.begin_loading(LoadTarget::Episodes(show_id));
        debug!(show_id, epoch, listed = listed.is_some(), "selecting show");
        self.render();

        PendingSelection {
            epoch,
            show_id,
            listed,
            catalog: Arc::clone(&self.catalog),
        }
    }

    /// Second half of [`select_show`](Self::select_show): applies a finished
    /// fetch unless the user has navigated elsewhere in the meantime.
    pub fn finish_selection(&mut self, completed: CompletedSelection) -> SelectionOutcome {
        let CompletedSelection {
            epoch,
            show_id,
            result,
        } = completed;

        if epoch != self.state.epoch {
            debug!(show_id, epoch, "discarding stale episode list");
            return SelectionOutcome::Discarded;
        }

        match result {
            Ok((show, episodes)) => {
                info!(show_id, count = episodes.len(), "episode list loaded");
                self.state.apply_episodes(show, episodes);
                self.render();
                SelectionOutcome::Applied
            }
            Err(e) => {
                warn!(show_id, error = %e, "failed to load episodes");
                self.state.fail_loading(e.clone());
                self.render();
                SelectionOutcome::Failed(e)
            }
        }
    }

    pub fn search_episodes(&mut self, term: &str) -> bool {
        self.apply(|state| state.search_episodes(term))
    }

    pub fn select_episode(&mut self, episode_id: EpisodeId) -> bool {
        self.apply(|state| state.select_episode(episode_id))
    }

    pub fn clear_episode_selection(&mut self) -> bool {
        self.apply(ViewState::clear_episode_selection)
    }

    /// Returns to the show list, see [`BackPolicy`].
    pub fn back(&mut self) -> bool {
        let policy = self.back_policy;
        self.apply(|state| state.back(policy))
    }

    fn apply(&mut self, event: impl FnOnce(&mut ViewState) -> bool) -> bool {
        let changed = event(&mut self.state);
        if changed {
            self.render();
        }
        changed
    }

    fn render(&mut self) {
        self.renderer.render(&self.state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fake::FakeSource;
    use crate::catalog::fixtures::{episode, show};

    /// Records a summary of every rendered snapshot
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(ActiveView, Counts, Option<LoadTarget>, bool)>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, snapshot: &Snapshot<'_>) {
            self.frames.push((
                snapshot.active_view,
                snapshot.counts,
                snapshot.loading,
                snapshot.error.is_some(),
            ));
        }
    }

    fn ten_episodes() -> Vec<Episode> {
        (1..=10)
            .map(|n| episode(100 + n, 1, n as u32, &format!("Episode {}", n)))
            .collect()
    }

    fn source() -> FakeSource {
        let mut thrones = show(82, "Game of Thrones");
        thrones.genres = vec!["Drama".to_string()];
        let mut source = FakeSource {
            shows: vec![thrones, show(83, "Breaking Bad"), show(84, "Arrested Development")],
            ..Default::default()
        };
        source.episodes.insert(82, ten_episodes());
        source.episodes.insert(83, vec![episode(1, 1, 1, "Pilot")]);
        source.unlisted_shows.push(show(90, "The Wire"));
        source.episodes.insert(90, vec![episode(201, 1, 1, "The Target")]);
        source
    }

    async fn loaded() -> Orchestrator<FakeSource, RecordingRenderer> {
        let mut browser = Orchestrator::new(CachedCatalog::new(source()), RecordingRenderer::default());
        browser.load_shows().await.unwrap();
        browser
    }

    fn visible_show_ids<R: Renderer>(browser: &Orchestrator<FakeSource, R>) -> Vec<ShowId> {
        browser.state().visible_shows().iter().map(|s| s.id).collect()
    }

    #[tokio::test]
    async fn test_load_shows_sorts_and_renders_loading() {
        let browser = loaded().await;

        assert_eq!(visible_show_ids(&browser), vec![84, 83, 82]);
        let frames = &browser.renderer().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].2, Some(LoadTarget::Shows));
        assert_eq!(frames[1], (ActiveView::ShowList, Counts { visible: 3, total: 3 }, None, false));
    }

    #[tokio::test]
    async fn test_load_shows_failure_is_surfaced_and_retryable() {
        let source = source();
        source
            .show_failures
            .lock()
            .unwrap()
            .push(CatalogError::Network("offline".to_string()));
        let mut browser = Orchestrator::new(CachedCatalog::new(source), NullRenderer);

        assert!(browser.load_shows().await.is_err());
        assert!(browser.snapshot().error.is_some());
        assert_eq!(browser.snapshot().loading, None);

        browser.load_shows().await.unwrap();
        assert!(browser.snapshot().error.is_none());
        assert_eq!(browser.snapshot().counts.total, 3);
    }

    #[tokio::test]
    async fn test_search_shows() {
        let mut browser = loaded().await;

        assert!(browser.search_shows("DRAMA"));
        assert_eq!(visible_show_ids(&browser), vec![82]);
        assert_eq!(browser.snapshot().counts, Counts { visible: 1, total: 3 });

        browser.search_shows("");
        assert_eq!(visible_show_ids(&browser), vec![84, 83, 82]);
    }

    #[tokio::test]
    async fn test_select_show_opens_episode_list() {
        let mut browser = loaded().await;

        browser.select_show(82).await.unwrap();

        let snapshot = browser.snapshot();
        assert_eq!(snapshot.active_view, ActiveView::EpisodeList);
        assert_eq!(snapshot.current_show.map(|s| s.id), Some(82));
        assert_eq!(snapshot.counts, Counts { visible: 10, total: 10 });
        assert!(matches!(snapshot.listing, Listing::Episodes(episodes) if episodes.len() == 10));
        assert_eq!(snapshot.loading, None);
    }

    #[tokio::test]
    async fn test_select_and_clear_episode() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();

        assert!(browser.select_episode(103));
        let visible: Vec<EpisodeId> = browser.state().visible_episodes().iter().map(|e| e.id).collect();
        assert_eq!(visible, vec![103]);
        assert_eq!(browser.snapshot().selected_episode, Some(103));

        assert!(browser.clear_episode_selection());
        assert_eq!(browser.state().visible_episodes().len(), 10);
        assert_eq!(browser.snapshot().selected_episode, None);
    }

    #[tokio::test]
    async fn test_unknown_episode_selection_is_a_no_op() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();
        let frames = browser.renderer().frames.len();

        assert!(!browser.select_episode(9999));
        assert_eq!(browser.state().visible_episodes().len(), 10);
        assert_eq!(browser.renderer().frames.len(), frames);
    }

    #[tokio::test]
    async fn test_most_recent_episode_filter_wins() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();

        browser.search_episodes("episode 1");
        // "Episode 1" and "Episode 10"
        assert_eq!(browser.state().visible_episodes().len(), 2);

        browser.select_episode(105);
        assert_eq!(browser.state().visible_episodes()[0].id, 105);

        browser.clear_episode_selection();
        assert_eq!(browser.state().visible_episodes().len(), 2);

        browser.select_episode(105);
        browser.search_episodes("episode 10");
        assert_eq!(browser.snapshot().selected_episode, None);
        assert_eq!(browser.state().visible_episodes()[0].id, 110);
    }

    #[tokio::test]
    async fn test_back_restores_show_search() {
        let mut browser = loaded().await;
        browser.search_shows("breaking");
        browser.select_show(83).await.unwrap();
        browser.search_episodes("pilot");

        assert!(browser.back());

        let snapshot = browser.snapshot();
        assert_eq!(snapshot.active_view, ActiveView::ShowList);
        assert!(snapshot.current_show.is_none());
        assert_eq!(snapshot.show_search, "breaking");
        assert_eq!(snapshot.episode_search, "");
        assert_eq!(visible_show_ids(&browser), vec![83]);
    }

    #[tokio::test]
    async fn test_back_with_clear_policy_shows_everything() {
        let mut browser = Orchestrator::new(CachedCatalog::new(source()), NullRenderer)
            .with_back_policy(BackPolicy::ClearSearch);
        browser.load_shows().await.unwrap();
        browser.search_shows("breaking");
        browser.select_show(83).await.unwrap();

        browser.back();

        assert_eq!(browser.state().show_search(), "");
        assert_eq!(visible_show_ids(&browser), vec![84, 83, 82]);
    }

    #[tokio::test]
    async fn test_out_of_view_events_are_ignored() {
        let mut browser = loaded().await;

        assert!(!browser.back());
        assert!(!browser.search_episodes("pilot"));
        assert!(!browser.select_episode(101));
        assert!(!browser.clear_episode_selection());

        browser.select_show(82).await.unwrap();
        assert!(!browser.search_shows("breaking"));
        assert_eq!(browser.state().show_search(), "");
    }

    #[tokio::test]
    async fn test_unknown_show_is_reported_by_the_catalog() {
        let mut browser = loaded().await;

        assert_eq!(browser.select_show(999).await, Err(CatalogError::NotFound(999)));
        assert_eq!(browser.catalog().source().show_lookups_for(999), 1);
        assert_eq!(browser.snapshot().active_view, ActiveView::ShowList);
        assert_eq!(browser.snapshot().error, Some(&CatalogError::NotFound(999)));
        assert_eq!(browser.snapshot().loading, None);
    }

    #[tokio::test]
    async fn test_unlisted_show_can_be_selected() {
        let mut browser = loaded().await;

        browser.select_show(90).await.unwrap();

        let snapshot = browser.snapshot();
        assert_eq!(snapshot.active_view, ActiveView::EpisodeList);
        assert_eq!(snapshot.current_show.map(|s| s.name.as_str()), Some("The Wire"));
        assert_eq!(snapshot.counts, Counts { visible: 1, total: 1 });
        assert_eq!(browser.catalog().source().show_lookups_for(90), 1);
        assert_eq!(visible_show_ids(&browser), vec![84, 83, 82]);
    }

    #[tokio::test]
    async fn test_selection_without_show_list() {
        let mut browser = Orchestrator::new(CachedCatalog::new(source()), NullRenderer);

        browser.select_show(83).await.unwrap();

        assert_eq!(browser.state().current_show().map(|s| s.id), Some(83));
        assert_eq!(browser.catalog().source().show_calls(), 0);
        assert_eq!(browser.catalog().source().show_lookups_for(83), 1);
    }

    #[tokio::test]
    async fn test_episode_filtering_clears_selection_error() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();
        browser
            .catalog()
            .source()
            .episode_failures
            .lock()
            .unwrap()
            .push(CatalogError::Http { status: 500 });

        assert!(browser.select_show(83).await.is_err());
        assert_eq!(browser.snapshot().active_view, ActiveView::EpisodeList);
        assert_eq!(browser.snapshot().error, Some(&CatalogError::Http { status: 500 }));

        assert!(browser.search_episodes("pilot"));
        assert!(browser.snapshot().error.is_none());
        assert_eq!(browser.snapshot().current_show.map(|s| s.id), Some(82));

        browser
            .catalog()
            .source()
            .episode_failures
            .lock()
            .unwrap()
            .push(CatalogError::Http { status: 500 });
        assert!(browser.select_show(83).await.is_err());
        assert!(browser.snapshot().error.is_some());

        assert!(browser.clear_episode_selection());
        assert!(browser.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_failed_selection_keeps_loaded_state() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();
        browser.back();
        browser
            .catalog()
            .source()
            .episode_failures
            .lock()
            .unwrap()
            .push(CatalogError::Http { status: 500 });

        let result = browser.select_show(83).await;

        assert_eq!(result, Err(CatalogError::Http { status: 500 }));
        let snapshot = browser.snapshot();
        assert_eq!(snapshot.active_view, ActiveView::ShowList);
        assert_eq!(snapshot.error, Some(&CatalogError::Http { status: 500 }));
        assert_eq!(snapshot.loading, None);
        assert_eq!(snapshot.counts, Counts { visible: 3, total: 3 });
        assert_eq!(browser.catalog().cached_episodes(82).map(|e| e.len()), Some(10));

        // Retrying refetches and succeeds.
        browser.select_show(83).await.unwrap();
        assert_eq!(browser.catalog().source().episode_calls_for(83), 2);
        assert!(browser.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_reselecting_a_show_reuses_the_cache() {
        let mut browser = loaded().await;

        browser.select_show(82).await.unwrap();
        browser.back();
        browser.select_show(82).await.unwrap();

        assert_eq!(browser.catalog().source().episode_calls_for(82), 1);
        assert_eq!(browser.state().visible_episodes().len(), 10);
    }

    #[tokio::test]
    async fn test_stale_selection_is_discarded() {
        let mut browser = loaded().await;

        let first = browser.begin_selection(82);
        let second = browser.begin_selection(83);

        let first = first.fetch().await;
        assert_eq!(browser.finish_selection(first), SelectionOutcome::Discarded);
        assert_eq!(browser.snapshot().loading, Some(LoadTarget::Episodes(83)));

        let second = second.fetch().await;
        assert_eq!(browser.finish_selection(second), SelectionOutcome::Applied);
        assert_eq!(browser.snapshot().current_show.map(|s| s.id), Some(83));
    }

    #[tokio::test]
    async fn test_back_discards_pending_selection() {
        let mut browser = loaded().await;
        browser.select_show(82).await.unwrap();

        let pending = browser.begin_selection(83);
        browser.back();
        let completed = pending.fetch().await;

        assert_eq!(browser.finish_selection(completed), SelectionOutcome::Discarded);
        assert_eq!(browser.snapshot().active_view, ActiveView::ShowList);
        assert!(browser.snapshot().current_show.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_selection_shares_one_fetch() {
        let mut browser = loaded().await;

        let a = browser.begin_selection(82);
        let b = browser.begin_selection(82);
        let (a, b) = tokio::join!(a.fetch(), b.fetch());

        assert_eq!(browser.finish_selection(a), SelectionOutcome::Applied);
        assert_eq!(browser.finish_selection(b), SelectionOutcome::Applied);
        assert_eq!(browser.catalog().source().episode_calls_for(82), 1);
        assert_eq!(browser.state().current_show().map(|s| s.id), Some(82));
    }

    #[test]
    fn test_view_state_starts_on_empty_show_list() {
        let state = ViewState::new();
        let snapshot = state.snapshot();

        assert_eq!(snapshot.active_view, ActiveView::ShowList);
        assert_eq!(snapshot.counts, Counts::default());
        assert!(matches!(snapshot.listing, Listing::Shows(shows) if shows.is_empty()));
    }

    #[test]
    fn test_apply_shows_keeps_active_search() {
        let mut state = ViewState::new();
        state.search_shows("alpha");
        state.apply_shows(Arc::new(vec![show(1, "Alpha"), show(2, "Beta")]));

        assert_eq!(state.visible_shows().len(), 1);
        assert_eq!(state.all_shows().len(), 2);
    }
}
