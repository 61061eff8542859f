//! The library screen.
//!
//! [`Library`] owns the search input, its debouncer, the pagination
//! controller, the virtualized grid and the viewport. The host drives it
//! with [`Library::tick`] and [`Library::handle_outcome`]; everything else is
//! a synchronous state change followed by a render.

use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Config;
use crate::grid::{BookGrid, Viewport, ViewportObserver, ViewportState};
use crate::pagination::{InfiniteBooks, PageOutcome};
use crate::sources::{BookSource, QUICK_FILTERS};
use crate::ui::pages::{
    loaded_line, render_empty, render_error, render_grid, render_quick_filters, status_line,
    LIBRARY_TITLE,
};
use crate::ui::OwoColorize;
use crate::utils::{Debouncer, QueryCache};

/// Scroll offset past which scrolling down hides the quick filters
pub const QUICK_FILTER_HIDE_OFFSET: u64 = 100;

/// What the main area of the library shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryView {
    Error(String),
    Empty,
    Grid,
}

/// State of the library screen
#[derive(Debug)]
pub struct Library {
    input: String,
    debouncer: Debouncer<String>,
    query: String,
    books: InfiniteBooks,
    grid: BookGrid,
    viewport: Viewport,
    grid_observer: ViewportObserver,
    chrome_observer: ViewportObserver,
    quick_filters_visible: bool,
    last_scroll_y: u64,
}

impl Library {
    /// Open the library on the configured initial query.
    ///
    /// Starts the first page request, so it must run inside a tokio runtime.
    pub fn new(
        source: Arc<dyn BookSource>,
        config: &Config,
        viewport: ViewportState,
        now: Instant,
    ) -> Self {
        let initial = config.search.initial_query.clone();
        let cache = QueryCache::from_config(&config.cache);
        let mut books = InfiniteBooks::new(source, cache).with_page_size(config.api.page_size);
        books.set_query(&initial, now);

        let grid = BookGrid::new(viewport.width, viewport.height, config.grid.overscan);
        let viewport = Viewport::new(viewport);
        let grid_observer = viewport.subscribe();
        let chrome_observer = viewport.subscribe();

        let mut library = Self {
            input: initial.clone(),
            debouncer: Debouncer::new(initial.clone(), config.search.debounce()),
            query: initial,
            books,
            grid,
            viewport,
            grid_observer,
            chrome_observer,
            quick_filters_visible: true,
            last_scroll_y: 0,
        };
        library.settle(now);
        library
    }

    /// Replace the search input. The query follows once the input is stable.
    pub fn type_input(&mut self, text: &str, now: Instant) {
        self.input = text.to_string();
        self.debouncer.push(self.input.clone(), now);
    }

    /// Select a quick filter chip.
    ///
    /// Input and the highlighted chip change at once; the search itself
    /// still waits out the debounce window.
    pub fn apply_quick_filter(&mut self, filter: &str, now: Instant) {
        self.query = filter.to_string();
        self.type_input(filter, now);
    }

    /// Advance the screen to `now`.
    ///
    /// Emits a settled query, applies finished page requests and viewport
    /// changes, and requests the next page when the grid reaches the end.
    /// Returns `true` if anything visible may have changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if let Some(query) = self.debouncer.poll(now) {
            tracing::debug!(query = %query, "Search input settled");
            self.query = query.clone();
            changed |= self.books.set_query(&query, now);
            self.viewport.scroll_to(0);
        }

        changed |= self.books.pump(now);

        if let Some(state) = self.grid_observer.poll_change() {
            self.grid.resize(state.width, state.height);
            self.grid.scroll_to(state.scroll_y);

            // A re-measured grid can be shorter than the old offset
            let clamped = self.grid.window().scroll_offset();
            if clamped != state.scroll_y {
                self.viewport.scroll_to(clamped);
                self.grid_observer.poll_change();
            }
            changed = true;
        }
        if let Some(state) = self.chrome_observer.poll_change() {
            changed |= self.track_scroll(state.scroll_y);
        }

        let evicted = self.books.evict_inactive(now);
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted inactive cache entries");
        }

        self.settle(now);
        changed
    }

    /// Fold a finished page request into the screen
    pub fn handle_outcome(&mut self, outcome: PageOutcome, now: Instant) -> bool {
        let changed = self.books.apply(outcome, now);
        self.settle(now);
        changed
    }

    /// Wait for the next finished page request
    pub async fn next_outcome(&mut self) -> Option<PageOutcome> {
        self.books.next_outcome().await
    }

    /// Start over after a failed request
    pub fn retry(&mut self, now: Instant) {
        self.books.refetch();
        self.viewport.scroll_to(0);
        self.settle(now);
    }

    /// Scroll the viewport by `delta` pixels, clamped to the grid
    pub fn scroll_by(&mut self, delta: i64) {
        let current = self.viewport.state().scroll_y;
        let target = if delta >= 0 {
            current.saturating_add(delta as u64)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        };
        self.viewport.scroll_to(target.min(self.grid.window().max_scroll()));
    }

    /// Scroll one viewport height down or up
    pub fn scroll_page(&mut self, down: bool) {
        let height = i64::from(self.viewport.state().height);
        self.scroll_by(if down { height } else { -height });
    }

    /// Report a new viewport size
    pub fn resize(&mut self, width: Option<u32>, height: u32) {
        self.viewport.resize(width, height);
    }

    /// Keep the grid in step with the loaded data and pull the next page
    /// when the rendered window reaches the last loaded row
    fn settle(&mut self, now: Instant) {
        self.sync_grid();
        if self
            .grid
            .should_fetch_next(self.books.has_next_page(), self.books.is_fetching())
            && self.books.fetch_next(now)
        {
            self.sync_grid();
        }
    }

    fn sync_grid(&mut self) {
        self.grid.sync(
            self.books.loaded_count(),
            self.books.has_next_page(),
            self.books.is_fetching_next_page(),
        );
    }

    fn track_scroll(&mut self, scroll_y: u64) -> bool {
        let was_visible = self.quick_filters_visible;
        if scroll_y > self.last_scroll_y && scroll_y > QUICK_FILTER_HIDE_OFFSET {
            self.quick_filters_visible = false;
        } else if scroll_y < self.last_scroll_y {
            self.quick_filters_visible = true;
        }
        self.last_scroll_y = scroll_y;
        was_visible != self.quick_filters_visible
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Query shown in the header
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The quick filter matching the current query, if any
    pub fn selected_filter(&self) -> Option<&'static str> {
        QUICK_FILTERS.iter().copied().find(|f| *f == self.query)
    }

    pub fn quick_filters_visible(&self) -> bool {
        self.quick_filters_visible
    }

    /// When the pending input settles, if anything is pending
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn books(&self) -> &InfiniteBooks {
        &self.books
    }

    pub fn grid(&self) -> &BookGrid {
        &self.grid
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_fetching(&self) -> bool {
        self.books.is_fetching()
    }

    pub fn status_line(&self) -> String {
        status_line(self.books.is_loading(), self.books.total_found(), &self.query)
    }

    pub fn loaded_line(&self) -> String {
        loaded_line(self.books.loaded_count())
    }

    pub fn view(&self) -> LibraryView {
        if let Some(err) = self.books.error() {
            LibraryView::Error(err.to_string())
        } else if self.books.books().is_empty() && !self.books.is_loading() {
            LibraryView::Empty
        } else {
            LibraryView::Grid
        }
    }

    /// Render the whole screen for a terminal `total_width` cells wide
    pub fn render(&self, total_width: usize) -> String {
        let mut out = vec![
            format!("📚 {}", LIBRARY_TITLE.bold().cyan()),
            format!("{}   ✨ {}", self.status_line(), self.loaded_line().dimmed()),
            format!("🔍 {}", self.input),
        ];
        if self.quick_filters_visible {
            out.push(render_quick_filters(&QUICK_FILTERS, self.selected_filter()));
        }

        match self.view() {
            LibraryView::Error(message) => out.push(render_error(&message)),
            LibraryView::Empty => out.push(render_empty()),
            LibraryView::Grid => {
                let rows = self.grid.rows(self.books.books());
                out.push(render_grid(&rows, self.grid.layout().columns, total_width));
            }
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockSource, SourceError};
    use crate::utils::{CacheResult, PageKey};
    use std::time::Duration;

    fn open(source: &Arc<MockSource>, config: &Config) -> Library {
        Library::new(
            Arc::clone(source) as Arc<dyn BookSource>,
            config,
            ViewportState::new(Some(1024), 900),
            Instant::now(),
        )
    }

    async fn settle(library: &mut Library) {
        while library.is_fetching() {
            let outcome = library.next_outcome().await.unwrap();
            library.handle_outcome(outcome, Instant::now());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_fills_viewport() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        let mut library = open(&source, &Config::default());

        assert_eq!(library.status_line(), "Searching...");
        settle(&mut library).await;

        // 20 books are 5 rows of 4; the overscan reaches row 4, so page 2
        // is pulled in straight away
        assert_eq!(source.call_count(), 2);
        assert_eq!(library.books().loaded_count(), 40);
        assert_eq!(library.status_line(), "45 books found for \"science\"");
        assert_eq!(library.loaded_line(), "40 loaded");
        assert_eq!(library.view(), LibraryView::Grid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_is_debounced() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        source.set_catalog("dune", 3, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;
        let calls = source.call_count();

        library.type_input("d", Instant::now());
        tokio::time::advance(Duration::from_millis(200)).await;
        library.type_input("du", Instant::now());
        tokio::time::advance(Duration::from_millis(200)).await;
        library.type_input("dune", Instant::now());

        tokio::time::advance(Duration::from_millis(399)).await;
        library.tick(Instant::now());
        assert_eq!(library.books().query(), "science");
        assert_eq!(source.call_count(), calls);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(library.tick(Instant::now()));
        assert_eq!(library.books().query(), "dune");
        settle(&mut library).await;

        assert_eq!(source.call_count(), calls + 1);
        assert_eq!(library.books().loaded_count(), 3);
        assert_eq!(library.status_line(), "3 books found for \"dune\"");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_filter_highlights_immediately() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        source.set_catalog("Fiction", 10, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;

        library.apply_quick_filter("Fiction", Instant::now());
        assert_eq!(library.input(), "Fiction");
        assert_eq!(library.selected_filter(), Some("Fiction"));
        assert_eq!(library.books().query(), "science");

        tokio::time::advance(Duration::from_millis(400)).await;
        library.tick(Instant::now());
        settle(&mut library).await;
        assert_eq!(library.books().query(), "Fiction");
        assert_eq!(library.books().loaded_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_filters_hide_on_scroll_down() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;

        library.scroll_by(80);
        library.tick(Instant::now());
        assert!(library.quick_filters_visible());

        library.scroll_by(220);
        library.tick(Instant::now());
        assert!(!library.quick_filters_visible());

        library.scroll_by(-50);
        library.tick(Instant::now());
        assert!(library.quick_filters_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_to_end_fetches_next_page() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;
        assert_eq!(library.grid().data_rows(), 10);

        library.scroll_by(100_000);
        library.tick(Instant::now());
        assert!(library.books().is_fetching_next_page());
        assert!(library.grid().has_loading_row());

        settle(&mut library).await;
        assert_eq!(library.books().loaded_count(), 45);
        assert!(!library.books().has_next_page());
        assert!(!library.grid().has_loading_row());
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_then_retry() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        source.fail_next(SourceError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
        });
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;

        assert_eq!(
            library.view(),
            LibraryView::Error("Failed to fetch books: 503 Service Unavailable".to_string())
        );
        assert!(library.render(100).contains("Something went wrong"));

        library.retry(Instant::now());
        settle(&mut library).await;
        assert_eq!(library.view(), LibraryView::Grid);
        assert_eq!(library.books().loaded_count(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_next_page_waits_for_retry() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 200, 20);
        let mut library = Library::new(
            Arc::clone(&source) as Arc<dyn BookSource>,
            &Config::default(),
            ViewportState::new(Some(500), 800),
            Instant::now(),
        );
        settle(&mut library).await;
        let calls = source.call_count();
        let loaded = library.books().loaded_count();

        for _ in 0..5 {
            source.fail_next(SourceError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        library.scroll_by(1_000_000);
        library.tick(Instant::now());
        settle(&mut library).await;
        library.tick(Instant::now());

        assert_eq!(source.call_count(), calls + 1);
        assert!(!library.is_fetching());
        assert_eq!(library.books().loaded_count(), loaded);
        assert_eq!(
            library.view(),
            LibraryView::Error("Failed to fetch books: 503 Service Unavailable".to_string())
        );

        source.clear_failures();
        library.retry(Instant::now());
        settle(&mut library).await;
        assert_eq!(library.view(), LibraryView::Grid);
        assert!(library.books().loaded_count() >= 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results() {
        let source = Arc::new(MockSource::new());
        let mut config = Config::default();
        config.search.initial_query = "zzzz".to_string();
        let mut library = open(&source, &config);
        settle(&mut library).await;

        assert_eq!(library.view(), LibraryView::Empty);
        assert_eq!(library.status_line(), "0 books found for \"zzzz\"");
        assert!(library.render(100).contains("No books found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_relayouts_grid() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;
        assert_eq!(library.grid().layout().columns, 4);

        library.resize(Some(500), 900);
        library.tick(Instant::now());
        assert_eq!(library.grid().layout().columns, 1);
        assert_eq!(library.grid().window().row_height(), 400);
        assert_eq!(library.viewport().observer_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_clamps_scroll_offset() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 20, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;

        // 5 rows of 440px in a 900px viewport
        library.scroll_by(100_000);
        library.tick(Instant::now());
        assert_eq!(library.viewport().state().scroll_y, 1300);

        // 6 columns leave 4 rows
        library.resize(Some(1400), 900);
        library.tick(Instant::now());
        assert_eq!(library.grid().window().max_scroll(), 860);
        assert_eq!(library.viewport().state().scroll_y, 860);
        assert_eq!(library.grid().window().scroll_offset(), 860);

        library.scroll_by(-100);
        library.tick(Instant::now());
        assert_eq!(library.grid().window().scroll_offset(), 760);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_query_evicted_after_gc_time() {
        let source = Arc::new(MockSource::new());
        source.set_catalog("science", 45, 20);
        source.set_catalog("dune", 3, 20);
        let mut library = open(&source, &Config::default());
        settle(&mut library).await;

        library.type_input("dune", Instant::now());
        tokio::time::advance(Duration::from_millis(400)).await;
        library.tick(Instant::now());
        settle(&mut library).await;
        assert_eq!(library.books().cache().len(), 3);

        tokio::time::advance(Duration::from_secs(599)).await;
        library.tick(Instant::now());
        assert_eq!(library.books().cache().len(), 3);

        tokio::time::advance(Duration::from_secs(1)).await;
        library.tick(Instant::now());
        assert_eq!(library.books().cache().len(), 1);
        let now = Instant::now();
        let science = library.books().cache().get(&PageKey::new("science", 1), now);
        assert!(matches!(science, CacheResult::Miss));
        let dune = library.books().cache().get(&PageKey::new("dune", 1), now);
        assert!(!matches!(dune, CacheResult::Miss));
    }
}
