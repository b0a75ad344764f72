use anyhow::Result;
use ratatui::text::Line;
use reqwest::redirect::Policy;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::content::{cache_key, load_into_cache, ContentCache, ContentState, ReaderClient};
use crate::digest::{DigestController, Phase, SaveToggle};
use crate::keybindings::KeybindingRegistry;
use crate::news::{Breakdown, BreakdownSource, GeminiClient, NewsStory};
use crate::prefetch::{ContentPrefetcher, PrefetchManager, PrefetchSink};
use crate::share::{share_text, Clipboard, Osc52Clipboard};
use crate::storage::{Database, KeyValueStore};
use crate::theme::{ColorPalette, ThemeVariant};
use crate::util::validate_url_for_open;

/// How long ordinary status messages stay visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);
/// Share feedback is shorter-lived.
pub const SHARE_STATUS_TTL: Duration = Duration::from_secs(2);

pub(crate) const ERR_STORY_NO_URL: &str = "Story has no source link";

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Redirect policy: at most 3 hops, loops rejected, chain logged.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Shared pooled client for Gemini and the reader service.
///
/// Only a connect timeout is set globally; generation calls can legitimately
/// take a long time, and the reader client applies its own request timeout.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

// ============================================================================
// View State
// ============================================================================

/// Which list the main screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: Cow<'static, str>,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

/// The in-terminal reader opened over either view.
pub struct ReaderState {
    pub story: NewsStory,
    /// Content cache key for the story's URL.
    pub key: String,
    pub content: ContentState,
    /// Rendered markdown, built once per content/palette.
    pub lines: Option<Vec<Line<'static>>>,
    /// Total lines after wrapping at the last drawn width.
    pub wrapped_lines: usize,
    pub scroll: usize,
}

/// Events from background tasks
pub enum AppEvent {
    /// A digest fetch finished (or its task panicked, reported as `Err`).
    BreakdownReady {
        generation: u64,
        result: Result<Breakdown, String>,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App<S: KeyValueStore = Database, B: BreakdownSource = GeminiClient> {
    pub digest: DigestController<S>,
    source: Arc<B>,

    reader_client: ReaderClient,
    pub content_cache: ContentCache,
    prefetch: Option<PrefetchManager<Box<dyn PrefetchSink + Send>>>,
    clipboard: Box<dyn Clipboard + Send>,

    pub keybindings: KeybindingRegistry,
    pub palette: ColorPalette,

    // UI State
    pub view: View,
    pub selected: usize,
    pub reader: Option<ReaderState>,
    reader_task: Option<JoinHandle<()>>,

    pub status: Option<StatusMessage>,

    /// Whether the help overlay is currently displayed.
    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// Skip frames when nothing changed.
    pub needs_redraw: bool,
    /// Current frame of the loading spinner.
    pub spinner_frame: usize,
    /// Last known reader viewport height (without borders).
    pub reader_visible_lines: usize,
}

impl<S: KeyValueStore, B: BreakdownSource> App<S, B> {
    pub fn new(digest: DigestController<S>, source: B, reader_client: ReaderClient) -> Self {
        let palette = digest.theme().palette();
        Self {
            digest,
            source: Arc::new(source),
            reader_client,
            content_cache: ContentCache::default(),
            prefetch: None,
            clipboard: Box::new(Osc52Clipboard),
            keybindings: KeybindingRegistry::new(),
            palette,
            view: View::Main,
            selected: 0,
            reader: None,
            reader_task: None,
            status: None,
            show_help: false,
            help_scroll_offset: 0,
            needs_redraw: true,
            spinner_frame: 0,
            reader_visible_lines: 0,
        }
    }

    /// Warm the content cache for each new digest's stories.
    pub fn with_prefetch(self, enabled: bool) -> Self {
        if !enabled {
            return self;
        }
        let sink = ContentPrefetcher::new(self.reader_client.clone(), self.content_cache.clone());
        self.with_prefetch_sink(Box::new(sink))
    }

    /// Route prefetch hints to `sink` instead of the reader.
    pub fn with_prefetch_sink(mut self, sink: Box<dyn PrefetchSink + Send>) -> Self {
        self.prefetch = Some(PrefetchManager::new(sink));
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard + Send>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_keybindings(mut self, keybindings: KeybindingRegistry) -> Self {
        self.keybindings = keybindings;
        self
    }

    pub fn source(&self) -> Arc<B> {
        Arc::clone(&self.source)
    }

    pub fn prefetched(&self) -> &[String] {
        self.prefetch.as_ref().map(|p| p.installed()).unwrap_or(&[])
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Stories in the current view, in display order.
    pub fn visible_stories(&self) -> Vec<&NewsStory> {
        match self.view {
            View::Main => self
                .digest
                .themes()
                .iter()
                .flat_map(|t| t.stories.iter())
                .collect(),
            View::Saved => self.digest.saved().iter().collect(),
        }
    }

    pub fn selected_story(&self) -> Option<&NewsStory> {
        self.visible_stories().get(self.selected).copied()
    }

    pub fn nav_down(&mut self) {
        let len = self.visible_stories().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_stories().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Switch between the digest and saved stories. Never re-fetches.
    pub fn toggle_saved_view(&mut self) {
        self.view = match self.view {
            View::Main => View::Saved,
            View::Saved => View::Main,
        };
        self.selected = 0;
        tracing::debug!(view = ?self.view, "Switched view");
    }

    // ========================================================================
    // Digest Lifecycle
    // ========================================================================

    /// Enter loading for a new fetch. `None` when refresh is unavailable:
    /// in the saved view or while a fetch is in flight.
    pub fn begin_refresh(&mut self) -> Option<u64> {
        if self.view == View::Saved {
            return None;
        }
        let generation = self.digest.begin_refresh()?;
        self.selected = 0;
        Some(generation)
    }

    /// Apply a finished fetch and, when it produced stories, replace the
    /// prefetch hints with their URLs.
    pub fn apply_breakdown(
        &mut self,
        generation: u64,
        result: Result<Breakdown, String>,
        now: Instant,
    ) {
        let urls: Vec<String> = match &result {
            Ok(Breakdown {
                data: Some(data), ..
            }) => data.story_urls().into_iter().map(str::to_string).collect(),
            _ => Vec::new(),
        };

        if !self.digest.finish_refresh(generation, result, now) {
            return;
        }
        self.clamp_selection();

        if let Some(prefetch) = self.prefetch.as_mut() {
            if *self.digest.phase() == Phase::Ready {
                prefetch.update(urls.iter().map(String::as_str));
            } else {
                prefetch.clear();
            }
        }
    }

    // ========================================================================
    // Story Actions
    // ========================================================================

    /// Save or unsave the focused story and report the outcome.
    pub async fn toggle_save_selected(&mut self) {
        let Some(story) = self.focused_story().cloned() else {
            return;
        };
        match self.digest.toggle_save(&story).await {
            Ok(SaveToggle::Saved) => self.set_status("Story saved"),
            Ok(SaveToggle::Removed) => self.set_status("Story removed from saved"),
            Ok(SaveToggle::NoUrl) => self.set_status(ERR_STORY_NO_URL),
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist saved stories");
                self.set_error(format!("Could not save: {e}"));
            }
        }
        if self.view == View::Saved {
            self.clamp_selection();
        }
        self.needs_redraw = true;
    }

    /// Flip light/dark, persist it, and apply the new palette.
    pub async fn toggle_theme(&mut self) {
        let result = self.digest.toggle_theme().await;
        self.apply_palette(self.digest.theme());
        match result {
            Ok(variant) => self.set_status(format!("Theme: {}", variant.name())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist theme preference");
                self.set_error(format!("Could not save theme: {e}"));
            }
        }
    }

    fn apply_palette(&mut self, variant: ThemeVariant) {
        self.palette = variant.palette();
        if let Some(reader) = self.reader.as_mut() {
            reader.lines = None;
        }
        self.needs_redraw = true;
    }

    /// Copy the focused story (reader first, then selection) as share text.
    pub fn share_selected(&mut self) {
        let Some(text) = self.focused_story().map(share_text) else {
            return;
        };
        match self.clipboard.copy(&text) {
            Ok(()) => self.set_status_for("Copied!", StatusKind::Success, SHARE_STATUS_TTL),
            Err(e) => {
                tracing::error!(error = %e, "Failed to copy story");
                self.set_status_for("Failed to copy", StatusKind::Error, SHARE_STATUS_TTL);
            }
        }
    }

    /// Open the focused story's source in the system browser.
    pub fn open_selected(&mut self) {
        let Some(url) = self.focused_story().and_then(|s| s.url()).map(str::to_string) else {
            if self.focused_story().is_some() {
                self.set_status(ERR_STORY_NO_URL);
            }
            return;
        };
        if let Err(e) = validate_url_for_open(&url) {
            self.set_error(e.to_string());
        } else if let Err(e) = open::that(&url) {
            tracing::warn!(url = %url, error = %e, "Failed to open browser");
            self.set_error(format!("Failed to open browser: {e}"));
        } else {
            self.set_status("Opening in browser...");
        }
    }

    fn focused_story(&self) -> Option<&NewsStory> {
        match &self.reader {
            Some(reader) => Some(&reader.story),
            None => self.selected_story(),
        }
    }

    // ========================================================================
    // Reader
    // ========================================================================

    /// Open the reader for the selected story, using cached content or
    /// starting a fetch. Stories without a URL cannot be read.
    pub fn open_reader(&mut self) {
        let Some(story) = self.selected_story().cloned() else {
            return;
        };
        let Some(url) = story.url() else {
            self.set_status(ERR_STORY_NO_URL);
            return;
        };
        let key = cache_key(url);

        let content = match self.content_cache.get(&key) {
            Some(state) => state,
            None => {
                self.spawn_reader_load(&key);
                ContentState::Loading
            }
        };

        tracing::debug!(url = %key, cached = !matches!(content, ContentState::Loading), "Opening reader");
        self.reader = Some(ReaderState {
            story,
            key,
            content,
            lines: None,
            wrapped_lines: 0,
            scroll: 0,
        });
    }

    fn spawn_reader_load(&mut self, key: &str) {
        if let Some(handle) = self.reader_task.take() {
            handle.abort();
        }
        let reader = self.reader_client.clone();
        let cache = self.content_cache.clone();
        let url = key.to_string();
        self.reader_task = Some(tokio::spawn(async move {
            load_into_cache(&reader, &cache, &url).await;
        }));
    }

    /// Pick up finished reader content from the cache. Returns `true` when
    /// the reader changed.
    pub fn poll_reader(&mut self) -> bool {
        let Some(key) = self
            .reader
            .as_ref()
            .filter(|r| r.content == ContentState::Loading)
            .map(|r| r.key.clone())
        else {
            return false;
        };

        match self.content_cache.get(&key) {
            Some(ContentState::Loading) => false,
            Some(state) => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.content = state;
                    reader.lines = None;
                }
                true
            }
            None => {
                // A prefetch for this URL was cancelled; fetch it ourselves
                self.spawn_reader_load(&key);
                false
            }
        }
    }

    pub fn exit_reader(&mut self) {
        if let Some(handle) = self.reader_task.take() {
            if !handle.is_finished() {
                handle.abort();
                if let Some(reader) = &self.reader {
                    self.content_cache.discard_loading(&reader.key);
                }
                tracing::debug!("Aborted reader load on exit");
            }
        }
        self.reader = None;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let visible = self.reader_visible_lines;
        if let Some(reader) = self.reader.as_mut() {
            let max = reader.wrapped_lines.saturating_sub(visible.max(1));
            reader.scroll = reader.scroll.saturating_add(lines).min(max);
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        if let Some(reader) = self.reader.as_mut() {
            reader.scroll = reader.scroll.saturating_sub(lines);
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.set_status_for(msg, StatusKind::Info, STATUS_TTL);
    }

    pub fn set_error(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.set_status_for(msg, StatusKind::Error, STATUS_TTL);
    }

    pub fn set_status_for(
        &mut self,
        msg: impl Into<Cow<'static, str>>,
        kind: StatusKind,
        ttl: Duration,
    ) {
        self.status = Some(StatusMessage {
            text: msg.into(),
            kind,
            expires_at: Instant::now() + ttl,
        });
        self.needs_redraw = true;
    }

    /// Clear the status message if it has expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self, now: Instant) -> bool {
        if self.status.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.status = None;
            return true;
        }
        false
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

impl<S: KeyValueStore, B: BreakdownSource> Drop for App<S, B> {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_task.take() {
            handle.abort();
            tracing::debug!("Aborted reader load on App drop");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{NewsData, NewsTheme};
    use crate::share::MemoryClipboard;
    use crate::storage::{MemoryStore, SAVED_STORIES_KEY, THEME_KEY};
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;

    struct NeverSource;

    impl BreakdownSource for NeverSource {
        type Error = Infallible;

        async fn fetch_breakdown(&self) -> Result<Breakdown, Infallible> {
            std::future::pending().await
        }
    }

    fn story(title: &str, url: Option<&str>) -> NewsStory {
        NewsStory {
            title: title.to_string(),
            summary: format!("{title} summary"),
            context: String::new(),
            url: url.map(str::to_string),
        }
    }

    fn breakdown() -> Breakdown {
        Breakdown {
            data: Some(NewsData {
                overview: vec!["Markets steady".to_string()],
                themes: vec![
                    NewsTheme {
                        theme_title: "Economy".to_string(),
                        stories: vec![
                            story("Rupee firms", Some("https://www.ft.lk/rupee")),
                            story("Tea exports", Some("https://economynext.com/tea")),
                        ],
                    },
                    NewsTheme {
                        theme_title: "Politics".to_string(),
                        stories: vec![story("Cabinet reshuffle", None)],
                    },
                ],
            }),
            sources: Vec::new(),
        }
    }

    async fn test_app() -> (App<MemoryStore, NeverSource>, MemoryStore, MemoryClipboard) {
        let store = MemoryStore::new();
        let digest = DigestController::load(store.clone(), ThemeVariant::Dark).await;
        let clipboard = MemoryClipboard::new();
        let app = App::new(
            digest,
            NeverSource,
            ReaderClient::new(reqwest::Client::new(), None),
        )
        .with_clipboard(Box::new(clipboard.clone()));
        (app, store, clipboard)
    }

    async fn ready_app() -> (App<MemoryStore, NeverSource>, MemoryStore, MemoryClipboard) {
        let (mut app, store, clipboard) = test_app().await;
        let now = Instant::now();
        let generation = app.begin_refresh().unwrap();
        app.apply_breakdown(generation, Ok(breakdown()), now);
        app.digest.reveal_all();
        (app, store, clipboard)
    }

    #[tokio::test]
    async fn test_nav_empty_list() {
        let (mut app, _, _) = test_app().await;
        app.nav_down();
        app.nav_up();
        assert_eq!(app.selected, 0);
        assert!(app.selected_story().is_none());
    }

    #[tokio::test]
    async fn test_nav_spans_themes() {
        let (mut app, _, _) = ready_app().await;
        assert_eq!(app.visible_stories().len(), 3);
        app.nav_down();
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected, 2);
        assert_eq!(app.selected_story().unwrap().title, "Cabinet reshuffle");
    }

    #[tokio::test]
    async fn test_refresh_disabled_in_saved_view_and_while_loading() {
        let (mut app, _, _) = test_app().await;
        app.toggle_saved_view();
        assert!(app.begin_refresh().is_none());
        app.toggle_saved_view();
        assert!(app.begin_refresh().is_some());
        assert!(app.begin_refresh().is_none());
    }

    #[tokio::test]
    async fn test_toggle_saved_view_keeps_digest() {
        let (mut app, _, _) = ready_app().await;
        app.toggle_saved_view();
        assert_eq!(app.view, View::Saved);
        assert!(app.visible_stories().is_empty());
        app.toggle_saved_view();
        assert_eq!(app.digest.themes().len(), 2);
        assert_eq!(*app.digest.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_save_selected_persists_and_shows_in_saved_view() {
        let (mut app, store, _) = ready_app().await;
        app.toggle_save_selected().await;
        assert!(store.snapshot(SAVED_STORIES_KEY).unwrap().contains("Rupee firms"));

        app.toggle_saved_view();
        assert_eq!(app.visible_stories().len(), 1);

        // Unsaving from the saved view empties it and clamps selection
        app.toggle_save_selected().await;
        assert!(app.visible_stories().is_empty());
        assert_eq!(app.selected, 0);
    }

    #[tokio::test]
    async fn test_save_story_without_url_reports_status() {
        let (mut app, store, _) = ready_app().await;
        app.selected = 2;
        app.toggle_save_selected().await;
        assert!(store.snapshot(SAVED_STORIES_KEY).is_none());
        assert_eq!(app.status.as_ref().unwrap().text, ERR_STORY_NO_URL);
    }

    #[tokio::test]
    async fn test_save_write_failure_is_reported() {
        let (mut app, store, _) = ready_app().await;
        store.set_fail_writes(true);
        app.toggle_save_selected().await;
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(app.digest.is_saved(app.selected_story().unwrap()));
    }

    #[tokio::test]
    async fn test_toggle_theme_applies_palette_and_persists() {
        let (mut app, store, _) = test_app().await;
        let dark_bg = app.palette.background;
        app.toggle_theme().await;
        assert_eq!(app.digest.theme(), ThemeVariant::Light);
        assert_ne!(app.palette.background, dark_bg);
        assert_eq!(store.snapshot(THEME_KEY).as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_share_copies_text_and_sets_short_status() {
        let (mut app, _, clipboard) = ready_app().await;
        let before = Instant::now();
        app.share_selected();
        assert_eq!(
            clipboard.last().unwrap(),
            "Rupee firms\n\nRupee firms summary\n\nSource: https://www.ft.lk/rupee"
        );
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.text, "Copied!");
        assert!(status.expires_at <= before + SHARE_STATUS_TTL + Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_share_failure_feedback() {
        let (mut app, _, clipboard) = ready_app().await;
        clipboard.set_fail(true);
        app.share_selected();
        let status = app.status.as_ref().unwrap();
        assert_eq!(status.text, "Failed to copy");
        assert_eq!(status.kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_stale_breakdown_ignored() {
        let (mut app, _, _) = test_app().await;
        let first = app.begin_refresh().unwrap();
        app.apply_breakdown(first, Err("network down".to_string()), Instant::now());
        let _second = app.begin_refresh().unwrap();
        app.apply_breakdown(first, Ok(breakdown()), Instant::now());
        assert!(app.digest.is_loading());
    }

    #[tokio::test]
    async fn test_open_reader_without_url_reports_status() {
        let (mut app, _, _) = ready_app().await;
        app.selected = 2;
        app.open_reader();
        assert!(app.reader.is_none());
        assert_eq!(app.status.as_ref().unwrap().text, ERR_STORY_NO_URL);
    }

    #[tokio::test]
    async fn test_open_reader_uses_cached_content() {
        let (mut app, _, _) = ready_app().await;
        app.content_cache.insert(
            &cache_key("https://www.ft.lk/rupee"),
            ContentState::Ready(Arc::from("# Rupee")),
        );
        app.open_reader();
        let reader = app.reader.as_ref().unwrap();
        assert_eq!(reader.content, ContentState::Ready(Arc::from("# Rupee")));
        assert!(!app.poll_reader());
        app.exit_reader();
        assert!(app.reader.is_none());
    }

    #[tokio::test]
    async fn test_poll_reader_picks_up_finished_content() {
        let (mut app, _, _) = ready_app().await;
        let key = cache_key("https://www.ft.lk/rupee");
        app.content_cache.insert(&key, ContentState::Loading);
        app.open_reader();
        assert!(!app.poll_reader());

        app.content_cache.insert(&key, ContentState::Failed("timeout".into()));
        assert!(app.poll_reader());
        assert_eq!(
            app.reader.as_ref().unwrap().content,
            ContentState::Failed("timeout".into())
        );
    }

    /// Mirrors the live hint set into a list the test keeps a handle to.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<std::sync::Mutex<Vec<String>>>);

    impl PrefetchSink for SharedSink {
        fn install(&mut self, url: &url::Url) {
            self.0.lock().unwrap().push(url.to_string());
        }

        fn remove(&mut self, url: &str) {
            self.0.lock().unwrap().retain(|u| u != url);
        }
    }

    #[tokio::test]
    async fn test_prefetch_follows_each_digest() {
        let (app, _, _) = test_app().await;
        let sink = SharedSink::default();
        let mut app = app.with_prefetch_sink(Box::new(sink.clone()));

        let mut result = breakdown();
        let data = result.data.as_mut().unwrap();
        data.themes[1].stories.extend([
            story("Rupee follow-up", Some("https://www.ft.lk/rupee")),
            story("Local mirror", Some("http://localhost/tea")),
        ]);

        let generation = app.begin_refresh().unwrap();
        app.apply_breakdown(generation, Ok(result), Instant::now());
        let expected = vec![
            "https://www.ft.lk/rupee".to_string(),
            "https://economynext.com/tea".to_string(),
        ];
        assert_eq!(app.prefetched(), expected.as_slice());
        assert_eq!(*sink.0.lock().unwrap(), expected);

        let generation = app.begin_refresh().unwrap();
        app.apply_breakdown(generation, Err("offline".to_string()), Instant::now());
        assert!(app.prefetched().is_empty());
        assert!(sink.0.lock().unwrap().is_empty());

        let generation = app.begin_refresh().unwrap();
        app.apply_breakdown(generation, Ok(breakdown()), Instant::now());
        assert_eq!(app.prefetched().len(), 2);

        let empty = Breakdown {
            data: Some(NewsData {
                overview: vec!["Quiet day".to_string()],
                themes: Vec::new(),
            }),
            sources: Vec::new(),
        };
        let generation = app.begin_refresh().unwrap();
        app.apply_breakdown(generation, Ok(empty), Instant::now());
        assert!(app.prefetched().is_empty());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_expires_after_ttl() {
        let (mut app, _, _) = test_app().await;
        app.set_status("Hello");
        assert!(!app.clear_expired_status(Instant::now()));
        tokio::time::advance(STATUS_TTL).await;
        assert!(app.clear_expired_status(Instant::now()));
        assert!(app.status.is_none());
    }
}
