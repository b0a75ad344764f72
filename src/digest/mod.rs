//! Digest state: fetch lifecycle, staggered theme reveal, saved stories and
//! the persisted theme preference.
//!
//! The controller is plain data plus async persistence; it never spawns or
//! sleeps. Callers pass the current instant in, and the event loop sleeps
//! until `next_reveal_at()`.

mod reveal;
mod saved;

pub use reveal::{RevealSchedule, DEFAULT_REVEAL_INTERVAL};
pub use saved::{SaveToggle, SavedStories};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::Instant;

use crate::news::{Breakdown, BreakdownSource, GroundingSource, NewsStory, NewsTheme};
use crate::storage::{KeyValueStore, SAVED_STORIES_KEY, THEME_KEY};
use crate::theme::ThemeVariant;

pub const DEFAULT_REGION: &str = "Sri Lanka";

pub const MALFORMED_MESSAGE: &str = "Could not retrieve a valid news breakdown. The AI might be busy or the response was not in the correct format.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Shown when the model returns a well-formed breakdown with no themes.
pub fn no_stories_message(region: &str) -> String {
    format!("No major non-sports news stories were found for {region} in the last 24 hours.")
}

/// Where the current digest stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

pub struct DigestController<S: KeyValueStore> {
    store: S,
    region: String,
    reveal_interval: Duration,

    phase: Phase,
    generation: u64,
    overview: Vec<String>,
    themes: Vec<NewsTheme>,
    reveal: RevealSchedule<NewsTheme>,
    sources: Vec<GroundingSource>,
    last_updated: Option<DateTime<Local>>,

    saved: SavedStories,
    theme: ThemeVariant,
}

impl<S: KeyValueStore> DigestController<S> {
    /// Read persisted saved stories and theme once.
    ///
    /// Missing or corrupt values fall back to empty / `default_theme`; read
    /// failures are logged and never prevent startup.
    pub async fn load(store: S, default_theme: ThemeVariant) -> Self {
        let saved = match store.get(SAVED_STORIES_KEY).await {
            Ok(Some(json)) => SavedStories::from_json(&json).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to parse saved stories, starting empty");
                SavedStories::default()
            }),
            Ok(None) => SavedStories::default(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read saved stories");
                SavedStories::default()
            }
        };

        let theme = match store.get(THEME_KEY).await {
            Ok(Some(value)) => ThemeVariant::from_str_name(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown stored theme, using default");
                default_theme
            }),
            Ok(None) => default_theme,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read theme preference");
                default_theme
            }
        };

        tracing::debug!(saved = saved.len(), theme = theme.as_str(), "Digest state loaded");

        Self {
            store,
            region: DEFAULT_REGION.to_string(),
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            phase: Phase::Idle,
            generation: 0,
            overview: Vec::new(),
            themes: Vec::new(),
            reveal: RevealSchedule::default(),
            sources: Vec::new(),
            last_updated: None,
            saved,
            theme,
        }
    }

    /// Region named in the no-stories message.
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.trim().to_string();
        self
    }

    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }

    // ========================================================================
    // Fetch Lifecycle
    // ========================================================================

    /// Clear the current digest and enter `Loading`.
    ///
    /// Returns the generation to tag the fetch result with, or `None` if a
    /// fetch is already in flight.
    pub fn begin_refresh(&mut self) -> Option<u64> {
        if self.phase == Phase::Loading {
            tracing::debug!("Refresh ignored, already loading");
            return None;
        }
        self.clear_digest();
        self.phase = Phase::Loading;
        self.generation += 1;
        Some(self.generation)
    }

    /// Apply a fetch result. Returns `false` when the result is stale.
    pub fn finish_refresh<E: Display>(
        &mut self,
        generation: u64,
        result: Result<Breakdown, E>,
        now: Instant,
    ) -> bool {
        if generation != self.generation || self.phase != Phase::Loading {
            tracing::debug!(
                generation,
                current = self.generation,
                "Dropping stale fetch result"
            );
            return false;
        }

        let breakdown = match result {
            Ok(b) => b,
            Err(e) => {
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    UNKNOWN_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                self.fail(message);
                return true;
            }
        };

        let Some(data) = breakdown.data else {
            self.fail(MALFORMED_MESSAGE.to_string());
            return true;
        };

        if data.themes.is_empty() {
            self.fail(no_stories_message(&self.region));
            return true;
        }

        tracing::info!(
            themes = data.themes.len(),
            stories = data.story_count(),
            sources = breakdown.sources.len(),
            "News breakdown ready"
        );

        self.overview = data.overview;
        self.sources = breakdown.sources;
        self.reveal = RevealSchedule::new(data.themes, now, self.reveal_interval);
        self.last_updated = Some(Local::now());
        self.phase = Phase::Ready;
        true
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "News breakdown failed");
        self.clear_digest();
        self.phase = Phase::Failed(message);
    }

    fn clear_digest(&mut self) {
        self.overview.clear();
        self.themes.clear();
        self.sources.clear();
        self.reveal.cancel();
    }

    /// Begin, await `source` and finish in one call. Returns `false` if a
    /// refresh was already in flight.
    pub async fn refresh_with<B: BreakdownSource>(&mut self, source: &B) -> bool {
        let Some(generation) = self.begin_refresh() else {
            return false;
        };
        let result = source.fetch_breakdown().await;
        self.finish_refresh(generation, result, Instant::now())
    }

    /// Move every theme whose reveal time has come into the visible list.
    /// Returns how many became visible.
    pub fn reveal_due(&mut self, now: Instant) -> usize {
        let due = self.reveal.take_due(now);
        let count = due.len();
        self.themes.extend(due);
        count
    }

    pub fn next_reveal_at(&self) -> Option<Instant> {
        self.reveal.next_deadline()
    }

    pub fn cancel_reveal(&mut self) {
        self.reveal.cancel();
    }

    /// Reveal everything still pending.
    pub fn reveal_all(&mut self) {
        let pending = self.reveal.take_all();
        self.themes.extend(pending);
    }

    // ========================================================================
    // Saved Stories
    // ========================================================================

    /// Save or unsave `story`, then persist the whole list.
    ///
    /// The in-memory list changes even if the write fails; the error is
    /// returned so the caller can report it.
    pub async fn toggle_save(&mut self, story: &NewsStory) -> Result<SaveToggle> {
        let outcome = self.saved.toggle(story);
        if outcome == SaveToggle::NoUrl {
            tracing::debug!(title = %story.title, "Story has no URL, not saving");
            return Ok(outcome);
        }
        let json = self
            .saved
            .to_json()
            .context("Failed to serialise saved stories")?;
        self.store
            .set(SAVED_STORIES_KEY, &json)
            .await
            .context("Failed to persist saved stories")?;
        tracing::debug!(outcome = ?outcome, saved = self.saved.len(), "Saved stories updated");
        Ok(outcome)
    }

    pub fn is_saved(&self, story: &NewsStory) -> bool {
        self.saved.contains(story)
    }

    pub fn saved(&self) -> &[NewsStory] {
        self.saved.as_slice()
    }

    // ========================================================================
    // Theme
    // ========================================================================

    /// Flip light/dark and persist the new value.
    ///
    /// As with `toggle_save`, the in-memory value flips even if the write
    /// fails.
    pub async fn toggle_theme(&mut self) -> Result<ThemeVariant> {
        self.theme = self.theme.toggled();
        self.store
            .set(THEME_KEY, self.theme.as_str())
            .await
            .context("Failed to persist theme")?;
        Ok(self.theme)
    }

    pub fn theme(&self) -> ThemeVariant {
        self.theme
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn overview(&self) -> &[String] {
        &self.overview
    }

    /// Themes revealed so far, in returned order.
    pub fn themes(&self) -> &[NewsTheme] {
        &self.themes
    }

    pub fn pending_themes(&self) -> usize {
        self.reveal.len()
    }

    pub fn sources(&self) -> &[GroundingSource] {
        &self.sources
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsData;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    fn theme(title: &str, urls: &[&str]) -> NewsTheme {
        NewsTheme {
            theme_title: title.to_string(),
            stories: urls
                .iter()
                .map(|u| NewsStory {
                    title: format!("{title} story"),
                    summary: "summary".to_string(),
                    context: String::new(),
                    url: Some(u.to_string()),
                })
                .collect(),
        }
    }

    fn breakdown(themes: Vec<NewsTheme>) -> Breakdown {
        Breakdown {
            data: Some(NewsData {
                overview: vec!["point one".to_string()],
                themes,
            }),
            sources: vec![GroundingSource {
                uri: "https://src.example".to_string(),
                title: "Src".to_string(),
            }],
        }
    }

    async fn controller() -> DigestController<MemoryStore> {
        DigestController::load(MemoryStore::new(), ThemeVariant::Dark).await
    }

    #[tokio::test]
    async fn test_begin_refused_while_loading() {
        let mut c = controller().await;
        assert_eq!(c.begin_refresh(), Some(1));
        assert_eq!(c.begin_refresh(), None);
        assert!(c.is_loading());
    }

    #[tokio::test]
    async fn test_ready_reveals_themes_in_order() {
        let mut c = controller().await;
        let start = Instant::now();
        let g = c.begin_refresh().unwrap();
        let result: Result<Breakdown, String> = Ok(breakdown(vec![
            theme("A", &["https://a/1"]),
            theme("B", &["https://b/1"]),
        ]));
        assert!(c.finish_refresh(g, result, start));

        assert_eq!(c.phase(), &Phase::Ready);
        assert_eq!(c.overview(), ["point one".to_string()]);
        assert_eq!(c.sources().len(), 1);
        assert!(c.themes().is_empty());
        assert_eq!(c.next_reveal_at(), Some(start + 250 * MS));

        assert_eq!(c.reveal_due(start + 249 * MS), 0);
        assert_eq!(c.reveal_due(start + 250 * MS), 1);
        assert_eq!(c.themes()[0].theme_title, "A");
        assert_eq!(c.reveal_due(start + 500 * MS), 1);
        assert_eq!(c.themes()[1].theme_title, "B");
        assert_eq!(c.next_reveal_at(), None);
    }

    #[tokio::test]
    async fn test_zero_themes_is_no_stories() {
        let mut c = controller().await.with_region("Nepal");
        let g = c.begin_refresh().unwrap();
        c.finish_refresh::<String>(g, Ok(breakdown(vec![])), Instant::now());
        assert_eq!(
            c.error(),
            Some("No major non-sports news stories were found for Nepal in the last 24 hours.")
        );
        assert!(c.overview().is_empty());
    }

    #[tokio::test]
    async fn test_absent_data_is_malformed() {
        let mut c = controller().await;
        let g = c.begin_refresh().unwrap();
        c.finish_refresh::<String>(g, Ok(Breakdown::default()), Instant::now());
        assert_eq!(c.error(), Some(MALFORMED_MESSAGE));
    }

    #[tokio::test]
    async fn test_error_message_passed_through() {
        let mut c = controller().await;
        let g = c.begin_refresh().unwrap();
        c.finish_refresh(g, Err("network down"), Instant::now());
        assert_eq!(c.error(), Some("network down"));
    }

    #[tokio::test]
    async fn test_empty_error_message_becomes_unknown() {
        let mut c = controller().await;
        let g = c.begin_refresh().unwrap();
        c.finish_refresh(g, Err(""), Instant::now());
        assert_eq!(c.error(), Some(UNKNOWN_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_stale_generation_dropped() {
        let mut c = controller().await;
        let old = c.begin_refresh().unwrap();
        c.finish_refresh(old, Err("first"), Instant::now());
        let current = c.begin_refresh().unwrap();

        let applied = c.finish_refresh::<String>(
            old,
            Ok(breakdown(vec![theme("Old", &[])])),
            Instant::now(),
        );
        assert!(!applied);
        assert!(c.is_loading());
        assert!(c.finish_refresh(current, Err("second"), Instant::now()));
    }

    #[tokio::test]
    async fn test_new_refresh_cancels_pending_reveal() {
        let mut c = controller().await;
        let start = Instant::now();
        let g = c.begin_refresh().unwrap();
        c.finish_refresh::<String>(
            g,
            Ok(breakdown(vec![theme("A", &[]), theme("B", &[])])),
            start,
        );
        c.reveal_due(start + 250 * MS);

        c.begin_refresh().unwrap();
        assert!(c.themes().is_empty());
        assert_eq!(c.pending_themes(), 0);
        assert_eq!(c.reveal_due(start + 10_000 * MS), 0);
    }

    #[tokio::test]
    async fn test_reveal_all_flushes_pending() {
        let mut c = controller().await;
        let g = c.begin_refresh().unwrap();
        c.finish_refresh::<String>(
            g,
            Ok(breakdown(vec![theme("A", &[]), theme("B", &[])])),
            Instant::now(),
        );
        c.reveal_all();
        assert_eq!(c.themes().len(), 2);
        assert_eq!(c.next_reveal_at(), None);
    }

    #[tokio::test]
    async fn test_toggle_save_persists_json() {
        let store = MemoryStore::new();
        let mut c = DigestController::load(store.clone(), ThemeVariant::Dark).await;
        let story = theme("A", &["https://a/1"]).stories.remove(0);

        assert_eq!(c.toggle_save(&story).await.unwrap(), SaveToggle::Saved);
        assert!(c.is_saved(&story));
        let json = store.snapshot(SAVED_STORIES_KEY).unwrap();
        let persisted: Vec<NewsStory> = serde_json::from_str(&json).unwrap();
        assert_eq!(persisted, vec![story.clone()]);

        assert_eq!(c.toggle_save(&story).await.unwrap(), SaveToggle::Removed);
        assert_eq!(store.snapshot(SAVED_STORIES_KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_saved_survive_refresh() {
        let mut c = controller().await;
        let story = theme("A", &["https://a/1"]).stories.remove(0);
        c.toggle_save(&story).await.unwrap();
        let g = c.begin_refresh().unwrap();
        c.finish_refresh(g, Err("down"), Instant::now());
        assert_eq!(c.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_save_write_failure_reported() {
        let store = MemoryStore::new();
        let mut c = DigestController::load(store.clone(), ThemeVariant::Dark).await;
        store.set_fail_writes(true);
        let story = theme("A", &["https://a/1"]).stories.remove(0);
        assert!(c.toggle_save(&story).await.is_err());
        assert!(c.is_saved(&story));
    }

    #[tokio::test]
    async fn test_story_without_url_not_persisted() {
        let store = MemoryStore::new();
        let mut c = DigestController::load(store.clone(), ThemeVariant::Dark).await;
        let mut story = theme("A", &["https://a/1"]).stories.remove(0);
        story.url = None;
        assert_eq!(c.toggle_save(&story).await.unwrap(), SaveToggle::NoUrl);
        assert_eq!(store.snapshot(SAVED_STORIES_KEY), None);
    }

    #[tokio::test]
    async fn test_load_corrupt_saved_stories_is_empty() {
        let store = MemoryStore::new();
        store.set(SAVED_STORIES_KEY, "{oops").await.unwrap();
        store.set(THEME_KEY, "sepia").await.unwrap();
        let c = DigestController::load(store, ThemeVariant::Light).await;
        assert!(c.saved().is_empty());
        assert_eq!(c.theme(), ThemeVariant::Light);
    }

    #[tokio::test]
    async fn test_toggle_theme_persists() {
        let store = MemoryStore::new();
        let mut c = DigestController::load(store.clone(), ThemeVariant::Light).await;
        assert_eq!(c.toggle_theme().await.unwrap(), ThemeVariant::Dark);
        assert_eq!(store.snapshot(THEME_KEY).as_deref(), Some("dark"));

        let reloaded = DigestController::load(store, ThemeVariant::Light).await;
        assert_eq!(reloaded.theme(), ThemeVariant::Dark);
    }
}
