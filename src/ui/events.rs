//! Application event handling for background task results.

use crate::app::{App, AppEvent};
use crate::digest::Phase;
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use tokio::time::Instant;

/// Apply a background task result to the application state.
pub(super) fn handle_app_event<S: KeyValueStore, B: BreakdownSource>(
    app: &mut App<S, B>,
    event: AppEvent,
) {
    match event {
        AppEvent::BreakdownReady { generation, result } => {
            app.apply_breakdown(generation, result, Instant::now());
            if let Phase::Ready = app.digest.phase() {
                let prefetched = app.prefetched().len();
                if prefetched > 0 {
                    tracing::debug!(prefetched, "Prefetching story content");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ReaderClient;
    use crate::digest::DigestController;
    use crate::news::{Breakdown, NewsData, NewsStory, NewsTheme};
    use crate::storage::MemoryStore;
    use crate::theme::ThemeVariant;
    use std::convert::Infallible;

    struct NeverSource;

    impl BreakdownSource for NeverSource {
        type Error = Infallible;

        async fn fetch_breakdown(&self) -> Result<Breakdown, Infallible> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_breakdown_event_schedules_reveal() {
        let digest = DigestController::load(MemoryStore::new(), ThemeVariant::Dark).await;
        let mut app = App::new(
            digest,
            NeverSource,
            ReaderClient::new(reqwest::Client::new(), None),
        );
        let generation = app.begin_refresh().unwrap();

        let theme = NewsTheme {
            theme_title: "Economy".to_string(),
            stories: vec![NewsStory {
                title: "Rupee firms".to_string(),
                summary: "Gains for a third day.".to_string(),
                context: String::new(),
                url: Some("https://www.ft.lk/rupee".to_string()),
            }],
        };
        let result = Ok(Breakdown {
            data: Some(NewsData {
                overview: vec!["One".to_string()],
                themes: vec![theme],
            }),
            sources: Vec::new(),
        });

        handle_app_event(&mut app, AppEvent::BreakdownReady { generation, result });
        assert_eq!(*app.digest.phase(), Phase::Ready);
        assert!(app.digest.themes().is_empty());
        assert_eq!(app.digest.pending_themes(), 1);
    }
}
