//! Helper functions shared across the UI layer: panic-safe background
//! tasks, the refresh spawner and small layout utilities.

use crate::app::AppEvent;
use crate::news::BreakdownSource;
use futures::FutureExt;
use ratatui::layout::Rect;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Frames of the loading spinner, advanced on each tick.
pub(super) const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Wraps a future to catch panics and convert them to errors.
///
/// Panics in spawned tasks would otherwise vanish inside the runtime; here
/// they become `Err(message)` the caller can report.
///
/// ```ignore
/// tokio::spawn(async move {
///     match catch_task_panic(async { do_work().await }).await {
///         Ok(result) => handle_result(result),
///         Err(panic_msg) => tracing::error!(error = %panic_msg, "Task panicked"),
///     }
/// });
/// ```
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Run one breakdown fetch in the background and report it as
/// `AppEvent::BreakdownReady` tagged with `generation`.
///
/// A panic is reported as an empty error message, which the digest turns
/// into its generic unknown-error text.
pub(super) fn spawn_refresh<B>(source: Arc<B>, generation: u64, event_tx: &mpsc::Sender<AppEvent>)
where
    B: BreakdownSource + Send + Sync + 'static,
{
    let tx = event_tx.clone();
    tracing::info!(generation, "Fetching news breakdown");

    tokio::spawn(async move {
        let result = match catch_task_panic(source.fetch_breakdown()).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(panic_msg) => {
                tracing::error!(task = "refresh", error = %panic_msg, "Background task panicked");
                Err(String::new())
            }
        };

        if let Err(e) = tx.send(AppEvent::BreakdownReady { generation, result }).await {
            tracing::warn!(error = %e, event = "BreakdownReady", "Channel send failed (receiver dropped)");
        }
    });
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_through() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_extracts_message() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));

        let result: Result<(), String> =
            catch_task_panic(async { panic!("{} failed", "fetch") }).await;
        assert_eq!(result, Err("fetch failed".to_string()));
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(80, 50, area);
        assert_eq!(inner, Rect::new(10, 10, 80, 20));
    }
}
