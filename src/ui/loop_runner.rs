//! Main event loop for the TUI.
//!
//! Multiplexes terminal input, background task events, the periodic tick
//! and the next theme reveal deadline.

use crate::app::{App, AppEvent};
use crate::content::ContentState;
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use anyhow::Result;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::{spawn_refresh, SPINNER};
use super::input::handle_input;
use super::render::render;

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Starts the first digest fetch immediately, then uses `tokio::select!`
/// over:
/// - **Signals**: SIGTERM/SIGINT end the loop
/// - **Terminal input**: key presses from crossterm's async event stream
/// - **Background tasks**: fetch results via the `AppEvent` channel
/// - **Reveal deadline**: wakes exactly when the next theme is due
/// - **Periodic tick**: 250ms timer for spinner, status expiry and reader polling
///
/// A panic hook restores the terminal before unwinding.
pub async fn run<S, B>(
    app: &mut App<S, B>,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()>
where
    S: KeyValueStore,
    B: BreakdownSource + Send + Sync + 'static,
{
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    if let Some(generation) = app.begin_refresh() {
        spawn_refresh(app.source(), generation, &event_tx);
    }

    loop {
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        // Drain pending results before waiting on input again
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        let reveal_at = app.digest.next_reveal_at();

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers, &event_tx).await {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_error(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => app.needs_redraw = true,
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event);
            }

            _ = tokio::time::sleep_until(reveal_at.unwrap_or_else(Instant::now)), if reveal_at.is_some() => {
                let revealed = app.digest.reveal_due(Instant::now());
                if revealed > 0 {
                    tracing::trace!(revealed, pending = app.digest.pending_themes(), "Revealed themes");
                    app.needs_redraw = true;
                }
            }

            _ = tick_interval.tick() => {
                handle_tick(app, Instant::now());
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Periodic housekeeping: spinner frames, status expiry, reader content
/// arriving in the cache and any reveal the deadline branch missed.
pub(super) fn handle_tick<S: KeyValueStore, B: BreakdownSource>(app: &mut App<S, B>, now: Instant) {
    let reader_loading = app
        .reader
        .as_ref()
        .is_some_and(|r| r.content == ContentState::Loading);
    if app.digest.is_loading() || reader_loading {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER.len();
        app.needs_redraw = true;
    }

    if app.clear_expired_status(now) {
        app.needs_redraw = true;
    }

    if app.poll_reader() {
        app.needs_redraw = true;
    }

    if app.digest.reveal_due(now) > 0 {
        app.needs_redraw = true;
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
