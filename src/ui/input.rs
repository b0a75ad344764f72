//! Input handling for the TUI.
//!
//! Keys resolve to actions through the keybinding registry, in the reader
//! context while the reader is open and the global context otherwise.

use crate::app::{App, AppEvent, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::spawn_refresh;
use super::Action;

/// Lines moved by page up/down when the viewport size is not yet known.
const DEFAULT_PAGE: usize = 20;

/// Main input dispatch function.
pub(super) async fn handle_input<S, B>(
    app: &mut App<S, B>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    S: KeyValueStore,
    B: BreakdownSource + Send + Sync + 'static,
{
    if app.show_help {
        return Ok(handle_help_input(app, code, modifiers));
    }

    if app.reader.is_some() {
        return Ok(handle_reader_input(app, code, modifiers).await);
    }

    let action = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global);

    match action {
        Some(KbAction::Quit) => return Ok(Action::Quit),
        Some(KbAction::Refresh) => start_refresh(app, event_tx),
        Some(KbAction::NavDown) => app.nav_down(),
        Some(KbAction::NavUp) => app.nav_up(),
        Some(KbAction::ToggleSavedView) => app.toggle_saved_view(),
        Some(KbAction::ToggleTheme) => app.toggle_theme().await,
        Some(KbAction::ToggleSave) => app.toggle_save_selected().await,
        Some(KbAction::Share) => app.share_selected(),
        Some(KbAction::OpenInBrowser) => app.open_selected(),
        Some(KbAction::Read) => app.open_reader(),
        Some(KbAction::Back) => {
            if app.view == View::Saved {
                app.toggle_saved_view();
            }
        }
        Some(KbAction::ShowHelp) => app.show_help = true,
        _ => {}
    }
    Ok(Action::Continue)
}

/// Refresh is unavailable in the saved view and while a fetch is running.
fn start_refresh<S, B>(app: &mut App<S, B>, event_tx: &mpsc::Sender<AppEvent>)
where
    S: KeyValueStore,
    B: BreakdownSource + Send + Sync + 'static,
{
    if app.view == View::Saved {
        app.set_status("Switch back to the digest to refresh");
        return;
    }
    match app.begin_refresh() {
        Some(generation) => spawn_refresh(app.source(), generation, event_tx),
        None => tracing::debug!("Refresh already in progress"),
    }
}

/// Handle input while the help overlay is visible. Captures all keys.
fn handle_help_input<S: KeyValueStore, B: BreakdownSource>(
    app: &mut App<S, B>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global)
    {
        Some(KbAction::Back | KbAction::ShowHelp | KbAction::Quit) => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::NavDown) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        Some(KbAction::NavUp) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while the reader is open.
async fn handle_reader_input<S: KeyValueStore, B: BreakdownSource>(
    app: &mut App<S, B>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Action {
    let page = match app.reader_visible_lines {
        0 => DEFAULT_PAGE,
        n => n.saturating_sub(1).max(1),
    };

    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Reader)
    {
        Some(KbAction::Quit) => return Action::Quit,
        Some(KbAction::Back) => app.exit_reader(),
        Some(KbAction::ScrollDown) => app.scroll_down(1),
        Some(KbAction::ScrollUp) => app.scroll_up(1),
        Some(KbAction::PageDown) => app.scroll_down(page),
        Some(KbAction::PageUp) => app.scroll_up(page),
        Some(KbAction::ToggleTheme) => app.toggle_theme().await,
        Some(KbAction::ToggleSave) => app.toggle_save_selected().await,
        Some(KbAction::Share) => app.share_selected(),
        Some(KbAction::OpenInBrowser) => app.open_selected(),
        Some(KbAction::ShowHelp) => app.show_help = true,
        _ => {}
    }
    Action::Continue
}
