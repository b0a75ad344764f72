use crate::app::{App, StatusKind, View};
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};

const MAIN_HINTS: &str = "[r]efresh [j/k]move [Enter]read [s]ave [c]opy [o]pen [v]saved [t]heme [?]help [q]uit";
const SAVED_HINTS: &str = "[j/k]move [Enter]read [s]unsave [c]opy [o]pen [v/Esc]back [t]heme [?]help [q]uit";
const READER_HINTS: &str = "[b]ack [j/k]scroll [Ctrl+d/u]page [s]ave [c]opy [o]pen [q]uit";

/// Render the status bar: the transient message if any, else key hints.
pub fn render<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &App<S, B>, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, style) = match &app.status {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => app.palette.status_bar,
                StatusKind::Success => app.palette.status_success,
                StatusKind::Error => app.palette.status_error,
            };
            (&*status.text, style)
        }
        None => {
            let hints = if app.reader.is_some() {
                READER_HINTS
            } else {
                match app.view {
                    View::Main => MAIN_HINTS,
                    View::Saved => SAVED_HINTS,
                }
            };
            (hints, app.palette.status_bar)
        }
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
