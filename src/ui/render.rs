//! Render dispatch: header, the active view, status bar and overlays.

use crate::app::{App, View};
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use super::{help, reader, status, stories};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 10;

const SUBTITLE: &str = "A 24-hour thematic news summary powered by Gemini";

/// Main render dispatch function.
pub(super) fn render<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &mut App<S, B>) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    f.render_widget(Block::default().style(app.palette.background), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    if app.reader.is_some() {
        reader::render(f, app, chunks[1]);
    } else {
        stories::render(f, app, chunks[1]);
    }
    status::render(f, app, chunks[2]);

    if app.show_help {
        help::render(f, app);
    }
}

/// Title, subtitle and a one-line summary of state.
fn render_header<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &App<S, B>, area: Rect) {
    let palette = &app.palette;

    let mut meta = vec![Span::styled(
        match app.view {
            View::Main => "Digest",
            View::Saved => "Saved Stories",
        },
        palette.section_heading,
    )];
    if let Some(updated) = app.digest.last_updated() {
        meta.push(Span::styled(
            format!(" · Updated {}", updated.format("%H:%M")),
            palette.app_subtitle,
        ));
    }
    meta.push(Span::styled(
        format!(" · {} saved · {} theme", app.digest.saved().len(), app.digest.theme().name()),
        palette.app_subtitle,
    ));

    let lines = vec![
        Line::from(Span::styled(
            format!("{}: News Digest", app.digest.region()),
            palette.app_title,
        )),
        Line::from(Span::styled(SUBTITLE, palette.app_subtitle)),
        Line::from(meta),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(palette.background),
        area,
    );
}
