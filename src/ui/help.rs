//! Help overlay: scrollable keybinding table grouped by context.
//!
//! Shows the live bindings, including any overrides from config.

use crate::app::App;
use crate::keybindings::Context;
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use super::helpers::centered_rect;

const CONTEXT_ORDER: [Context; 2] = [Context::Global, Context::Reader];

/// Render the help overlay on top of the current view.
pub fn render<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &App<S, B>) {
    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let bindings = app.keybindings.help_rows();
    let mut rows: Vec<Row> = Vec::new();

    for ctx in CONTEXT_ORDER {
        let group: Vec<_> = bindings.iter().filter(|(c, _, _)| *c == ctx).collect();
        if group.is_empty() {
            continue;
        }

        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {} --", ctx.label()),
                app.palette.section_heading,
            )),
            Line::from(""),
        ]));

        for (_, keys, description) in group {
            rows.push(Row::new(vec![
                Line::from(Span::styled(format!("  {}", keys), app.palette.help_key)),
                Line::from(description.to_string()),
            ]));
        }

        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let visible_height = overlay.height.saturating_sub(4) as usize; // borders, header, margin
    let max_scroll = rows.len().saturating_sub(visible_height);
    let scroll = app.help_scroll_offset.min(max_scroll);
    let visible_rows: Vec<Row> = rows.into_iter().skip(scroll).take(visible_height).collect();

    let title = if max_scroll > 0 {
        format!(" Help ({}/{}) ", scroll + 1, max_scroll + 1)
    } else {
        " Help (? to close) ".to_string()
    };

    let table = Table::new(visible_rows, [Constraint::Length(18), Constraint::Min(20)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border)
                .title(title),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        )
        .style(app.palette.background);

    f.render_widget(table, overlay);

    if scroll < max_scroll {
        let hint = Line::from(Span::styled(
            " j/k to scroll, ? or Esc to close ",
            app.palette.reader_metadata,
        ));
        let hint_area = Rect {
            x: overlay.x + 1,
            y: overlay.y + overlay.height.saturating_sub(1),
            width: overlay.width.saturating_sub(2),
            height: 1,
        };
        f.render_widget(Paragraph::new(hint), hint_area);
    }
}
