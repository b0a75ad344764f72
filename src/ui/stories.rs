//! The digest and saved-stories views.
//!
//! Both are built as a flat list of pre-wrapped lines so the selected story's
//! line range is known exactly and can be kept on screen.

use crate::app::{App, View};
use crate::digest::Phase;
use crate::news::{BreakdownSource, NewsStory};
use crate::storage::KeyValueStore;
use crate::theme::ColorPalette;
use crate::util::{source_label, strip_control_chars, truncate_to_width, wrap_to_width};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::ops::Range;

use super::helpers::SPINNER;

/// Lines for one view plus the line range of the selected story.
pub(super) struct ViewLines {
    pub lines: Vec<Line<'static>>,
    pub selected: Option<Range<usize>>,
}

pub fn render<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &App<S, B>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let title = match app.view {
        View::Main => " Digest ",
        View::Saved => " Saved ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.panel_border)
        .title(title);
    let inner = block.inner(area);
    let width = inner.width.saturating_sub(1) as usize;

    let view = match app.view {
        View::Main => digest_lines(app, width),
        View::Saved => saved_lines(app, width),
    };

    let offset = scroll_offset(view.selected.as_ref(), inner.height as usize);
    let visible: Vec<Line<'static>> = view
        .lines
        .into_iter()
        .skip(offset)
        .take(inner.height as usize)
        .collect();

    f.render_widget(
        Paragraph::new(visible)
            .block(block)
            .style(app.palette.background),
        area,
    );
}

/// First line to draw so the selected range is on screen.
///
/// Ranges taller than the viewport show their start.
pub(super) fn scroll_offset(selected: Option<&Range<usize>>, height: usize) -> usize {
    let Some(range) = selected else {
        return 0;
    };
    if height == 0 || range.end <= height {
        return 0;
    }
    let bottom_aligned = range.end - height;
    bottom_aligned.min(range.start)
}

// ============================================================================
// Digest View
// ============================================================================

pub(super) fn digest_lines<S: KeyValueStore, B: BreakdownSource>(
    app: &App<S, B>,
    width: usize,
) -> ViewLines {
    let palette = &app.palette;
    let mut lines = Vec::new();
    let mut selected = None;

    match app.digest.phase() {
        Phase::Idle => {
            lines.push(Line::from(Span::styled(
                "Press r to fetch the latest digest.",
                palette.empty,
            )));
        }
        Phase::Loading => {
            lines.push(Line::from(Span::styled(
                format!("{} Fetching the latest news...", SPINNER[app.spinner_frame % SPINNER.len()]),
                palette.app_subtitle,
            )));
            lines.push(Line::default());
            skeleton_lines(palette, width, &mut lines);
        }
        Phase::Failed(message) => {
            let text = format!("Error: {}", message);
            for row in wrap_to_width(&text, width) {
                lines.push(Line::from(Span::styled(row, palette.error)));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Press r to try again.", palette.empty)));
        }
        Phase::Ready => {
            overview_lines(app.digest.overview(), palette, width, &mut lines);

            let mut index = 0;
            for (theme_index, theme) in app.digest.themes().iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!("▍{}", strip_control_chars(&theme.theme_title)),
                    palette.theme_accent(theme_index),
                )));
                lines.push(Line::default());
                for story in &theme.stories {
                    let start = lines.len();
                    let is_selected = index == app.selected;
                    story_lines(
                        story,
                        is_selected,
                        app.digest.is_saved(story),
                        palette,
                        width,
                        &mut lines,
                    );
                    if is_selected {
                        selected = Some(start..lines.len());
                    }
                    lines.push(Line::default());
                    index += 1;
                }
            }

            if app.digest.pending_themes() > 0 {
                lines.push(Line::from(Span::styled(
                    "░░░░░░░░░░░░░░░░",
                    palette.skeleton,
                )));
            } else {
                source_list_lines(app, width, &mut lines);
            }
        }
    }

    ViewLines { lines, selected }
}

fn overview_lines(
    overview: &[String],
    palette: &ColorPalette,
    width: usize,
    lines: &mut Vec<Line<'static>>,
) {
    if overview.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled("Overview", palette.section_heading)));
    lines.push(Line::default());
    for point in overview {
        let text = strip_control_chars(point);
        for (i, row) in wrap_to_width(&text, width.saturating_sub(2)).into_iter().enumerate() {
            let marker = if i == 0 { "• " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, palette.overview_bullet),
                Span::styled(row, palette.overview_text),
            ]));
        }
    }
    lines.push(Line::default());
}

fn source_list_lines<S: KeyValueStore, B: BreakdownSource>(
    app: &App<S, B>,
    width: usize,
    lines: &mut Vec<Line<'static>>,
) {
    let sources = app.digest.sources();
    if sources.is_empty() {
        return;
    }
    let palette = &app.palette;
    lines.push(Line::from(Span::styled("Sources", palette.section_heading)));
    lines.push(Line::default());
    for source in sources {
        let title = strip_control_chars(&source.title);
        for (i, row) in wrap_to_width(&title, width.saturating_sub(2)).into_iter().enumerate() {
            let marker = if i == 0 { "↗ " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, palette.overview_bullet),
                Span::styled(row, palette.source_title),
            ]));
        }
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                truncate_to_width(&source.uri, width.saturating_sub(2)).into_owned(),
                palette.source_uri,
            ),
        ]));
    }
}

/// Placeholder blocks shown while loading: an overview block and two theme
/// blocks of two stories each.
fn skeleton_lines(palette: &ColorPalette, width: usize, lines: &mut Vec<Line<'static>>) {
    let bar = |fraction: usize| -> Line<'static> {
        let len = (width * fraction / 100).max(1);
        Line::from(Span::styled("░".repeat(len), palette.skeleton))
    };

    lines.push(bar(25));
    for fraction in [90, 80, 85] {
        lines.push(bar(fraction));
    }
    lines.push(Line::default());

    for _ in 0..2 {
        lines.push(bar(40));
        lines.push(Line::default());
        for _ in 0..2 {
            lines.push(bar(60));
            lines.push(bar(95));
            lines.push(bar(70));
            lines.push(Line::default());
        }
    }
}

// ============================================================================
// Saved View
// ============================================================================

pub(super) fn saved_lines<S: KeyValueStore, B: BreakdownSource>(
    app: &App<S, B>,
    width: usize,
) -> ViewLines {
    let palette = &app.palette;
    let mut lines = vec![
        Line::from(Span::styled("Saved Stories", palette.section_heading)),
        Line::default(),
    ];
    let mut selected = None;

    let saved = app.digest.saved();
    if saved.is_empty() {
        lines.push(Line::from(Span::styled(
            "You haven't saved any stories yet.",
            palette.empty,
        )));
    }

    for (index, story) in saved.iter().enumerate() {
        let start = lines.len();
        let is_selected = index == app.selected;
        story_lines(story, is_selected, true, palette, width, &mut lines);
        if is_selected {
            selected = Some(start..lines.len());
        }
        lines.push(Line::default());
    }

    ViewLines { lines, selected }
}

// ============================================================================
// Story Item
// ============================================================================

/// Title, summary, optional context and source label for one story.
fn story_lines(
    story: &NewsStory,
    is_selected: bool,
    is_saved: bool,
    palette: &ColorPalette,
    width: usize,
    lines: &mut Vec<Line<'static>>,
) {
    let gutter = if is_selected { "▸ " } else { "  " };
    let gutter_style = if is_selected {
        palette.story_selected
    } else {
        Style::default()
    };
    let text_width = width.saturating_sub(4);
    let start = lines.len();

    let title = strip_control_chars(&story.title);
    for (i, row) in wrap_to_width(&title, text_width).into_iter().enumerate() {
        let mut spans = vec![Span::styled(gutter, gutter_style), Span::styled(row, palette.story_title)];
        if i == 0 && is_saved {
            spans.push(Span::styled(" ★", palette.saved_marker));
        }
        lines.push(Line::from(spans));
    }

    for row in wrap_to_width(&strip_control_chars(&story.summary), text_width) {
        lines.push(Line::from(vec![
            Span::styled(gutter_pad(is_selected), gutter_style),
            Span::styled(row, palette.story_summary),
        ]));
    }

    if story.has_context() {
        let context = strip_control_chars(&story.context);
        let rows = wrap_to_width(&format!("Context: {}", context), text_width);
        for (i, row) in rows.into_iter().enumerate() {
            let mut spans = vec![Span::styled(gutter_pad(is_selected), gutter_style)];
            match row.strip_prefix("Context:").filter(|_| i == 0) {
                Some(rest) => {
                    spans.push(Span::styled("Context:", palette.story_context_label));
                    spans.push(Span::styled(rest.to_string(), palette.story_context));
                }
                None => spans.push(Span::styled(row, palette.story_context)),
            }
            lines.push(Line::from(spans));
        }
    }

    if let Some(url) = story.url() {
        lines.push(Line::from(vec![
            Span::styled(gutter_pad(is_selected), gutter_style),
            Span::styled(format!("Source: {}", source_label(url)), palette.story_source),
        ]));
    }

    if is_selected {
        for line in &mut lines[start..] {
            line.style = palette.story_selected;
        }
    }
}

fn gutter_pad(is_selected: bool) -> &'static str {
    if is_selected {
        "│ "
    } else {
        "  "
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scroll_offset_keeps_selection_visible() {
        assert_eq!(scroll_offset(None, 10), 0);
        assert_eq!(scroll_offset(Some(&(2..5)), 10), 0);
        assert_eq!(scroll_offset(Some(&(12..15)), 10), 5);
        // Taller than the viewport: show its start
        assert_eq!(scroll_offset(Some(&(12..30)), 10), 12);
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_story_lines_show_context_and_source() {
        let story = NewsStory {
            title: "Budget passed".to_string(),
            summary: "Parliament approved the budget.".to_string(),
            context: "Follows a week of debate.".to_string(),
            url: Some("https://www.dailymirror.lk/budget".to_string()),
        };
        let palette = crate::theme::ThemeVariant::Dark.palette();
        let mut lines = Vec::new();
        story_lines(&story, false, true, &palette, 80, &mut lines);

        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(
            text,
            vec![
                "  Budget passed ★",
                "  Parliament approved the budget.",
                "  Context: Follows a week of debate.",
                "  Source: dailymirror.lk",
            ]
        );
    }

    #[test]
    fn test_story_lines_omit_empty_context_and_url() {
        let story = NewsStory {
            title: "Rain alert".to_string(),
            summary: "Heavy showers expected.".to_string(),
            context: String::new(),
            url: None,
        };
        let palette = crate::theme::ThemeVariant::Light.palette();
        let mut lines = Vec::new();
        story_lines(&story, true, false, &palette, 80, &mut lines);

        let text: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(text, vec!["▸ Rain alert", "│ Heavy showers expected."]);
    }

    #[test]
    fn test_skeleton_has_three_blocks() {
        let palette = crate::theme::ThemeVariant::Dark.palette();
        let mut lines = Vec::new();
        skeleton_lines(&palette, 40, &mut lines);
        // overview (4 + gap) + 2 themes x (heading + gap + 2 x (3 + gap))
        assert_eq!(lines.len(), 5 + 2 * (2 + 2 * 4));
    }
}
