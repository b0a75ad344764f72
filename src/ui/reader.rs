use crate::app::App;
use crate::content::ContentState;
use crate::news::BreakdownSource;
use crate::storage::KeyValueStore;
use crate::theme::ColorPalette;
use crate::util::{display_width, source_label, strip_control_chars};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::helpers::SPINNER;

/// Render the story reader.
///
/// Content lines are cached on the reader state and rebuilt only when the
/// content or palette changes.
pub fn render<S: KeyValueStore, B: BreakdownSource>(f: &mut Frame, app: &mut App<S, B>, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    app.reader_visible_lines = area.height.saturating_sub(2) as usize;
    let viewport_width = area.width.saturating_sub(2) as usize;
    let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
    let palette = app.palette.clone();

    let Some(reader) = app.reader.as_mut() else {
        return;
    };

    if reader.lines.is_none() {
        let mut lines = header_lines(&reader.story, &palette);
        lines.extend(content_lines(&reader.content, &reader.story.summary, &palette));
        reader.lines = Some(lines);
    }
    let Some(lines) = reader.lines.as_mut() else {
        return;
    };

    if reader.content == ContentState::Loading {
        if let Some(last) = lines.last_mut() {
            *last = Line::from(Span::styled(
                format!("{spinner} Loading article..."),
                palette.reader_metadata,
            ));
        }
    }

    reader.wrapped_lines = lines
        .iter()
        .map(|line| wrapped_line_count(line, viewport_width))
        .sum();
    let max_scroll = reader
        .wrapped_lines
        .saturating_sub(app.reader_visible_lines.max(1));
    reader.scroll = reader.scroll.min(max_scroll);

    // ratatui scrolls by u16
    let scroll = reader.scroll.min(u16::MAX as usize) as u16;
    let paragraph = Paragraph::new(Text::from(lines.clone()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.panel_border)
                .title(" Story "),
        )
        .style(palette.background)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    f.render_widget(paragraph, area);
}

fn header_lines(story: &crate::news::NewsStory, palette: &ColorPalette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        strip_control_chars(&story.title).into_owned(),
        palette.reader_heading,
    ))];
    if let Some(url) = story.url() {
        lines.push(Line::from(Span::styled(
            format!("{} • {}", source_label(url), url),
            palette.reader_metadata,
        )));
    }
    lines.push(Line::default());
    lines
}

fn content_lines(content: &ContentState, summary: &str, palette: &ColorPalette) -> Vec<Line<'static>> {
    match content {
        ContentState::Loading => vec![Line::from("Loading article...")],
        ContentState::Ready(markdown) => render_markdown(&strip_control_chars(markdown), palette),
        ContentState::Failed(error) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("Failed to load content: {}", error),
                    palette.error,
                )),
                Line::default(),
                Line::from(Span::styled("Showing summary:", palette.reader_metadata)),
                Line::default(),
            ];
            lines.extend(
                strip_control_chars(summary)
                    .lines()
                    .map(|l| Line::from(Span::styled(l.to_string(), palette.reader_body))),
            );
            lines
        }
    }
}

/// Rows a line occupies when wrapped at `width` columns.
fn wrapped_line_count(line: &Line<'_>, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let line_width: usize = line.spans.iter().map(|s| display_width(&s.content)).sum();
    line_width.div_ceil(width).max(1)
}

/// Convert markdown to styled ratatui Lines.
pub fn render_markdown(md: &str, palette: &ColorPalette) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(md.lines().count());
    let mut current_spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut in_code_block = false;
    let mut in_heading = false;
    let mut in_emphasis = false;
    let mut in_strong = false;
    let mut in_link = false;

    let flush = |spans: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>| {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => in_heading = true,
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut current_spans, &mut lines);
                lines.push(Line::default());
                in_heading = false;
            }
            Event::End(TagEnd::Paragraph) => {
                flush(&mut current_spans, &mut lines);
                lines.push(Line::default());
            }
            Event::Start(Tag::Item) => {
                current_spans.push(Span::styled("• ", palette.reader_metadata));
            }
            Event::End(TagEnd::Item) => flush(&mut current_spans, &mut lines),
            Event::End(TagEnd::List(_)) => lines.push(Line::default()),
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                flush(&mut current_spans, &mut lines);
                in_code_block = false;
                lines.push(Line::default());
            }
            Event::Start(Tag::Emphasis) => in_emphasis = true,
            Event::End(TagEnd::Emphasis) => in_emphasis = false,
            Event::Start(Tag::Strong) => in_strong = true,
            Event::End(TagEnd::Strong) => in_strong = false,
            Event::Start(Tag::Link { .. }) => in_link = true,
            Event::End(TagEnd::Link) => in_link = false,
            Event::Start(Tag::Image { dest_url, .. }) => {
                current_spans.push(Span::styled(
                    format!("[Image: {}]", dest_url),
                    palette.reader_metadata,
                ));
            }
            Event::Text(text) if in_code_block => {
                for line in text.lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), palette.reader_code)));
                }
            }
            Event::Text(text) => {
                let style = if in_heading {
                    palette.reader_heading
                } else if in_link {
                    palette.reader_link
                } else if in_strong {
                    palette.reader_strong
                } else if in_emphasis {
                    palette.reader_emphasis
                } else {
                    palette.reader_body
                };
                current_spans.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                current_spans.push(Span::styled(format!("`{}`", code), palette.reader_code));
            }
            Event::SoftBreak => current_spans.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut current_spans, &mut lines),
            _ => {}
        }
    }

    flush(&mut current_spans, &mut lines);

    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    lines
}
