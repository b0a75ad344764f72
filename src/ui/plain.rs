//! Plain-text rendering of a digest for `--print`.

use crate::digest::{DigestController, Phase};
use crate::storage::KeyValueStore;
use crate::util::{source_label, strip_control_chars};
use std::fmt::Write;

/// Render the visible digest as plain text.
///
/// Failed digests render as `Error: {message}`; idle or loading ones render
/// as an empty string.
pub fn render_plain<S: KeyValueStore>(digest: &DigestController<S>) -> String {
    let mut out = String::new();

    match digest.phase() {
        Phase::Idle | Phase::Loading => return out,
        Phase::Failed(message) => {
            let _ = writeln!(out, "Error: {}", message);
            return out;
        }
        Phase::Ready => {}
    }

    let _ = writeln!(out, "{}: News Digest", digest.region());
    if let Some(updated) = digest.last_updated() {
        let _ = writeln!(out, "Updated {}", updated.format("%Y-%m-%d %H:%M"));
    }
    out.push('\n');

    if !digest.overview().is_empty() {
        out.push_str("Overview\n");
        for point in digest.overview() {
            let _ = writeln!(out, "  • {}", strip_control_chars(point));
        }
        out.push('\n');
    }

    for theme in digest.themes() {
        let _ = writeln!(out, "## {}", strip_control_chars(&theme.theme_title));
        out.push('\n');
        for story in &theme.stories {
            let _ = writeln!(out, "  {}", strip_control_chars(&story.title));
            let _ = writeln!(out, "  {}", strip_control_chars(&story.summary));
            if story.has_context() {
                let _ = writeln!(out, "  Context: {}", strip_control_chars(&story.context));
            }
            if let Some(url) = story.url() {
                let _ = writeln!(out, "  Source: {} <{}>", source_label(url), url);
            }
            out.push('\n');
        }
    }

    if !digest.sources().is_empty() {
        out.push_str("Sources\n");
        for source in digest.sources() {
            let _ = writeln!(
                out,
                "  {} <{}>",
                strip_control_chars(&source.title),
                source.uri
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{Breakdown, GroundingSource, NewsData, NewsStory, NewsTheme};
    use crate::storage::MemoryStore;
    use crate::theme::ThemeVariant;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_render_plain_ready_digest() {
        let mut digest = DigestController::load(MemoryStore::new(), ThemeVariant::Dark).await;
        let generation = digest.begin_refresh().unwrap();
        let breakdown = Breakdown {
            data: Some(NewsData {
                overview: vec!["Rupee steady".to_string()],
                themes: vec![NewsTheme {
                    theme_title: "Economy".to_string(),
                    stories: vec![NewsStory {
                        title: "Tea auction".to_string(),
                        summary: "Prices rose.".to_string(),
                        context: "Third weekly gain.".to_string(),
                        url: Some("https://www.ft.lk/tea".to_string()),
                    }],
                }],
            }),
            sources: vec![GroundingSource {
                uri: "https://www.ft.lk/tea".to_string(),
                title: "ft.lk".to_string(),
            }],
        };
        digest.finish_refresh::<String>(generation, Ok(breakdown), Instant::now());
        digest.reveal_all();

        let text = render_plain(&digest);
        assert!(text.starts_with("Sri Lanka: News Digest\n"));
        assert!(text.contains("Overview\n  • Rupee steady\n"));
        assert!(text.contains("## Economy\n"));
        assert!(text.contains("  Context: Third weekly gain.\n"));
        assert!(text.contains("  Source: ft.lk <https://www.ft.lk/tea>\n"));
        assert!(text.contains("Sources\n  ft.lk <https://www.ft.lk/tea>\n"));
    }

    #[tokio::test]
    async fn test_render_plain_error() {
        let mut digest = DigestController::load(MemoryStore::new(), ThemeVariant::Dark).await;
        let generation = digest.begin_refresh().unwrap();
        digest.finish_refresh(generation, Err("network down"), Instant::now());
        assert_eq!(render_plain(&digest), "Error: network down\n");
    }
}
