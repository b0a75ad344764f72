//! News breakdown model, response parsing and the Gemini fetcher.
//!
//! - `parser` - extracts the fenced JSON payload from model output
//! - `prompt` - the instruction sent with every request
//! - `gemini` - HTTP client for the `generateContent` endpoint

mod gemini;
mod parser;
mod prompt;

pub use gemini::{BreakdownSource, FetchError, GeminiClient, GeminiError, DEFAULT_GEMINI_BASE_URL};
pub use parser::parse_breakdown;
pub use prompt::{build_prompt, PromptOptions, DEFAULT_PREFERRED_SOURCES};

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Breakdown Payload
// ============================================================================

/// A single story inside a theme.
///
/// `url` is the story's identity for saving. An empty string from the model
/// is treated the same as a missing URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsStory {
    pub title: String,
    pub summary: String,
    /// Follow-up history for the story; empty when there is none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewsStory {
    /// The story's URL, if it has a non-empty one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn has_context(&self) -> bool {
        !self.context.trim().is_empty()
    }
}

/// Decode a string field where the model may send `null` instead of `""`.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A titled group of related stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsTheme {
    #[serde(rename = "themeTitle")]
    pub theme_title: String,
    #[serde(default)]
    pub stories: Vec<NewsStory>,
}

/// The decoded payload: overview bullets plus themed stories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsData {
    pub overview: Vec<String>,
    pub themes: Vec<NewsTheme>,
}

impl NewsData {
    /// Every story URL across all themes, in display order (duplicates kept).
    pub fn story_urls(&self) -> Vec<&str> {
        self.themes
            .iter()
            .flat_map(|theme| theme.stories.iter())
            .filter_map(NewsStory::url)
            .collect()
    }

    pub fn story_count(&self) -> usize {
        self.themes.iter().map(|t| t.stories.len()).sum()
    }
}

// ============================================================================
// Grounding Citations
// ============================================================================

/// A web source the model cited while generating the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Result of one fetch: the parsed payload (absent when the model output
/// was unusable) and the grounding citations that came with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown {
    pub data: Option<NewsData>,
    pub sources: Vec<GroundingSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str, url: Option<&str>) -> NewsStory {
        NewsStory {
            title: title.to_string(),
            summary: "summary".to_string(),
            context: String::new(),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_url_treated_as_missing() {
        assert_eq!(story("a", Some("")).url(), None);
        assert_eq!(story("a", None).url(), None);
        assert_eq!(
            story("a", Some("https://example.com")).url(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_story_urls_flattens_themes_in_order() {
        let data = NewsData {
            overview: vec![],
            themes: vec![
                NewsTheme {
                    theme_title: "Economy".to_string(),
                    stories: vec![
                        story("a", Some("https://a.example")),
                        story("b", None),
                    ],
                },
                NewsTheme {
                    theme_title: "Politics".to_string(),
                    stories: vec![story("c", Some("https://a.example"))],
                },
            ],
        };
        assert_eq!(
            data.story_urls(),
            vec!["https://a.example", "https://a.example"]
        );
        assert_eq!(data.story_count(), 3);
    }

    #[test]
    fn test_story_deserializes_without_context_or_url() {
        let s: NewsStory = serde_json::from_str(r#"{"title":"t","summary":"s"}"#).unwrap();
        assert_eq!(s.context, "");
        assert!(s.url.is_none());
        assert!(!s.has_context());
    }

    #[test]
    fn test_theme_uses_camel_case_title_key() {
        let t: NewsTheme =
            serde_json::from_str(r#"{"themeTitle":"Economy","stories":[]}"#).unwrap();
        assert_eq!(t.theme_title, "Economy");
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"themeTitle\""));
    }
}
