//! Extraction of the breakdown payload from free-form model output.
//!
//! The model is instructed to answer with a single JSON object inside a
//! ```` ```json ```` fenced block. Anything around the block is ignored.
//! Every failure is logged and collapses to `None`; callers never see a
//! parse error.

use serde_json::Value;

use super::NewsData;

const FENCE: &str = "```";
const JSON_TAG: &str = "json";

/// A fenced block found in model output.
struct FencedBlock<'a> {
    /// Info string after the opening fence (e.g. `json`), possibly empty.
    tag: &'a str,
    /// Block content with surrounding whitespace trimmed.
    body: &'a str,
}

/// Parse model output into a `NewsData`.
///
/// Returns `None` when:
/// - no fenced block is present
/// - the block is not valid JSON
/// - the decoded object lacks a list-typed `overview` or `themes`
/// - the lists do not decode into stories and themes
///
/// A block tagged `json` wins over an untagged block; blocks tagged with
/// another language are skipped.
pub fn parse_breakdown(text: &str) -> Option<NewsData> {
    let Some(body) = find_json_block(text) else {
        tracing::error!(
            response_len = text.len(),
            "No valid JSON block found in model response"
        );
        return None;
    };

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse JSON from model response");
            return None;
        }
    };

    let has_overview = value.get("overview").is_some_and(Value::is_array);
    let has_themes = value.get("themes").is_some_and(Value::is_array);
    if !has_overview || !has_themes {
        tracing::error!(
            has_overview,
            has_themes,
            "Model response JSON is missing overview or themes"
        );
        return None;
    }

    match serde_json::from_value::<NewsData>(value) {
        Ok(data) => {
            tracing::debug!(
                overview = data.overview.len(),
                themes = data.themes.len(),
                "Parsed news breakdown"
            );
            Some(data)
        }
        Err(e) => {
            tracing::error!(error = %e, "Model response JSON has unexpected item shapes");
            None
        }
    }
}

/// Locate the payload of the first `json`-tagged block, falling back to the
/// first untagged block.
fn find_json_block(text: &str) -> Option<&str> {
    let mut untagged = None;
    for block in fenced_blocks(text) {
        if block.body.is_empty() {
            continue;
        }
        if block.tag.eq_ignore_ascii_case(JSON_TAG) {
            return Some(block.body);
        }
        if block.tag.is_empty() && untagged.is_none() {
            untagged = Some(block.body);
        }
    }
    untagged
}

/// Iterate over fenced blocks in order. An opening fence without a closing
/// fence ends the scan.
fn fenced_blocks(text: &str) -> impl Iterator<Item = FencedBlock<'_>> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let open = rest.find(FENCE)?;
        let after_open = &rest[open + FENCE.len()..];

        let (tag, content) = match after_open.get(..JSON_TAG.len()) {
            // The body may follow the tag on the same line: ```json{...}```
            Some(tag) if tag.eq_ignore_ascii_case(JSON_TAG) => {
                (tag, &after_open[JSON_TAG.len()..])
            }
            _ => {
                // Info string runs until the first whitespace character
                let tag_len = after_open
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(after_open.len());
                let (tag, after_tag) = after_open.split_at(tag_len);

                // A tag containing backticks means the "fence" was an empty
                // `````` run or similar; treat the tag as part of the body.
                if tag.contains('`') {
                    ("", after_open)
                } else {
                    (tag, after_tag)
                }
            }
        };

        let close = content.find(FENCE)?;
        let body = content[..close].trim();
        rest = &content[close + FENCE.len()..];
        Some(FencedBlock { tag, body })
    })
}
