//! Sharing a story as plain text through the terminal clipboard.

use crossterm::clipboard::CopyToClipboard;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::news::NewsStory;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Failed to write to terminal: {0}")]
    Io(#[from] std::io::Error),
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// A place text can be copied to.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ShareError>;
}

/// Text copied for a story: title, summary and the source link if any.
pub fn share_text(story: &NewsStory) -> String {
    match story.url() {
        Some(url) => format!("{}\n\n{}\n\nSource: {}", story.title, story.summary, url),
        None => format!("{}\n\n{}", story.title, story.summary),
    }
}

// ============================================================================
// OSC 52
// ============================================================================

/// Copies via the OSC 52 escape sequence, which the terminal forwards to the
/// system clipboard (works over SSH too). Terminals that ignore OSC 52
/// silently drop it, so success only means the sequence was written.
#[derive(Debug, Default)]
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ShareError> {
        crossterm::execute!(
            std::io::stdout(),
            CopyToClipboard::to_clipboard_from(text)
        )?;
        Ok(())
    }
}

// ============================================================================
// In-Memory
// ============================================================================

/// Records copies in memory. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    inner: Arc<Mutex<MemoryClipboardInner>>,
}

#[derive(Debug, Default)]
struct MemoryClipboardInner {
    copies: Vec<String>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent copies fail.
    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail = fail;
        }
    }

    pub fn last(&self) -> Option<String> {
        self.inner.lock().ok()?.copies.last().cloned()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().map(|i| i.copies.len()).unwrap_or(0)
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ShareError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ShareError::Unavailable("clipboard lock poisoned".to_string()))?;
        if inner.fail {
            return Err(ShareError::Unavailable("copy rejected".to_string()));
        }
        inner.copies.push(text.to_string());
        Ok(())
    }
}
