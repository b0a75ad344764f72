//! newsdigest: a terminal digest of the past 24 hours of regional news,
//! grouped into themes by Gemini.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so integration tests can drive them directly.

pub mod app;
pub mod config;
pub mod content;
pub mod digest;
pub mod keybindings;
pub mod news;
pub mod prefetch;
pub mod share;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
