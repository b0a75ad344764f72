//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and view dispatch
//! - `helpers` - Panic-safe task spawning and layout utilities
//! - `stories` - Digest and saved-stories views
//! - `reader` - Story reader with markdown rendering
//! - `help` - Keybinding overlay
//! - `status` - Status bar widget
//! - `plain` - Plain-text output for non-interactive use

mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod plain;
pub mod reader;
mod render;
mod status;
mod stories;

pub use loop_runner::{run, Action};
pub use plain::render_plain;
