//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! `ThemeVariant` selects between the Dark and Light palettes and is the
//! value persisted under the `theme` key.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Stored form: `"dark"` or `"light"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Guess the terminal's scheme from a `COLORFGBG` value such as `"15;0"`.
    ///
    /// The last field is the background colour index; 7 and 15 (white) and
    /// 9-14 (bright colours) read as light. Anything unparsable is `None`.
    pub fn from_colorfgbg(value: &str) -> Option<Self> {
        let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
        match bg {
            7 | 9..=15 => Some(Self::Light),
            _ => Some(Self::Dark),
        }
    }

    /// The environment's colour-scheme preference; dark when unknown.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| Self::from_colorfgbg(&v))
            .unwrap_or_default()
    }
}

// ============================================================================
// Color Palette - semantic roles to Style
// ============================================================================

/// Number of accent colours theme headings cycle through.
pub const ACCENT_COUNT: usize = 4;

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    pub background: Style,

    // -- Header --
    pub app_title: Style,
    pub app_subtitle: Style,

    // -- Digest --
    pub section_heading: Style,
    pub overview_bullet: Style,
    pub overview_text: Style,
    pub theme_accents: [Style; ACCENT_COUNT],
    pub story_title: Style,
    pub story_summary: Style,
    pub story_context: Style,
    pub story_context_label: Style,
    pub story_source: Style,
    pub story_selected: Style,
    pub saved_marker: Style,
    pub source_title: Style,
    pub source_uri: Style,
    pub skeleton: Style,
    pub error: Style,
    pub empty: Style,

    // -- Reader --
    pub reader_heading: Style,
    pub reader_body: Style,
    pub reader_metadata: Style,
    pub reader_code: Style,
    pub reader_emphasis: Style,
    pub reader_strong: Style,
    pub reader_link: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_success: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub help_key: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            background: Style::default().fg(Color::Gray).bg(Color::Black),

            app_title: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            app_subtitle: Style::default().fg(Color::DarkGray),

            section_heading: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            overview_bullet: Style::default().fg(Color::LightGreen),
            overview_text: Style::default().fg(Color::Gray),
            theme_accents: [
                Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::LightYellow).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            ],
            story_title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            story_summary: Style::default().fg(Color::Gray),
            story_context: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            story_context_label: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            story_source: Style::default().fg(Color::LightGreen),
            story_selected: Style::default().bg(Color::DarkGray),
            saved_marker: Style::default().fg(Color::LightGreen),
            source_title: Style::default().fg(Color::White),
            source_uri: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::UNDERLINED),
            skeleton: Style::default().fg(Color::DarkGray),
            error: Style::default().fg(Color::LightRed),
            empty: Style::default().fg(Color::DarkGray),

            reader_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            reader_body: Style::default(),
            reader_metadata: Style::default().fg(Color::DarkGray),
            reader_code: Style::default().fg(Color::Yellow),
            reader_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            reader_strong: Style::default().add_modifier(Modifier::BOLD),
            reader_link: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_success: Style::default().bg(Color::DarkGray).fg(Color::LightGreen),
            status_error: Style::default().bg(Color::DarkGray).fg(Color::LightRed),
            panel_border: Style::default().fg(Color::DarkGray),
            help_key: Style::default().fg(Color::LightGreen),
        }
    }

    fn light() -> Self {
        Self {
            background: Style::default().fg(Color::Black).bg(Color::White),

            app_title: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            app_subtitle: Style::default().fg(Color::DarkGray),

            section_heading: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            overview_bullet: Style::default().fg(Color::Green),
            overview_text: Style::default().fg(Color::Black),
            theme_accents: [
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Rgb(180, 120, 0)).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ],
            story_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            story_summary: Style::default().fg(Color::Black),
            story_context: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            story_context_label: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            story_source: Style::default().fg(Color::Green),
            story_selected: Style::default().bg(Color::Gray),
            saved_marker: Style::default().fg(Color::Green),
            source_title: Style::default().fg(Color::Black),
            source_uri: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            skeleton: Style::default().fg(Color::Gray),
            error: Style::default().fg(Color::Red),
            empty: Style::default().fg(Color::DarkGray),

            reader_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            reader_body: Style::default().fg(Color::Black),
            reader_metadata: Style::default().fg(Color::DarkGray),
            reader_code: Style::default().fg(Color::DarkGray),
            reader_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            reader_strong: Style::default().add_modifier(Modifier::BOLD),
            reader_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            status_bar: Style::default().bg(Color::Gray).fg(Color::Black),
            status_success: Style::default().bg(Color::Gray).fg(Color::Green),
            status_error: Style::default().bg(Color::Gray).fg(Color::Red),
            panel_border: Style::default().fg(Color::Gray),
            help_key: Style::default().fg(Color::Green),
        }
    }

    /// Heading style for the theme at `index`, cycling through the accents.
    pub fn theme_accent(&self, index: usize) -> Style {
        self.theme_accents[index % ACCENT_COUNT]
    }
}

// ============================================================================
// Tests
// ============================================================================
