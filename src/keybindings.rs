//! Keybinding registry: maps key events to actions, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Refresh,
    NavDown,
    NavUp,
    ToggleSavedView,
    ToggleTheme,
    ToggleSave,
    Share,
    OpenInBrowser,
    Read,
    Back,
    ShowHelp,
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::Refresh => "Fetch a fresh digest",
            Self::NavDown => "Next story",
            Self::NavUp => "Previous story",
            Self::ToggleSavedView => "Toggle saved stories view",
            Self::ToggleTheme => "Toggle light/dark theme",
            Self::ToggleSave => "Save / unsave story",
            Self::Share => "Copy story to clipboard",
            Self::OpenInBrowser => "Open source in browser",
            Self::Read => "Read story in terminal",
            Self::Back => "Go back / dismiss",
            Self::ShowHelp => "Show help",
            Self::ScrollDown => "Scroll down one line",
            Self::ScrollUp => "Scroll up one line",
            Self::PageDown => "Page down",
            Self::PageUp => "Page up",
        }
    }

    /// Parse an action name from config (`snake_case`, plus a few aliases).
    fn from_config_name(name: &str) -> Option<Self> {
        let action = match name.trim().to_lowercase().as_str() {
            "quit" => Self::Quit,
            "refresh" => Self::Refresh,
            "nav_down" | "down" => Self::NavDown,
            "nav_up" | "up" => Self::NavUp,
            "toggle_saved_view" | "saved" => Self::ToggleSavedView,
            "toggle_theme" | "theme" => Self::ToggleTheme,
            "toggle_save" | "save" => Self::ToggleSave,
            "share" | "copy" => Self::Share,
            "open_in_browser" | "open" => Self::OpenInBrowser,
            "read" => Self::Read,
            "back" => Self::Back,
            "show_help" | "help" => Self::ShowHelp,
            "scroll_down" => Self::ScrollDown,
            "scroll_up" => Self::ScrollUp,
            "page_down" => Self::PageDown,
            "page_up" => Self::PageUp,
            _ => return None,
        };
        Some(action)
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. `Reader` falls back to `Global` for unbound keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Reader,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Digest",
            Self::Reader => "Reader",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Parse a config key string: `"q"`, `"Enter"`, `"Ctrl+d"`, `"F5"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
            let mut chars = rest.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Self::ctrl(c)),
                _ => None,
            };
        }

        let named = match s.to_lowercase().as_str() {
            "enter" | "return" => Some(KeyCode::Enter),
            "esc" | "escape" => Some(KeyCode::Esc),
            "tab" => Some(KeyCode::Tab),
            "up" => Some(KeyCode::Up),
            "down" => Some(KeyCode::Down),
            "left" => Some(KeyCode::Left),
            "right" => Some(KeyCode::Right),
            "pageup" => Some(KeyCode::PageUp),
            "pagedown" => Some(KeyCode::PageDown),
            "backspace" => Some(KeyCode::Backspace),
            "space" => Some(KeyCode::Char(' ')),
            _ => None,
        };
        if let Some(code) = named {
            return Some(Self::plain(code));
        }

        if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12).contains(&n).then(|| Self::plain(KeyCode::F(n)));
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self::char(c)),
            _ => None,
        }
    }

    /// Display form for the help screen.
    pub fn display(&self) -> String {
        let prefix = if self.modifiers.contains(KeyModifiers::CONTROL) {
            "Ctrl+"
        } else {
            ""
        };
        let name = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            _ => "?".to_string(),
        };
        format!("{prefix}{name}")
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, KeySpec::char('q'), Action::Quit),
    (Context::Global, KeySpec::char('r'), Action::Refresh),
    (Context::Global, KeySpec::char('j'), Action::NavDown),
    (Context::Global, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Global, KeySpec::char('k'), Action::NavUp),
    (Context::Global, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Global, KeySpec::char('v'), Action::ToggleSavedView),
    (Context::Global, KeySpec::char('t'), Action::ToggleTheme),
    (Context::Global, KeySpec::char('s'), Action::ToggleSave),
    (Context::Global, KeySpec::char('c'), Action::Share),
    (Context::Global, KeySpec::char('o'), Action::OpenInBrowser),
    (Context::Global, KeySpec::plain(KeyCode::Enter), Action::Read),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Global, KeySpec::char('?'), Action::ShowHelp),
    (Context::Reader, KeySpec::char('j'), Action::ScrollDown),
    (Context::Reader, KeySpec::plain(KeyCode::Down), Action::ScrollDown),
    (Context::Reader, KeySpec::char('k'), Action::ScrollUp),
    (Context::Reader, KeySpec::plain(KeyCode::Up), Action::ScrollUp),
    (Context::Reader, KeySpec::ctrl('d'), Action::PageDown),
    (Context::Reader, KeySpec::ctrl('u'), Action::PageUp),
    (Context::Reader, KeySpec::char('b'), Action::Back),
    (Context::Reader, KeySpec::plain(KeyCode::Esc), Action::Back),
];

/// Registry of keybindings: defaults plus config overrides.
///
/// The same key can map to different actions in different contexts.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Insertion-ordered copy for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply `[keybindings]` overrides from config.
    ///
    /// Each entry replaces every key bound to that action with the new key,
    /// in the same contexts. Returns warnings for unknown actions and
    /// unparsable keys; those entries are skipped.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = Action::from_config_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = KeySpec::parse(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for context in contexts {
                self.bind(context, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Action for a key in `context`, falling back to `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers);
        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }

    /// (context, key label, description) rows for the help screen, with
    /// keys for the same action in the same context joined by `/`.
    pub fn help_rows(&self) -> Vec<(Context, String, &'static str)> {
        let mut rows: Vec<(Context, Action, Vec<String>)> = Vec::new();
        for (context, key, action) in &self.bindings {
            match rows
                .iter_mut()
                .find(|(c, a, _)| c == context && a == action)
            {
                Some((_, _, keys)) => keys.push(key.display()),
                None => rows.push((*context, *action, vec![key.display()])),
            }
        }
        rows.into_iter()
            .map(|(context, action, keys)| (context, keys.join("/"), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(reg: &KeybindingRegistry, key: KeySpec, context: Context) -> Option<Action> {
        reg.action_for_key(key.code, key.modifiers, context)
    }

    #[test]
    fn test_default_digest_keys() {
        let reg = KeybindingRegistry::new();
        let cases = [
            ('q', Action::Quit),
            ('r', Action::Refresh),
            ('j', Action::NavDown),
            ('k', Action::NavUp),
            ('v', Action::ToggleSavedView),
            ('t', Action::ToggleTheme),
            ('s', Action::ToggleSave),
            ('c', Action::Share),
            ('o', Action::OpenInBrowser),
            ('?', Action::ShowHelp),
        ];
        for (c, action) in cases {
            assert_eq!(lookup(&reg, KeySpec::char(c), Context::Global), Some(action));
        }
        assert_eq!(
            lookup(&reg, KeySpec::plain(KeyCode::Enter), Context::Global),
            Some(Action::Read)
        );
    }

    #[test]
    fn test_reader_context_overrides_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(
            lookup(&reg, KeySpec::char('j'), Context::Reader),
            Some(Action::ScrollDown)
        );
        assert_eq!(
            lookup(&reg, KeySpec::ctrl('d'), Context::Reader),
            Some(Action::PageDown)
        );
        assert_eq!(lookup(&reg, KeySpec::char('b'), Context::Reader), Some(Action::Back));
    }

    #[test]
    fn test_reader_falls_back_to_global() {
        let reg = KeybindingRegistry::new();
        assert_eq!(lookup(&reg, KeySpec::char('q'), Context::Reader), Some(Action::Quit));
        assert_eq!(lookup(&reg, KeySpec::char('s'), Context::Reader), Some(Action::ToggleSave));
        // 'b' is reader-only
        assert_eq!(lookup(&reg, KeySpec::char('b'), Context::Global), None);
    }

    #[test]
    fn test_override_replaces_key_in_all_contexts() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([("back".to_string(), "Backspace".to_string())]);
        assert!(reg.apply_overrides(&overrides).is_empty());

        let backspace = KeySpec::plain(KeyCode::Backspace);
        assert_eq!(lookup(&reg, backspace, Context::Global), Some(Action::Back));
        assert_eq!(lookup(&reg, backspace, Context::Reader), Some(Action::Back));
        assert_eq!(lookup(&reg, KeySpec::plain(KeyCode::Esc), Context::Global), None);
        assert_eq!(lookup(&reg, KeySpec::char('b'), Context::Reader), None);
    }

    #[test]
    fn test_override_warnings() {
        let mut reg = KeybindingRegistry::new();
        let overrides = HashMap::from([
            ("teleport".to_string(), "x".to_string()),
            ("quit".to_string(), "Ctrl+Alt+q".to_string()),
        ]);
        let mut warnings = reg.apply_overrides(&overrides);
        warnings.sort();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Cannot parse key"));
        assert!(warnings[1].contains("Unknown action"));
        // Failed override leaves the default in place
        assert_eq!(lookup(&reg, KeySpec::char('q'), Context::Global), Some(Action::Quit));
    }

    #[test]
    fn test_parse_key_strings() {
        assert_eq!(KeySpec::parse("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(KeySpec::parse("esc"), Some(KeySpec::plain(KeyCode::Esc)));
        assert_eq!(KeySpec::parse("Ctrl+u"), Some(KeySpec::ctrl('u')));
        assert_eq!(KeySpec::parse("F5"), Some(KeySpec::plain(KeyCode::F(5))));
        assert_eq!(KeySpec::parse("F13"), None);
        assert_eq!(KeySpec::parse("space"), Some(KeySpec::char(' ')));
        assert_eq!(KeySpec::parse("/"), Some(KeySpec::char('/')));
        assert_eq!(KeySpec::parse("qq"), None);
        assert_eq!(KeySpec::parse("F"), Some(KeySpec::char('F')));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for key in [KeySpec::char('s'), KeySpec::ctrl('d'), KeySpec::plain(KeyCode::Enter)] {
            assert_eq!(KeySpec::parse(&key.display()), Some(key));
        }
    }

    #[test]
    fn test_help_rows_join_alternate_keys() {
        let reg = KeybindingRegistry::new();
        let rows = reg.help_rows();
        assert!(rows
            .iter()
            .any(|(c, keys, _)| *c == Context::Global && keys == "j/Down"));
        assert!(rows
            .iter()
            .any(|(c, keys, _)| *c == Context::Reader && keys == "b/Esc"));
    }
}
