//! # Theme System
//!
//! Color palettes for the console, selected by name in the config file.
//!
//! Rendering code never hardcodes a `ratatui::style::Color`; it asks the
//! active [`Theme`] for the color of a semantic role (connection ok, warning,
//! gauge fill and so on).
//!
//! ## Built-in Themes
//!
//! - **Catppuccin Mocha** (default)
//! - **Catppuccin Macchiato**
//! - **Catppuccin Frappe**
//! - **Nord**
//! - **Gruvbox Dark**

use crate::session::{ActivityKind, ConnectionState};
use ratatui::style::Color;

/// All colors used by the console, grouped by semantic role.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Name as written in `config.json`.
    pub name: &'static str,

    /// Panel and modal background.
    pub bg: Color,

    /// Primary text.
    pub fg: Color,
    /// Hints, footer, unfocused borders.
    pub fg_dim: Color,

    /// Focused borders and the selected device.
    pub accent: Color,
    /// Gauge fill and the active form field.
    pub highlight: Color,

    /// Connection open, verification passed.
    pub success: Color,
    /// Mounted devices, pending verification, malformed traffic.
    pub warning: Color,
    /// Connection errors, failed submissions.
    pub error: Color,

    /// Background of the highlighted list row.
    pub selection_bg: Color,
}

impl Theme {
    pub fn all() -> &'static [Theme] {
        &BUILT_IN_THEMES
    }

    /// Find a built-in theme by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static Theme> {
        BUILT_IN_THEMES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn default_theme() -> &'static Theme {
        &BUILT_IN_THEMES[0]
    }

    /// The named theme, or the default when the name is unknown.
    pub fn resolve(name: &str) -> &'static Theme {
        Self::by_name(name).unwrap_or_else(Self::default_theme)
    }

    pub fn connection_color(&self, state: ConnectionState) -> Color {
        match state {
            ConnectionState::Open => self.success,
            ConnectionState::Connecting => self.warning,
            ConnectionState::Closed => self.fg_dim,
            ConnectionState::Errored => self.error,
        }
    }

    pub fn activity_color(&self, kind: ActivityKind) -> Color {
        match kind {
            ActivityKind::Info => self.fg,
            ActivityKind::Warning => self.warning,
            ActivityKind::Error => self.error,
        }
    }
}

static BUILT_IN_THEMES: [Theme; 5] = [
    Theme {
        name: "Catppuccin Mocha",
        bg: Color::Rgb(30, 30, 46),            // base
        fg: Color::Rgb(205, 214, 244),         // text
        fg_dim: Color::Rgb(108, 112, 134),     // overlay0
        accent: Color::Rgb(137, 180, 250),     // blue
        highlight: Color::Rgb(203, 166, 247),  // mauve
        success: Color::Rgb(166, 227, 161),    // green
        warning: Color::Rgb(250, 179, 135),    // peach
        error: Color::Rgb(243, 139, 168),      // red
        selection_bg: Color::Rgb(69, 71, 90),  // surface1
    },
    Theme {
        name: "Catppuccin Macchiato",
        bg: Color::Rgb(36, 39, 58),
        fg: Color::Rgb(202, 211, 245),
        fg_dim: Color::Rgb(110, 115, 141),
        accent: Color::Rgb(138, 173, 244),
        highlight: Color::Rgb(198, 160, 246),
        success: Color::Rgb(166, 218, 149),
        warning: Color::Rgb(245, 169, 127),
        error: Color::Rgb(237, 135, 150),
        selection_bg: Color::Rgb(73, 77, 100),
    },
    Theme {
        name: "Catppuccin Frappe",
        bg: Color::Rgb(48, 52, 70),
        fg: Color::Rgb(198, 208, 245),
        fg_dim: Color::Rgb(115, 121, 148),
        accent: Color::Rgb(140, 170, 238),
        highlight: Color::Rgb(202, 158, 230),
        success: Color::Rgb(166, 209, 137),
        warning: Color::Rgb(239, 159, 118),
        error: Color::Rgb(231, 130, 132),
        selection_bg: Color::Rgb(81, 87, 109),
    },
    Theme {
        name: "Nord",
        bg: Color::Rgb(46, 52, 64),
        fg: Color::Rgb(216, 222, 233),
        fg_dim: Color::Rgb(76, 86, 106),
        accent: Color::Rgb(136, 192, 208),    // frost
        highlight: Color::Rgb(180, 142, 173), // aurora purple
        success: Color::Rgb(163, 190, 140),
        warning: Color::Rgb(208, 135, 112),
        error: Color::Rgb(191, 97, 106),
        selection_bg: Color::Rgb(67, 76, 94),
    },
    Theme {
        name: "Gruvbox Dark",
        bg: Color::Rgb(40, 40, 40),
        fg: Color::Rgb(235, 219, 178),
        fg_dim: Color::Rgb(146, 131, 116),
        accent: Color::Rgb(131, 165, 152),
        highlight: Color::Rgb(211, 134, 155),
        success: Color::Rgb(184, 187, 38),
        warning: Color::Rgb(254, 128, 25),
        error: Color::Rgb(251, 73, 52),
        selection_bg: Color::Rgb(80, 73, 69),
    },
];
