//! Color theme and styling for the Reglas TUI

use ratatui::style::{Color, Modifier, Style};

use reglas_core::BannerKind;

/// UI color theme
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,

    // Banner colors
    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,

    // Table colors
    pub header: Color,
    pub selected_bg: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            accent: Color::Cyan,

            info: Color::LightBlue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::LightRed,

            header: Color::Yellow,
            selected_bg: Color::DarkGray,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    /// Dimmed text for hints and placeholders
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted).add_modifier(Modifier::DIM)
    }

    pub fn banner_color(&self, kind: BannerKind) -> Color {
        match kind {
            BannerKind::Info => self.info,
            BannerKind::Success => self.success,
            BannerKind::Warning => self.warning,
            BannerKind::Danger => self.danger,
        }
    }

    pub fn banner_style(&self, kind: BannerKind) -> Style {
        Style::default()
            .fg(self.banner_color(kind))
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Border of a field that failed validation
    pub fn invalid_border_style(&self) -> Style {
        Style::default().fg(self.danger)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Submit button, greyed out while a request is in flight
    pub fn button_style(&self, focused: bool, disabled: bool) -> Style {
        if disabled {
            self.muted_style()
        } else if focused {
            Style::default()
                .fg(Color::Black)
                .bg(self.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.accent)
        }
    }
}
