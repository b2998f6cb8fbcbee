//! Form field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

const MASK: char = '•';

/// A bordered, labelled single-line text field
pub struct InputWidget<'a> {
    label: &'a str,
    content: &'a str,
    cursor_position: usize,
    theme: &'a Theme,
    placeholder: &'a str,
    is_focused: bool,
    is_masked: bool,
    is_invalid: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(label: &'a str, content: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            content,
            cursor_position: content.chars().count(),
            theme,
            placeholder: "",
            is_focused: false,
            is_masked: false,
            is_invalid: false,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.is_focused = focused;
        self
    }

    /// Render every character as a bullet (passwords)
    pub fn masked(mut self, masked: bool) -> Self {
        self.is_masked = masked;
        self
    }

    pub fn invalid(mut self, invalid: bool) -> Self {
        self.is_invalid = invalid;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.is_invalid {
            self.theme.invalid_border_style()
        } else {
            self.theme.border_style(self.is_focused)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.label))
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let display: String = if self.is_masked {
            self.content.chars().map(|_| MASK).collect()
        } else {
            self.content.to_string()
        };

        let line = if display.is_empty() && !self.is_focused {
            Line::from(Span::styled(self.placeholder, self.theme.muted_style()))
        } else if !self.is_focused {
            Line::from(Span::styled(display, self.theme.text_style()))
        } else {
            // Use character-based slicing for unicode safety
            let before_cursor: String = display.chars().take(self.cursor_position).collect();
            let at_cursor = display
                .chars()
                .nth(self.cursor_position)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after_cursor: String = display.chars().skip(self.cursor_position + 1).collect();

            Line::from(vec![
                Span::raw(before_cursor),
                Span::styled(
                    at_cursor,
                    Style::default()
                        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                        .fg(self.theme.accent),
                ),
                Span::raw(after_cursor),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}

/// A bordered selection field showing the current choice with arrows
pub struct SelectWidget<'a> {
    label: &'a str,
    value: &'a str,
    theme: &'a Theme,
    is_focused: bool,
}

impl<'a> SelectWidget<'a> {
    pub fn new(label: &'a str, value: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            value,
            theme,
            is_focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.is_focused = focused;
        self
    }
}

impl Widget for SelectWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.label))
            .border_style(self.theme.border_style(self.is_focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let arrow_style = if self.is_focused {
            Style::default().fg(self.theme.accent)
        } else {
            self.theme.muted_style()
        };
        let line = Line::from(vec![
            Span::styled("◀ ", arrow_style),
            Span::styled(self.value, self.theme.text_style()),
            Span::styled(" ▶", arrow_style),
        ]);

        Paragraph::new(line).render(inner, buf);
    }
}
