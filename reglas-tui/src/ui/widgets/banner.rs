//! Alert banner widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use reglas_core::{Banner, BannerKind};

use crate::ui::theme::Theme;

pub struct BannerWidget<'a> {
    banner: &'a Banner,
    theme: &'a Theme,
}

impl<'a> BannerWidget<'a> {
    pub fn new(banner: &'a Banner, theme: &'a Theme) -> Self {
        Self { banner, theme }
    }
}

fn icon(kind: BannerKind) -> &'static str {
    match kind {
        BannerKind::Info => "ℹ",
        BannerKind::Success => "✔",
        BannerKind::Warning => "⚠",
        BannerKind::Danger => "✖",
    }
}

impl Widget for BannerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = self.theme.banner_color(self.banner.kind);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(ratatui::style::Style::default().fg(color));

        let line = Line::from(vec![
            Span::styled(
                format!("{} ", icon(self.banner.kind)),
                self.theme.banner_style(self.banner.kind),
            ),
            Span::styled(self.banner.message.as_str(), self.theme.banner_style(self.banner.kind)),
        ]);

        Paragraph::new(line)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
