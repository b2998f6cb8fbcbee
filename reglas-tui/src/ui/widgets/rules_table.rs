//! Rule table widget

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use reglas_core::{ListState, RuleRow};

use crate::ui::theme::Theme;

pub const LOADING: &str = "Cargando reglas…";
pub const EMPTY: &str = "No hay reglas registradas.";
pub const NO_MATCHES: &str = "Ninguna regla coincide con el filtro.";

/// Widget for the filtered rule list
pub struct RulesTableWidget<'a> {
    rows: &'a [RuleRow],
    state: &'a ListState,
    theme: &'a Theme,
    selected: Option<usize>,
    title: &'a str,
    focused: bool,
}

impl<'a> RulesTableWidget<'a> {
    pub fn new(rows: &'a [RuleRow], state: &'a ListState, theme: &'a Theme) -> Self {
        Self {
            rows,
            state,
            theme,
            selected: None,
            title: " Reglas ",
            focused: true,
        }
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn message(&self) -> Option<Line<'a>> {
        match self.state {
            ListState::Loading => Some(Line::from(Span::styled(LOADING, self.theme.muted_style()))),
            ListState::Empty => Some(Line::from(Span::styled(EMPTY, self.theme.muted_style()))),
            ListState::Failed(text) => Some(Line::from(Span::styled(
                text.as_str(),
                self.theme.banner_style(reglas_core::BannerKind::Danger),
            ))),
            ListState::Ready if self.rows.is_empty() => {
                Some(Line::from(Span::styled(NO_MATCHES, self.theme.muted_style())))
            }
            ListState::Ready => None,
        }
    }
}

impl Widget for RulesTableWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(self.title, self.theme.title_style()))
            .border_style(self.theme.border_style(self.focused));

        if let Some(message) = self.message() {
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(block)
                .render(area, buf);
            return;
        }

        let with_actions = self.rows.iter().any(|r| r.actions);

        let mut header_cells = vec!["ID", "Factor", "Operador", "Valor", "Hecho"];
        if with_actions {
            header_cells.push("Acciones");
        }
        let header = Row::new(header_cells.into_iter().map(Cell::from))
            .style(self.theme.header_style())
            .bottom_margin(1);

        let rows = self.rows.iter().map(|r| {
            let mut cells = vec![
                Cell::from(r.id.to_string()),
                Cell::from(r.factor.clone()),
                Cell::from(r.operador.clone()),
                Cell::from(r.valor.clone()),
                Cell::from(r.hecho.clone()),
            ];
            if r.actions {
                cells.push(Cell::from(Span::styled("e editar · d eliminar", self.theme.muted_style())));
            }
            Row::new(cells).style(self.theme.text_style())
        });

        let mut widths = vec![
            Constraint::Length(6),
            Constraint::Percentage(22),
            Constraint::Length(9),
            Constraint::Percentage(18),
            Constraint::Percentage(30),
        ];
        if with_actions {
            widths.push(Constraint::Length(22));
        }

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(self.theme.selected_style())
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(self.selected);
        StatefulWidget::render(table, area, buf, &mut state);
    }
}
