//! Render orchestration for the Reglas TUI

use std::str::FromStr;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use reglas_core::reference::{FACTOR_PLACEHOLDER, HECHO_PLACEHOLDER};
use reglas_core::{
    Banner, DeleteDialog, FactorDialog, HechoDialog, Operador, RuleDialog, SubmitButton,
};

use crate::app::{option_label, App, InputMode, Overlay, Screen};
use crate::ui::layout::{centered_rect_fixed, stack, AppLayout};
use crate::ui::theme::Theme;
use crate::ui::widgets::{BannerWidget, InputWidget, RulesTableWidget, SelectWidget};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    match app.screen {
        Screen::Login => render_login(frame, app, layout.body_area),
        Screen::Register => render_register(frame, app, layout.body_area),
        Screen::Rules => render_rules(frame, app, layout.body_area),
        Screen::CreateRule => render_create_rule(frame, app, layout.body_area),
    }

    render_status_bar(frame, app, layout.status_bar);
    render_hotkey_bar(frame, app, layout.hotkey_bar);

    if let Some(overlay) = app.overlay() {
        render_overlay(frame, app, overlay, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" Reglas · {} ", app.screen.title()),
        app.theme.title_style(),
    )];
    if let Some(session) = &app.session {
        let role = if session.is_admin { "admin" } else { "usuario" };
        spans.push(Span::styled(
            format!("  {} ({role})", session.display_name),
            app.theme.muted_style(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_button(frame: &mut Frame, theme: &Theme, button: &SubmitButton, focused: bool, area: Rect) {
    let paragraph = Paragraph::new(format!("[ {} ]", button.label()))
        .alignment(Alignment::Center)
        .style(theme.button_style(focused, button.is_disabled()));
    frame.render_widget(paragraph, area);
}

fn render_plain_button(frame: &mut Frame, theme: &Theme, label: &str, focused: bool, area: Rect) {
    render_button(frame, theme, &SubmitButton::new(label), focused, area);
}

fn render_banner(frame: &mut Frame, theme: &Theme, banner: Option<&Banner>, area: Rect) {
    if let Some(banner) = banner {
        frame.render_widget(BannerWidget::new(banner, theme), area);
    }
}

fn render_hint(frame: &mut Frame, theme: &Theme, text: &str, area: Rect) {
    frame.render_widget(
        Paragraph::new(text)
            .style(theme.muted_style())
            .alignment(Alignment::Center),
        area,
    );
}

/// A bordered panel; returns its inner area.
fn panel(frame: &mut Frame, theme: &Theme, title: &str, area: Rect) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {title} "), theme.title_style()))
        .border_style(theme.border_style(true));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

// ============================================================================
// Screens
// ============================================================================

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let login = &app.login;
    let inner = panel(frame, theme, "Iniciar sesión", centered_rect_fixed(60, 18, area));
    let rows = stack(inner, &[3, 3, 1, 1, 3, 1]);

    frame.render_widget(
        InputWidget::new("Correo", &login.form.email, theme)
            .placeholder("usuario@dominio.com")
            .focused(app.focus == 0),
        rows[0],
    );
    frame.render_widget(
        InputWidget::new("Contraseña", &login.form.password, theme)
            .masked(true)
            .focused(app.focus == 1),
        rows[1],
    );
    render_button(frame, theme, &login.button, app.focus == 2, rows[3]);
    render_banner(frame, theme, login.banner.as_ref(), rows[4]);
    render_hint(frame, theme, "F2 crear cuenta · Esc salir", rows[5]);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let register = &app.register;
    let form = &register.form;
    let flag = register.was_validated;
    let inner = panel(frame, theme, "Crear cuenta", centered_rect_fixed(60, 24, area));
    let rows = stack(inner, &[3, 3, 3, 3, 1, 1, 3, 1]);

    frame.render_widget(
        InputWidget::new("Nombre", &form.name, theme)
            .focused(app.focus == 0)
            .invalid(flag && form.name.trim().is_empty()),
        rows[0],
    );
    frame.render_widget(
        InputWidget::new("Correo", &form.email, theme)
            .focused(app.focus == 1)
            .invalid(flag && !form.email.contains('@')),
        rows[1],
    );
    frame.render_widget(
        InputWidget::new("Contraseña", &form.password, theme)
            .masked(true)
            .focused(app.focus == 2)
            .invalid(flag && form.password.is_empty()),
        rows[2],
    );
    frame.render_widget(
        InputWidget::new("Confirmar contraseña", &form.confirm, theme)
            .masked(true)
            .focused(app.focus == 3)
            .invalid(flag && (form.confirm.is_empty() || form.confirm_validity().is_some())),
        rows[3],
    );
    render_button(frame, theme, &register.button, app.focus == 4, rows[5]);
    render_banner(frame, theme, register.banner.as_ref(), rows[6]);
    render_hint(frame, theme, "Esc volver al inicio de sesión", rows[7]);
}

fn render_rules(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let banner = app.banner.as_ref().or(app.reference.banner.as_ref());
    let heights: &[u16] = if banner.is_some() { &[3, 3] } else { &[0, 3] };
    let rows = stack(area, heights);

    render_banner(frame, theme, banner, rows[0]);
    frame.render_widget(
        InputWidget::new("Filtrar (/)", app.rules.filter(), theme)
            .placeholder("Buscar por id, factor, hecho, operador o valor")
            .focused(app.input_mode == InputMode::Filter),
        rows[1],
    );

    let title = if app.rules.has_actions() {
        " Reglas (administración) "
    } else {
        " Reglas "
    };
    let selected = (!app.rules.rows().is_empty()).then_some(app.selected);
    frame.render_widget(
        RulesTableWidget::new(app.rules.rows(), app.rules.state(), theme)
            .selected(selected)
            .title(title)
            .focused(app.input_mode == InputMode::Normal),
        rows[2],
    );
}

fn render_create_rule(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let quick = &app.quick;
    let inner = panel(frame, theme, "Crear regla", centered_rect_fixed(64, 26, area));
    let rows = stack(inner, &[3, 3, 3, 3, 1, 1, 3, 3, 1]);

    let factor = option_label(app.reference.factor_options(), quick.factor_id);
    let hecho = option_label(app.reference.hecho_options(), quick.hecho_id);
    frame.render_widget(
        SelectWidget::new("Factor", factor, theme).focused(app.focus == 0),
        rows[0],
    );
    frame.render_widget(
        SelectWidget::new("Hecho", hecho, theme).focused(app.focus == 1),
        rows[1],
    );
    frame.render_widget(
        SelectWidget::new("Operador", quick.operador.label(), theme).focused(app.focus == 2),
        rows[2],
    );
    let placeholder = if quick.operador == Operador::Range {
        "Ej: 1000-2000"
    } else {
        "Valor"
    };
    frame.render_widget(
        InputWidget::new("Valor", &quick.valor, theme)
            .placeholder(placeholder)
            .focused(app.focus == 3),
        rows[3],
    );
    render_plain_button(frame, theme, "Crear regla", app.focus == 4, rows[5]);
    render_banner(frame, theme, quick.message.as_ref(), rows[6]);
    render_banner(
        frame,
        theme,
        app.banner.as_ref().or(app.reference.banner.as_ref()),
        rows[7],
    );
    render_hint(frame, theme, "F2 nuevo factor · F3 nuevo hecho · Esc volver", rows[8]);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.busy {
        Line::from(Span::styled(
            " Procesando…",
            Style::default()
                .fg(app.theme.warning)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(message) = app.status_message() {
        Line::from(Span::styled(format!(" {message}"), app.theme.text_style()))
    } else if app.screen == Screen::Rules {
        Line::from(Span::styled(
            format!(
                " {} de {} reglas",
                app.rules.rows().len(),
                app.rules.reglas().len()
            ),
            app.theme.muted_style(),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the hotkey bar
fn render_hotkey_bar(frame: &mut Frame, app: &App, area: Rect) {
    let keys = match (app.screen, app.input_mode) {
        (Screen::Login, _) | (Screen::Register, _) => {
            "Tab campo · Enter enviar · F1 ayuda · Ctrl+C salir"
        }
        (Screen::Rules, InputMode::Filter) => "Escribe para filtrar · Enter/Esc terminar",
        (Screen::Rules, InputMode::Normal) if app.rules.has_actions() => {
            "j/k mover · / filtrar · n nueva · e editar · d eliminar · c crear · f factor · h hecho · r recargar · L salir · ? ayuda"
        }
        (Screen::Rules, InputMode::Normal) => {
            "j/k mover · / filtrar · r recargar · L cerrar sesión · ? ayuda · q salir"
        }
        (Screen::CreateRule, _) => "Tab campo · ←/→ elegir · Enter crear · Esc volver",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {keys}"), app.theme.muted_style())),
        area,
    );
}

// ============================================================================
// Overlays
// ============================================================================

/// Render overlay
fn render_overlay(frame: &mut Frame, app: &App, overlay: &Overlay, area: Rect) {
    match overlay {
        Overlay::Help => render_help_overlay(frame, app, area),
        Overlay::Rule(dialog) => render_rule_dialog(frame, app, dialog, area),
        Overlay::Delete(dialog) => render_delete_dialog(frame, &app.theme, dialog, area),
        Overlay::Factor(dialog) => render_factor_dialog(frame, app, dialog, area),
        Overlay::Hecho(dialog) => render_hecho_dialog(frame, app, dialog, area),
    }
}

fn render_rule_dialog(frame: &mut Frame, app: &App, dialog: &RuleDialog, area: Rect) {
    let theme = &app.theme;
    let inner = panel(frame, theme, &dialog.title(), centered_rect_fixed(64, 22, area));
    let rows = stack(inner, &[3, 3, 3, 3, 1, 1, 3]);

    let operador = Operador::from_str(&dialog.operador)
        .map(|op| op.label())
        .unwrap_or(dialog.operador.as_str());

    frame.render_widget(
        SelectWidget::new(
            "Factor",
            dialog.factor_label().unwrap_or(FACTOR_PLACEHOLDER),
            theme,
        )
        .focused(app.focus == 0),
        rows[0],
    );
    frame.render_widget(
        SelectWidget::new(
            "Hecho",
            dialog.hecho_label().unwrap_or(HECHO_PLACEHOLDER),
            theme,
        )
        .focused(app.focus == 1),
        rows[1],
    );
    frame.render_widget(
        SelectWidget::new("Operador", operador, theme).focused(app.focus == 2),
        rows[2],
    );
    frame.render_widget(
        InputWidget::new("Valor", &dialog.valor, theme).focused(app.focus == 3),
        rows[3],
    );
    render_plain_button(frame, theme, "Guardar", app.focus == 4, rows[5]);
    render_banner(frame, theme, dialog.message.as_ref(), rows[6]);
}

fn render_delete_dialog(frame: &mut Frame, theme: &Theme, dialog: &DeleteDialog, area: Rect) {
    let inner = panel(frame, theme, "Eliminar regla", centered_rect_fixed(64, 10, area));
    let rows = stack(inner, &[2, 3, 1]);

    frame.render_widget(
        Paragraph::new(dialog.prompt())
            .style(theme.text_style())
            .wrap(Wrap { trim: true }),
        rows[0],
    );
    if let Some(error) = &dialog.error {
        let banner = Banner::danger(error.clone());
        frame.render_widget(BannerWidget::new(&banner, theme), rows[1]);
    }
    render_hint(frame, theme, "Enter/y eliminar · Esc/n cancelar", rows[2]);
}

fn render_factor_dialog(frame: &mut Frame, app: &App, dialog: &FactorDialog, area: Rect) {
    let theme = &app.theme;
    let inner = panel(frame, theme, "Nuevo factor", centered_rect_fixed(56, 16, area));
    let rows = stack(inner, &[3, 3, 1, 1, 3]);

    frame.render_widget(
        InputWidget::new("Nombre", &dialog.nombre, theme).focused(app.focus == 0),
        rows[0],
    );
    frame.render_widget(
        InputWidget::new("Categoría", &dialog.categoria, theme).focused(app.focus == 1),
        rows[1],
    );
    render_plain_button(frame, theme, "Crear factor", app.focus == 2, rows[3]);
    render_banner(frame, theme, dialog.message.as_ref(), rows[4]);
}

fn render_hecho_dialog(frame: &mut Frame, app: &App, dialog: &HechoDialog, area: Rect) {
    let theme = &app.theme;
    let inner = panel(frame, theme, "Nuevo hecho", centered_rect_fixed(56, 13, area));
    let rows = stack(inner, &[3, 1, 1, 3]);

    frame.render_widget(
        InputWidget::new("Descripción", &dialog.descripcion, theme).focused(app.focus == 0),
        rows[0],
    );
    render_plain_button(frame, theme, "Crear hecho", app.focus == 1, rows[2]);
    render_banner(frame, theme, dialog.message.as_ref(), rows[3]);
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::UNDERLINED),
    ))
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(58, 24, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            " Reglas - Ayuda ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Formularios:"),
        Line::from("  Tab/↓ ⇧Tab/↑   Cambiar de campo"),
        Line::from("  ←/→            Elegir opción"),
        Line::from("  Enter          Enviar"),
        Line::from("  F2             Crear cuenta (inicio de sesión)"),
        Line::from(""),
        section("Lista de reglas:"),
        Line::from("  j/k o ↑/↓      Mover selección"),
        Line::from("  /              Filtrar (Esc limpia)"),
        Line::from("  r              Recargar"),
        Line::from("  n / e / d      Nueva / editar / eliminar (admin)"),
        Line::from("  c              Formulario crear regla (admin)"),
        Line::from("  f / h          Nuevo factor / hecho (admin)"),
        Line::from("  L              Cerrar sesión"),
        Line::from(""),
        section("General:"),
        Line::from("  ? / F1         Esta ayuda"),
        Line::from("  q / Ctrl+C     Salir"),
        Line::from(""),
        Line::from(Span::styled(
            "Pulsa cualquier tecla para cerrar",
            app.theme.muted_style(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true))
        .title(" Ayuda ");

    frame.render_widget(
        Paragraph::new(help_text)
            .block(block)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}
