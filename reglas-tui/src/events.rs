//! Event handling for the Reglas TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode, Overlay, PendingAction, Screen};

/// Result of handling an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// Backend work for the main loop to await
    Dispatch(PendingAction),
}

impl From<Option<PendingAction>> for EventResult {
    fn from(action: Option<PendingAction>) -> Self {
        match action {
            Some(action) => EventResult::Dispatch(action),
            None => EventResult::NeedsRedraw,
        }
    }
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    if app.screen != Screen::Rules || app.has_overlay() {
        return EventResult::Continue;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.screen {
        Screen::Login => handle_login_keys(app, key),
        Screen::Register => handle_register_keys(app, key),
        Screen::Rules => match app.input_mode {
            InputMode::Normal => handle_rules_keys(app, key),
            InputMode::Filter => handle_filter_keys(app, key),
        },
        Screen::CreateRule => handle_create_rule_keys(app, key),
    }
}

/// Keys shared by every form: focus movement, text entry, submit.
///
/// Returns `None` when the key is not a form key.
fn handle_form_keys(app: &mut App, key: KeyEvent) -> Option<EventResult> {
    let result = match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.focus_next();
            EventResult::NeedsRedraw
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.focus_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Left => {
            app.cycle(false);
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cycle(true);
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => app.submit().into(),
        KeyCode::Backspace => {
            app.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input_char(c);
            EventResult::NeedsRedraw
        }
        _ => return None,
    };
    Some(result)
}

fn handle_login_keys(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => EventResult::Quit,
        KeyCode::F(2) => {
            app.go_to(Screen::Register);
            EventResult::NeedsRedraw
        }
        KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        _ => handle_form_keys(app, key).unwrap_or(EventResult::Continue),
    }
}

fn handle_register_keys(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.go_to(Screen::Login);
            EventResult::NeedsRedraw
        }
        KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        _ => handle_form_keys(app, key).unwrap_or(EventResult::Continue),
    }
}

/// Handle keys on the rule list in NORMAL mode
fn handle_rules_keys(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') => {
            app.selected = 0;
            EventResult::NeedsRedraw
        }
        KeyCode::Char('G') => {
            app.selected = app.rules.rows().len().saturating_sub(1);
            EventResult::NeedsRedraw
        }

        // Filter
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Filter;
            EventResult::NeedsRedraw
        }
        KeyCode::Esc => {
            app.clear_filter();
            EventResult::NeedsRedraw
        }

        KeyCode::Char('r') => {
            app.banner = None;
            EventResult::Dispatch(PendingAction::LoadScreen)
        }
        KeyCode::Char('L') => {
            app.logout();
            EventResult::NeedsRedraw
        }

        // Admin actions
        KeyCode::Char('n') => {
            app.open_create_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            app.open_edit_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            app.open_delete_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('f') => {
            app.open_factor_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('h') => {
            app.open_hecho_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('c') if app.is_admin() => {
            app.banner = None;
            app.go_to(Screen::CreateRule);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys while typing a filter
fn handle_filter_keys(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.pop_filter_char();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.push_filter_char(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_create_rule_keys(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.quick.message = None;
            app.go_to(Screen::Rules);
            EventResult::Dispatch(PendingAction::LoadScreen)
        }
        KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::F(2) => {
            app.open_factor_dialog();
            EventResult::NeedsRedraw
        }
        KeyCode::F(3) => {
            app.open_hecho_dialog();
            EventResult::NeedsRedraw
        }
        _ => handle_form_keys(app, key).unwrap_or(EventResult::Continue),
    }
}

/// Handle keys when an overlay is open
fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    let is_help = matches!(app.overlay(), Some(Overlay::Help));
    let is_delete = matches!(app.overlay(), Some(Overlay::Delete(_)));

    if is_help {
        app.close_overlay();
        return EventResult::NeedsRedraw;
    }

    if is_delete {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('s') | KeyCode::Enter => {
                EventResult::Dispatch(PendingAction::DeleteRule)
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                app.close_overlay();
                EventResult::NeedsRedraw
            }
            _ => EventResult::Continue,
        };
    }

    match key.code {
        KeyCode::Esc => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => handle_form_keys(app, key).unwrap_or(EventResult::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reglas_core::ClientConfig;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_login_form_typing_and_submit() {
        let mut app = App::new(&ClientConfig::default());
        type_text(&mut app, "ana@example.com");
        handle_event(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "secreto");

        assert_eq!(app.login.form.email, "ana@example.com");
        assert_eq!(app.login.form.password, "secreto");

        let result = handle_event(&mut app, key(KeyCode::Enter));
        assert!(matches!(result, EventResult::Dispatch(PendingAction::Login(_))));
        assert_eq!(app.login.button.label(), "Ingresando…");
    }

    #[test]
    fn test_empty_login_does_not_dispatch() {
        let mut app = App::new(&ClientConfig::default());
        let result = handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(result, EventResult::NeedsRedraw);
        assert!(app.login.banner.is_some());
    }

    #[test]
    fn test_register_navigation() {
        let mut app = App::new(&ClientConfig::default());
        handle_event(&mut app, key(KeyCode::F(2)));
        assert_eq!(app.screen, Screen::Register);
        type_text(&mut app, "Carla");
        assert_eq!(app.register.form.name, "Carla");
        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Login);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = App::new(&ClientConfig::default());
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, ev), EventResult::Quit);
    }

    #[test]
    fn test_filter_mode() {
        let mut app = App::new(&ClientConfig::default());
        app.go_to(Screen::Rules);
        handle_event(&mut app, key(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Filter);
        type_text(&mut app, "edad");
        assert_eq!(app.rules.filter(), "edad");
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.rules.filter(), "");
    }
}
