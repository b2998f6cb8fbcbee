//! Main application state and logic

use std::str::FromStr;
use std::time::Instant;

use reglas_core::{
    authenticate, Banner, ClientConfig, Credentials, DeleteDialog, FactorDialog, HechoDialog,
    Landing, ListVariant, LoginController, Operador, QuickRuleForm, Redirect, RegisterController,
    Registration, ReferenceLoader, RuleDialog, RuleListView, RuleRow, RulesBackend, SelectOption,
    Session,
};
use tracing::{debug, info};

use crate::ui::theme::Theme;

/// Input modes on the rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Navigation and hotkeys (default)
    #[default]
    Normal,
    /// Typing into the filter box
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    /// Rule list; CRUD-capable for admins, read-only otherwise
    Rules,
    /// Static create-rule form
    CreateRule,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Iniciar sesión",
            Screen::Register => "Crear cuenta",
            Screen::Rules => "Reglas",
            Screen::CreateRule => "Crear regla",
        }
    }
}

/// Modal windows drawn over the current screen
#[derive(Debug, Clone)]
pub enum Overlay {
    Help,
    Rule(RuleDialog),
    Delete(DeleteDialog),
    Factor(FactorDialog),
    Hecho(HechoDialog),
}

/// Backend work the main loop awaits between frames
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Login(Credentials),
    Register(Registration),
    /// Fetch reference data and the rule list for the current screen
    LoadScreen,
    SaveRule,
    DeleteRule,
    CreateFactor,
    CreateHecho,
    QuickCreate,
}

/// A login redirect waiting for its delay to elapse
#[derive(Debug, Clone)]
pub struct PendingRedirect {
    pub redirect: Redirect,
    pub due: Instant,
}

pub const READ_ONLY: &str = "Solo lectura: inicia sesión como administrador.";

const DIALOG_OPERATORS: [Operador; 3] = [Operador::Eq, Operador::Le, Operador::Ge];

/// Step a selection control through `options`, placeholder included.
pub fn cycle_option(options: &[SelectOption], current: Option<i64>, forward: bool) -> Option<i64> {
    if options.is_empty() {
        return None;
    }
    let pos = options.iter().position(|o| o.value == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % options.len()
    } else {
        (pos + options.len() - 1) % options.len()
    };
    options[next].value
}

pub fn option_label(options: &[SelectOption], current: Option<i64>) -> &str {
    options
        .iter()
        .find(|o| o.value == current)
        .or_else(|| options.first())
        .map(|o| o.label.as_str())
        .unwrap_or("")
}

fn cycle_dialog_operator(current: &str, forward: bool) -> String {
    let pos = Operador::from_str(current)
        .ok()
        .and_then(|op| DIALOG_OPERATORS.iter().position(|o| *o == op));
    let len = DIALOG_OPERATORS.len();
    let next = match (pos, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    };
    DIALOG_OPERATORS[next].as_str().to_string()
}

/// Main application state
pub struct App {
    pub theme: Theme,
    pub screen: Screen,
    overlay: Option<Overlay>,
    pub input_mode: InputMode,

    /// Focused field of the current form or dialog
    pub focus: usize,

    // Controllers
    pub login: LoginController,
    pub register: RegisterController,
    pub reference: ReferenceLoader,
    pub rules: RuleListView,
    pub quick: QuickRuleForm,

    pub session: Option<Session>,
    pub redirect: Option<PendingRedirect>,

    /// Selected row of the rule table
    pub selected: usize,

    /// Screen-level acknowledgment (rule saved, factor created, ...)
    pub banner: Option<Banner>,

    status_message: Option<String>,
    pub busy: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            theme: Theme::default(),
            screen: Screen::Login,
            overlay: None,
            input_mode: InputMode::Normal,
            focus: 0,
            login: LoginController::new(config.redirect_delay),
            register: RegisterController::new(),
            reference: ReferenceLoader::new(),
            rules: RuleListView::new(ListVariant::Joined),
            quick: QuickRuleForm::new(config.range_encoding),
            session: None,
            redirect: None,
            selected: 0,
            banner: None,
            status_message: None,
            busy: false,
            should_quit: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_admin)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn go_to(&mut self, screen: Screen) {
        debug!(?screen, "navigating");
        self.screen = screen;
        self.focus = 0;
        self.input_mode = InputMode::Normal;
        self.overlay = None;
    }

    /// Perform a login redirect: open the landing screen for the session.
    fn enter_landing(&mut self, redirect: Redirect) -> PendingAction {
        info!(landing = redirect.landing.path(), "redirecting");
        let variant = match redirect.landing {
            Landing::Admin => ListVariant::Joined,
            Landing::User => ListVariant::Plain,
        };
        self.session = Some(redirect.session);
        self.rules = RuleListView::new(variant);
        self.selected = 0;
        self.banner = None;
        self.login.reset();
        self.go_to(Screen::Rules);
        PendingAction::LoadScreen
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user = %session.display_name, "logged out");
        }
        self.rules.reset();
        self.reference = ReferenceLoader::new();
        self.banner = None;
        self.selected = 0;
        self.login.banner = Some(Banner::info("Sesión cerrada."));
        self.go_to(Screen::Login);
    }

    /// Advance timers. Returns the action a due redirect requires.
    pub fn tick(&mut self, now: Instant) -> Option<PendingAction> {
        let due = self.redirect.as_ref().is_some_and(|r| now >= r.due);
        if !due {
            return None;
        }
        let pending = self.redirect.take()?;
        Some(self.enter_landing(pending.redirect))
    }

    // ========================================================================
    // Overlays
    // ========================================================================

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
        self.focus = 0;
    }

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    fn open(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
        self.focus = 0;
    }

    /// Whether a mutation may start; flags the status bar when it may not.
    fn permit(&mut self, allowed: bool) -> bool {
        if !allowed {
            self.set_status(READ_ONLY);
        }
        allowed
    }

    pub fn open_create_dialog(&mut self) {
        if self.permit(self.rules.has_actions()) {
            self.open(Overlay::Rule(RuleDialog::create(self.reference.data())));
        }
    }

    pub fn open_edit_dialog(&mut self) {
        if !self.permit(self.rules.has_actions()) {
            return;
        }
        let Some(id) = self.selected_row().map(|r| r.id) else {
            return;
        };
        if let Some(regla) = self.rules.get(id) {
            let dialog = RuleDialog::edit(regla, self.reference.data());
            self.open(Overlay::Rule(dialog));
        }
    }

    pub fn open_delete_dialog(&mut self) {
        if !self.permit(self.rules.has_actions()) {
            return;
        }
        let Some(id) = self.selected_row().map(|r| r.id) else {
            return;
        };
        if let Some(regla) = self.rules.get(id) {
            let dialog = DeleteDialog::new(regla);
            self.open(Overlay::Delete(dialog));
        }
    }

    pub fn open_factor_dialog(&mut self) {
        if self.permit(self.is_admin()) {
            self.open(Overlay::Factor(FactorDialog::new()));
        }
    }

    pub fn open_hecho_dialog(&mut self) {
        if self.permit(self.is_admin()) {
            self.open(Overlay::Hecho(HechoDialog::new()));
        }
    }

    // ========================================================================
    // Rule table
    // ========================================================================

    pub fn selected_row(&self) -> Option<&RuleRow> {
        self.rules.rows().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let len = self.rules.rows().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.rules.rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn push_filter_char(&mut self, c: char) {
        let mut filter = self.rules.filter().to_string();
        filter.push(c);
        self.rules.set_filter(filter);
        self.selected = 0;
    }

    pub fn pop_filter_char(&mut self) {
        let mut filter = self.rules.filter().to_string();
        filter.pop();
        self.rules.set_filter(filter);
        self.selected = 0;
    }

    pub fn clear_filter(&mut self) {
        self.rules.set_filter("");
        self.selected = 0;
    }

    // ========================================================================
    // Forms
    // ========================================================================

    /// Number of focusable fields (the submit button included).
    pub fn field_count(&self) -> usize {
        match &self.overlay {
            Some(Overlay::Rule(_)) => 5,
            Some(Overlay::Factor(_)) => 3,
            Some(Overlay::Hecho(_)) => 2,
            Some(Overlay::Help) | Some(Overlay::Delete(_)) => 1,
            None => match self.screen {
                Screen::Login => 3,
                Screen::Register => 5,
                Screen::CreateRule => 5,
                Screen::Rules => 1,
            },
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    pub fn focus_prev(&mut self) {
        let count = self.field_count();
        self.focus = (self.focus + count - 1) % count;
    }

    /// The text field under focus, if the focused field is free text.
    fn text_field_mut(&mut self) -> Option<&mut String> {
        let focus = self.focus;
        match &mut self.overlay {
            Some(Overlay::Rule(d)) => return (focus == 3).then_some(&mut d.valor),
            Some(Overlay::Factor(d)) => {
                return match focus {
                    0 => Some(&mut d.nombre),
                    1 => Some(&mut d.categoria),
                    _ => None,
                }
            }
            Some(Overlay::Hecho(d)) => return (focus == 0).then_some(&mut d.descripcion),
            Some(_) => return None,
            None => {}
        }
        match self.screen {
            Screen::Login => match focus {
                0 => Some(&mut self.login.form.email),
                1 => Some(&mut self.login.form.password),
                _ => None,
            },
            Screen::Register => {
                let form = &mut self.register.form;
                match focus {
                    0 => Some(&mut form.name),
                    1 => Some(&mut form.email),
                    2 => Some(&mut form.password),
                    3 => Some(&mut form.confirm),
                    _ => None,
                }
            }
            Screen::CreateRule => (focus == 3).then_some(&mut self.quick.valor),
            Screen::Rules => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(field) = self.text_field_mut() {
            field.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.text_field_mut() {
            field.pop();
        }
    }

    /// Step the focused selection control.
    pub fn cycle(&mut self, forward: bool) {
        let focus = self.focus;
        if let Some(Overlay::Rule(dialog)) = &mut self.overlay {
            match focus {
                0 => dialog.cycle_factor(forward),
                1 => dialog.cycle_hecho(forward),
                2 => dialog.operador = cycle_dialog_operator(&dialog.operador, forward),
                _ => {}
            }
            return;
        }
        if self.overlay.is_none() && self.screen == Screen::CreateRule {
            match focus {
                0 => {
                    self.quick.factor_id =
                        cycle_option(self.reference.factor_options(), self.quick.factor_id, forward)
                }
                1 => {
                    self.quick.hecho_id =
                        cycle_option(self.reference.hecho_options(), self.quick.hecho_id, forward)
                }
                2 => {
                    self.quick.operador = if forward {
                        self.quick.operador.next()
                    } else {
                        self.quick.operador.prev()
                    }
                }
                _ => {}
            }
        }
    }

    /// Submit the current form or dialog. Returns the backend work to do.
    pub fn submit(&mut self) -> Option<PendingAction> {
        match &self.overlay {
            Some(Overlay::Rule(_)) => return Some(PendingAction::SaveRule),
            Some(Overlay::Delete(_)) => return Some(PendingAction::DeleteRule),
            Some(Overlay::Factor(_)) => return Some(PendingAction::CreateFactor),
            Some(Overlay::Hecho(_)) => return Some(PendingAction::CreateHecho),
            Some(Overlay::Help) => {
                self.close_overlay();
                return None;
            }
            None => {}
        }
        match self.screen {
            Screen::Login if self.redirect.is_none() => {
                self.login.begin_submit().map(PendingAction::Login)
            }
            Screen::Register => self.register.begin_submit().map(PendingAction::Register),
            Screen::CreateRule => Some(PendingAction::QuickCreate),
            _ => None,
        }
    }

    // ========================================================================
    // Backend work
    // ========================================================================

    /// Await one pending action against `backend` and apply the outcome.
    pub async fn perform<B: RulesBackend + ?Sized>(&mut self, action: PendingAction, backend: &B) {
        debug!(?action, "performing");
        self.busy = true;
        match action {
            PendingAction::Login(credentials) => {
                let result = authenticate(backend, &credentials).await;
                if let Some(redirect) = self.login.finish_submit(result) {
                    self.redirect = Some(PendingRedirect {
                        due: Instant::now() + redirect.delay,
                        redirect,
                    });
                }
            }
            PendingAction::Register(registration) => {
                let result = backend.register(&registration).await;
                if self.register.finish_submit(result) {
                    self.focus = 0;
                }
            }
            PendingAction::LoadScreen => {
                if self.rules.variant() == ListVariant::Joined
                    && self.reference.load(backend).await
                {
                    self.rules.load_with(backend, self.reference.data()).await;
                } else {
                    self.rules.load(backend).await;
                }
                self.clamp_selection();
            }
            PendingAction::SaveRule => {
                let result = match &mut self.overlay {
                    Some(Overlay::Rule(dialog)) => dialog.confirm(backend, &mut self.rules).await,
                    _ => return self.done(),
                };
                if let Ok(message) = result {
                    self.close_overlay();
                    self.banner = Some(Banner::success(message));
                    self.clamp_selection();
                }
            }
            PendingAction::DeleteRule => {
                let result = match &mut self.overlay {
                    Some(Overlay::Delete(dialog)) => dialog.confirm(backend, &mut self.rules).await,
                    _ => return self.done(),
                };
                if let Ok(message) = result {
                    self.close_overlay();
                    self.banner = Some(Banner::success(message));
                    self.clamp_selection();
                }
            }
            PendingAction::CreateFactor => {
                let result = match &mut self.overlay {
                    Some(Overlay::Factor(dialog)) => dialog.confirm(backend).await,
                    _ => return self.done(),
                };
                if let Ok(factor) = result {
                    self.close_overlay();
                    self.reference.load(backend).await;
                    self.quick.factor_id = Some(factor.id);
                    self.banner = Some(Banner::success("Factor creado."));
                }
            }
            PendingAction::CreateHecho => {
                let result = match &mut self.overlay {
                    Some(Overlay::Hecho(dialog)) => dialog.confirm(backend).await,
                    _ => return self.done(),
                };
                if let Ok(hecho) = result {
                    self.close_overlay();
                    self.reference.load(backend).await;
                    self.quick.hecho_id = Some(hecho.id);
                    self.banner = Some(Banner::success("Hecho creado."));
                }
            }
            PendingAction::QuickCreate => {
                self.quick.submit(backend).await;
            }
        }
        self.done();
    }

    fn done(&mut self) {
        self.busy = false;
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reglas_core::testing::rejection;
    use reglas_core::{BannerKind, Endpoint, Factor, Hecho, LoginResponse, MockBackend, Regla};
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::default().with_redirect_delay(Duration::from_millis(0))
    }

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_factores(vec![Factor {
                id: 1,
                nombre: "Ingreso".into(),
                categoria: "finanzas".into(),
            }])
            .with_hechos(vec![Hecho {
                id: 2,
                descripcion: "Aprobar".into(),
            }])
            .with_reglas(vec![Regla {
                id: 3,
                factor_id: 1,
                hecho_id: 2,
                operador: ">=".into(),
                valor: "1000".into(),
                factor: None,
                hecho: None,
            }])
    }

    async fn logged_in(backend: &MockBackend) -> App {
        let mut app = App::new(&config());
        app.login.form.email = "ana@example.com".into();
        app.login.form.password = "secreto".into();
        let action = app.submit().unwrap();
        assert!(app.login.button.is_disabled());
        app.perform(action, backend).await;
        let load = app.tick(Instant::now()).unwrap();
        app.perform(load, backend).await;
        app
    }

    #[tokio::test]
    async fn test_admin_login_lands_on_joined_list() {
        let backend = backend();
        let app = logged_in(&backend).await;

        assert_eq!(app.screen, Screen::Rules);
        assert!(app.is_admin());
        assert!(app.rules.has_actions());
        assert_eq!(app.rules.rows()[0].factor, "Ingreso");
        assert_eq!(app.reference.factor_options().len(), 2);
        assert!(app.login.form.email.is_empty());
    }

    #[tokio::test]
    async fn test_reload_fetches_lookups_once() {
        let backend = backend();
        let mut app = logged_in(&backend).await;
        let before = backend.calls_to(Endpoint::ListFactores).len();

        app.perform(PendingAction::LoadScreen, &backend).await;

        assert_eq!(backend.calls_to(Endpoint::ListFactores).len(), before + 1);
        assert_eq!(backend.calls_to(Endpoint::ListHechos).len(), before + 1);
        assert_eq!(app.rules.rows()[0].hecho, "Aprobar");
    }

    #[tokio::test]
    async fn test_user_login_lands_on_plain_list() {
        let backend = backend().with_user_login(LoginResponse {
            name: Some("Ana".into()),
            ..LoginResponse::default()
        });
        backend.fail(Endpoint::EmployeeLogin, rejection(401, "No autorizado"));
        let mut app = logged_in(&backend).await;

        assert!(!app.is_admin());
        assert!(!app.rules.has_actions());
        app.open_delete_dialog();
        assert!(!app.has_overlay());
        assert_eq!(app.status_message(), Some(READ_ONLY));
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let backend = backend();
        let mut app = logged_in(&backend).await;

        app.logout();

        assert_eq!(app.screen, Screen::Login);
        assert!(app.session.is_none());
        let banner = app.login.banner.as_ref().unwrap();
        assert_eq!(banner.kind, BannerKind::Info);
        assert_eq!(banner.message, "Sesión cerrada.");
    }

    #[tokio::test]
    async fn test_redirect_waits_for_delay() {
        let backend = backend();
        let config = ClientConfig::default().with_redirect_delay(Duration::from_secs(60));
        let mut app = App::new(&config);
        app.login.form.email = "ana@example.com".into();
        app.login.form.password = "secreto".into();
        let action = app.submit().unwrap();
        app.perform(action, &backend).await;

        assert!(app.tick(Instant::now()).is_none());
        assert_eq!(app.screen, Screen::Login);
        assert!(app.login.banner.as_ref().unwrap().message.starts_with("✅ Bienvenido"));
    }

    #[tokio::test]
    async fn test_delete_flow_through_overlay() {
        let backend = backend();
        let mut app = logged_in(&backend).await;

        app.open_delete_dialog();
        let action = app.submit().unwrap();
        assert_eq!(action, PendingAction::DeleteRule);
        app.perform(action, &backend).await;

        assert!(!app.has_overlay());
        assert!(app.rules.rows().is_empty());
        assert_eq!(app.banner.as_ref().unwrap().message, "Regla #3 eliminada.");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_overlay() {
        let backend = backend();
        backend.fail(Endpoint::DeleteRegla, rejection(500, "Error interno"));
        let mut app = logged_in(&backend).await;

        app.open_delete_dialog();
        app.perform(PendingAction::DeleteRule, &backend).await;

        match app.overlay() {
            Some(Overlay::Delete(dialog)) => {
                assert_eq!(dialog.error.as_deref(), Some("Error interno"))
            }
            other => panic!("expected delete dialog, got {other:?}"),
        }
        assert!(app.rules.contains(3));
    }

    #[tokio::test]
    async fn test_new_factor_is_preselected() {
        let backend = backend();
        let mut app = logged_in(&backend).await;
        app.go_to(Screen::CreateRule);

        app.open_factor_dialog();
        for c in "Deuda".chars() {
            app.input_char(c);
        }
        app.focus_next();
        for c in "finanzas".chars() {
            app.input_char(c);
        }
        app.perform(PendingAction::CreateFactor, &backend).await;

        assert!(!app.has_overlay());
        let id = app.quick.factor_id.unwrap();
        assert_eq!(app.reference.data().factor(id).unwrap().nombre, "Deuda");
        assert_eq!(app.banner.as_ref().unwrap().message, "Factor creado.");
    }

    #[tokio::test]
    async fn test_filter_typing_resets_selection() {
        let backend = backend();
        let mut app = logged_in(&backend).await;

        app.push_filter_char('z');
        assert!(app.rules.rows().is_empty());
        app.pop_filter_char();
        assert_eq!(app.rules.rows().len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_cycle_option_includes_placeholder() {
        let options = reglas_core::reference::factor_options(&[Factor {
            id: 4,
            nombre: "Edad".into(),
            categoria: "x".into(),
        }]);
        assert_eq!(cycle_option(&options, None, true), Some(4));
        assert_eq!(cycle_option(&options, Some(4), true), None);
        assert_eq!(option_label(&options, Some(4)), "Edad");
    }

    #[test]
    fn test_dialog_operator_skips_range() {
        assert_eq!(cycle_dialog_operator("=", true), "<=");
        assert_eq!(cycle_dialog_operator(">=", true), "=");
        assert_eq!(cycle_dialog_operator("=", false), ">=");
    }
}
