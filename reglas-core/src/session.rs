//! Login and registration form controllers.
//!
//! Both controllers follow the same submit cycle:
//!
//! 1. `begin_submit` runs client-side validation. On failure it sets a
//!    warning banner and returns `None`; otherwise it disables the submit
//!    button and returns the request to send.
//! 2. The caller performs the backend call (and may redraw meanwhile).
//! 3. `finish_submit` turns the outcome into a banner and always restores
//!    the submit button.
//!
//! `submit` runs the whole cycle in one call.

use std::time::Duration;

use reglas_api::{Credentials, LoginResponse, Registration};
use tracing::{debug, info, warn};

use crate::backend::RulesBackend;
use crate::banner::Banner;
use crate::ApiError;

const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
const DEFAULT_DISPLAY_NAME: &str = "usuario";

/// Where a successful login lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// CRUD-capable rule management.
    Admin,
    /// Read-only rule listing.
    User,
}

impl Landing {
    pub fn path(self) -> &'static str {
        match self {
            Landing::Admin => "/admin",
            Landing::User => "/home",
        }
    }
}

/// An authenticated user as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub display_name: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl Session {
    fn from_response(response: &LoginResponse, is_admin: bool) -> Self {
        Self {
            display_name: response
                .display_name()
                .unwrap_or(DEFAULT_DISPLAY_NAME)
                .to_string(),
            email: response.email.clone(),
            is_admin,
        }
    }
}

/// Result of [`authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Admin(Session),
    User(Session),
    /// The server rejected the credentials; holds the text to show.
    Failure(String),
}

/// Log in, trying the employee endpoint first.
///
/// A 401 from the employee endpoint falls through to the standard user
/// login. An employee response is admin unless it says `es_admin: false`;
/// the user path is never admin. Server rejections become
/// [`AuthOutcome::Failure`]; transport and decoding problems are returned
/// as errors.
pub async fn authenticate<B>(backend: &B, credentials: &Credentials) -> Result<AuthOutcome, ApiError>
where
    B: RulesBackend + ?Sized,
{
    match backend.employee_login(credentials).await {
        Ok(response) => {
            let is_admin = response.es_admin != Some(false);
            let session = Session::from_response(&response, is_admin);
            debug!(is_admin, "employee login accepted");
            Ok(if is_admin {
                AuthOutcome::Admin(session)
            } else {
                AuthOutcome::User(session)
            })
        }
        Err(err) if err.is_unauthorized() => {
            debug!("employee login rejected, trying user login");
            match backend.user_login(credentials).await {
                Ok(response) => Ok(AuthOutcome::User(Session::from_response(&response, false))),
                Err(err) => rejection(err),
            }
        }
        Err(err) => rejection(err),
    }
}

fn rejection(err: ApiError) -> Result<AuthOutcome, ApiError> {
    if !matches!(err, ApiError::Api { .. }) {
        return Err(err);
    }
    let text = err
        .detail()
        .or_else(|| err.reason())
        .unwrap_or(INVALID_CREDENTIALS);
    Ok(AuthOutcome::Failure(text.to_string()))
}

/// Submit control state around an async call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    label: String,
    idle_label: String,
    disabled: bool,
}

impl SubmitButton {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            idle_label: label.clone(),
            label,
            disabled: false,
        }
    }

    /// Disable and show `busy_label`.
    pub fn begin(&mut self, busy_label: &str) {
        self.disabled = true;
        self.label = busy_label.to_string();
    }

    /// Re-enable with the original label.
    pub fn restore(&mut self) {
        self.disabled = false;
        self.label = self.idle_label.clone();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((user, domain)) => !user.is_empty() && !domain.is_empty() && !value.contains(' '),
        None => false,
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Required fields present and the email well formed.
    pub fn is_valid(&self) -> bool {
        looks_like_email(&self.email) && !self.password.is_empty()
    }
}

/// Redirect scheduled after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub landing: Landing,
    pub delay: Duration,
    pub session: Session,
}

pub struct LoginController {
    pub form: LoginForm,
    pub button: SubmitButton,
    pub banner: Option<Banner>,
    redirect_delay: Duration,
}

impl LoginController {
    pub fn new(redirect_delay: Duration) -> Self {
        Self {
            form: LoginForm::default(),
            button: SubmitButton::new("Ingresar"),
            banner: None,
            redirect_delay,
        }
    }

    /// Validate and lock the form. Returns the credentials to send.
    pub fn begin_submit(&mut self) -> Option<Credentials> {
        if !self.form.is_valid() {
            self.banner = Some(Banner::warning("Por favor completa los campos requeridos."));
            return None;
        }
        self.button.begin("Ingresando…");
        Some(Credentials::new(self.form.email.trim(), self.form.password.clone()))
    }

    /// Apply the authentication outcome. Returns the redirect on success.
    pub fn finish_submit(&mut self, result: Result<AuthOutcome, ApiError>) -> Option<Redirect> {
        self.button.restore();

        match result {
            Ok(AuthOutcome::Admin(session)) => Some(self.welcome(session, Landing::Admin)),
            Ok(AuthOutcome::User(session)) => Some(self.welcome(session, Landing::User)),
            Ok(AuthOutcome::Failure(text)) => {
                self.banner = Some(Banner::danger(text));
                None
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.banner = Some(Banner::unreachable());
                None
            }
        }
    }

    fn welcome(&mut self, session: Session, landing: Landing) -> Redirect {
        info!(user = %session.display_name, ?landing, "login succeeded");
        self.banner = Some(Banner::success(format!(
            "✅ Bienvenido, {}",
            session.display_name
        )));
        Redirect {
            landing,
            delay: self.redirect_delay,
            session,
        }
    }

    pub async fn submit<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> Option<Redirect> {
        let credentials = self.begin_submit()?;
        let result = authenticate(backend, &credentials).await;
        self.finish_submit(result)
    }

    pub fn reset(&mut self) {
        self.form = LoginForm::default();
        self.button.restore();
        self.banner = None;
    }
}

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl RegisterForm {
    /// Custom validity of the confirmation field: `Some("Mismatch")` when it
    /// differs from the password.
    pub fn confirm_validity(&self) -> Option<&'static str> {
        (self.confirm != self.password).then_some("Mismatch")
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
            && looks_like_email(&self.email)
            && !self.password.is_empty()
            && !self.confirm.is_empty()
            && self.confirm_validity().is_none()
    }
}

pub struct RegisterController {
    pub form: RegisterForm,
    pub button: SubmitButton,
    pub banner: Option<Banner>,
    /// Set after a failed validation so the form highlights its fields.
    pub was_validated: bool,
}

impl Default for RegisterController {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterController {
    pub fn new() -> Self {
        Self {
            form: RegisterForm::default(),
            button: SubmitButton::new("Crear cuenta"),
            banner: None,
            was_validated: false,
        }
    }

    pub fn begin_submit(&mut self) -> Option<Registration> {
        if !self.form.is_valid() {
            self.was_validated = true;
            self.banner = Some(Banner::warning("Revisa los campos resaltados."));
            return None;
        }
        self.button.begin("Creando…");
        Some(Registration {
            name: self.form.name.trim().to_string(),
            email: self.form.email.trim().to_string(),
            password: self.form.password.clone(),
        })
    }

    /// Apply the registration outcome. Returns true on success.
    pub fn finish_submit(&mut self, result: Result<LoginResponse, ApiError>) -> bool {
        self.button.restore();

        match result {
            Ok(response) => {
                let name = response
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| self.form.name.trim().to_string());
                info!(user = %name, "account created");
                self.banner = Some(Banner::success(format!(
                    "✅ Cuenta creada para {name}. Ya puedes iniciar sesión."
                )));
                self.form = RegisterForm::default();
                self.was_validated = false;
                true
            }
            Err(err @ ApiError::Api { .. }) => {
                let text = err
                    .detail_or_unknown()
                    .unwrap_or("No se pudo crear el usuario.");
                self.banner = Some(Banner::danger(format!("❌ {text}")));
                false
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.banner = Some(Banner::unreachable());
                false
            }
        }
    }

    pub async fn submit<B: RulesBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let Some(registration) = self.begin_submit() else {
            return false;
        };
        let result = backend.register(&registration).await;
        self.finish_submit(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_button_cycle() {
        let mut button = SubmitButton::new("Ingresar");
        button.begin("Ingresando…");
        assert!(button.is_disabled());
        assert_eq!(button.label(), "Ingresando…");
        button.restore();
        assert!(!button.is_disabled());
        assert_eq!(button.label(), "Ingresar");
    }

    #[test]
    fn test_login_form_validation() {
        let mut form = LoginForm::default();
        assert!(!form.is_valid());
        form.email = "ana@example.com".into();
        assert!(!form.is_valid());
        form.password = "secreto".into();
        assert!(form.is_valid());
        form.email = "ana".into();
        assert!(!form.is_valid());
    }

    #[test]
    fn test_invalid_login_sets_warning() {
        let mut controller = LoginController::new(Duration::from_millis(800));
        assert!(controller.begin_submit().is_none());
        assert_eq!(
            controller.banner,
            Some(Banner::warning("Por favor completa los campos requeridos."))
        );
        assert!(!controller.button.is_disabled());
    }

    #[test]
    fn test_confirm_validity() {
        let mut form = RegisterForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "abc123".into(),
            confirm: "abc124".into(),
        };
        assert_eq!(form.confirm_validity(), Some("Mismatch"));
        assert!(!form.is_valid());
        form.confirm = "abc123".into();
        assert_eq!(form.confirm_validity(), None);
        assert!(form.is_valid());
    }

    #[test]
    fn test_network_error_restores_button() {
        let mut controller = LoginController::new(Duration::from_millis(800));
        controller.form.email = "ana@example.com".into();
        controller.form.password = "x".into();
        assert!(controller.begin_submit().is_some());
        assert!(controller.button.is_disabled());

        let redirect =
            controller.finish_submit(Err(ApiError::Network("connection refused".into())));
        assert!(redirect.is_none());
        assert!(!controller.button.is_disabled());
        assert_eq!(controller.banner, Some(Banner::unreachable()));
    }

    #[test]
    fn test_landing_paths() {
        assert_eq!(Landing::Admin.path(), "/admin");
        assert_eq!(Landing::User.path(), "/home");
    }
}
