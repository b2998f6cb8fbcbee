//! Screen controllers for the Reglas rule-management client.
//!
//! This crate provides:
//! - Login with employee/user fallback and account registration
//! - Factor and fact lookups for selection controls
//! - A filterable rule list, plain or joined with factor/fact names
//! - Create, edit and delete dialogs for rules, plus factor/fact creation
//!
//! Every controller talks to the server through [`RulesBackend`], so the
//! same code drives the terminal UI, the headless mode and the tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use reglas_core::{ClientConfig, ListVariant, LoginController, RuleListView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let api = config.build_client()?;
//!
//!     let mut login = LoginController::new(config.redirect_delay);
//!     login.form.email = "ana@example.com".into();
//!     login.form.password = "secreto".into();
//!     if let Some(redirect) = login.submit(&api).await {
//!         let mut list = RuleListView::new(ListVariant::Joined);
//!         list.load(&api).await;
//!         println!("{} -> {} rules", redirect.landing.path(), list.reglas().len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod banner;
pub mod config;
pub mod dialogs;
pub mod operator;
pub mod reference;
pub mod rules_view;
pub mod session;
pub mod testing;

/// Errors surfaced by the HTTP client.
pub type ApiError = reglas_api::Error;

pub use reglas_api::{
    Credentials, Factor, Hecho, LoginResponse, NewFactor, NewHecho, Regla, ReglaPayload,
    Registration, ReglasApi,
};

// Primary public API
pub use backend::RulesBackend;
pub use banner::{describe_error, Banner, BannerKind, SERVER_UNREACHABLE};
pub use config::{ClientConfig, ConfigError};
pub use dialogs::{
    Choice, DeleteDialog, DialogMode, DialogResult, FactorDialog, HechoDialog, QuickRuleForm,
    RuleDialog,
};
pub use operator::{is_range_value, Operador, RangeEncoding};
pub use reference::{load_reference_data, ReferenceData, ReferenceLoader, SelectOption};
pub use rules_view::{ListState, ListVariant, RuleListView, RuleRow};
pub use session::{
    authenticate, AuthOutcome, Landing, LoginController, LoginForm, Redirect, RegisterController,
    RegisterForm, Session, SubmitButton,
};
pub use testing::{Endpoint, MockBackend, RecordedCall};
