//! Minimal client for the Reglas rule-management API.
//!
//! This crate provides a focused client for the backend the rule screens talk to:
//! - Factor and fact lookup lists (`/factores/`, `/hechos/`)
//! - Rule CRUD (`/reglas/`)
//! - Form-encoded employee/user login and registration
//!
//! Error responses are decoded into [`Error::Api`], keeping the server's
//! `detail` text when the body is JSON.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_REGISTER_PATH: &str = "/register";

/// Label used when an error response carries no JSON body.
pub const UNKNOWN_ERROR: &str = "Error desconocido";

/// Errors that can occur when using the Reglas client.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {body}")]
    Api {
        status: u16,
        /// Canonical reason phrase for the status, if any.
        reason: Option<String>,
        /// `detail` field of a JSON error body.
        detail: Option<String>,
        /// Whether the error body was served as JSON.
        json: bool,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// The server-supplied `detail` text, if the error body had one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Detail text, or [`UNKNOWN_ERROR`] when the body was not JSON.
    ///
    /// Returns `None` for a JSON body without a `detail` field so callers can
    /// substitute their own generic message.
    pub fn detail_or_unknown(&self) -> Option<&str> {
        match self {
            Error::Api {
                detail: Some(d), ..
            } => Some(d.as_str()),
            Error::Api { json: false, .. } => Some(UNKNOWN_ERROR),
            _ => None,
        }
    }

    /// Raw body text of a server rejection.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Canonical reason phrase ("Unauthorized", "Not Found", ...).
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::Api { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

/// Reglas API client.
#[derive(Clone)]
pub struct ReglasApi {
    client: reqwest::Client,
    base_url: String,
    register_path: String,
}

impl ReglasApi {
    /// Create a client for the API served at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            register_path: DEFAULT_REGISTER_PATH.to_string(),
        })
    }

    /// Override the path registration forms are posted to.
    pub fn with_register_path(mut self, path: impl Into<String>) -> Self {
        self.register_path = path.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    // ------------------------------------------------------------------
    // Lookup lists
    // ------------------------------------------------------------------

    pub async fn list_factores(&self) -> Result<Vec<Factor>, Error> {
        self.send_json(self.client.get(self.url("/factores/"))).await
    }

    pub async fn create_factor(&self, factor: &NewFactor) -> Result<Factor, Error> {
        self.send_json(self.client.post(self.url("/factores/")).json(factor))
            .await
    }

    pub async fn list_hechos(&self) -> Result<Vec<Hecho>, Error> {
        self.send_json(self.client.get(self.url("/hechos/"))).await
    }

    pub async fn create_hecho(&self, hecho: &NewHecho) -> Result<Hecho, Error> {
        self.send_json(self.client.post(self.url("/hechos/")).json(hecho))
            .await
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    pub async fn list_reglas(&self) -> Result<Vec<Regla>, Error> {
        self.send_json(self.client.get(self.url("/reglas/"))).await
    }

    pub async fn get_regla(&self, id: i64) -> Result<Regla, Error> {
        self.send_json(self.client.get(self.url(&format!("/reglas/{id}"))))
            .await
    }

    pub async fn create_regla(&self, regla: &ReglaPayload) -> Result<Regla, Error> {
        self.send_json(self.client.post(self.url("/reglas/")).json(regla))
            .await
    }

    pub async fn update_regla(&self, id: i64, regla: &ReglaPayload) -> Result<Regla, Error> {
        self.send_json(
            self.client
                .put(self.url(&format!("/reglas/{id}")))
                .json(regla),
        )
        .await
    }

    /// Delete a rule. The response body is ignored.
    pub async fn delete_regla(&self, id: i64) -> Result<(), Error> {
        self.send(self.client.delete(self.url(&format!("/reglas/{id}"))))
            .await
            .map(|_| ())
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Post credentials to the employee (admin) login endpoint.
    pub async fn employee_login(&self, credentials: &Credentials) -> Result<LoginResponse, Error> {
        self.send_form(self.url("/empleado/login"), credentials.to_form())
            .await
    }

    /// Post credentials to the standard user login endpoint.
    pub async fn user_login(&self, credentials: &Credentials) -> Result<LoginResponse, Error> {
        self.send_form(self.url("/login"), credentials.to_form())
            .await
    }

    pub async fn register(&self, registration: &Registration) -> Result<LoginResponse, Error> {
        self.send_form(self.url(&self.register_path), registration.to_form())
            .await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, Error> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "api response");

        if status.is_success() {
            return Ok(response);
        }

        let json = is_json(&response);
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, json, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, Error> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }

    /// Post a multipart form. A successful response without a JSON body
    /// decodes to `T::default()`.
    async fn send_form<T>(&self, url: String, form: Form) -> Result<T, Error>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.send(self.client.post(url).multipart(form)).await?;
        if !is_json(&response) {
            return Ok(T::default());
        }
        response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https://, got '{raw}'"
        )));
    }
    Ok(trimmed.to_string())
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

/// Build an [`Error::Api`] from a rejected response.
fn api_error(status: StatusCode, json: bool, body: String) -> Error {
    let detail = if json {
        serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Null) | None => None,
                // FastAPI validation errors carry a list of problems
                Some(other) => Some(other.to_string()),
            })
    } else {
        None
    };

    Error::Api {
        status: status.as_u16(),
        reason: status.canonical_reason().map(str::to_string),
        detail,
        json,
        body,
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Public types
// ============================================================================

/// A measurable input dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombre: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categoria: String,
}

/// An assertion a rule can conclude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hecho {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descripcion: String,
}

/// A rule binding a factor to a fact via an operator and value.
///
/// `factor` and `hecho` are display names, present only when the server
/// (or the client-side join) supplies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regla {
    pub id: i64,
    pub factor_id: i64,
    pub hecho_id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub operador: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub valor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hecho: Option<String>,
}

/// Body of `POST /reglas/` and `PUT /reglas/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReglaPayload {
    pub factor_id: i64,
    pub hecho_id: i64,
    pub operador: String,
    pub valor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFactor {
    pub nombre: String,
    pub categoria: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewHecho {
    pub descripcion: String,
}

/// Login form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn to_form(&self) -> Form {
        Form::new()
            .text("email", self.email.clone())
            .text("password", self.password.clone())
    }
}

/// Registration form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    fn to_form(&self) -> Form {
        Form::new()
            .text("name", self.name.clone())
            .text("email", self.email.clone())
            .text("password", self.password.clone())
    }
}

/// Successful login or registration response. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub es_admin: Option<bool>,
}

impl LoginResponse {
    /// First non-empty of `name`, `nombre`, `email`.
    pub fn display_name(&self) -> Option<&str> {
        [&self.name, &self.nombre, &self.email]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReglasApi::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/reglas/5"), "http://localhost:8000/reglas/5");
        assert_eq!(client.url("hechos/"), "http://localhost:8000/hechos/");
    }

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(matches!(
            ReglasApi::new("localhost:8000"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_register_path_override() {
        let client = ReglasApi::new("https://api.example.com")
            .unwrap()
            .with_register_path("/users-form");
        assert_eq!(client.url(&client.register_path), "https://api.example.com/users-form");
    }

    #[test]
    fn test_api_error_with_json_detail() {
        let err = api_error(
            StatusCode::UNAUTHORIZED,
            true,
            r#"{"detail":"Credenciales inválidas"}"#.to_string(),
        );
        assert!(err.is_unauthorized());
        assert_eq!(err.detail(), Some("Credenciales inválidas"));
        assert_eq!(err.reason(), Some("Unauthorized"));
    }

    #[test]
    fn test_api_error_without_json() {
        let err = api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            false,
            "Internal Server Error".to_string(),
        );
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.detail(), None);
        assert_eq!(err.detail_or_unknown(), Some(UNKNOWN_ERROR));
        assert_eq!(err.body(), Some("Internal Server Error"));
    }

    #[test]
    fn test_api_error_json_without_detail() {
        let err = api_error(StatusCode::BAD_REQUEST, true, "{}".to_string());
        assert_eq!(err.detail_or_unknown(), None);
    }

    #[test]
    fn test_api_error_structured_detail() {
        let err = api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            true,
            r#"{"detail":[{"loc":["body","valor"],"msg":"field required"}]}"#.to_string(),
        );
        assert!(err.detail().unwrap().contains("field required"));
    }

    #[test]
    fn test_regla_tolerates_nulls() {
        let regla: Regla = serde_json::from_str(
            r#"{"id":3,"factor_id":1,"hecho_id":2,"operador":null,"valor":"100"}"#,
        )
        .unwrap();
        assert_eq!(regla.operador, "");
        assert_eq!(regla.valor, "100");
        assert!(regla.factor.is_none());
    }

    #[test]
    fn test_payload_serialization() {
        let payload = ReglaPayload {
            factor_id: 1,
            hecho_id: 2,
            operador: "<=".to_string(),
            valor: "1000".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["factor_id"], 1);
        assert_eq!(json["operador"], "<=");
    }

    #[test]
    fn test_display_name_precedence() {
        let response = LoginResponse {
            name: Some(String::new()),
            nombre: Some("Ana".to_string()),
            email: Some("ana@example.com".to_string()),
            es_admin: None,
        };
        assert_eq!(response.display_name(), Some("Ana"));
        assert_eq!(LoginResponse::default().display_name(), None);
    }
}
