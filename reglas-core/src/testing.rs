//! Testing utilities for the rule screens.
//!
//! This module provides a [`MockBackend`] that serves an in-memory data set,
//! records every call it receives, and can be scripted to reject specific
//! endpoints. Use it to drive the controllers without a running API.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reglas_api::{
    Credentials, Factor, Hecho, LoginResponse, NewFactor, NewHecho, Regla, ReglaPayload,
    Registration,
};
use serde_json::{json, Value};

use crate::backend::RulesBackend;
use crate::ApiError;

/// Backend endpoints, for scripting failures and inspecting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListFactores,
    CreateFactor,
    ListHechos,
    CreateHecho,
    ListReglas,
    GetRegla,
    CreateRegla,
    UpdateRegla,
    DeleteRegla,
    EmployeeLogin,
    UserLogin,
    Register,
}

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    /// Path id for id-scoped endpoints.
    pub id: Option<i64>,
    /// Request body as JSON, form bodies included.
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    factores: Vec<Factor>,
    hechos: Vec<Hecho>,
    reglas: Vec<Regla>,
    next_id: i64,
    employee_login: LoginResponse,
    user_login: LoginResponse,
    failures: HashMap<Endpoint, ApiError>,
    calls: Vec<RecordedCall>,
}

/// An in-memory backend with scriptable failures.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

/// A JSON `{detail}` rejection.
pub fn rejection(status: u16, detail: &str) -> ApiError {
    let body = json!({ "detail": detail }).to_string();
    ApiError::Api {
        status,
        reason: canonical_reason(status),
        detail: Some(detail.to_string()),
        json: true,
        body,
    }
}

/// A rejection with a non-JSON body.
pub fn plain_rejection(status: u16, body: &str) -> ApiError {
    ApiError::Api {
        status,
        reason: canonical_reason(status),
        detail: None,
        json: false,
        body: body.to_string(),
    }
}

/// A transport failure.
pub fn unreachable() -> ApiError {
    ApiError::Network("error sending request: connection refused".to_string())
}

fn canonical_reason(status: u16) -> Option<String> {
    let reason = match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => return None,
    };
    Some(reason.to_string())
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factores(self, factores: Vec<Factor>) -> Self {
        self.lock().factores = factores;
        self.bump_next_id();
        self
    }

    pub fn with_hechos(self, hechos: Vec<Hecho>) -> Self {
        self.lock().hechos = hechos;
        self.bump_next_id();
        self
    }

    pub fn with_reglas(self, reglas: Vec<Regla>) -> Self {
        self.lock().reglas = reglas;
        self.bump_next_id();
        self
    }

    /// Response of a successful employee login.
    pub fn with_employee_login(self, response: LoginResponse) -> Self {
        self.lock().employee_login = response;
        self
    }

    /// Response of a successful user login.
    pub fn with_user_login(self, response: LoginResponse) -> Self {
        self.lock().user_login = response;
        self
    }

    /// Make `endpoint` fail with `error` until [`MockBackend::recover`].
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.lock().failures.insert(endpoint, error);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    /// Server-side rules as they stand now.
    pub fn reglas(&self) -> Vec<Regla> {
        self.lock().reglas.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump_next_id(&self) {
        let mut state = self.lock();
        let max = state
            .factores
            .iter()
            .map(|f| f.id)
            .chain(state.hechos.iter().map(|h| h.id))
            .chain(state.reglas.iter().map(|r| r.id))
            .max()
            .unwrap_or(0);
        state.next_id = state.next_id.max(max);
    }

    /// Record the call, then return the scripted failure if any.
    fn record(
        &self,
        endpoint: Endpoint,
        id: Option<i64>,
        body: Option<Value>,
    ) -> Result<MutexGuard<'_, MockState>, ApiError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall { endpoint, id, body });
        if let Some(err) = state.failures.get(&endpoint).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

fn not_found(what: &str) -> ApiError {
    rejection(404, &format!("{what} no encontrada"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

#[async_trait]
impl RulesBackend for MockBackend {
    async fn list_factores(&self) -> Result<Vec<Factor>, ApiError> {
        let state = self.record(Endpoint::ListFactores, None, None)?;
        Ok(state.factores.clone())
    }

    async fn create_factor(&self, factor: &NewFactor) -> Result<Factor, ApiError> {
        let mut state = self.record(Endpoint::CreateFactor, None, to_json(factor))?;
        state.next_id += 1;
        let created = Factor {
            id: state.next_id,
            nombre: factor.nombre.clone(),
            categoria: factor.categoria.clone(),
        };
        state.factores.push(created.clone());
        Ok(created)
    }

    async fn list_hechos(&self) -> Result<Vec<Hecho>, ApiError> {
        let state = self.record(Endpoint::ListHechos, None, None)?;
        Ok(state.hechos.clone())
    }

    async fn create_hecho(&self, hecho: &NewHecho) -> Result<Hecho, ApiError> {
        let mut state = self.record(Endpoint::CreateHecho, None, to_json(hecho))?;
        state.next_id += 1;
        let created = Hecho {
            id: state.next_id,
            descripcion: hecho.descripcion.clone(),
        };
        state.hechos.push(created.clone());
        Ok(created)
    }

    async fn list_reglas(&self) -> Result<Vec<Regla>, ApiError> {
        let state = self.record(Endpoint::ListReglas, None, None)?;
        Ok(state.reglas.clone())
    }

    async fn get_regla(&self, id: i64) -> Result<Regla, ApiError> {
        let state = self.record(Endpoint::GetRegla, Some(id), None)?;
        state
            .reglas
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("Regla"))
    }

    async fn create_regla(&self, regla: &ReglaPayload) -> Result<Regla, ApiError> {
        let mut state = self.record(Endpoint::CreateRegla, None, to_json(regla))?;
        state.next_id += 1;
        let created = Regla {
            id: state.next_id,
            factor_id: regla.factor_id,
            hecho_id: regla.hecho_id,
            operador: regla.operador.clone(),
            valor: regla.valor.clone(),
            factor: None,
            hecho: None,
        };
        state.reglas.push(created.clone());
        Ok(created)
    }

    async fn update_regla(&self, id: i64, regla: &ReglaPayload) -> Result<Regla, ApiError> {
        let mut state = self.record(Endpoint::UpdateRegla, Some(id), to_json(regla))?;
        let existing = state
            .reglas
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("Regla"))?;
        existing.factor_id = regla.factor_id;
        existing.hecho_id = regla.hecho_id;
        existing.operador = regla.operador.clone();
        existing.valor = regla.valor.clone();
        Ok(existing.clone())
    }

    async fn delete_regla(&self, id: i64) -> Result<(), ApiError> {
        let mut state = self.record(Endpoint::DeleteRegla, Some(id), None)?;
        let before = state.reglas.len();
        state.reglas.retain(|r| r.id != id);
        if state.reglas.len() == before {
            return Err(not_found("Regla"));
        }
        Ok(())
    }

    async fn employee_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = json!({ "email": credentials.email, "password": credentials.password });
        let state = self.record(Endpoint::EmployeeLogin, None, Some(body))?;
        Ok(state.employee_login.clone())
    }

    async fn user_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = json!({ "email": credentials.email, "password": credentials.password });
        let state = self.record(Endpoint::UserLogin, None, Some(body))?;
        Ok(state.user_login.clone())
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse, ApiError> {
        let body = json!({
            "name": registration.name,
            "email": registration.email,
            "password": registration.password,
        });
        drop(self.record(Endpoint::Register, None, Some(body))?);
        Ok(LoginResponse {
            name: Some(registration.name.clone()),
            email: Some(registration.email.clone()),
            ..LoginResponse::default()
        })
    }
}
