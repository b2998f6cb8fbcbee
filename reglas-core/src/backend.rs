//! The backend seam the view controllers call through.

use async_trait::async_trait;
use reglas_api::{
    Credentials, Factor, Hecho, LoginResponse, NewFactor, NewHecho, Regla, ReglaPayload,
    ReglasApi, Registration,
};

use crate::ApiError;

/// Every backend call the screens make.
///
/// Implemented by [`ReglasApi`] for real use and by
/// [`MockBackend`](crate::testing::MockBackend) in tests.
#[async_trait]
pub trait RulesBackend: Send + Sync {
    async fn list_factores(&self) -> Result<Vec<Factor>, ApiError>;

    async fn create_factor(&self, factor: &NewFactor) -> Result<Factor, ApiError>;

    async fn list_hechos(&self) -> Result<Vec<Hecho>, ApiError>;

    async fn create_hecho(&self, hecho: &NewHecho) -> Result<Hecho, ApiError>;

    async fn list_reglas(&self) -> Result<Vec<Regla>, ApiError>;

    async fn get_regla(&self, id: i64) -> Result<Regla, ApiError>;

    async fn create_regla(&self, regla: &ReglaPayload) -> Result<Regla, ApiError>;

    async fn update_regla(&self, id: i64, regla: &ReglaPayload) -> Result<Regla, ApiError>;

    async fn delete_regla(&self, id: i64) -> Result<(), ApiError>;

    async fn employee_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn user_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<LoginResponse, ApiError>;
}

#[async_trait]
impl RulesBackend for ReglasApi {
    async fn list_factores(&self) -> Result<Vec<Factor>, ApiError> {
        ReglasApi::list_factores(self).await
    }

    async fn create_factor(&self, factor: &NewFactor) -> Result<Factor, ApiError> {
        ReglasApi::create_factor(self, factor).await
    }

    async fn list_hechos(&self) -> Result<Vec<Hecho>, ApiError> {
        ReglasApi::list_hechos(self).await
    }

    async fn create_hecho(&self, hecho: &NewHecho) -> Result<Hecho, ApiError> {
        ReglasApi::create_hecho(self, hecho).await
    }

    async fn list_reglas(&self) -> Result<Vec<Regla>, ApiError> {
        ReglasApi::list_reglas(self).await
    }

    async fn get_regla(&self, id: i64) -> Result<Regla, ApiError> {
        ReglasApi::get_regla(self, id).await
    }

    async fn create_regla(&self, regla: &ReglaPayload) -> Result<Regla, ApiError> {
        ReglasApi::create_regla(self, regla).await
    }

    async fn update_regla(&self, id: i64, regla: &ReglaPayload) -> Result<Regla, ApiError> {
        ReglasApi::update_regla(self, id, regla).await
    }

    async fn delete_regla(&self, id: i64) -> Result<(), ApiError> {
        ReglasApi::delete_regla(self, id).await
    }

    async fn employee_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        ReglasApi::employee_login(self, credentials).await
    }

    async fn user_login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        ReglasApi::user_login(self, credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse, ApiError> {
        ReglasApi::register(self, registration).await
    }
}
