//! Contract with the banking backend.
//!
//! Transport is left to the implementor. Every method receives the current
//! session credential, if any, to attach as a bearer token.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::loans::validation::RegistrationRequest;
use crate::types::{AccountRecord, Credential, Identity, LoanRecord, LoanRequest};

pub mod fixture;

pub use fixture::{FixtureBackend, FixtureCustomer, FixtureData};

/// How a backend call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request was understood and refused (bad credentials, duplicate
    /// login id, unknown account). Carries the backend's message.
    #[error("{0}")]
    Rejected(String),

    /// The credential was missing, unknown or revoked.
    #[error("credential rejected by backend")]
    Unauthorized,

    /// Network or server failure.
    #[error("backend unavailable: {0}")]
    Transient(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Successful login: the issued credential and the customer's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "bearerToken")]
    pub token: Credential,
    #[serde(alias = "customerDetails")]
    pub customer: Identity,
}

pub trait BackendApi {
    fn login(
        &self,
        bearer: Option<&Credential>,
        login_id: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<LoginResponse>>;

    fn register(
        &self,
        bearer: Option<&Credential>,
        request: &RegistrationRequest,
    ) -> impl Future<Output = ApiResult<()>>;

    fn get_account(
        &self,
        bearer: Option<&Credential>,
        customer_id: &str,
    ) -> impl Future<Output = ApiResult<AccountRecord>>;

    fn get_loans(
        &self,
        bearer: Option<&Credential>,
        customer_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<LoanRecord>>>;

    fn apply_loan(
        &self,
        bearer: Option<&Credential>,
        customer_id: &str,
        request: &LoanRequest,
    ) -> impl Future<Output = ApiResult<LoanRecord>>;
}

/// Decode an account response, bare or wrapped as `{"account": {...}}`.
pub fn parse_account_response(value: Value) -> ApiResult<AccountRecord> {
    let value = match value {
        Value::Object(mut map) if map.get("account").is_some_and(Value::is_object) => {
            map.remove("account").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| ApiError::Transient(format!("unexpected account response: {e}")))
}

/// Decode a loans response: an array, `{"loans": [...]}`, or null for none.
pub fn parse_loans_response(value: Value) -> ApiResult<Vec<LoanRecord>> {
    let value = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) if map.contains_key("loans") => {
            map.remove("loans").unwrap_or(Value::Null)
        }
        other => other,
    };
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::Transient(format!("unexpected loans response: {e}")))
}
