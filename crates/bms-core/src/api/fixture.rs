//! In-process backend seeded from JSON.
//!
//! Reproduces the banking service's observable behaviour closely enough to
//! drive the client end to end: credential checks, duplicate login ids,
//! token revocation, and loan submission with a server-computed EMI.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult, BackendApi, LoginResponse};
use crate::error::BmsError;
use crate::loans::emi::compute_emi;
use crate::loans::validation::RegistrationRequest;
use crate::types::{AccountRecord, Credential, Identity, LoanRecord, LoanRequest, LoanStatus};
use crate::BmsResult;

/// Seed and current state of the fixture backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureData {
    pub customers: Vec<FixtureCustomer>,
    /// Tokens the backend no longer honours.
    pub revoked_tokens: Vec<String>,
    /// Last loan number handed out; new loans get `LOAN<n+1>`.
    pub loan_sequence: u64,
}

impl FixtureData {
    /// Seeds must not repeat identifiers the backend keeps unique.
    pub fn check(&self) -> BmsResult<()> {
        let mut login_ids = BTreeSet::new();
        let mut customer_ids = BTreeSet::new();
        let mut tokens = BTreeSet::new();
        for customer in &self.customers {
            if !login_ids.insert(customer.login_id.as_str()) {
                return Err(duplicate("loginId", &customer.login_id));
            }
            if !customer_ids.insert(customer.identity.customer_id.as_str()) {
                return Err(duplicate("customerId", &customer.identity.customer_id));
            }
            if !customer.token.is_empty() && !tokens.insert(customer.token.as_str()) {
                return Err(duplicate("token", "(redacted)"));
            }
        }
        Ok(())
    }
}

fn duplicate(field: &str, value: &str) -> BmsError {
    BmsError::InvalidInput {
        field: field.to_string(),
        reason: format!("duplicate value {value}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureCustomer {
    pub login_id: String,
    pub password: String,
    /// Issued on first login when empty.
    #[serde(default)]
    pub token: String,
    pub identity: Identity,
    #[serde(default)]
    pub account: Option<AccountRecord>,
    #[serde(default)]
    pub loans: Vec<LoanRecord>,
}

#[derive(Debug, Default)]
pub struct FixtureBackend {
    state: RefCell<FixtureData>,
    offline: Cell<bool>,
}

impl FixtureBackend {
    pub fn new(data: FixtureData) -> Self {
        Self {
            state: RefCell::new(data),
            offline: Cell::new(false),
        }
    }

    pub fn from_json(json: &str) -> BmsResult<Self> {
        let data: FixtureData = serde_json::from_str(json)?;
        data.check()?;
        Ok(Self::new(data))
    }

    pub fn snapshot(&self) -> FixtureData {
        self.state.borrow().clone()
    }

    /// Stop honouring `token`, as a server-side logout or expiry would.
    pub fn revoke(&self, token: &str) {
        let mut state = self.state.borrow_mut();
        if !state.revoked_tokens.iter().any(|t| t == token) {
            state.revoked_tokens.push(token.to_string());
        }
    }

    /// While offline every call fails with [`ApiError::Transient`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    fn reachable(&self) -> ApiResult<()> {
        if self.offline.get() {
            return Err(ApiError::Transient("connection refused".into()));
        }
        Ok(())
    }
}

fn authorize(data: &FixtureData, bearer: Option<&Credential>, customer_id: &str) -> ApiResult<usize> {
    let token = bearer
        .filter(|c| !c.is_empty())
        .ok_or(ApiError::Unauthorized)?;
    if data.revoked_tokens.iter().any(|t| t == token.as_str()) {
        return Err(ApiError::Unauthorized);
    }
    let index = data
        .customers
        .iter()
        .position(|c| !c.token.is_empty() && c.token == token.as_str())
        .ok_or(ApiError::Unauthorized)?;
    if data.customers[index].identity.customer_id != customer_id {
        return Err(ApiError::Rejected("Customer not found".into()));
    }
    Ok(index)
}

fn issue_token(data: &mut FixtureData, index: usize) -> String {
    let current = &data.customers[index].token;
    if !current.is_empty() && !data.revoked_tokens.contains(current) {
        return current.clone();
    }
    let token = format!(
        "tok-{}-{}",
        data.customers[index].identity.customer_id,
        data.revoked_tokens.len() + 1
    );
    data.customers[index].token = token.clone();
    token
}

fn next_customer_id(data: &FixtureData) -> String {
    let max = data
        .customers
        .iter()
        .filter_map(|c| c.identity.customer_id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

impl BackendApi for FixtureBackend {
    async fn login(
        &self,
        _bearer: Option<&Credential>,
        login_id: &str,
        password: &str,
    ) -> ApiResult<LoginResponse> {
        self.reachable()?;
        let mut state = self.state.borrow_mut();
        let index = state
            .customers
            .iter()
            .position(|c| c.login_id == login_id && c.password == password)
            .ok_or_else(|| ApiError::Rejected("Invalid credentials".into()))?;
        let token = issue_token(&mut state, index);
        tracing::debug!(login_id, "fixture login accepted");
        Ok(LoginResponse {
            token: Credential::new(token),
            customer: state.customers[index].identity.clone(),
        })
    }

    async fn register(&self, _bearer: Option<&Credential>, request: &RegistrationRequest) -> ApiResult<()> {
        self.reachable()?;
        let mut state = self.state.borrow_mut();
        if state.customers.iter().any(|c| c.login_id == request.login_id) {
            return Err(ApiError::Rejected(
                "Customer with this login ID already exists".into(),
            ));
        }

        let customer_id = next_customer_id(&state);
        let mut names = request.name.trim().splitn(2, ' ');
        let identity = Identity {
            customer_id: customer_id.clone(),
            first_name: names.next().unwrap_or_default().to_string(),
            last_name: names.next().unwrap_or_default().trim().to_string(),
            email: request.email.clone(),
            phone_number: request.phone_number.clone(),
            address: request.address.clone(),
            created_date: Some(Local::now().naive_local()),
        };
        let account = (!request.account_number.trim().is_empty()).then(|| AccountRecord {
            account_number: request.account_number.trim().to_string(),
            balance: Decimal::ZERO,
            account_type: Some(request.account_type),
            customer_id: Some(customer_id),
            active: Some(true),
        });
        state.customers.push(FixtureCustomer {
            login_id: request.login_id.clone(),
            password: request.password.clone(),
            token: String::new(),
            identity,
            account,
            loans: Vec::new(),
        });
        Ok(())
    }

    async fn get_account(&self, bearer: Option<&Credential>, customer_id: &str) -> ApiResult<AccountRecord> {
        self.reachable()?;
        let state = self.state.borrow();
        let index = authorize(&state, bearer, customer_id)?;
        state.customers[index]
            .account
            .clone()
            .ok_or_else(|| ApiError::Rejected("Account not found".into()))
    }

    async fn get_loans(&self, bearer: Option<&Credential>, customer_id: &str) -> ApiResult<Vec<LoanRecord>> {
        self.reachable()?;
        let state = self.state.borrow();
        let index = authorize(&state, bearer, customer_id)?;
        Ok(state.customers[index].loans.clone())
    }

    async fn apply_loan(
        &self,
        bearer: Option<&Credential>,
        customer_id: &str,
        request: &LoanRequest,
    ) -> ApiResult<LoanRecord> {
        self.reachable()?;
        let mut state = self.state.borrow_mut();
        let index = authorize(&state, bearer, customer_id)?;

        state.loan_sequence += 1;
        let loan = LoanRecord {
            loan_id: format!("LOAN{}", state.loan_sequence),
            loan_type: request.loan_type.into(),
            amount: request.amount,
            interest_rate: request.interest_rate_percent,
            term_months: request.term_months,
            emi: compute_emi(request.amount, request.interest_rate_percent, request.term_months)
                .map(|b| b.emi),
            status: LoanStatus::Pending,
            application_date: Some(Local::now().naive_local()),
        };
        state.customers[index].loans.push(loan.clone());
        tracing::debug!(loan_id = %loan.loan_id, customer_id, "fixture loan recorded");
        Ok(loan)
    }
}
