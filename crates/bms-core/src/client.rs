//! Orchestration between the views, the session and the backend.
//!
//! Every backend failure passes through [`BankClient::surface`], which is the
//! only place an `Unauthorized` answer is turned into a session expiry.

use serde::Serialize;

use crate::api::{ApiError, BackendApi};
use crate::error::ClientError;
use crate::loans::summary::{aggregate, recent_loans, AccountSummary};
use crate::loans::validation::{validate, validate_registration, LoanApplicationForm, RegistrationForm};
use crate::session::{CredentialStore, Route, RouteDecision, SessionManager};
use crate::types::{AccountRecord, Credential, Identity, LoanRecord};
use crate::BmsResult;

/// Loans shown on the dashboard.
pub const DASHBOARD_RECENT_LOANS: usize = 5;

/// Everything the dashboard and account views render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub identity: Identity,
    pub account: Option<AccountRecord>,
    pub summary: AccountSummary,
    pub recent_loans: Vec<LoanRecord>,
    pub loans: Vec<LoanRecord>,
    pub warnings: Vec<String>,
}

pub struct BankClient<A: BackendApi, S: CredentialStore> {
    api: A,
    session: SessionManager<S>,
}

impl<A: BackendApi, S: CredentialStore> BankClient<A, S> {
    pub fn new(api: A, session: SessionManager<S>) -> Self {
        Self { api, session }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<S> {
        &mut self.session
    }

    pub fn into_parts(self) -> (A, SessionManager<S>) {
        (self.api, self.session)
    }

    pub fn resolve(&self, route: Route) -> RouteDecision {
        self.session.resolve(route)
    }

    /// Authenticate and establish the session.
    ///
    /// A credential store failure does not fail the login: the session is
    /// live for this process and the failure is logged.
    pub async fn login(&mut self, login_id: &str, password: &str) -> Result<Identity, ClientError> {
        let mut reasons = Vec::new();
        if login_id.trim().is_empty() {
            reasons.push("Login ID is required".to_string());
        }
        if password.is_empty() {
            reasons.push("Password is required".to_string());
        }
        if !reasons.is_empty() {
            return Err(ClientError::Validation(crate::ValidationRejected::new(reasons)));
        }

        let bearer = self.session.credential().cloned();
        let response = match self.api.login(bearer.as_ref(), login_id.trim(), password).await {
            Ok(response) => response,
            // A 401 here means bad credentials, not an expired session.
            Err(ApiError::Unauthorized) => {
                return Err(ClientError::BackendRejected(
                    "Login failed. Please check your credentials.".into(),
                ))
            }
            Err(e) => return Err(self.surface(e, "Login failed")),
        };

        let identity = response.customer.clone();
        if let Err(e) = self.session.login(response.token, response.customer) {
            // Signed in for this process only.
            tracing::debug!(error = %e, customer_id = %identity.customer_id, "login not persisted");
        }
        Ok(identity)
    }

    /// Validate the form locally, then create the customer. Does not sign in.
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<(), ClientError> {
        let request = validate_registration(form)?;
        let bearer = self.session.credential().cloned();
        match self.api.register(bearer.as_ref(), &request).await {
            Ok(()) => {
                tracing::info!(login_id = %request.login_id, "customer registered");
                Ok(())
            }
            Err(e) => Err(self.surface(e, "Registration failed")),
        }
    }

    /// Fetch the account and loans concurrently and derive the summary.
    ///
    /// An account the backend refuses to return still yields the loan-derived
    /// part of the overview, with a warning. Any other failure fails the call.
    pub async fn load_overview(&mut self) -> Result<AccountOverview, ClientError> {
        let (credential, identity) = self.signed_in()?;
        let customer_id = identity.customer_id.as_str();

        let (account, loans) = futures::join!(
            self.api.get_account(Some(&credential), customer_id),
            self.api.get_loans(Some(&credential), customer_id),
        );

        if matches!(account, Err(ApiError::Unauthorized)) || matches!(loans, Err(ApiError::Unauthorized)) {
            return Err(self.surface(ApiError::Unauthorized, "Failed to load account data"));
        }
        let loans = match loans {
            Ok(loans) => loans,
            Err(e) => return Err(self.surface(e, "Failed to load account data")),
        };

        let mut warnings = Vec::new();
        let account = match account {
            Ok(account) => Some(account),
            Err(ApiError::Rejected(message)) => {
                tracing::warn!(customer_id, %message, "account unavailable; showing loans only");
                warnings.push(format!("Account details unavailable: {message}"));
                None
            }
            Err(e) => return Err(self.surface(e, "Failed to load account data")),
        };

        let summary = aggregate(account.as_ref(), &loans);
        Ok(AccountOverview {
            recent_loans: recent_loans(&loans, DASHBOARD_RECENT_LOANS),
            identity,
            account,
            summary,
            loans,
            warnings,
        })
    }

    /// Validate and submit a loan application. A rejected form never reaches
    /// the backend.
    pub async fn apply_for_loan(&mut self, form: &LoanApplicationForm) -> Result<LoanRecord, ClientError> {
        let (credential, identity) = self.signed_in()?;
        let request = validate(form)?;
        request.validate()?;
        match self
            .api
            .apply_loan(Some(&credential), &identity.customer_id, &request)
            .await
        {
            Ok(loan) => {
                tracing::info!(loan_id = %loan.loan_id, loan_type = %loan.loan_type, "loan application submitted");
                Ok(loan)
            }
            Err(e) => Err(self.surface(e, "Failed to submit loan application")),
        }
    }

    pub fn logout(&mut self) -> BmsResult<()> {
        self.session.logout()
    }

    fn signed_in(&self) -> Result<(Credential, Identity), ClientError> {
        match (self.session.credential(), self.session.identity()) {
            (Some(credential), Some(identity)) => Ok((credential.clone(), identity.clone())),
            _ => Err(ClientError::NotSignedIn),
        }
    }

    fn surface(&mut self, error: ApiError, operation: &str) -> ClientError {
        match error {
            ApiError::Unauthorized => {
                let redirect = self.session.on_unauthorized();
                tracing::info!(%redirect, "{operation}: credential rejected, session expired");
                ClientError::AuthorizationExpired
            }
            ApiError::Rejected(message) => ClientError::BackendRejected(message),
            ApiError::Transient(detail) => {
                tracing::warn!(%detail, "{operation}: transient backend failure");
                ClientError::Transient(format!("{operation}. Please try again."))
            }
        }
    }
}
