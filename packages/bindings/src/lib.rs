use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use bms_core::api::{parse_account_response, parse_loans_response};
use bms_core::loans::emi::{compute_emi_for, preview_emi as preview, EmiInput};
use bms_core::loans::summary::{aggregate, recent_loans};
use bms_core::loans::validation::{validate, validate_registration, LoanApplicationForm, RegistrationForm};
use bms_core::session::routes::{resolve, Route};
use bms_core::{LoanType, TERM_OPTIONS};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// EMI
// ---------------------------------------------------------------------------

/// `null` when the inputs do not yield an instalment.
#[napi]
pub fn compute_emi(input_json: String) -> NapiResult<String> {
    let input: EmiInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    serde_json::to_string(&compute_emi_for(&input)).map_err(to_napi_error)
}

/// Live preview over raw form text; never fails.
#[napi]
pub fn preview_emi(amount: String, rate_percent: String, term_months: String) -> String {
    let breakdown = preview(&amount, &rate_percent, &term_months);
    serde_json::to_string(&breakdown).unwrap_or_else(|_| "null".to_string())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_loan_application(form_json: String) -> NapiResult<String> {
    let form: LoanApplicationForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let outcome = match validate(&form) {
        Ok(request) => json!({ "valid": true, "request": request }),
        Err(rejected) => json!({ "valid": false, "reasons": rejected.reasons }),
    };
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

#[napi]
pub fn validate_registration_form(form_json: String) -> NapiResult<String> {
    let form: RegistrationForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let outcome = match validate_registration(&form) {
        Ok(request) => json!({ "valid": true, "request": request }),
        Err(rejected) => json!({ "valid": false, "reasons": rejected.reasons }),
    };
    serde_json::to_string(&outcome).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateInput {
    #[serde(default)]
    account: Value,
    #[serde(default)]
    loans: Value,
    #[serde(default = "default_recent")]
    recent: usize,
}

fn default_recent() -> usize {
    5
}

/// Takes raw backend responses: `account` bare or wrapped, `loans` as an
/// array or `{loans: [...]}`.
#[napi]
pub fn aggregate_account(input_json: String) -> NapiResult<String> {
    let input: AggregateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let account = if input.account.is_null() {
        None
    } else {
        Some(parse_account_response(input.account).map_err(to_napi_error)?)
    };
    let loans = parse_loans_response(input.loans).map_err(to_napi_error)?;
    let output = json!({
        "summary": aggregate(account.as_ref(), &loans),
        "recentLoans": recent_loans(&loans, input.recent),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Catalogue and routes
// ---------------------------------------------------------------------------

#[napi]
pub fn loan_catalogue() -> NapiResult<String> {
    let types: Vec<Value> = LoanType::ALL
        .iter()
        .map(|t| {
            let base_rate: Decimal = t.base_rate();
            json!({ "code": t.code(), "label": t.label(), "baseRate": base_rate })
        })
        .collect();
    serde_json::to_string(&json!({ "loanTypes": types, "termOptions": TERM_OPTIONS }))
        .map_err(to_napi_error)
}

/// Render-or-redirect for a location path, from the caller's auth state.
#[napi]
pub fn resolve_route(path: String, authenticated: bool) -> NapiResult<String> {
    let route: Route = path.parse().map_err(to_napi_error)?;
    serde_json::to_string(&resolve(route, authenticated)).map_err(to_napi_error)
}
