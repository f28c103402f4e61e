//! Loan application and registration form validation.
//!
//! Every rule is checked and every violation reported, in rule order, so the
//! form can show all problems at once. A rejected application is never sent
//! to the backend.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationRejected;
use crate::types::{AccountType, LoanRequest, LoanType, Money, Percent, TERM_OPTIONS};

pub const MIN_LOAN_AMOUNT: Money = dec!(1000);
pub const MAX_LOAN_AMOUNT: Money = dec!(1000000);
pub const MIN_INTEREST_RATE: Percent = dec!(1);
pub const MAX_INTEREST_RATE: Percent = dec!(50);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Raw loan form fields, exactly as typed or selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanApplicationForm {
    #[serde(deserialize_with = "field_text")]
    pub loan_type: String,
    #[serde(deserialize_with = "field_text")]
    pub amount: String,
    #[serde(alias = "interestRatePercent", deserialize_with = "field_text")]
    pub interest_rate: String,
    #[serde(deserialize_with = "field_text")]
    pub term_months: String,
}

impl Default for LoanApplicationForm {
    /// A fresh form: personal loan over one year, amount and rate empty.
    fn default() -> Self {
        Self {
            loan_type: LoanType::Personal.code().to_string(),
            amount: String::new(),
            interest_rate: String::new(),
            term_months: "12".to_string(),
        }
    }
}

/// Raw registration form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub name: String,
    pub login_id: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub address: String,
    pub state: String,
    pub country: String,
    pub pan_number: String,
    pub dob: String,
    pub account_number: String,
    pub account_type: String,
}

/// Registration payload sent to the backend. The password confirmation is
/// checked locally and not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub login_id: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub address: String,
    pub state: String,
    pub country: String,
    pub pan_number: String,
    pub dob: String,
    pub account_number: String,
    pub account_type: AccountType,
}

// ---------------------------------------------------------------------------
// Loan application
// ---------------------------------------------------------------------------

/// Validate a loan form, collecting every violated rule.
pub fn validate(form: &LoanApplicationForm) -> Result<LoanRequest, ValidationRejected> {
    let mut reasons = Vec::new();

    let amount = check_amount(number_field(&form.amount, "Loan amount", &mut reasons), &mut reasons);
    let rate = check_rate(
        number_field(&form.interest_rate, "Interest rate", &mut reasons),
        &mut reasons,
    );
    let term = check_term(&form.term_months, &mut reasons);
    let loan_type = check_loan_type(&form.loan_type, &mut reasons);

    match (loan_type, amount, rate, term) {
        (Some(loan_type), Some(amount), Some(interest_rate_percent), Some(term_months)) if reasons.is_empty() => {
            Ok(LoanRequest {
                loan_type,
                amount,
                interest_rate_percent,
                term_months,
            })
        }
        _ => {
            tracing::debug!(violations = reasons.len(), "loan application rejected");
            Err(ValidationRejected::new(reasons))
        }
    }
}

impl LoanRequest {
    /// Re-check the business rules on an already typed request.
    ///
    /// Run again right before submission: the rate range is a business rule,
    /// not a form hint.
    pub fn validate(&self) -> Result<(), ValidationRejected> {
        let mut reasons = Vec::new();
        check_amount(Some(self.amount), &mut reasons);
        check_rate(Some(self.interest_rate_percent), &mut reasons);
        if !TERM_OPTIONS.contains(&self.term_months) {
            reasons.push(term_reason());
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ValidationRejected::new(reasons))
        }
    }
}

fn number_field(text: &str, name: &str, reasons: &mut Vec<String>) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        reasons.push(format!("{name} is required"));
        return None;
    }
    match Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)) {
        Ok(value) => Some(value),
        Err(_) => {
            reasons.push(format!("{name} must be a number"));
            None
        }
    }
}

fn check_amount(amount: Option<Money>, reasons: &mut Vec<String>) -> Option<Money> {
    let amount = amount?;
    if amount < MIN_LOAN_AMOUNT || amount > MAX_LOAN_AMOUNT {
        reasons.push("Loan amount must be between $1,000 and $1,000,000".into());
        return None;
    }
    Some(amount)
}

fn check_rate(rate: Option<Percent>, reasons: &mut Vec<String>) -> Option<Percent> {
    let rate = rate?;
    if rate < MIN_INTEREST_RATE || rate > MAX_INTEREST_RATE {
        reasons.push("Interest rate must be between 1% and 50%".into());
        return None;
    }
    Some(rate)
}

fn check_term(text: &str, reasons: &mut Vec<String>) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        reasons.push("Loan term is required".into());
        return None;
    }
    match text.parse::<u32>() {
        Ok(term) if TERM_OPTIONS.contains(&term) => Some(term),
        _ => {
            reasons.push(term_reason());
            None
        }
    }
}

fn term_reason() -> String {
    "Loan term must be one of 6, 12, 24, 36, 48 or 60 months".into()
}

fn check_loan_type(text: &str, reasons: &mut Vec<String>) -> Option<LoanType> {
    if text.trim().is_empty() {
        reasons.push("Loan type is required".into());
        return None;
    }
    // Only the four form codes; the backend's `_LOAN` spellings are not form values.
    match LoanType::ALL.iter().find(|t| t.code() == text.trim()) {
        Some(loan_type) => Some(*loan_type),
        None => {
            reasons.push("Loan type must be one of PERSONAL, HOME, AUTO or EDUCATION".into());
            None
        }
    }
}

fn field_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Validate a registration form, collecting every violated rule.
pub fn validate_registration(form: &RegistrationForm) -> Result<RegistrationRequest, ValidationRejected> {
    let mut reasons = Vec::new();

    for (value, name) in [
        (&form.name, "Full name"),
        (&form.login_id, "Login ID"),
        (&form.email, "Email"),
        (&form.password, "Password"),
        (&form.phone_number, "Phone number"),
    ] {
        if value.trim().is_empty() {
            reasons.push(format!("{name} is required"));
        }
    }

    let email = form.email.trim();
    if !email.is_empty() && !email.contains('@') {
        reasons.push("Email must be a valid email address".into());
    }

    if form.password != form.confirm_password {
        reasons.push("Passwords do not match".into());
    }

    let account_type = if form.account_type.trim().is_empty() {
        Some(AccountType::default())
    } else {
        match form.account_type.parse::<AccountType>() {
            Ok(t) => Some(t),
            Err(_) => {
                reasons.push(
                    "Account type must be one of SAVINGS, CURRENT, FIXED_DEPOSIT or RECURRING_DEPOSIT".into(),
                );
                None
            }
        }
    };

    match account_type {
        Some(account_type) if reasons.is_empty() => Ok(RegistrationRequest {
            name: form.name.trim().to_string(),
            login_id: form.login_id.trim().to_string(),
            email: email.to_string(),
            password: form.password.clone(),
            phone_number: form.phone_number.trim().to_string(),
            address: form.address.trim().to_string(),
            state: form.state.trim().to_string(),
            country: form.country.trim().to_string(),
            pan_number: form.pan_number.trim().to_string(),
            dob: form.dob.trim().to_string(),
            account_number: form.account_number.trim().to_string(),
            account_type,
        }),
        _ => {
            tracing::debug!(violations = reasons.len(), "registration rejected");
            Err(ValidationRejected::new(reasons))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
