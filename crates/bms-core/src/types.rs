use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual interest rates as typed on the loan form (12 = 12% a year).
pub type Percent = Decimal;

/// Loan terms offered on the application form, in months.
pub const TERM_OPTIONS: [u32; 6] = [6, 12, 24, 36, 48, 60];

/// Display label for a term option; `None` when the term is not offered.
pub fn term_label(term_months: u32) -> Option<&'static str> {
    match term_months {
        6 => Some("6 months"),
        12 => Some("1 year"),
        24 => Some("2 years"),
        36 => Some("3 years"),
        48 => Some("4 years"),
        60 => Some("5 years"),
        _ => None,
    }
}

/// Loan products a customer can apply for.
///
/// The backend also reports these with a `_LOAN` suffix (and `CAR_LOAN` for
/// auto loans); both spellings deserialize to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanType {
    #[serde(alias = "PERSONAL_LOAN")]
    Personal,
    #[serde(alias = "HOME_LOAN")]
    Home,
    #[serde(alias = "CAR_LOAN", alias = "AUTO_LOAN")]
    Auto,
    #[serde(alias = "EDUCATION_LOAN")]
    Education,
}

impl LoanType {
    pub const ALL: [LoanType; 4] = [
        LoanType::Personal,
        LoanType::Home,
        LoanType::Auto,
        LoanType::Education,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LoanType::Personal => "PERSONAL",
            LoanType::Home => "HOME",
            LoanType::Auto => "AUTO",
            LoanType::Education => "EDUCATION",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoanType::Personal => "Personal Loan",
            LoanType::Home => "Home Loan",
            LoanType::Auto => "Auto Loan",
            LoanType::Education => "Education Loan",
        }
    }

    /// Server-declared base annual rate. Informational only: the rate the
    /// customer types on the form is the one that is validated and submitted.
    pub fn base_rate(self) -> Percent {
        match self {
            LoanType::Personal => dec!(15.0),
            LoanType::Home => dec!(9.0),
            LoanType::Auto => dec!(10.5),
            LoanType::Education => dec!(9.5),
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSONAL" | "PERSONAL_LOAN" => Ok(LoanType::Personal),
            "HOME" | "HOME_LOAN" => Ok(LoanType::Home),
            "AUTO" | "AUTO_LOAN" | "CAR_LOAN" => Ok(LoanType::Auto),
            "EDUCATION" | "EDUCATION_LOAN" => Ok(LoanType::Education),
            other => Err(format!("unknown loan type '{other}'")),
        }
    }
}

/// Loan type as it appears on a backend record.
///
/// The backend offers products the application form does not (gold loans,
/// for one); those keep their backend code instead of failing the whole
/// loan list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoanKind {
    Product(LoanType),
    Other(String),
}

impl LoanKind {
    /// The form product, if this is one.
    pub fn product(&self) -> Option<LoanType> {
        match self {
            LoanKind::Product(loan_type) => Some(*loan_type),
            LoanKind::Other(_) => None,
        }
    }
}

impl From<LoanType> for LoanKind {
    fn from(loan_type: LoanType) -> Self {
        LoanKind::Product(loan_type)
    }
}

impl fmt::Display for LoanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanKind::Product(loan_type) => f.write_str(loan_type.code()),
            LoanKind::Other(code) => f.write_str(code),
        }
    }
}

/// Loan application status. Transitions happen server-side only.
///
/// Statuses past approval, and any the client does not know, count toward
/// the loan total but not toward the active, pending or rejected buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Savings,
    Current,
    FixedDeposit,
    RecurringDeposit,
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAVINGS" => Ok(AccountType::Savings),
            "CURRENT" => Ok(AccountType::Current),
            "FIXED_DEPOSIT" => Ok(AccountType::FixedDeposit),
            "RECURRING_DEPOSIT" => Ok(AccountType::RecurringDeposit),
            other => Err(format!("unknown account type '{other}'")),
        }
    }
}

/// Authenticated customer's profile snapshot, as received at login.
///
/// Never mutated by the core. The backend sends the customer id as `id`
/// (a number) on login responses; both that and `customerId` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub customer_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDateTime>,
}

impl Identity {
    /// "First Last", falling back to the email, then the customer id.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.email.trim().is_empty() {
            self.email.trim().to_string()
        } else {
            self.customer_id.clone()
        }
    }
}

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    /// Accepts a raw token or a full `Bearer <token>` header value.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        match token.trim().strip_prefix("Bearer ") {
            Some(raw) => Credential(raw.trim().to_string()),
            None => Credential(token.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for an `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Credential::new(token)
    }
}

impl From<Credential> for String {
    fn from(credential: Credential) -> Self {
        credential.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// A loan application that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub loan_type: LoanType,
    pub amount: Money,
    #[serde(alias = "interestRate")]
    pub interest_rate_percent: Percent,
    pub term_months: u32,
}

/// A loan as reported by the backend. Read-only to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub loan_id: String,
    pub loan_type: LoanKind,
    pub amount: Money,
    #[serde(alias = "offeredInterestRate")]
    pub interest_rate: Percent,
    #[serde(alias = "tenureMonths")]
    pub term_months: u32,
    #[serde(default, alias = "monthlyEmi", skip_serializing_if = "Option::is_none")]
    pub emi: Option<Money>,
    #[serde(alias = "loanStatus")]
    pub status: LoanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<NaiveDateTime>,
}

/// The customer's deposit account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub account_number: String,
    pub balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, alias = "isActive", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    })
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_identity_accepts_numeric_backend_id() {
        let identity: Identity = serde_json::from_value(json!({
            "id": 42,
            "email": "john@example.com",
            "accountNumber": "ACC001"
        }))
        .unwrap();
        assert_eq!(identity.customer_id, "42");
        assert_eq!(identity.display_name(), "john@example.com");
    }

    #[test]
    fn test_identity_serializes_customer_id_camel_case() {
        let identity = Identity {
            customer_id: "7".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: String::new(),
            phone_number: String::new(),
            address: String::new(),
            created_date: None,
        };
        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["customerId"], json!("7"));
        assert_eq!(value["firstName"], json!("John"));
        assert_eq!(identity.display_name(), "John Doe");
    }

    #[test]
    fn test_loan_record_accepts_backend_field_names() {
        let record: LoanRecord = serde_json::from_value(json!({
            "loanId": "LOAN1700000000000",
            "loanType": "CAR_LOAN",
            "amount": 25000,
            "offeredInterestRate": 10.5,
            "tenureMonths": 36,
            "monthlyEmi": 812.56,
            "loanStatus": "APPROVED",
            "applicationDate": "2024-03-01T09:15:00"
        }))
        .unwrap();
        assert_eq!(record.loan_type, LoanKind::Product(LoanType::Auto));
        assert_eq!(record.status, LoanStatus::Approved);
        assert_eq!(record.interest_rate, dec!(10.5));
        assert_eq!(record.term_months, 36);
        assert_eq!(record.emi, Some(dec!(812.56)));
        assert!(record.application_date.is_some());
    }

    #[test]
    fn test_loan_record_keeps_products_outside_the_form() {
        let record: LoanRecord = serde_json::from_value(json!({
            "loanId": "LOAN9",
            "loanType": "GOLD_LOAN",
            "amount": 40000,
            "offeredInterestRate": 8.5,
            "tenureMonths": 12,
            "loanStatus": "DISBURSED"
        }))
        .unwrap();
        assert_eq!(record.loan_type, LoanKind::Other("GOLD_LOAN".into()));
        assert_eq!(record.loan_type.product(), None);
        assert_eq!(record.status, LoanStatus::Disbursed);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["loanType"], json!("GOLD_LOAN"));
        assert_eq!(value["status"], json!("DISBURSED"));

        let status: LoanStatus = serde_json::from_value(json!("FORECLOSED")).unwrap();
        assert_eq!(status, LoanStatus::Unknown);
    }

    #[test]
    fn test_loan_type_from_str() {
        assert_eq!("personal".parse::<LoanType>().unwrap(), LoanType::Personal);
        assert_eq!(" HOME ".parse::<LoanType>().unwrap(), LoanType::Home);
        assert_eq!("CAR_LOAN".parse::<LoanType>().unwrap(), LoanType::Auto);
        assert!("GOLD".parse::<LoanType>().is_err());
    }

    #[test]
    fn test_base_rates() {
        assert_eq!(LoanType::Personal.base_rate(), dec!(15));
        assert_eq!(LoanType::Auto.base_rate(), dec!(10.5));
    }

    #[test]
    fn test_credential_strips_bearer_prefix_and_redacts_debug() {
        let cred = Credential::new("Bearer abc.def.ghi");
        assert_eq!(cred.as_str(), "abc.def.ghi");
        assert_eq!(cred.bearer_header(), "Bearer abc.def.ghi");
        assert_eq!(format!("{cred:?}"), "Credential(****)");
    }

    #[test]
    fn test_term_labels() {
        assert_eq!(term_label(12), Some("1 year"));
        assert_eq!(term_label(18), None);
        assert!(TERM_OPTIONS.iter().all(|t| term_label(*t).is_some()));
    }
}
