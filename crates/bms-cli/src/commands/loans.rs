use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use bms_core::api::{parse_account_response, parse_loans_response};
use bms_core::loans::emi::{compute_emi, compute_emi_for, EmiInput};
use bms_core::loans::summary::{aggregate, recent_loans};
use bms_core::loans::validation::{validate, LoanApplicationForm};
use bms_core::{term_label, with_metadata, LoanType, TERM_OPTIONS};

use crate::input;

/// Arguments for the EMI calculation
#[derive(Args)]
pub struct EmiArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (12 = 12%)
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,
}

/// Arguments for loan form validation
#[derive(Args)]
pub struct ValidateLoanArgs {
    /// Path to JSON/YAML form file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// PERSONAL, HOME, AUTO or EDUCATION
    #[arg(long)]
    pub loan_type: Option<String>,

    /// Amount, as typed
    #[arg(long)]
    pub amount: Option<String>,

    /// Annual rate in percent, as typed
    #[arg(long, alias = "rate")]
    pub interest_rate: Option<String>,

    /// Term in months, as selected
    #[arg(long, alias = "term")]
    pub term_months: Option<String>,
}

/// Arguments for the account summary
#[derive(Args)]
pub struct SummaryArgs {
    /// JSON/YAML file holding `account` and `loans`
    #[arg(long)]
    pub input: Option<String>,

    /// Number of recent loans to list
    #[arg(long, default_value_t = 5)]
    pub recent: usize,
}

#[derive(Deserialize)]
struct SummaryInput {
    #[serde(default)]
    account: Value,
    #[serde(default)]
    loans: Value,
}

impl ValidateLoanArgs {
    fn into_form(self) -> LoanApplicationForm {
        let defaults = LoanApplicationForm::default();
        LoanApplicationForm {
            loan_type: self.loan_type.unwrap_or(defaults.loan_type),
            amount: self.amount.unwrap_or(defaults.amount),
            interest_rate: self.interest_rate.unwrap_or(defaults.interest_rate),
            term_months: self.term_months.unwrap_or(defaults.term_months),
        }
    }
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let emi_input: EmiInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        EmiInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            term_months: args.term_months
                .ok_or("--term-months is required (or provide --input)")?,
        }
    };

    let start = Instant::now();
    let breakdown = compute_emi_for(&emi_input)
        .ok_or("EMI is undefined: principal, rate and term must all be positive")?;

    let mut warnings = Vec::new();
    if !TERM_OPTIONS.contains(&emi_input.term_months) {
        warnings.push(format!(
            "{} months is not one of the offered loan terms",
            emi_input.term_months
        ));
    }

    let output = with_metadata(
        "Equal monthly instalment on a reducing balance, rounded half away from zero to cents",
        &emi_input,
        warnings,
        start.elapsed().as_micros() as u64,
        breakdown,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_validate_loan(args: ValidateLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form: LoanApplicationForm = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        args.into_form()
    };

    Ok(match validate(&form) {
        Ok(request) => {
            let emi = compute_emi(request.amount, request.interest_rate_percent, request.term_months);
            json!({ "valid": true, "request": request, "emi": emi })
        }
        Err(rejected) => json!({ "valid": false, "reasons": rejected.reasons }),
    })
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: SummaryInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file (or JSON on stdin) is required for the account summary".into());
    };

    let account = if data.account.is_null() {
        None
    } else {
        Some(parse_account_response(data.account)?)
    };
    let loans = parse_loans_response(data.loans)?;

    Ok(json!({
        "summary": aggregate(account.as_ref(), &loans),
        "recentLoans": recent_loans(&loans, args.recent),
    }))
}

pub fn run_loan_types() -> Result<Value, Box<dyn std::error::Error>> {
    let terms: Vec<Value> = TERM_OPTIONS
        .iter()
        .map(|&months| json!({ "months": months, "label": term_label(months) }))
        .collect();
    let types: Vec<Value> = LoanType::ALL
        .iter()
        .map(|t| {
            json!({
                "code": t.code(),
                "label": t.label(),
                "baseRate": t.base_rate(),
            })
        })
        .collect();
    Ok(json!({ "loanTypes": types, "termOptions": terms }))
}
