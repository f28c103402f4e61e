//! Equal monthly installment (EMI) calculator.
//!
//! `emi = P * r * (1 + r)^n / ((1 + r)^n - 1)` with `r` the monthly rate
//! (annual percent / 100 / 12). The installment is rounded to cents first;
//! the totals are derived from the rounded installment so that
//! `total_payment == emi * n` and `total_interest == total_payment - P`.
//!
//! Missing or non-positive inputs yield `None` ("nothing to display yet"),
//! never an error. All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use std::str::FromStr;

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);
const CENTS: u32 = 2;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Inputs of an EMI computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiInput {
    pub principal: Money,
    #[serde(alias = "interestRate")]
    pub annual_rate_percent: Percent,
    pub term_months: u32,
}

/// Periodic payment and totals, all rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiBreakdown {
    pub emi: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Compute the monthly installment and totals for a fully amortizing loan.
///
/// Returns `None` when any input is non-positive or when the arithmetic would
/// overflow `Decimal`.
pub fn compute_emi(principal: Money, annual_rate_percent: Percent, term_months: u32) -> Option<EmiBreakdown> {
    if principal <= Decimal::ZERO || annual_rate_percent <= Decimal::ZERO || term_months == 0 {
        return None;
    }

    let monthly_rate = annual_rate_percent.checked_div(PERCENT)?.checked_div(MONTHS_PER_YEAR)?;
    let growth = (Decimal::ONE + monthly_rate).checked_powu(u64::from(term_months))?;
    let denominator = growth - Decimal::ONE;
    if denominator <= Decimal::ZERO {
        return None;
    }

    let raw_emi = principal
        .checked_mul(monthly_rate)?
        .checked_mul(growth)?
        .checked_div(denominator)?;
    let emi = round_cents(raw_emi);
    let total_payment = round_cents(emi.checked_mul(Decimal::from(term_months))?);
    let total_interest = round_cents(total_payment - principal);

    Some(EmiBreakdown {
        emi,
        total_payment,
        total_interest,
    })
}

/// [`compute_emi`] over a typed input.
pub fn compute_emi_for(input: &EmiInput) -> Option<EmiBreakdown> {
    compute_emi(input.principal, input.annual_rate_percent, input.term_months)
}

/// EMI preview over the raw text of the loan form.
///
/// Meant to be called after every edit of the amount, rate or term fields,
/// including half-typed states such as `""`, `"12."` or `"1e"`; anything that
/// does not parse to a positive number yields `None`.
pub fn preview_emi(amount: &str, rate_percent: &str, term_months: &str) -> Option<EmiBreakdown> {
    let principal = parse_positive_decimal(amount)?;
    let rate = parse_positive_decimal(rate_percent)?;
    let term = term_months.trim().parse::<u32>().ok()?;
    compute_emi(principal, rate, term)
}

pub(crate) fn parse_positive_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()?;
    (value > Decimal::ZERO).then_some(value)
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
