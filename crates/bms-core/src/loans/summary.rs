//! Account and loan aggregates for the dashboard and account views.
//!
//! `aggregate` is a commutative fold over the loans: the backend may return
//! them in any order and the summary does not change.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AccountRecord, AccountType, LoanRecord, LoanStatus, Money};

/// Derived view of an account and its loans. Recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// `None` when the account record is unknown.
    pub balance: Option<Money>,
    pub account_number: Option<String>,
    pub account_type: Option<AccountType>,
    pub active_loan_count: u32,
    pub pending_loan_count: u32,
    pub rejected_loan_count: u32,
    pub total_loan_count: u32,
    pub total_approved_principal: Money,
}

/// Summarize an account and its loans. A missing account still yields the
/// loan-derived fields.
pub fn aggregate(account: Option<&AccountRecord>, loans: &[LoanRecord]) -> AccountSummary {
    let mut summary = AccountSummary {
        balance: account.map(|a| a.balance),
        account_number: account.map(|a| a.account_number.clone()),
        account_type: account.and_then(|a| a.account_type),
        active_loan_count: 0,
        pending_loan_count: 0,
        rejected_loan_count: 0,
        total_loan_count: 0,
        total_approved_principal: Decimal::ZERO,
    };

    for loan in loans {
        summary.total_loan_count += 1;
        match loan.status {
            LoanStatus::Approved => {
                summary.active_loan_count += 1;
                summary.total_approved_principal += loan.amount;
            }
            LoanStatus::Pending => summary.pending_loan_count += 1,
            LoanStatus::Rejected => summary.rejected_loan_count += 1,
            // Counted in the total only.
            LoanStatus::Disbursed | LoanStatus::Closed | LoanStatus::Unknown => {}
        }
    }

    summary
}

/// The `limit` most recent loans, newest first. Loans without an application
/// date sort last; ties break on loan id so the order is stable.
pub fn recent_loans(loans: &[LoanRecord], limit: usize) -> Vec<LoanRecord> {
    let mut sorted: Vec<&LoanRecord> = loans.iter().collect();
    sorted.sort_by(|a, b| match (a.application_date, b.application_date) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.loan_id.cmp(&b.loan_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.loan_id.cmp(&b.loan_id),
    });
    sorted.into_iter().take(limit).cloned().collect()
}
