use bms_core::loans::emi::compute_emi;
use bms_core::loans::summary::aggregate;
use bms_core::loans::validation::{validate, LoanApplicationForm};
use bms_core::{AccountRecord, LoanKind, LoanRecord, LoanStatus, LoanType, TERM_OPTIONS};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Strategies
// ===========================================================================

fn cents(min: i64, max: i64) -> impl Strategy<Value = Decimal> {
    (min..=max).prop_map(|c| Decimal::new(c, 2))
}

fn status_strategy() -> impl Strategy<Value = LoanStatus> {
    prop_oneof![
        Just(LoanStatus::Pending),
        Just(LoanStatus::Approved),
        Just(LoanStatus::Rejected),
        Just(LoanStatus::Disbursed),
        Just(LoanStatus::Closed),
        Just(LoanStatus::Unknown),
    ]
}

fn loan_type_strategy() -> impl Strategy<Value = LoanKind> {
    prop_oneof![
        Just(LoanKind::Product(LoanType::Personal)),
        Just(LoanKind::Product(LoanType::Home)),
        Just(LoanKind::Product(LoanType::Auto)),
        Just(LoanKind::Product(LoanType::Education)),
        Just(LoanKind::Other("GOLD_LOAN".into())),
    ]
}

fn loan_strategy() -> impl Strategy<Value = LoanRecord> {
    (
        0u32..10_000,
        loan_type_strategy(),
        cents(100_000, 100_000_000),
        status_strategy(),
        prop::sample::select(TERM_OPTIONS.to_vec()),
    )
        .prop_map(|(id, loan_type, amount, status, term_months)| LoanRecord {
            loan_id: format!("LOAN{id}"),
            loan_type,
            amount,
            interest_rate: dec!(10.5),
            term_months,
            emi: None,
            status,
            application_date: None,
        })
}

fn account() -> AccountRecord {
    AccountRecord {
        account_number: "ACC-001".into(),
        balance: dec!(12500.75),
        account_type: None,
        customer_id: Some("1".into()),
        active: Some(true),
    }
}

// ===========================================================================
// Aggregation
// ===========================================================================

proptest! {
    #[test]
    fn aggregate_is_invariant_under_permutation(
        (loans, shuffled) in proptest::collection::vec(loan_strategy(), 0..24)
            .prop_flat_map(|loans| (Just(loans.clone()), Just(loans).prop_shuffle()))
    ) {
        let acct = account();
        prop_assert_eq!(aggregate(Some(&acct), &loans), aggregate(Some(&acct), &shuffled));
        prop_assert_eq!(aggregate(None, &loans), aggregate(None, &shuffled));
    }

    #[test]
    fn aggregate_counts_partition_the_loans(loans in proptest::collection::vec(loan_strategy(), 0..24)) {
        let summary = aggregate(None, &loans);
        prop_assert_eq!(summary.total_loan_count as usize, loans.len());
        let settled = loans
            .iter()
            .filter(|l| matches!(l.status, LoanStatus::Disbursed | LoanStatus::Closed | LoanStatus::Unknown))
            .count();
        prop_assert_eq!(
            (summary.active_loan_count + summary.pending_loan_count + summary.rejected_loan_count) as usize
                + settled,
            loans.len()
        );
        let approved: Decimal = loans
            .iter()
            .filter(|l| l.status == LoanStatus::Approved)
            .map(|l| l.amount)
            .sum();
        prop_assert_eq!(summary.total_approved_principal, approved);
    }
}

// ===========================================================================
// EMI
// ===========================================================================

proptest! {
    #[test]
    fn emi_totals_are_consistent(
        principal in cents(100_000, 100_000_000),
        rate in cents(100, 5_000),
        term in prop::sample::select(TERM_OPTIONS.to_vec()),
    ) {
        let b = compute_emi(principal, rate, term).expect("valid inputs yield a result");
        let n = Decimal::from(term);

        // Totals derive from the rounded instalment, so the tolerance is the rounding of one product.
        prop_assert!((b.emi * n - b.total_payment).abs() <= dec!(0.005));
        prop_assert_eq!(b.total_interest, b.total_payment - principal);
        prop_assert!(b.emi > Decimal::ZERO);
        prop_assert!(b.total_interest > Decimal::ZERO);
        prop_assert_eq!(b.emi, b.emi.round_dp(2));
    }

    #[test]
    fn emi_is_pure(
        principal in cents(100_000, 10_000_000),
        rate in cents(100, 5_000),
        term in 1u32..=360,
    ) {
        prop_assert_eq!(compute_emi(principal, rate, term), compute_emi(principal, rate, term));
    }

    #[test]
    fn emi_absent_for_non_positive_inputs(
        principal in -1_000_000i64..=0,
        term in 1u32..=60,
    ) {
        prop_assert!(compute_emi(Decimal::new(principal, 2), dec!(12), term).is_none());
        prop_assert!(compute_emi(dec!(10000), Decimal::new(principal, 2), term).is_none());
        prop_assert!(compute_emi(dec!(10000), dec!(12), 0).is_none());
    }
}

// ===========================================================================
// Validation
// ===========================================================================

proptest! {
    #[test]
    fn validation_accepts_exactly_the_allowed_ranges(
        amount in 0i64..2_000_000,
        rate in 0i64..=100,
    ) {
        let form = LoanApplicationForm {
            loan_type: "HOME".into(),
            amount: amount.to_string(),
            interest_rate: rate.to_string(),
            term_months: "24".into(),
        };
        let amount_ok = (1_000..=1_000_000).contains(&amount);
        let rate_ok = (1..=50).contains(&rate);
        match validate(&form) {
            Ok(request) => {
                prop_assert!(amount_ok && rate_ok);
                prop_assert_eq!(request.amount, Decimal::from(amount));
            }
            Err(rejected) => {
                prop_assert!(!(amount_ok && rate_ok));
                let expected = usize::from(!amount_ok) + usize::from(!rate_ok);
                prop_assert_eq!(rejected.reasons.len(), expected);
            }
        }
    }
}
