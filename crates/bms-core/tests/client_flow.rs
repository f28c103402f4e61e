use bms_core::api::{BackendApi, FixtureBackend};
use bms_core::client::BankClient;
use bms_core::loans::validation::{LoanApplicationForm, RegistrationForm};
use bms_core::session::{
    CredentialStore, MemoryStore, Route, RouteDecision, SessionEvent, SessionManager, TOKEN_KEY,
};
use bms_core::{ClientError, LoanStatus};
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const SEED: &str = r#"{
    "customers": [{
        "loginId": "asha",
        "password": "secret",
        "identity": {"id": 1, "firstName": "Asha", "lastName": "Rao", "email": "asha@example.com"},
        "account": {"accountNumber": "ACC1", "balance": "2500.00", "accountType": "SAVINGS"},
        "loans": [
            {"loanId": "LOAN90", "loanType": "HOME_LOAN", "amount": 50000, "offeredInterestRate": 9,
             "tenureMonths": 24, "loanStatus": "APPROVED", "applicationDate": "2020-01-10T09:00:00"},
            {"loanId": "LOAN91", "loanType": "CAR_LOAN", "amount": 8000, "offeredInterestRate": 10.5,
             "tenureMonths": 12, "loanStatus": "REJECTED", "applicationDate": "2020-02-01T09:00:00"}
        ]
    }],
    "loanSequence": 100
}"#;

fn client_with(store: MemoryStore) -> BankClient<FixtureBackend, MemoryStore> {
    let backend = FixtureBackend::from_json(SEED).unwrap();
    let mut session = SessionManager::new(store);
    session.restore();
    BankClient::new(backend, session)
}

fn home_loan_form() -> LoanApplicationForm {
    LoanApplicationForm {
        loan_type: "HOME".into(),
        amount: "10000".into(),
        interest_rate: "12".into(),
        term_months: "12".into(),
    }
}

// ===========================================================================
// Login, overview, apply
// ===========================================================================

#[test]
fn test_login_then_overview_then_apply() {
    let mut client = client_with(MemoryStore::new());
    assert_eq!(client.resolve(Route::Dashboard), RouteDecision::Redirect(Route::Login));

    let identity = block_on(client.login("asha", "secret")).unwrap();
    assert_eq!(identity.display_name(), "Asha Rao");
    assert!(client.session().is_authenticated());
    assert_eq!(client.resolve(Route::Login), RouteDecision::Redirect(Route::Dashboard));

    let overview = block_on(client.load_overview()).unwrap();
    assert_eq!(overview.summary.balance, Some(dec!(2500.00)));
    assert_eq!(overview.summary.active_loan_count, 1);
    assert_eq!(overview.summary.rejected_loan_count, 1);
    assert_eq!(overview.summary.total_approved_principal, dec!(50000));
    assert_eq!(overview.recent_loans[0].loan_id, "LOAN91");
    assert!(overview.warnings.is_empty());

    let loan = block_on(client.apply_for_loan(&home_loan_form())).unwrap();
    assert_eq!(loan.loan_id, "LOAN101");
    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.emi, Some(dec!(888.49)));

    let overview = block_on(client.load_overview()).unwrap();
    assert_eq!(overview.summary.pending_loan_count, 1);
    assert_eq!(overview.summary.total_loan_count, 3);
    assert_eq!(overview.recent_loans[0].loan_id, "LOAN101");
}

#[test]
fn test_bad_credentials_are_backend_rejected() {
    let mut client = client_with(MemoryStore::new());
    let err = block_on(client.login("asha", "nope")).unwrap_err();
    assert_eq!(err, ClientError::BackendRejected("Invalid credentials".into()));
    assert!(!client.session().is_authenticated());
}

// ===========================================================================
// Persistence and expiry
// ===========================================================================

#[test]
fn test_session_survives_restart() {
    let mut client = client_with(MemoryStore::new());
    block_on(client.login("asha", "secret")).unwrap();
    let (_, session) = client.into_parts();
    let store = session.into_store();
    assert!(store.get(TOKEN_KEY).unwrap().is_some());

    let restarted = client_with(store);
    assert!(restarted.session().is_authenticated());
    assert_eq!(restarted.session().identity().unwrap().customer_id, "1");
}

#[test]
fn test_revoked_credential_expires_session() {
    let mut client = client_with(MemoryStore::new());
    block_on(client.login("asha", "secret")).unwrap();
    let mut events = client.session_mut().subscribe();

    let token = client.session().credential().unwrap().as_str().to_string();
    client.api().revoke(&token);

    let err = block_on(client.load_overview()).unwrap_err();
    assert_eq!(err, ClientError::AuthorizationExpired);
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().store().get(TOKEN_KEY).unwrap(), None);
    assert_eq!(
        events.try_next().unwrap(),
        Some(SessionEvent::Expired { redirect: Route::Login })
    );
    assert_eq!(client.resolve(Route::Dashboard), RouteDecision::Redirect(Route::Login));
}

#[test]
fn test_logout_is_idempotent() {
    let mut client = client_with(MemoryStore::new());
    block_on(client.login("asha", "secret")).unwrap();
    client.logout().unwrap();
    client.logout().unwrap();
    assert!(!client.session().is_authenticated());
    assert!(client.session().store().is_empty());
}

// ===========================================================================
// Validation never reaches the backend
// ===========================================================================

#[test]
fn test_invalid_application_is_not_submitted() {
    let mut client = client_with(MemoryStore::new());
    block_on(client.login("asha", "secret")).unwrap();
    client.api().set_offline(true);

    let form = LoanApplicationForm {
        amount: "500".into(),
        interest_rate: "60".into(),
        ..home_loan_form()
    };
    match block_on(client.apply_for_loan(&form)).unwrap_err() {
        ClientError::Validation(rejected) => assert_eq!(
            rejected.reasons,
            vec![
                "Loan amount must be between $1,000 and $1,000,000".to_string(),
                "Interest rate must be between 1% and 50%".to_string(),
            ]
        ),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(client.api().snapshot().loan_sequence, 100);
}

#[test]
fn test_register_then_login() {
    let mut client = client_with(MemoryStore::new());
    let form = RegistrationForm {
        name: "Ravi Kumar".into(),
        login_id: "ravi".into(),
        email: "ravi@example.com".into(),
        password: "pw123456".into(),
        confirm_password: "pw123456".into(),
        phone_number: "5550100".into(),
        account_number: "ACC2".into(),
        ..RegistrationForm::default()
    };
    block_on(client.register(&form)).unwrap();
    assert!(!client.session().is_authenticated());

    let duplicate = block_on(client.register(&form)).unwrap_err();
    assert_eq!(
        duplicate,
        ClientError::BackendRejected("Customer with this login ID already exists".into())
    );

    let identity = block_on(client.login("ravi", "pw123456")).unwrap();
    assert_eq!(identity.customer_id, "2");
    let overview = block_on(client.load_overview()).unwrap();
    assert_eq!(overview.summary.balance, Some(dec!(0)));
    assert_eq!(overview.summary.total_loan_count, 0);
}

#[test]
fn test_backend_can_be_driven_directly() {
    let backend = FixtureBackend::from_json(SEED).unwrap();
    let login = block_on(backend.login(None, "asha", "secret")).unwrap();
    let loans = block_on(backend.get_loans(Some(&login.token), "1")).unwrap();
    assert_eq!(loans.len(), 2);
}
