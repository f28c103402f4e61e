//! Customer flows against a fixture backend file. The fixture is written
//! back after each command so issued tokens, registrations and submitted
//! loans carry over to the next invocation.

use std::path::Path;

use clap::Args;
use futures::executor::block_on;
use serde_json::{json, Value};

use bms_core::api::{FixtureBackend, FixtureData};
use bms_core::client::BankClient;
use bms_core::loans::validation::{LoanApplicationForm, RegistrationForm};
use bms_core::session::FileStore;

use crate::commands::session::{open_session, status};
use crate::input;

/// Backend fixture shared by the customer flows
#[derive(Args)]
pub struct FixtureArgs {
    /// JSON/YAML file seeding the backend (customers, accounts, loans)
    #[arg(long)]
    pub fixture: String,
}

/// Arguments for signing in
#[derive(Args)]
pub struct LoginArgs {
    #[command(flatten)]
    pub backend: FixtureArgs,

    #[arg(long)]
    pub login_id: String,

    #[arg(long)]
    pub password: String,
}

/// Arguments for registration
#[derive(Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub backend: FixtureArgs,

    /// Registration form as JSON/YAML (or JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a loan application
#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub backend: FixtureArgs,

    /// Loan form as JSON/YAML (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub loan_type: Option<String>,

    #[arg(long)]
    pub amount: Option<String>,

    #[arg(long, alias = "rate")]
    pub interest_rate: Option<String>,

    #[arg(long, alias = "term")]
    pub term_months: Option<String>,
}

type Client = BankClient<FixtureBackend, FileStore>;

fn open_client(backend: &FixtureArgs, session_file: &Path) -> Result<Client, Box<dyn std::error::Error>> {
    let data: FixtureData = input::file::read_structured(&backend.fixture)?;
    data.check()?;
    Ok(BankClient::new(FixtureBackend::new(data), open_session(session_file)))
}

fn persist(client: &Client, backend: &FixtureArgs) -> Result<(), Box<dyn std::error::Error>> {
    input::file::write_structured(&backend.fixture, &client.api().snapshot())
}

/// Runs `op` and writes the fixture back even when `op` fails.
fn with_client<F>(backend: &FixtureArgs, session_file: &Path, op: F) -> Result<Value, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Client) -> Result<Value, Box<dyn std::error::Error>>,
{
    let mut client = open_client(backend, session_file)?;
    let outcome = op(&mut client);
    persist(&client, backend)?;
    outcome
}

pub fn run_login(args: LoginArgs, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    with_client(&args.backend, session_file, |client| {
        let identity = block_on(client.login(&args.login_id, &args.password))?;
        Ok(json!({
            "customer": identity,
            "displayName": identity.display_name(),
            "session": status(client.session()),
        }))
    })
}

pub fn run_register(args: RegisterArgs, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let form: RegistrationForm = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file (or JSON on stdin) is required for registration".into());
    };

    with_client(&args.backend, session_file, |client| {
        block_on(client.register(&form))?;
        Ok(json!({
            "registered": true,
            "loginId": form.login_id.trim(),
            "message": "Registration successful. Please log in.",
        }))
    })
}

pub fn run_dashboard(args: FixtureArgs, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    with_client(&args, session_file, |client| {
        let overview = block_on(client.load_overview())?;
        Ok(serde_json::to_value(overview)?)
    })
}

pub fn run_apply(args: ApplyArgs, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let form: LoanApplicationForm = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let defaults = LoanApplicationForm::default();
        LoanApplicationForm {
            loan_type: args.loan_type.unwrap_or(defaults.loan_type),
            amount: args.amount.unwrap_or(defaults.amount),
            interest_rate: args.interest_rate.unwrap_or(defaults.interest_rate),
            term_months: args.term_months.unwrap_or(defaults.term_months),
        }
    };

    with_client(&args.backend, session_file, |client| {
        let loan = block_on(client.apply_for_loan(&form))?;
        Ok(json!({
            "loan": loan,
            "message": "Loan application submitted successfully.",
        }))
    })
}
