mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

use commands::loans::{EmiArgs, SummaryArgs, ValidateLoanArgs};
use commands::portal::{ApplyArgs, FixtureArgs, LoginArgs, RegisterArgs};
use commands::session::{RouteArgs, SessionCommand};
use config::Settings;

/// Bank management client: loans, accounts and sessions
#[derive(Parser)]
#[command(
    name = "bms",
    version,
    about = "Bank management client: loans, accounts and sessions",
    long_about = "Client-side tooling for the bank management system. Computes EMIs, \
                  validates loan applications, summarizes accounts and drives the \
                  customer session (login, dashboard, loan applications) against a \
                  fixture backend. Decimal precision throughout."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Session file (defaults to $BMS_SESSION_FILE, then .bms-session.json)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly instalment, total payment and total interest
    Emi(EmiArgs),
    /// Validate a loan application form
    ValidateLoan(ValidateLoanArgs),
    /// Summarize an account and its loans
    Summary(SummaryArgs),
    /// List loan products and term options
    LoanTypes,
    /// Resolve a route against the current session
    Route(RouteArgs),
    /// Inspect or clear the persisted session
    #[command(subcommand)]
    Session(SessionCommand),
    /// Sign in against a fixture backend
    Login(LoginArgs),
    /// Register a customer with a fixture backend
    Register(RegisterArgs),
    /// Account overview for the signed-in customer
    Dashboard(FixtureArgs),
    /// Submit a loan application
    Apply(ApplyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.session_file);
    config::init_logging(&settings);
    let session_file = settings.session_file.as_path();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loans::run_emi(args),
        Commands::ValidateLoan(args) => commands::loans::run_validate_loan(args),
        Commands::Summary(args) => commands::loans::run_summary(args),
        Commands::LoanTypes => commands::loans::run_loan_types(),
        Commands::Route(args) => commands::session::run_route(args, session_file),
        Commands::Session(command) => commands::session::run_session(command, session_file),
        Commands::Login(args) => commands::portal::run_login(args, session_file),
        Commands::Register(args) => commands::portal::run_register(args, session_file),
        Commands::Dashboard(args) => commands::portal::run_dashboard(args, session_file),
        Commands::Apply(args) => commands::portal::run_apply(args, session_file),
        Commands::Version => {
            println!("bms {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
