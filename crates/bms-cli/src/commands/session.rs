use std::path::Path;

use clap::{Args, Subcommand};
use serde_json::{json, Value};

use bms_core::session::{FileStore, Route, SessionManager};

/// Arguments for route resolution
#[derive(Args)]
pub struct RouteArgs {
    /// Location path, e.g. /dashboard or /apply-loan?type=HOME
    pub path: String,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Show the persisted session
    Status,
    /// Sign out and clear the persisted session
    Logout,
}

/// Session over the file store, restored from disk.
pub fn open_session(path: &Path) -> SessionManager<FileStore> {
    let mut session = SessionManager::new(FileStore::new(path));
    if session.restore() {
        tracing::debug!(path = %path.display(), "session restored");
    }
    session
}

pub fn run_route(args: RouteArgs, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let route: Route = args.path.parse()?;
    let session = open_session(session_file);
    Ok(json!({
        "route": route,
        "authenticated": session.is_authenticated(),
        "decision": session.resolve(route),
    }))
}

pub fn run_session(command: SessionCommand, session_file: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = open_session(session_file);
    match command {
        SessionCommand::Status => Ok(status(&session)),
        SessionCommand::Logout => {
            session.logout()?;
            Ok(status(&session))
        }
    }
}

pub fn status(session: &SessionManager<FileStore>) -> Value {
    json!({
        "authenticated": session.is_authenticated(),
        "customer": session.identity(),
        "sessionFile": session.store().path().display().to_string(),
    })
}
