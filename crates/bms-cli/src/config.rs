//! Process configuration from flags and the environment.
//!
//! | Variable           | Default              |
//! |--------------------|----------------------|
//! | `BMS_SESSION_FILE` | `.bms-session.json`  |
//! | `BMS_LOG`          | `warn`               |
//! | `BMS_LOG_JSON`     | `false`              |
//!
//! A `--session-file` flag wins over `BMS_SESSION_FILE`.

use std::env;
use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_SESSION_FILE: &str = ".bms-session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub session_file: PathBuf,
    pub log_filter: String,
    pub log_json: bool,
}

impl Settings {
    pub fn resolve(session_flag: Option<PathBuf>) -> Self {
        Self::from_lookup(session_flag, |name| env::var(name).ok())
    }

    fn from_lookup(session_flag: Option<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let session_file = session_flag
            .or_else(|| {
                lookup("BMS_SESSION_FILE")
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        let log_filter = lookup("BMS_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "warn".to_string());
        let log_json = lookup("BMS_LOG_JSON")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(false);
        Self {
            session_file,
            log_filter,
            log_json,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// parseable output.
pub fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    if settings.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
