use serde_json::Value;

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => tracing::error!(error = %e, "JSON serialization failed"),
    }
}

/// YAML to stdout, for fixtures and hand editing.
pub fn print_yaml(value: &Value) {
    match serde_yaml::to_string(value) {
        Ok(s) => print!("{}", s),
        Err(e) => tracing::error!(error = %e, "YAML serialization failed"),
    }
}
