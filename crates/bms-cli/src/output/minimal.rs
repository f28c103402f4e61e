use serde_json::Value;

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
fn minimal_text(value: &Value) -> String {
    // Unwrap the computation envelope or a single nested record
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result").or_else(|| m.get("loan")).or_else(|| m.get("summary")))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "valid",
        "emi",
        "loanId",
        "decision",
        "activeLoanCount",
        "authenticated",
        "registered",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    // Not an object, just print directly
    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        // Route decisions print as "redirect /login"
        Value::Object(map) if map.contains_key("action") => {
            let action = map.get("action").and_then(Value::as_str).unwrap_or_default();
            let route = map.get("route").and_then(Value::as_str).unwrap_or_default();
            format!("{} {}", action, route)
        }
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
