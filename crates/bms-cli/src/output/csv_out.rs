use serde_json::{Map, Value};
use std::io;

/// Record lists worth exporting on their own, in order of preference.
const RECORD_KEYS: [&str; 4] = ["loans", "recentLoans", "loanTypes", "termOptions"];

/// Write output as CSV to stdout.
///
/// Outputs carrying a list of records (loans, loan types) export that list;
/// everything else becomes two-column `field,value` rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                write_fields(&mut wtr, result);
            } else if let Some(Value::Array(records)) =
                RECORD_KEYS.iter().find_map(|k| map.get(*k).filter(|v| v.is_array()))
            {
                write_array_csv(&mut wtr, records);
            } else {
                write_fields(&mut wtr, map);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        match val {
            Value::Object(inner) => {
                for (k, v) in inner {
                    let _ = wtr.write_record([format!("{}.{}", key, k), format_csv_value(v)]);
                }
            }
            _ => {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Loans may omit optional fields; the header is the union of all keys
    if arr.iter().all(Value::is_object) {
        let mut headers: Vec<&str> = Vec::new();
        for item in arr {
            if let Value::Object(map) = item {
                for key in map.keys() {
                    if !headers.contains(&key.as_str()) {
                        headers.push(key.as_str());
                    }
                }
            }
        }
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
