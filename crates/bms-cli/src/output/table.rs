use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields go into one Field/Value table; every array of records
/// (loans, loan types) gets a titled table of its own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_sections(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => println!("{}", field_table(res_map.iter())),
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_sections(map: &Map<String, Value>) {
    let (records, scalars): (Vec<_>, Vec<_>) = map.iter().partition(|(_, v)| is_record_list(v));

    // Nested single records (summary, customer, loan) flatten into the same table
    let mut rows: Vec<(String, &Value)> = Vec::new();
    for (key, val) in scalars {
        match val {
            Value::Object(inner) if !inner.contains_key("action") => {
                for (k, v) in inner {
                    rows.push((format!("{}.{}", key, k), v));
                }
            }
            _ => rows.push((key.clone(), val)),
        }
    }
    if !rows.is_empty() {
        println!("{}", field_table(rows.iter().map(|(k, v)| (k, *v))));
    }

    for (key, val) in records {
        if let Value::Array(arr) = val {
            println!("\n{}:", key);
            print_array_table(arr);
        }
    }
}

fn is_record_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

fn field_table<'a, K: AsRef<str> + 'a>(rows: impl Iterator<Item = (K, &'a Value)>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key.as_ref().to_string(), format_value(val)]);
    }
    builder.build()
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", builder.build());
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => match (map.get("action"), map.get("route")) {
            (Some(Value::String(action)), Some(Value::String(route))) => format!("{} {}", action, route),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}
