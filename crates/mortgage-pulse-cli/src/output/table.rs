use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_object, ROW_FIELDS};

/// Format output as tables: scalar fields first, then one table per
/// row-detail field (scenarios, schedule, ...).
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        if ROW_FIELDS.contains(&key.as_str()) {
            continue;
        }
        builder.push_record([key.as_str(), &format_nested(val)]);
    }
    println!("{}", Table::from(builder));

    for key in ROW_FIELDS {
        if let Some(Value::Array(rows)) = result.get(key) {
            println!("\n{}:", key);
            print_rows(rows);
        }
    }

    if let Some(envelope) = value.as_object() {
        print_envelope(envelope);
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(none)");
        return;
    };

    // Nested validation detail is summarised by its messages elsewhere.
    let headers: Vec<String> = first
        .keys()
        .filter(|k| k.as_str() != "validation")
        .cloned()
        .collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_nested).unwrap_or_default())
                .collect();
            builder.push_record(cells);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_nested(value: &Value) -> String {
    match value {
        Value::Array(arr) => arr.iter().map(format_nested).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, format_nested(v)))
            .collect::<Vec<_>>()
            .join(" "),
        other => format_scalar(other),
    }
}
