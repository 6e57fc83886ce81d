pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Fields of a result holding per-row detail rather than a single figure.
pub(crate) const ROW_FIELDS: [&str; 4] = ["scenarios", "schedule", "payment_curve", "violations"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The computation result, unwrapped from the metadata envelope when present.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    let inner = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);
    inner.as_object()
}

/// First row-detail array in a result, with its field name.
pub(crate) fn row_field(result: &Map<String, Value>) -> Option<(&'static str, &Vec<Value>)> {
    ROW_FIELDS
        .iter()
        .find_map(|key| result.get(*key).and_then(Value::as_array).map(|rows| (*key, rows)))
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
