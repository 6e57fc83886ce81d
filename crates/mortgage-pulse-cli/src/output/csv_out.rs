use serde_json::Value;
use std::io;

use super::{format_scalar, result_object, row_field};

/// Write output as CSV to stdout. Results with row detail (scenarios,
/// schedules, curves) become one record per row; anything else is written
/// as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_object(value) {
        Some(result) => match row_field(result) {
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
        },
        None => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };

    let headers: Vec<&str> = first
        .keys()
        .map(|k| k.as_str())
        .filter(|k| *k != "validation")
        .collect();
    let _ = wtr.write_record(&headers);

    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}
