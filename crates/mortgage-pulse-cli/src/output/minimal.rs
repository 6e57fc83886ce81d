use serde_json::Value;

use super::{format_scalar, result_object};

/// Key answer fields, in priority order.
const PRIORITY_KEYS: [&str; 7] = [
    "monthly_payment_rounded",
    "monthly_payment",
    "term_years",
    "effective_rate",
    "is_valid",
    "shortest_improving_term",
    "special_case",
];

/// Print just the key answer value from the output.
///
/// Scenario sets print one `kind years payment` line per scenario, or the
/// special-case tag when there are none.
pub fn print_minimal(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", format_scalar(value));
        return;
    };

    if let Some(Value::Array(scenarios)) = result.get("scenarios") {
        if scenarios.is_empty() {
            let tag = result.get("special_case").map(format_scalar).unwrap_or_default();
            println!("{}", tag);
        }
        for s in scenarios {
            let field = |k: &str| s.get(k).map(format_scalar).unwrap_or_default();
            println!("{} {} {}", field("kind"), field("years"), field("monthly_payment"));
        }
        return;
    }

    for key in PRIORITY_KEYS {
        if let Some(val) = result.get(key) {
            if !val.is_null() {
                println!("{}", format_scalar(val));
                return;
            }
        }
    }

    if let Some((key, val)) = result.iter().next() {
        println!("{}: {}", key, format_scalar(val));
    }
}
