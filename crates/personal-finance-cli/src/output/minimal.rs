use serde_json::Value;

use super::{format_value, result_of};

/// Key answer fields, in priority order.
const PRIORITY_KEYS: [&str; 9] = [
    "emi",
    "maturity_amount",
    "total_tax",
    "cheapest_regime",
    "months_to_payoff",
    "least_interest",
    "converted_amount",
    "compounding_advantage",
    "price",
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(result_of(value)));
}

fn minimal_line(result: &Value) -> String {
    if let Value::Object(map) = result {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return format_value(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_value(val));
        }
    }
    format_value(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_priority_key_wins() {
        let result = json!({"schedule": [], "total_interest": "5", "emi": "21695.58"});
        assert_eq!(minimal_line(&result), "21695.58");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let result = json!({"alpha": "1"});
        assert_eq!(minimal_line(&result), "alpha: 1");
    }
}
