use serde_json::Value;

use super::cell;

// Headline field of each command's result, most specific first
const PRIORITY_KEYS: [&str; 9] = [
    "npv",
    "total_score",
    "total_tax",
    "vat_payable",
    "total_debt_service",
    "user_message",
    "grade",
    "irr",
    "script_url",
];

/// Print just the key answer value from the output.
///
/// Scenario comparisons print one `scenario: npv` line per scenario.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        let per_scenario: Vec<String> = ["pessimistic", "base", "optimistic"]
            .iter()
            .filter_map(|name| {
                map.get(*name)
                    .and_then(|s| s.get("npv"))
                    .map(|npv| format!("{name}: {}", cell(npv, "null")))
            })
            .collect();
        if !per_scenario.is_empty() {
            println!("{}", per_scenario.join("\n"));
            return;
        }

        if let Some(val) = PRIORITY_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|val| !val.is_null())
        {
            println!("{}", cell(val, "null"));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val, "null"));
            return;
        }
    }

    if let Value::Array(rows) = result {
        println!("{}", rows.len());
        return;
    }
    println!("{}", cell(result, "null"));
}
