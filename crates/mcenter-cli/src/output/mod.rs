pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Arrays inside a result that read best as their own row set, in the order
/// they are looked up.
pub(crate) const ROW_KEYS: [&str; 5] = ["cash_flows", "periods", "dscr", "categories", "brackets"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a single cell. `null` becomes `null_text`; nested values are
/// written as compact JSON.
pub(crate) fn cell(value: &Value, null_text: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null_text.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(|v| cell(v, null_text))
            .collect::<Vec<_>>()
            .join(", "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// `true` for arrays of objects, which are rendered as row sets.
pub(crate) fn is_row_set(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.first().is_some_and(Value::is_object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_formats() {
        assert_eq!(cell(&json!("12.5"), ""), "12.5");
        assert_eq!(cell(&json!(null), "-"), "-");
        assert_eq!(cell(&json!(["a", "b"]), ""), "a, b");
        assert_eq!(cell(&json!({"k": 1}), ""), r#"{"k":1}"#);
    }

    #[test]
    fn test_row_set_detection() {
        assert!(is_row_set(&json!([{"year": 1}])));
        assert!(!is_row_set(&json!([1, 2])));
        assert!(!is_row_set(&json!([])));
    }
}
