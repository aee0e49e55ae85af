use colored::Colorize;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, is_row_set, ROW_KEYS};

/// Render output as tables: scalar fields as a Field/Value table, then each
/// row set (cash flows, loan periods, category scores...) as its own table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_result(result);
                print_envelope_notes(map);
            }
            None => print_object(map),
        },
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", cell(value, "-")),
    }
}

fn print_result(result: &Value) {
    let Value::Object(map) = result else {
        println!("{}", cell(result, "-"));
        return;
    };

    // Scenario comparison: one column per scenario
    if map.contains_key("base") && map.values().all(Value::is_object) {
        print_side_by_side(map);
        return;
    }
    print_object(map);
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map.iter().filter(|(_, v)| !is_row_set(v)) {
        builder.push_record([key.as_str(), &cell(val, "-")]);
    }
    println!("{}", Table::from(builder));

    let nested = ROW_KEYS
        .iter()
        .filter_map(|key| map.get(*key).map(|v| (*key, v)))
        .chain(
            map.iter()
                .filter(|(k, _)| !ROW_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v)),
        )
        .filter(|(_, v)| is_row_set(v));
    for (key, rows) in nested {
        if let Value::Array(rows) = rows {
            println!("\n{}", key.bold());
            print_rows(rows);
        }
    }
}

fn print_side_by_side(map: &Map<String, Value>) {
    let names: Vec<&String> = map.keys().collect();
    let Some(Value::Object(first)) = map.values().next() else {
        return;
    };

    let mut builder = Builder::default();
    let mut header = vec!["Field".to_string()];
    header.extend(names.iter().map(|n| n.to_string()));
    builder.push_record(header);
    for field in first.keys().filter(|k| !is_row_set(&first[*k])) {
        let mut row = vec![field.clone()];
        row.extend(
            names
                .iter()
                .map(|n| map[*n].get(field).map(|v| cell(v, "-")).unwrap_or_default()),
        );
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("(empty)");
        }
        for item in rows {
            println!("{}", cell(item, "-"));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(|v| cell(v, "-")).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
