use serde_json::Value;
use std::io::{self, Write};

use super::{cell, is_row_set, ROW_KEYS};

/// Write output as CSV to stdout.
///
/// Results with a row set (cash flows, loan periods...) write those rows;
/// anything else becomes a two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            let rows = result
                .as_object()
                .and_then(|m| ROW_KEYS.iter().find_map(|k| m.get(*k).filter(|v| is_row_set(v))));
            match (rows, result) {
                (Some(Value::Array(rows)), _) => write_rows(&mut wtr, rows),
                (_, Value::Object(fields)) => write_fields(&mut wtr, fields.iter()),
                _ => wtr.write_record([cell(result, "")]).map_err(Into::into),
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => wtr.write_record([cell(value, "")]).map_err(Into::into),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(Into::into)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields<'a, W: Write>(
    wtr: &mut csv::Writer<W>,
    fields: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Result<(), Box<dyn std::error::Error>> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in fields {
        wtr.write_record([key.as_str(), &cell(val, "")])?;
    }
    Ok(())
}

fn write_rows<W: Write>(
    wtr: &mut csv::Writer<W>,
    rows: &[Value],
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([cell(item, "")])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| cell(v, "")).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(rows: &[Value]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, rows).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_use_first_object_headers() {
        let out = render(&[json!({"year": 1, "interest": "150000"}), json!({"year": 2})]);
        let mut rdr = csv::Reader::from_reader(out.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        let year = headers.iter().position(|h| h == "year").unwrap();
        let interest = headers.iter().position(|h| h == "interest").unwrap();

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][year], "1");
        assert_eq!(&rows[0][interest], "150000");
        assert_eq!(&rows[1][interest], "");
    }
}
