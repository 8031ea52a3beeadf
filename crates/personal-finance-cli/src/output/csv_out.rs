use serde_json::Value;
use std::io;

use super::{format_value, result_of, split_rows};

/// Write output as CSV to stdout.
///
/// A result that carries rows (a schedule, a breakdown, per-debt outcomes) is
/// written as those rows so it can be loaded straight into a spreadsheet;
/// otherwise the scalar fields are written as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_of(value) {
        Value::Object(map) => {
            let (scalars, row_sets) = split_rows(map);
            match row_sets.first() {
                Some((_, rows)) => write_rows(&mut wtr, rows),
                None => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in scalars {
                        let _ = wtr.write_record([key, format_value(val).as_str()]);
                    }
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([format_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([format_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_value).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn to_csv(rows: &[Value]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_rows(&mut wtr, rows);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_use_first_object_headers() {
        let rows = vec![
            json!({"month": 1, "payment": "100"}),
            json!({"month": 2, "payment": "100", "extra": "x"}),
        ];
        assert_eq!(to_csv(&rows), "month,payment\n1,100\n2,100\n");
    }

    #[test]
    fn test_missing_cells_are_blank() {
        let rows = vec![json!({"a": 1, "b": 2}), json!({"a": 3})];
        assert_eq!(to_csv(&rows), "a,b\n1,2\n3,\n");
    }
}
