use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Longest scalar array printed inline; longer ones are summarised.
const INLINE_ARRAY_LIMIT: usize = 12;

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go into one Field/Value table; every list of rows
/// (monthly returns, comparison points, holdings, overlay points) gets its
/// own table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_fields(map);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            print_fields(res_map);
            for (key, val) in res_map {
                if let Some(rows) = row_list(val) {
                    println!("\n{}:", key);
                    print_rows(rows);
                }
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", result),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Rows of a field: an array of objects, or an overlay series `{"points": [...]}`.
fn row_list(value: &Value) -> Option<&[Value]> {
    let arr = match value {
        Value::Array(arr) => arr,
        Value::Object(map) => match map.get("points") {
            Some(Value::Array(arr)) if map.len() == 1 => arr,
            _ => return None,
        },
        _ => return None,
    };
    matches!(arr.first(), Some(Value::Object(_))).then_some(arr.as_slice())
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if row_list(val).is_none() {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) if arr.len() > INLINE_ARRAY_LIMIT => format!("[{} values]", arr.len()),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
