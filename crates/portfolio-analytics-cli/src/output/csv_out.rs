use serde_json::{Map, Value};
use std::io;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Row lists, in the order they are looked for in a result.
const ROW_KEYS: [&str; 8] = [
    "points", "months", "slices", "holdings", "schedule", "bars", "best", "histogram",
];

/// Overlay series written side by side, one row per timestamp.
const OVERLAY_KEYS: [&str; 5] = [
    "ema_fast",
    "ema_slow",
    "bollinger_mid",
    "bollinger_upper",
    "bollinger_lower",
];

/// Write output as CSV to stdout.
///
/// A result holding a list of rows is written as that table; overlays and
/// forecasts are written one row per timestamp; anything else becomes
/// field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result(&mut wtr, result),
            Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows),
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result(wtr: &mut StdoutWriter<'_>, result: &Map<String, Value>) {
    if result.contains_key("ema_fast") {
        write_overlays(wtr, result);
        return;
    }
    if let (Some(Value::Array(axis)), Some(Value::Array(predicted))) =
        (result.get("axis"), result.get("predicted"))
    {
        let _ = wtr.write_record(["time", "predicted"]);
        for (t, p) in axis.iter().zip(predicted) {
            let _ = wtr.write_record([format_csv_value(t), format_csv_value(p)]);
        }
        return;
    }
    for key in ROW_KEYS {
        if let Some(Value::Array(rows)) = result.get(key) {
            write_array_csv(wtr, rows);
            return;
        }
    }
    write_fields(wtr, result);
}

fn write_overlays(wtr: &mut StdoutWriter<'_>, result: &Map<String, Value>) {
    let series: Vec<&[Value]> = OVERLAY_KEYS
        .iter()
        .map(|k| match result.get(*k).and_then(|s| s.get("points")) {
            Some(Value::Array(points)) => points.as_slice(),
            _ => &[][..],
        })
        .collect();

    let mut header = vec!["time"];
    header.extend(OVERLAY_KEYS);
    let _ = wtr.write_record(&header);

    let rows = series.iter().map(|s| s.len()).max().unwrap_or(0);
    for i in 0..rows {
        let time = series
            .iter()
            .find_map(|s| s.get(i).and_then(|p| p.get("time")))
            .map(format_csv_value)
            .unwrap_or_default();
        let mut record = vec![time];
        record.extend(series.iter().map(|s| {
            s.get(i)
                .and_then(|p| p.get("value"))
                .map(format_csv_value)
                .unwrap_or_default()
        }));
        let _ = wtr.write_record(&record);
    }
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
