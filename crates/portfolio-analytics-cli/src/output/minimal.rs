use serde_json::Value;

/// Headline figure per result shape, as dotted paths into `result`.
const HEADLINE_PATHS: [&str; 9] = [
    "var",
    "portfolio_vs_market",
    "delta_return",
    "yield_on_capital",
    "mean",
    "total",
    "fit.slope",
    "best.0.name",
    "display_from",
];

/// Print just the headline value of a result.
///
/// Falls back to the first field when no known path is present.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for path in HEADLINE_PATHS {
        if let Some(val) = lookup(result, path).filter(|v| !v.is_null()) {
            println!("{}", format_minimal(val));
            return;
        }
    }

    match result {
        Value::Object(map) => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, part| match part.parse::<usize>() {
        Ok(i) => v.get(i),
        Err(_) => v.get(part),
    })
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
