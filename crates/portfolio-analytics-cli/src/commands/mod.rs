pub mod forecast;
pub mod indicators;
pub mod portfolio;
pub mod risk;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::input;

/// Read the request document from `--input` or piped stdin.
pub(crate) fn read_request(
    path: Option<&str>,
    what: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json_value(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

/// Set `key` from the config when the request leaves it out.
pub(crate) fn fill_default<T: Serialize>(
    request: &mut Value,
    key: &str,
    value: T,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = request
        .as_object_mut()
        .ok_or("request document must be a JSON object")?;
    if !map.contains_key(key) {
        map.insert(key.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

/// Set `key` from a command-line flag, replacing any request value.
pub(crate) fn apply_flag<T: Serialize>(
    request: &mut Value,
    key: &str,
    flag: Option<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(value) = flag {
        let map = request
            .as_object_mut()
            .ok_or("request document must be a JSON object")?;
        map.insert(key.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

/// Resolve a nested settings block: the config value, with any keys the
/// request sets under `key` laid over it.
pub(crate) fn merge_section<T: Serialize + DeserializeOwned>(
    request: &Value,
    key: &str,
    config: T,
) -> Result<T, Box<dyn std::error::Error>> {
    let mut merged = serde_json::to_value(config)?;
    match (request.get(key), merged.as_object_mut()) {
        (None, _) => {}
        (Some(Value::Object(fields)), Some(target)) => {
            for (name, value) in fields {
                target.insert(name.clone(), value.clone());
            }
        }
        (Some(_), _) => return Err(format!("'{key}' must be a JSON object").into()),
    }
    Ok(serde_json::from_value(merged)?)
}
