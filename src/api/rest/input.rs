use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Decodes an optional JSON body. An empty body yields the default request.
pub fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|err| AppError::Validation(format!("invalid request body: {err}")))
}

/// Reads a JSON number or numeric string. Null and blank strings are absent.
pub fn optional_number(field: &str, value: Option<&Value>) -> Result<Option<f64>, AppError> {
    let invalid = || AppError::InvalidNumeric(field.to_string());

    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    parsed.filter(|v| v.is_finite()).map(Some).ok_or_else(invalid)
}
