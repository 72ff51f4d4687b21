use crate::error::{PriceEngineError, Result};
use crate::schema::ForecastRequest;
use log::{debug, warn};
use serde_json::Value;
use std::io::Read;

/// Parses the forecaster's stdin payload.
///
/// Only the first line is considered. Empty input or text that is not JSON at
/// all falls back to the default request. A JSON document that is not an
/// object, or a `currentPrice` that cannot be read as a number, is an error.
pub fn parse_request(input: &str) -> Result<ForecastRequest> {
    parse_request_with_default(input, ForecastRequest::default().current_price)
}

pub fn parse_request_with_default(input: &str, default_price: f64) -> Result<ForecastRequest> {
    let defaults = ForecastRequest {
        current_price: default_price,
        crop_name: None,
    };

    let Some(first_line) = input.lines().next().filter(|l| !l.trim().is_empty()) else {
        debug!("Empty request, using default price {}", default_price);
        return Ok(defaults);
    };

    let value: Value = match serde_json::from_str(first_line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring malformed request ({}), using default price", e);
            return Ok(defaults);
        }
    };

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(PriceEngineError::InvalidInput(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let current_price = match fields.get("currentPrice") {
        None => default_price,
        Some(raw) => coerce_price(raw)?,
    };

    let crop_name = fields
        .get("cropName")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ForecastRequest {
        current_price,
        crop_name,
    })
}

/// Reads the whole payload. An unreadable stream counts as empty input, which
/// later resolves to the default price.
pub fn read_input<R: Read>(mut reader: R) -> String {
    let mut input = String::new();
    if let Err(e) = reader.read_to_string(&mut input) {
        warn!("Could not read request ({}), treating it as empty", e);
        input.clear();
    }
    input
}

/// Accepts JSON numbers, booleans (as 1 and 0) and numeric strings such as
/// `"2500"` or `" 12.5 "`.
fn coerce_price(raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            PriceEngineError::InvalidInput(format!("currentPrice {} is not representable", n))
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            PriceEngineError::InvalidInput(format!(
                "could not convert string to float: '{}'",
                s
            ))
        }),
        other => Err(PriceEngineError::InvalidInput(format!(
            "currentPrice must be a number, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
