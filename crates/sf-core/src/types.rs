//! Common types used throughout SalesFlow

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a stored monetary value into a number.
///
/// Numbers pass through, numeric strings are parsed (thousands separators
/// and surrounding whitespace are ignored), anything else is `None`.
pub fn coerce_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    amount.filter(|a| a.is_finite())
}

/// Round a monetary amount to cents
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Serde adapter for monetary fields that may hold garbage upstream.
///
/// ```ignore
/// #[serde(default, deserialize_with = "sf_core::types::lenient_amount")]
/// pub contract_value: Option<f64>,
/// ```
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_amount))
}

/// A discount percentage is a finite number in `0..=100`
pub fn is_valid_percent(percent: f64) -> bool {
    percent.is_finite() && (0.0..=100.0).contains(&percent)
}
