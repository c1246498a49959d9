//! Lenient conversion of raw market payloads into [`AssetRecord`]s.
//!
//! A single bad item never fails a payload: it is skipped with a
//! [`SkipReason`] and the rest of the batch goes through. Only a payload
//! that is not a JSON array is an error.
//!
//! The same per-item rules are used to read persisted snapshots, so a
//! snapshot written by an older build degrades the same way an upstream
//! response does.

mod skip_reason;

pub use skip_reason::{NormalizedBatch, SkipReason, SkippedItem};

use serde_json::{Map, Value};

use crate::errors::MarketDataError;
use crate::models::AssetRecord;

/// Upstream name of the 7d change field when `price_change_percentage=7d` is requested.
const CHANGE_7D_UPSTREAM: &str = "price_change_percentage_7d_in_currency";
const CHANGE_7D: &str = "price_change_percentage_7d";

/// Normalize a whole `coins/markets` payload.
///
/// Returns [`MarketDataError::Decode`] if the payload is not an array.
pub fn normalize_markets(provider: &str, payload: &Value) -> Result<NormalizedBatch, MarketDataError> {
    let items = payload.as_array().ok_or_else(|| MarketDataError::Decode {
        provider: provider.to_string(),
        message: format!("expected a JSON array, got {}", json_type_name(payload)),
    })?;

    let mut batch = NormalizedBatch::new();
    for (index, item) in items.iter().enumerate() {
        match normalize_item(item) {
            Ok(record) => batch.record_kept(record),
            Err(reason) => batch.record_skip(index, item_id(item), reason),
        }
    }
    Ok(batch)
}

/// Normalize a single raw item.
pub fn normalize_item(item: &Value) -> Result<AssetRecord, SkipReason> {
    normalize_item_with_symbol(item, None)
}

/// Normalize a single raw item, falling back to `default_symbol` when the
/// item carries none (used for snapshots keyed by symbol).
pub fn normalize_item_with_symbol(
    item: &Value,
    default_symbol: Option<&str>,
) -> Result<AssetRecord, SkipReason> {
    let obj = item.as_object().ok_or(SkipReason::NotAnObject)?;

    let id = identifier(obj.get("id")).ok_or(SkipReason::MissingId)?;
    let symbol = non_empty_text(obj.get("symbol"))
        .or_else(|| {
            default_symbol
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .ok_or(SkipReason::MissingSymbol)?;

    Ok(AssetRecord {
        id,
        symbol: symbol.to_uppercase(),
        name: to_text(obj.get("name")),
        image: to_text(obj.get("image")),
        current_price: to_float(obj.get("current_price")),
        market_cap: to_float(obj.get("market_cap")),
        market_cap_rank: to_rank(obj.get("market_cap_rank")),
        total_volume: to_float(obj.get("total_volume")),
        high_24h: to_float(obj.get("high_24h")),
        low_24h: to_float(obj.get("low_24h")),
        price_change_percentage_24h: to_float(obj.get("price_change_percentage_24h")),
        price_change_percentage_7d: change_7d(obj),
        ath: to_float(obj.get("ath")),
        atl: to_float(obj.get("atl")),
        last_updated: to_text(obj.get("last_updated")),
    })
}

/// Coerce a numeric-looking value to `f64`.
///
/// Numbers and numeric strings convert; null, booleans, other strings,
/// containers and non-finite results become `None`.
pub fn to_float(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Coerce an integer-looking value to `i64`.
pub fn to_rank(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn to_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The id is opaque: strings are kept as given and numbers in their JSON
/// form. Blank strings count as missing.
fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn change_7d(obj: &Map<String, Value>) -> Option<f64> {
    to_float(obj.get(CHANGE_7D_UPSTREAM)).or_else(|| to_float(obj.get(CHANGE_7D)))
}

fn item_id(item: &Value) -> Option<String> {
    identifier(item.get("id"))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
