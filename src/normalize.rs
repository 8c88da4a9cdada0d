//! Value unwrapping and unit conversion for display.

use crate::feature::{Feature, FeatureValue, MAX_NESTING_DEPTH};
use serde_json::Value;

pub const UNIT_REVOLUTIONS_PER_SECOND: &str = "revolutionsPerSecond";
pub const UNIT_RPM: &str = "RPM";
pub const UNIT_WATT: &str = "watt";
pub const UNIT_KILOWATT: &str = "kilowatt";

/// Strip `{value: …}` envelopes from raw JSON until a scalar (or an object without `value`) is
/// left. Idempotent.
pub fn unwrap_value(value: &Value) -> &Value {
    let mut current = value;
    for _ in 0..MAX_NESTING_DEPTH {
        match current.get("value") {
            Some(inner) if current.is_object() => current = inner,
            _ => break,
        }
    }
    current
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayValue {
    pub value: f64,
    pub unit: Option<String>,
}

/// Convert a reading into its display unit. Unknown units pass through untouched.
pub fn convert_unit(value: f64, unit: Option<&str>) -> DisplayValue {
    match unit {
        Some(UNIT_REVOLUTIONS_PER_SECOND) => DisplayValue {
            value: value * 60.0,
            unit: Some(UNIT_RPM.to_string()),
        },
        Some(UNIT_WATT) if value.abs() >= 1000.0 => DisplayValue {
            value: value / 1000.0,
            unit: Some(UNIT_KILOWATT.to_string()),
        },
        _ => DisplayValue {
            value,
            unit: unit.map(String::from),
        },
    }
}

/// Short label for a vendor unit name.
pub fn unit_label(unit: &str) -> &str {
    match unit {
        "celsius" => "°C",
        "kelvin" => "K",
        "percent" => "%",
        "bar" => "bar",
        "liter/hour" => "l/h",
        UNIT_WATT => "W",
        UNIT_KILOWATT => "kW",
        "kilowattHour" => "kWh",
        "ampere" => "A",
        "hour" => "h",
        UNIT_REVOLUTIONS_PER_SECOND => "U/s",
        other => other,
    }
}

/// Normalised, display-ready reading of a feature, or `None` when it does not resolve to a
/// number.
pub fn display_value(feature: &Feature) -> Option<DisplayValue> {
    let resolved = feature.resolve();
    let unit = resolved.unit.as_deref().or(feature.unit.as_deref());
    resolved
        .value
        .as_f64()
        .map(|value| convert_unit(value, unit))
}

/// The same feature name may carry a plain number on one device and a `{status, value}` compound
/// on another. Only the former may be formatted as a number.
pub fn is_valid_numeric_value(feature: Option<&Feature>) -> bool {
    match feature.map(|f| &f.value) {
        Some(FeatureValue::Number(n)) => n.is_finite(),
        _ => false,
    }
}

/// Strictly numeric value of a feature.
pub fn numeric_value(feature: Option<&Feature>) -> Option<f64> {
    if is_valid_numeric_value(feature) {
        feature.and_then(|f| f.value.as_f64())
    } else {
        None
    }
}
