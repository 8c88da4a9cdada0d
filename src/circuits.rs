//! Heating circuit detection and per-circuit curve parameters.

use crate::feature::{Category, FeatureValue, TelemetryDocument};
use crate::locator;
use crate::normalize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::convert::TryFrom;

const CIRCUITS_FEATURE: &str = "heating.circuits";
const CIRCUIT_PREFIX: &str = "heating.circuits.";

/// Room setpoint assumed when the active program does not expose one.
pub const DEFAULT_ROOM_SETPOINT: f64 = 20.0;

/// Indices of the active heating circuits, ascending.
///
/// Newer payloads list them under `heating.circuits` → `enabled`; older ones only reveal them
/// through `heating.circuits.N.*` keys. With neither, a single circuit 0 is assumed.
pub fn detect_circuits(document: &TelemetryDocument) -> Vec<u32> {
    if let Some(enabled) = enabled_circuits(document) {
        return enabled;
    }

    let inferred: BTreeSet<u32> = document
        .categories()
        .flat_map(|(_, features)| features.keys())
        .filter_map(|name| circuit_index(name))
        .collect();

    if inferred.is_empty() {
        log::debug!("no circuit features found, assuming circuit 0");
        vec![0]
    } else {
        inferred.into_iter().collect()
    }
}

fn enabled_circuits(document: &TelemetryDocument) -> Option<Vec<u32>> {
    let enabled = document
        .category(Category::Circuits)
        .and_then(|features| features.get(CIRCUITS_FEATURE))
        .and_then(|feature| feature.child("enabled"))?;

    /* unwrap one `{type: "array", value: [...]}` level */
    let circuits: Vec<u32> = match &enabled.resolve().value {
        FeatureValue::Array(items) => items.iter().filter_map(parse_index).collect(),
        FeatureValue::Number(n) => parse_index(&Value::from(*n)).into_iter().collect(),
        FeatureValue::String(s) => parse_index(&Value::from(s.as_str())).into_iter().collect(),
        _ => Vec::new(),
    };

    if circuits.is_empty() {
        log::warn!("heating.circuits lists no usable enabled circuits, inferring from keys");
        None
    } else {
        Some(circuits)
    }
}

fn parse_index(value: &Value) -> Option<u32> {
    match normalize::unwrap_value(value) {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `N` of a `heating.circuits.N.…` key.
pub fn circuit_index(feature_name: &str) -> Option<u32> {
    let rest = feature_name.strip_prefix(CIRCUIT_PREFIX)?;
    let (digits, _) = rest.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Heating curve settings of one circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParameters {
    pub slope: f64,
    pub shift: f64,
    pub min_supply: Option<f64>,
    pub max_supply: Option<f64>,
}

impl CurveParameters {
    /// `None` when the circuit has no heating curve.
    pub fn for_circuit(document: &TelemetryDocument, circuit: u32) -> Option<CurveParameters> {
        let curve = format!("heating.circuits.{}.heating.curve", circuit);
        let levels = format!("heating.circuits.{}.temperature.levels", circuit);
        let number = |feature: &str, property: &str| {
            normalize::numeric_value(locator::find_nested(document, feature, property).as_ref())
        };

        let slope = number(&curve, "slope")?;
        let shift = number(&curve, "shift")?;

        Some(CurveParameters {
            slope,
            shift,
            min_supply: number(&levels, "min"),
            max_supply: number(&levels, "max"),
        })
    }
}

/// Name of the circuit's active operating program, e.g. `normal` or `comfort`.
pub fn active_program(document: &TelemetryDocument, circuit: u32) -> Option<String> {
    let name = format!("heating.circuits.{}.operating.programs.active", circuit);
    locator::find(document, &[name.as_str()], &[])
        .and_then(|f| f.value.as_str().map(String::from))
}

/// Room setpoint stored in the active program, defaulting to [`DEFAULT_ROOM_SETPOINT`].
pub fn room_setpoint(document: &TelemetryDocument, circuit: u32) -> f64 {
    active_program(document, circuit)
        .and_then(|program| {
            let feature = format!("heating.circuits.{}.operating.programs.{}", circuit, program);
            normalize::numeric_value(locator::find_nested(document, &feature, "temperature").as_ref())
        })
        .unwrap_or(DEFAULT_ROOM_SETPOINT)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> TelemetryDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn explicit_enabled_list() {
        let doc = document(json!({
            "circuits": {"heating.circuits": {"value": {"enabled": {"type": "array", "value": [0, 1]}}}}
        }));
        assert_eq!(vec![0, 1], detect_circuits(&doc));
    }

    #[test]
    fn explicit_enabled_list_of_strings() {
        let doc = document(json!({
            "circuits": {"heating.circuits": {
                "type": "object",
                "value": {"enabled": {"type": "array", "value": ["0", "2"]}}
            }}
        }));
        assert_eq!(vec![0, 2], detect_circuits(&doc));
    }

    #[test]
    fn explicit_single_circuit() {
        let doc = document(json!({
            "circuits": {"heating.circuits": {"value": {"enabled": {"type": "string", "value": "1"}}}}
        }));
        assert_eq!(vec![1], detect_circuits(&doc));
    }

    #[test]
    fn inferred_from_keys() {
        let doc = document(json!({
            "circuits": {
                "heating.circuits.0.sensors.temperature.supply": {"type": "number", "value": 35.0}
            },
            "operatingModes": {
                "heating.circuits.2.operating.modes.active": {"type": "string", "value": "heating"}
            }
        }));
        assert_eq!(vec![0, 2], detect_circuits(&doc));
    }

    #[test]
    fn default_circuit() {
        let doc = document(json!({
            "temperatures": {"heating.sensors.temperature.outside": {"type": "number", "value": 3.0}}
        }));
        assert_eq!(vec![0], detect_circuits(&doc));
        assert_eq!(vec![0], detect_circuits(&TelemetryDocument::default()));
    }

    #[test]
    fn circuit_index_parsing() {
        assert_eq!(Some(12), circuit_index("heating.circuits.12.heating.curve"));
        assert_eq!(None, circuit_index("heating.circuits"));
        assert_eq!(None, circuit_index("heating.circuits.x.name"));
        assert_eq!(None, circuit_index("heating.circuits.3"));
        assert_eq!(None, circuit_index("heating.dhw.temperature.main"));
    }

    #[test]
    fn curve_parameters_and_setpoint() {
        let doc = document(json!({
            "circuits": {
                "heating.circuits.1.heating.curve": {"type": "object", "value": {
                    "slope": {"type": "number", "value": 1.2},
                    "shift": {"type": "number", "value": 2}
                }},
                "heating.circuits.1.temperature.levels": {"type": "object", "value": {
                    "min": {"type": "number", "value": 20, "unit": "celsius"},
                    "max": {"type": "number", "value": 55, "unit": "celsius"}
                }}
            },
            "operatingModes": {
                "heating.circuits.1.operating.programs.active": {"type": "string", "value": "comfort"},
                "heating.circuits.1.operating.programs.comfort": {"type": "object", "value": {
                    "active": {"type": "boolean", "value": true},
                    "temperature": {"type": "number", "value": 22.5, "unit": "celsius"}
                }}
            }
        }));

        let params = CurveParameters::for_circuit(&doc, 1).unwrap();
        assert_eq!(1.2, params.slope);
        assert_eq!(2.0, params.shift);
        assert_eq!(Some(20.0), params.min_supply);
        assert_eq!(Some(55.0), params.max_supply);
        assert_eq!(None, CurveParameters::for_circuit(&doc, 0));

        assert_eq!(Some("comfort".to_string()), active_program(&doc, 1));
        assert_eq!(22.5, room_setpoint(&doc, 1));
        assert_eq!(DEFAULT_ROOM_SETPOINT, room_setpoint(&doc, 0));
    }
}
