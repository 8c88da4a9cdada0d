//! Typed view over the vendor telemetry document.
//!
//! Every feature arrives as a loosely typed `{type, value, unit}` envelope whose `value` may itself
//! be a mapping of further envelopes. The JSON is parsed once into [`Feature`] and everything
//! downstream matches on [`FeatureValue`] instead of sniffing shapes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nesting is tree shaped; anything deeper than this is treated as malformed.
pub const MAX_NESTING_DEPTH: usize = 10;

pub type FeatureMap = IndexMap<String, Feature>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Number,
    String,
    Boolean,
    Object,
    Array,
    /// Envelope without a (recognised) `type` tag.
    Unknown,
    /// Scalar or mapping that arrived without any envelope around it.
    Bare,
}

impl FeatureType {
    pub fn from_tag(tag: &str) -> FeatureType {
        match tag {
            "number" => FeatureType::Number,
            "string" => FeatureType::String,
            "boolean" => FeatureType::Boolean,
            "object" => FeatureType::Object,
            "array" => FeatureType::Array,
            "bare" => FeatureType::Bare,
            _ => FeatureType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Number => "number",
            FeatureType::String => "string",
            FeatureType::Boolean => "boolean",
            FeatureType::Object => "object",
            FeatureType::Array => "array",
            FeatureType::Unknown => "unknown",
            FeatureType::Bare => "bare",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    Object(FeatureMap),
    Array(Vec<Value>),
}

impl FeatureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FeatureValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FeatureValue::Null => Value::Null,
            FeatureValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FeatureValue::String(s) => Value::String(s.to_owned()),
            FeatureValue::Boolean(b) => Value::Bool(*b),
            FeatureValue::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.to_owned(), child.to_json()))
                    .collect(),
            ),
            FeatureValue::Array(items) => Value::Array(items.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureType,
    pub value: FeatureValue,
    pub unit: Option<String>,
}

impl Feature {
    pub fn new(kind: FeatureType, value: FeatureValue, unit: Option<&str>) -> Feature {
        Feature {
            kind,
            value,
            unit: unit.map(String::from),
        }
    }

    pub fn number(value: f64, unit: Option<&str>) -> Feature {
        Feature::new(FeatureType::Number, FeatureValue::Number(value), unit)
    }

    /// Parse a feature envelope. Total: any JSON yields a feature, malformed input simply ends up
    /// as `Null`, `Unknown` or `Bare`.
    pub fn from_json(value: &Value) -> Feature {
        Feature::from_json_at(value, 0)
    }

    fn from_json_at(value: &Value, depth: usize) -> Feature {
        match value {
            Value::Object(map) if is_envelope(map) => {
                let kind = map
                    .get("type")
                    .and_then(Value::as_str)
                    .map(FeatureType::from_tag)
                    .unwrap_or(FeatureType::Unknown);
                let unit = map.get("unit").and_then(Value::as_str);
                /* `properties` is the legacy name of the value container */
                let container = map.get("value").or_else(|| map.get("properties"));
                let value = match container {
                    Some(container) => parse_value(container, depth),
                    None => FeatureValue::Null,
                };
                Feature::new(kind, value, unit)
            }
            other => Feature::new(FeatureType::Bare, parse_value(other, depth), None),
        }
    }

    /// Child of an object feature.
    pub fn child(&self, name: &str) -> Option<&Feature> {
        match &self.value {
            FeatureValue::Object(children) => children.get(name),
            _ => None,
        }
    }

    /// Follow nested `value` children down to the innermost value.
    pub fn resolve(&self) -> &Feature {
        let mut current = self;
        for _ in 0..MAX_NESTING_DEPTH {
            match current.child("value") {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::from(self.kind.as_str()));
        map.insert("value".to_string(), self.value.to_json());
        if let Some(unit) = &self.unit {
            map.insert("unit".to_string(), Value::from(unit.as_str()));
        }
        Value::Object(map)
    }
}

/// A JSON object is an envelope if it carries any of the envelope keys; otherwise it is a bare
/// mapping of children.
fn is_envelope(map: &Map<String, Value>) -> bool {
    map.contains_key("type") || map.contains_key("value") || map.contains_key("properties")
}

fn parse_value(value: &Value, depth: usize) -> FeatureValue {
    match value {
        Value::Null => FeatureValue::Null,
        Value::Bool(b) => FeatureValue::Boolean(*b),
        Value::Number(n) => n
            .as_f64()
            .map(FeatureValue::Number)
            .unwrap_or(FeatureValue::Null),
        Value::String(s) => FeatureValue::String(s.to_owned()),
        Value::Array(items) => FeatureValue::Array(items.to_owned()),
        Value::Object(_) if depth >= MAX_NESTING_DEPTH => {
            log::warn!("feature nesting exceeds {} levels, truncating", MAX_NESTING_DEPTH);
            FeatureValue::Null
        }
        Value::Object(map) => FeatureValue::Object(
            map.iter()
                .map(|(name, child)| (name.to_owned(), Feature::from_json_at(child, depth + 1)))
                .collect(),
        ),
    }
}

impl<'de> serde::Deserialize<'de> for Feature {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(Feature::from_json(&value))
    }
}

impl serde::Serialize for Feature {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Temperatures,
    Dhw,
    Circuits,
    OperatingModes,
    Other,
}

impl Category {
    /// Lookup order. The same key may legitimately live in several categories; the first wins.
    pub const SEARCH_ORDER: [Category; 5] = [
        Category::Temperatures,
        Category::Dhw,
        Category::Circuits,
        Category::OperatingModes,
        Category::Other,
    ];

    /// Category a raw vendor feature is filed under.
    pub fn of(feature_name: &str) -> Category {
        if feature_name.starts_with("heating.dhw") {
            Category::Dhw
        } else if feature_name.contains(".operating.modes") || feature_name.contains(".operating.programs")
        {
            Category::OperatingModes
        } else if feature_name.starts_with("heating.circuits") {
            Category::Circuits
        } else if feature_name.contains(".temperature") {
            Category::Temperatures
        } else {
            Category::Other
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Entry of the flat vendor feature list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeature {
    pub feature: String,
    #[serde(default)]
    pub properties: FeatureMap,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

impl RawFeature {
    /// The categorised form: a lone `value` property is the feature itself, several properties
    /// become an object feature. Features without properties have nothing to show.
    pub fn to_feature(&self) -> Option<Feature> {
        match self.properties.len() {
            0 => None,
            1 => match self.properties.get("value") {
                Some(value) => Some(value.to_owned()),
                None => Some(self.as_object()),
            },
            _ => Some(self.as_object()),
        }
    }

    fn as_object(&self) -> Feature {
        Feature::new(
            FeatureType::Object,
            FeatureValue::Object(self.properties.to_owned()),
            None,
        )
    }
}

/// One fetch worth of telemetry. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryDocument {
    #[serde(default)]
    pub temperatures: Option<FeatureMap>,
    #[serde(default)]
    pub dhw: Option<FeatureMap>,
    #[serde(default)]
    pub circuits: Option<FeatureMap>,
    #[serde(default)]
    pub operating_modes: Option<FeatureMap>,
    #[serde(default)]
    pub other: Option<FeatureMap>,
    #[serde(default)]
    pub raw_features: Vec<RawFeature>,
}

impl TelemetryDocument {
    /// Build the categorised document from the flat vendor list. Disabled features are kept in
    /// `raw_features` only.
    pub fn from_raw_features(raw_features: Vec<RawFeature>) -> TelemetryDocument {
        let mut document = TelemetryDocument::default();

        for raw in raw_features.iter().filter(|raw| raw.is_enabled) {
            if let Some(feature) = raw.to_feature() {
                document
                    .category_mut(Category::of(&raw.feature))
                    .insert(raw.feature.to_owned(), feature);
            }
        }

        document.raw_features = raw_features;
        document
    }

    pub fn category(&self, category: Category) -> Option<&FeatureMap> {
        match category {
            Category::Temperatures => self.temperatures.as_ref(),
            Category::Dhw => self.dhw.as_ref(),
            Category::Circuits => self.circuits.as_ref(),
            Category::OperatingModes => self.operating_modes.as_ref(),
            Category::Other => self.other.as_ref(),
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut FeatureMap {
        let slot = match category {
            Category::Temperatures => &mut self.temperatures,
            Category::Dhw => &mut self.dhw,
            Category::Circuits => &mut self.circuits,
            Category::OperatingModes => &mut self.operating_modes,
            Category::Other => &mut self.other,
        };
        slot.get_or_insert_with(FeatureMap::new)
    }

    /// All present categories in search order, absent ones skipped.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &FeatureMap)> {
        Category::SEARCH_ORDER
            .iter()
            .filter_map(move |category| self.category(*category).map(|map| (*category, map)))
    }

    /// Exact-name lookup in the flat list.
    pub fn raw_feature(&self, name: &str) -> Option<&RawFeature> {
        self.raw_features.iter().find(|raw| raw.feature == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    #[test]
    fn parse_number_envelope() {
        let feature = Feature::from_json(&json!({"type": "number", "value": 5.6, "unit": "celsius"}));
        assert_eq!(FeatureType::Number, feature.kind);
        assert_eq!(Some(5.6), feature.value.as_f64());
        assert_eq!(Some("celsius"), feature.unit.as_deref());
    }

    #[test]
    fn parse_object_with_legacy_properties() {
        let feature = Feature::from_json(&json!({
            "type": "object",
            "properties": {
                "slope": {"type": "number", "value": 1.4},
                "shift": {"type": "number", "value": 0}
            }
        }));
        assert_eq!(FeatureType::Object, feature.kind);
        assert_eq!(Some(1.4), feature.child("slope").and_then(|f| f.value.as_f64()));
        assert_eq!(Some(0.0), feature.child("shift").and_then(|f| f.value.as_f64()));
    }

    #[test]
    fn bare_scalar_is_told_apart_from_untagged_envelope() {
        let bare = Feature::from_json(&json!(5));
        assert_eq!(FeatureType::Bare, bare.kind);

        let untagged = Feature::from_json(&json!({"value": 5}));
        assert_eq!(FeatureType::Unknown, untagged.kind);
        assert_eq!(Some(5.0), untagged.value.as_f64());

        let reparsed = Feature::from_json(&bare.to_json());
        assert_eq!(bare, reparsed);
    }

    #[test]
    fn resolve_follows_value_chain() {
        let feature = Feature::from_json(&json!({
            "type": "object",
            "value": {"value": {"type": "number", "value": {"value": 42}}}
        }));
        let resolved = feature.resolve();
        assert_eq!(Some(42.0), resolved.value.as_f64());
        assert_eq!(resolved, resolved.resolve());
    }

    #[test]
    fn deeply_nested_input_is_truncated() {
        let mut value = json!(1);
        for _ in 0..(MAX_NESTING_DEPTH * 4) {
            value = json!({ "value": value });
        }
        let feature = Feature::from_json(&value);
        assert!(feature.resolve().value.is_null());
    }

    #[test]
    fn categorise_raw_features() {
        let response: Value = serde_json::from_str(&read_resource("features.json")).unwrap();
        let raw: Vec<RawFeature> = serde_json::from_value(response["data"].clone()).unwrap();
        let document = TelemetryDocument::from_raw_features(raw);

        let temperatures = document.temperatures.as_ref().unwrap();
        let outside = temperatures.get("heating.sensors.temperature.outside").unwrap();
        assert_eq!(FeatureType::Object, outside.kind);
        assert_eq!(Some(-2.5), outside.resolve().value.as_f64());
        assert_eq!(Some("celsius"), outside.resolve().unit.as_deref());

        let dhw_target = document.dhw.as_ref().unwrap().get("heating.dhw.temperature.main");
        assert_eq!(Some(50.0), dhw_target.and_then(|f| f.value.as_f64()));

        let circuits = document.circuits.as_ref().unwrap();
        assert_eq!(
            FeatureType::Object,
            circuits.get("heating.circuits.0.heating.curve").unwrap().kind
        );
        assert!(document
            .operating_modes
            .as_ref()
            .unwrap()
            .contains_key("heating.circuits.0.operating.programs.active"));
        assert!(document
            .dhw
            .as_ref()
            .unwrap()
            .contains_key("heating.dhw.temperature.main"));

        /* disabled features stay out of the categories but remain in the flat list */
        assert!(document
            .categories()
            .all(|(_, map)| !map.contains_key("heating.circuits.1.sensors.temperature.supply")));
        assert!(document
            .raw_feature("heating.circuits.1.sensors.temperature.supply")
            .is_some());
    }

    #[test]
    fn categorised_document_round_trips_through_json() {
        let document: TelemetryDocument =
            serde_json::from_str(&read_resource("document.json")).unwrap();
        assert!(document.dhw.is_none());
        assert_eq!(
            Some(21.0),
            document
                .circuits
                .as_ref()
                .and_then(|c| c.get("heating.circuits.0.sensors.temperature.supply"))
                .and_then(|f| f.value.as_f64())
        );

        let reparsed: TelemetryDocument =
            serde_json::from_value(serde_json::to_value(&document).unwrap()).unwrap();
        assert_eq!(document.circuits, reparsed.circuits);
    }

    #[test]
    fn category_of_feature_names() {
        assert_eq!(Category::Dhw, Category::of("heating.dhw.operating.modes.active"));
        assert_eq!(
            Category::OperatingModes,
            Category::of("heating.circuits.0.operating.modes.active")
        );
        assert_eq!(
            Category::Circuits,
            Category::of("heating.circuits.0.sensors.temperature.supply")
        );
        assert_eq!(
            Category::Temperatures,
            Category::of("heating.sensors.temperature.outside")
        );
        assert_eq!(Category::Other, Category::of("heating.compressors.0"));
    }
}
