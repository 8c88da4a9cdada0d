//! Flat record of the catalog fields, resolved once per fetch.

use crate::catalog::{HistoryField, KeyField, Lookup, HISTORY_FIELD_COUNT, KEY_FIELD_COUNT};
use crate::feature::{Feature, FeatureValue, RawFeature, TelemetryDocument};
use crate::locator;
use crate::normalize;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Today's value is hidden once its read timestamp is older than this.
pub const STALE_DAY_VALUE_HOURS: i64 = 4;

/// Day/week/month/year history of one consumption or production counter. Index 0 is the
/// current period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionHistory {
    pub day: Vec<f64>,
    pub week: Vec<f64>,
    pub month: Vec<f64>,
    pub year: Vec<f64>,
    pub unit: Option<String>,
    pub day_value_read_at: Option<DateTime<Utc>>,
}

impl ConsumptionHistory {
    pub fn from_raw(raw: &RawFeature) -> ConsumptionHistory {
        let series = |name: &str| -> Vec<f64> {
            match raw.properties.get(name).map(|p| &p.value) {
                Some(FeatureValue::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
                _ => Vec::new(),
            }
        };
        let unit = ["day", "week", "month", "year"]
            .iter()
            .filter_map(|name| raw.properties.get(*name))
            .find_map(|p| p.unit.to_owned())
            .or_else(|| {
                raw.properties
                    .get("unit")
                    .and_then(|p| p.value.as_str())
                    .map(String::from)
            });
        let day_value_read_at = raw
            .properties
            .get("dayValueReadAt")
            .and_then(|p| p.value.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        ConsumptionHistory {
            day: series("day"),
            week: series("week"),
            month: series("month"),
            year: series("year"),
            unit,
            day_value_read_at,
        }
    }

    /// Whether today's entry is older than `threshold`. Without a timestamp it is trusted.
    pub fn is_day_value_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.day_value_read_at {
            Some(read_at) => now.signed_duration_since(read_at) > threshold,
            None => false,
        }
    }

    /// Day series for display: index 0 is dropped when it is stale.
    pub fn day_for_display(&self, now: DateTime<Utc>) -> &[f64] {
        if self.is_day_value_stale(now, Duration::hours(STALE_DAY_VALUE_HOURS)) && !self.day.is_empty()
        {
            &self.day[1..]
        } else {
            &self.day
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> Option<f64> {
        if self.is_day_value_stale(now, Duration::hours(STALE_DAY_VALUE_HOURS)) {
            None
        } else {
            self.day.first().copied()
        }
    }
}

/// Every catalog field is present; `None` means the capability is absent on this device.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFeatures {
    values: Vec<Option<Feature>>,
    histories: Vec<Option<ConsumptionHistory>>,
}

impl KeyFeatures {
    pub fn extract(document: &TelemetryDocument) -> KeyFeatures {
        let values: Vec<Option<Feature>> = KeyField::all()
            .map(|field| {
                let resolved = resolve(document, field.lookup());
                if resolved.is_none() {
                    log::debug!("{} not present on device", field.name());
                }
                resolved
            })
            .collect();
        let histories = HistoryField::all()
            .map(|field| {
                document
                    .raw_feature(field.feature())
                    .filter(|raw| raw.is_enabled)
                    .map(ConsumptionHistory::from_raw)
            })
            .collect();

        log::debug!(
            "extracted {} of {} key features",
            values.iter().filter(|v| v.is_some()).count(),
            KEY_FIELD_COUNT
        );

        KeyFeatures { values, histories }
    }

    /// Record with every field absent.
    pub fn empty() -> KeyFeatures {
        KeyFeatures {
            values: vec![None; KEY_FIELD_COUNT],
            histories: vec![None; HISTORY_FIELD_COUNT],
        }
    }

    pub fn get(&self, field: KeyField) -> Option<&Feature> {
        self.values.get(field.index()).and_then(Option::as_ref)
    }

    pub fn set(&mut self, field: KeyField, feature: Option<Feature>) {
        self.values[field.index()] = feature;
    }

    /// Strictly numeric value; compounds and non-finite values yield `None`.
    pub fn number(&self, field: KeyField) -> Option<f64> {
        normalize::numeric_value(self.get(field))
    }

    pub fn text(&self, field: KeyField) -> Option<&str> {
        self.get(field).and_then(|f| f.value.as_str())
    }

    pub fn flag(&self, field: KeyField) -> Option<bool> {
        self.get(field).and_then(|f| f.value.as_bool())
    }

    pub fn is_present(&self, field: KeyField) -> bool {
        self.get(field).is_some()
    }

    pub fn history(&self, field: HistoryField) -> Option<&ConsumptionHistory> {
        self.histories.get(field.index()).and_then(Option::as_ref)
    }

    pub fn present(&self) -> impl Iterator<Item = (KeyField, &Feature)> {
        KeyField::all().filter_map(move |field| self.get(field).map(|f| (field, f)))
    }

    /// Logical-name keyed JSON form, absent fields as `null`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for field in KeyField::all() {
            let value = self.get(field).map(Feature::to_json).unwrap_or(Value::Null);
            map.insert(field.name().to_string(), value);
        }
        for field in HistoryField::all() {
            let value = self
                .history(field)
                .and_then(|h| serde_json::to_value(h).ok())
                .unwrap_or(Value::Null);
            map.insert(field.name().to_string(), value);
        }
        Value::Object(map)
    }
}

fn resolve(document: &TelemetryDocument, lookup: Lookup) -> Option<Feature> {
    match lookup {
        Lookup::Find { keys, patterns } => locator::find(document, keys, patterns),
        Lookup::Nested { feature, property } => locator::find_nested(document, feature, property),
    }
}
