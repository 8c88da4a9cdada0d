//! Feature lookup over the categorised document.

use crate::feature::{Category, Feature, FeatureType, FeatureValue, TelemetryDocument};

/// First candidate name present with a usable value, searching categories in
/// [`Category::SEARCH_ORDER`]. When no candidate matches, keys are scanned for a
/// case-insensitive substring match against `fallback_patterns`.
///
/// A feature whose value is `null` is indistinguishable from an absent one.
pub fn find(
    document: &TelemetryDocument,
    candidates: &[&str],
    fallback_patterns: &[&str],
) -> Option<Feature> {
    candidates
        .iter()
        .find_map(|name| find_exact(document, name))
        .or_else(|| find_by_pattern(document, fallback_patterns))
}

fn find_exact(document: &TelemetryDocument, name: &str) -> Option<Feature> {
    Category::SEARCH_ORDER.iter().find_map(|category| {
        document
            .category(*category)
            .and_then(|features| features.get(name))
            .and_then(representative)
    })
}

/// The value a caller should see for a located feature. Object features carrying a single real
/// measurement under `value` are collapsed onto it; compound features are returned whole.
fn representative(feature: &Feature) -> Option<Feature> {
    match (&feature.kind, &feature.value) {
        (_, FeatureValue::Null) => None,
        (FeatureType::Object, FeatureValue::Object(children)) => match children.get("value") {
            /* bare number in the container: keep the parent's type and unit */
            Some(inner) if inner.kind == FeatureType::Bare => match &inner.value {
                FeatureValue::Number(n) => Some(Feature {
                    kind: feature.kind,
                    value: FeatureValue::Number(*n),
                    unit: feature.unit.to_owned(),
                }),
                FeatureValue::Null => None,
                _ => Some(feature.to_owned()),
            },
            Some(inner) if inner.value.is_null() => None,
            Some(inner) => Some(inner.to_owned()),
            None => Some(feature.to_owned()),
        },
        _ => Some(feature.to_owned()),
    }
}

fn find_by_pattern(document: &TelemetryDocument, patterns: &[&str]) -> Option<Feature> {
    if patterns.is_empty() {
        return None;
    }
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();

    document
        .categories()
        .flat_map(|(_, features)| features.iter())
        .filter(|(name, _)| {
            let name = name.to_lowercase();
            patterns.iter().any(|p| name.contains(p.as_str()))
        })
        .find_map(|(name, feature)| {
            let found = representative(feature)?;
            log::debug!("resolved {} by fallback pattern", name);
            Some(found)
        })
}

/// Named sub-property of a compound feature, e.g. `slope` of a heating curve.
pub fn find_nested(
    document: &TelemetryDocument,
    feature_name: &str,
    property_name: &str,
) -> Option<Feature> {
    Category::SEARCH_ORDER.iter().find_map(|category| {
        document
            .category(*category)
            .and_then(|features| features.get(feature_name))
            .and_then(|feature| feature.child(property_name))
            .filter(|property| !property.value.is_null())
            .map(|property| Feature {
                kind: property.kind,
                value: property.value.to_owned(),
                unit: property.unit.to_owned(),
            })
    })
}

/// Ordered fallback chain: the first supplier yielding a value wins, later ones are not evaluated.
pub fn first_present<T>(suppliers: &[&dyn Fn() -> Option<T>]) -> Option<T> {
    suppliers.iter().find_map(|supplier| supplier())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::feature::RawFeature;
    use crate::normalize;
    use serde_json::json;
    use std::cell::Cell;

    fn document(value: serde_json::Value) -> TelemetryDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_category_in_search_order_wins() {
        let doc = document(json!({
            "other": {"heating.sensors.temperature.outside": {"type": "number", "value": 1.0}},
            "temperatures": {"heating.sensors.temperature.outside": {"type": "number", "value": 2.0}}
        }));
        let found = find(&doc, &["heating.sensors.temperature.outside"], &[]).unwrap();
        assert_eq!(Some(2.0), found.value.as_f64());
    }

    #[test]
    fn candidates_are_tried_in_order() {
        let doc = document(json!({
            "other": {
                "heating.scop.total": {"type": "number", "value": 3.9},
                "heating.cop.total": {"type": "number", "value": 4.2}
            }
        }));
        let found = find(&doc, &["heating.cop.total", "heating.scop.total"], &[]).unwrap();
        assert_eq!(Some(4.2), found.value.as_f64());

        let fallback = find(&doc, &["heating.cop.heating", "heating.scop.total"], &[]).unwrap();
        assert_eq!(Some(3.9), fallback.value.as_f64());
    }

    #[test]
    fn null_value_is_treated_as_absent() {
        let with_null = document(json!({
            "temperatures": {"heating.sensors.temperature.outside": {"type": "number", "value": null}}
        }));
        let absent = document(json!({"temperatures": {}}));

        assert_eq!(None, find(&with_null, &["heating.sensors.temperature.outside"], &[]));
        assert_eq!(None, find(&absent, &["heating.sensors.temperature.outside"], &[]));
    }

    #[test]
    fn null_in_first_category_falls_through_to_next() {
        let doc = document(json!({
            "temperatures": {"heating.sensors.temperature.return": {"type": "number", "value": null}},
            "other": {"heating.sensors.temperature.return": {"type": "number", "value": 28.5}}
        }));
        let found = find(&doc, &["heating.sensors.temperature.return"], &[]).unwrap();
        assert_eq!(Some(28.5), found.value.as_f64());
    }

    #[test]
    fn absent_categories_are_skipped() {
        let doc = TelemetryDocument::default();
        assert_eq!(None, find(&doc, &["heating.dhw.temperature.main"], &["dhw"]));
        assert_eq!(None, find_nested(&doc, "heating.circuits.0.heating.curve", "slope"));
    }

    #[test]
    fn wrapper_object_collapses_onto_its_value() {
        let doc = document(json!({
            "other": {
                "heating.burners.0.modulation": {
                    "type": "object",
                    "value": {
                        "value": {"type": "number", "value": 37, "unit": "percent"},
                        "status": {"type": "string", "value": "on"}
                    }
                }
            }
        }));
        let found = find(&doc, &["heating.burners.0.modulation"], &[]).unwrap();
        assert_eq!(FeatureType::Number, found.kind);
        assert_eq!(Some(37.0), found.value.as_f64());
        assert_eq!(Some("percent"), found.unit.as_deref());
    }

    #[test]
    fn bare_number_container_keeps_parent_type_and_unit() {
        let doc = document(json!({
            "other": {
                "heating.compressors.0.speed.current": {
                    "type": "object",
                    "unit": "revolutionsPerSecond",
                    "value": {"value": 42}
                }
            }
        }));
        let found = find(&doc, &["heating.compressors.0.speed.current"], &[]).unwrap();
        assert_eq!(FeatureType::Object, found.kind);
        assert_eq!(Some(42.0), found.value.as_f64());
        assert_eq!(Some("revolutionsPerSecond"), found.unit.as_deref());
    }

    #[test]
    fn compound_without_value_is_returned_whole() {
        let doc = document(json!({
            "other": {
                "heating.compressors.0.statistics": {
                    "type": "object",
                    "value": {
                        "starts": {"type": "number", "value": 1234},
                        "hours": {"type": "number", "value": 5678}
                    }
                }
            }
        }));
        let found = find(&doc, &["heating.compressors.0.statistics"], &[]).unwrap();
        assert_eq!(Some(1234.0), found.child("starts").and_then(|f| f.value.as_f64()));
    }

    #[test]
    fn fallback_pattern_is_case_insensitive() {
        let doc = document(json!({
            "other": {
                "heating.sensors.volumetricFlow.allengra": {"type": "number", "value": null},
                "heating.sensors.volumetricFlow.return": {"type": "number", "value": 820, "unit": "liter/hour"}
            }
        }));
        let found = find(&doc, &["heating.sensors.volumetricFlow.missing"], &["VOLUMETRICFLOW"]).unwrap();
        assert_eq!(Some(820.0), found.value.as_f64());
    }

    #[test]
    fn fallback_pattern_collapses_vendor_wrappers() {
        let raw: Vec<RawFeature> = serde_json::from_value(json!([
            {
                "feature": "heating.sensors.volumetricFlow.allengra",
                "isEnabled": true,
                "properties": {
                    "status": {"type": "string", "value": "error"},
                    "value": {"type": "number", "value": null, "unit": "liter/hour"}
                }
            },
            {
                "feature": "heating.sensors.volumetricFlow.flow",
                "isEnabled": true,
                "properties": {
                    "status": {"type": "string", "value": "connected"},
                    "value": {"type": "number", "value": 820, "unit": "liter/hour"}
                }
            }
        ]))
        .unwrap();
        let doc = TelemetryDocument::from_raw_features(raw);

        let found = find(&doc, &["heating.sensors.volumetricFlow.return"], &["volumetricFlow"]).unwrap();
        assert_eq!(FeatureType::Number, found.kind);
        assert_eq!(Some(820.0), normalize::numeric_value(Some(&found)));
        assert_eq!(Some("liter/hour"), found.unit.as_deref());
        assert_eq!(
            find(&doc, &["heating.sensors.volumetricFlow.flow"], &[]),
            Some(found)
        );
    }

    #[test]
    fn untagged_inner_envelope_is_not_treated_as_bare_number() {
        let doc = document(json!({
            "other": {
                "heating.solar.power.production": {
                    "type": "object",
                    "unit": "kilowattHour",
                    "value": {"value": {"value": 5}}
                }
            }
        }));
        let found = find(&doc, &["heating.solar.power.production"], &[]).unwrap();
        assert_eq!(FeatureType::Unknown, found.kind);
        assert_eq!(None, found.unit);
        assert_eq!(Some(5.0), found.value.as_f64());
    }

    #[test]
    fn find_nested_property() {
        let doc = document(json!({
            "circuits": {
                "heating.circuits.0.heating.curve": {
                    "type": "object",
                    "value": {
                        "slope": {"type": "number", "value": 1.2},
                        "shift": {"type": "number", "value": 2, "unit": ""}
                    }
                }
            }
        }));
        let slope = find_nested(&doc, "heating.circuits.0.heating.curve", "slope").unwrap();
        assert_eq!(Some(1.2), slope.value.as_f64());
        assert_eq!(None, find_nested(&doc, "heating.circuits.0.heating.curve", "curvature"));
    }

    #[test]
    fn first_present_is_lazy() {
        let evaluated = Cell::new(0);
        let a = || -> Option<i32> {
            evaluated.set(evaluated.get() + 1);
            None
        };
        let b = || -> Option<i32> {
            evaluated.set(evaluated.get() + 1);
            Some(2)
        };
        let c = || -> Option<i32> {
            evaluated.set(evaluated.get() + 1);
            Some(3)
        };
        let suppliers: [&dyn Fn() -> Option<i32>; 3] = [&a, &b, &c];
        assert_eq!(Some(2), first_present(&suppliers));
        assert_eq!(2, evaluated.get());
    }
}
