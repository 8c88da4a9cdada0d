//! Derived state of one telemetry fetch and the last-applied-wins holder for it.

use crate::calc::{self, SpreizungResult};
use crate::catalog::KeyField;
use crate::circuits::{self, CurveParameters};
use crate::feature::TelemetryDocument;
use crate::key_features::KeyFeatures;
use crate::settings::DeviceSettings;

/// Heating curve outcome for one circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitTarget {
    pub circuit: u32,
    pub room_setpoint: f64,
    pub curve: CurveParameters,
    pub target_supply_temp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub spreizung: SpreizungResult,
    /// Spread gated on flow; this is what consumers show.
    pub display_spreizung: Option<f64>,
    pub thermal_power_w: Option<f64>,
    pub electrical_power_w: Option<f64>,
    pub cop: Option<f64>,
    pub compressor_rpm: Option<f64>,
    pub compressor_speed_percent: Option<f64>,
    pub primary_supply_label: &'static str,
    pub targets: Vec<CircuitTarget>,
}

impl Derived {
    pub fn compute(
        document: &TelemetryDocument,
        record: &KeyFeatures,
        active_circuits: &[u32],
        settings: &DeviceSettings,
    ) -> Derived {
        let flow = record.number(KeyField::VolumetricFlow);
        let spreizung = calc::resolve_spreizung(record, settings.has_hot_water_buffer());
        let thermal_power_w = calc::thermal_power(&spreizung, flow);
        let electrical_power_w = calc::electrical_power_watts(
            record.get(KeyField::CompressorPower),
            settings.power_correction_factor(),
        );
        let compressor_speed = record.get(KeyField::CompressorSpeed);

        let targets = match record.number(KeyField::OutsideTemp) {
            Some(outside) => active_circuits
                .iter()
                .filter_map(|circuit| {
                    let curve = CurveParameters::for_circuit(document, *circuit)?;
                    let room_setpoint = circuits::room_setpoint(document, *circuit);
                    Some(CircuitTarget {
                        circuit: *circuit,
                        room_setpoint,
                        curve,
                        target_supply_temp: calc::target_supply_temperature(
                            outside,
                            room_setpoint,
                            &curve,
                        ),
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        Derived {
            display_spreizung: spreizung.displayable(flow),
            spreizung,
            thermal_power_w,
            electrical_power_w,
            cop: calc::cop(thermal_power_w, electrical_power_w),
            compressor_rpm: calc::compressor_rpm(compressor_speed),
            compressor_speed_percent: calc::compressor_speed_percent(compressor_speed, settings),
            primary_supply_label: settings.primary_supply_label(record),
            targets,
        }
    }
}

/// Everything consumers read after a refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: TelemetryDocument,
    pub key_features: KeyFeatures,
    pub circuits: Vec<u32>,
    pub derived: Derived,
}

impl Snapshot {
    pub fn build(document: TelemetryDocument, settings: &DeviceSettings) -> Snapshot {
        let key_features = KeyFeatures::extract(&document);
        let circuits = circuits::detect_circuits(&document);
        let derived = Derived::compute(&document, &key_features, &circuits, settings);

        Snapshot {
            document,
            key_features,
            circuits,
            derived,
        }
    }
}

/// Refreshes are tagged on start; a result older than the applied one is dropped so an
/// out-of-order response cannot overwrite newer state.
#[derive(Debug, Default)]
pub struct RefreshState {
    issued: u64,
    applied: Option<u64>,
    current: Option<Snapshot>,
}

impl RefreshState {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Replace the current snapshot unless a newer refresh was applied already.
    pub fn apply(&mut self, sequence: u64, snapshot: Snapshot) -> bool {
        match self.applied {
            Some(applied) if applied >= sequence => {
                log::warn!(
                    "discarding refresh #{}, #{} already applied",
                    sequence,
                    applied
                );
                false
            }
            _ => {
                self.applied = Some(sequence);
                self.current = Some(snapshot);
                true
            }
        }
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn applied_sequence(&self) -> Option<u64> {
        self.applied
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::feature::RawFeature;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    fn heat_pump() -> TelemetryDocument {
        let response: Value = serde_json::from_str(&read_resource("features.json")).unwrap();
        let raw: Vec<RawFeature> = serde_json::from_value(response["data"].clone()).unwrap();
        TelemetryDocument::from_raw_features(raw)
    }

    #[test]
    fn build_heat_pump_snapshot() {
        let settings = DeviceSettings {
            has_hot_water_buffer: Some(false),
            compressor_rpm_min: Some(1200),
            compressor_rpm_max: Some(4800),
            ..DeviceSettings::default()
        };
        let snapshot = Snapshot::build(heat_pump(), &settings);

        assert_eq!(vec![0], snapshot.circuits);

        let derived = &snapshot.derived;
        assert!(derived.spreizung.is_valid);
        assert!((derived.display_spreizung.unwrap() - 5.1).abs() < 1e-9);

        let expected_power = calc::water_density(34.2) * 980.0 / 3_600_000.0 * 4180.0 * (34.2 - 29.1);
        assert!((derived.thermal_power_w.unwrap() - expected_power).abs() < 1e-6);
        assert_eq!(Some(1420.0), derived.electrical_power_w);
        assert!((derived.cop.unwrap() - expected_power / 1420.0).abs() < 1e-9);
        assert_eq!(Some(3000.0), derived.compressor_rpm);
        assert_eq!(Some(50.0), derived.compressor_speed_percent);

        assert_eq!(1, derived.targets.len());
        let target = &derived.targets[0];
        assert_eq!(21.0, target.room_setpoint);
        let expected = calc::target_supply_temperature(-2.5, 21.0, &target.curve);
        assert_eq!(expected, target.target_supply_temp);
    }

    #[test]
    fn empty_document_builds_without_derived_values() {
        let snapshot = Snapshot::build(TelemetryDocument::default(), &DeviceSettings::default());
        assert_eq!(vec![0], snapshot.circuits);
        assert_eq!(None, snapshot.derived.thermal_power_w);
        assert_eq!(None, snapshot.derived.cop);
        assert!(snapshot.derived.targets.is_empty());
    }

    #[test]
    fn stale_refresh_is_discarded() {
        let mut state = RefreshState::default();
        let first = state.begin();
        let second = state.begin();

        let newer = Snapshot::build(heat_pump(), &DeviceSettings::default());
        let older = Snapshot::build(TelemetryDocument::default(), &DeviceSettings::default());

        assert!(state.apply(second, newer));
        assert!(!state.apply(first, older));
        assert_eq!(Some(second), state.applied_sequence());
        assert!(state.current().unwrap().key_features.is_present(KeyField::OutsideTemp));
    }
}
