use crate::StateData;
use chrono::Utc;
use prometheus::{Encoder, GaugeVec, TextEncoder};
use vicare_rs::catalog::HistoryField;
use vicare_rs::normalize;
use vicare_rs::snapshot::Snapshot;

lazy_static! {
    static ref KEY_FEATURE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_key_feature",
            "numeric key feature reported by device, in display unit",
        ),
        &["device_id", "feature", "unit"],
    )
    .unwrap();
    static ref SPREIZUNG_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_spreizung_kelvin",
            "supply/return temperature spread, only while water is flowing",
        ),
        &["device_id", "pair"],
    )
    .unwrap();
    static ref THERMAL_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("vicare_thermal_power_watts", "heat output derived from spread and flow"),
        &["device_id"],
    )
    .unwrap();
    static ref ELECTRICAL_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_electrical_power_watts",
            "compressor electrical input after correction factor",
        ),
        &["device_id"],
    )
    .unwrap();
    static ref COP_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("vicare_cop", "momentary coefficient of performance"),
        &["device_id"],
    )
    .unwrap();
    static ref COMPRESSOR_SPEED_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_compressor_speed_percent",
            "compressor speed scaled into the configured RPM range",
        ),
        &["device_id"],
    )
    .unwrap();
    static ref TARGET_SUPPLY_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_target_supply_temperature_celsius",
            "supply temperature the heating curve asks for",
        ),
        &["device_id", "circuit"],
    )
    .unwrap();
    static ref CONSUMPTION_TODAY_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "vicare_consumption_today",
            "today's value of a consumption or production counter",
        ),
        &["device_id", "counter", "unit"],
    )
    .unwrap();
}

fn reset_all() {
    for gauge in [
        &*KEY_FEATURE_GAUGE,
        &*SPREIZUNG_GAUGE,
        &*THERMAL_POWER_GAUGE,
        &*ELECTRICAL_POWER_GAUGE,
        &*COP_GAUGE,
        &*COMPRESSOR_SPEED_GAUGE,
        &*TARGET_SUPPLY_GAUGE,
        &*CONSUMPTION_TODAY_GAUGE,
    ]
    .iter()
    {
        gauge.reset();
    }
}

fn set_optional(gauge: &GaugeVec, labels: &[&str], value: Option<f64>) {
    if let Some(value) = value {
        gauge.with_label_values(labels).set(value);
    }
}

/// Feed `snapshot` to the registry. Values absent from this snapshot are dropped rather than left
/// at their previous reading.
fn publish(snapshot: &Snapshot, device_id: &str) {
    reset_all();

    for (field, feature) in snapshot.key_features.present() {
        if let Some(display) = normalize::display_value(feature) {
            let unit = display.unit.as_deref().unwrap_or("");
            KEY_FEATURE_GAUGE
                .with_label_values(&[device_id, field.name(), unit])
                .set(display.value);
        }
    }

    let derived = &snapshot.derived;
    set_optional(
        &SPREIZUNG_GAUGE,
        &[device_id, derived.spreizung.label],
        derived.display_spreizung,
    );
    set_optional(&THERMAL_POWER_GAUGE, &[device_id], derived.thermal_power_w);
    set_optional(&ELECTRICAL_POWER_GAUGE, &[device_id], derived.electrical_power_w);
    set_optional(&COP_GAUGE, &[device_id], derived.cop);
    set_optional(
        &COMPRESSOR_SPEED_GAUGE,
        &[device_id],
        derived.compressor_speed_percent,
    );

    for target in &derived.targets {
        set_optional(
            &TARGET_SUPPLY_GAUGE,
            &[device_id, &target.circuit.to_string()],
            target.target_supply_temp,
        );
    }

    let now = Utc::now();
    for field in HistoryField::all() {
        if let Some(history) = snapshot.key_features.history(field) {
            let unit = history.unit.as_deref().unwrap_or("");
            set_optional(
                &CONSUMPTION_TODAY_GAUGE,
                &[device_id, field.name(), unit],
                history.today(now),
            );
        }
    }
}

/// Fetch the device's features, derive a snapshot and publish it unless a newer one won the race.
pub async fn collect(state: &StateData) -> Result<(), vicare_rs::Error> {
    let sequence = state.begin_refresh()?;
    let document = vicare_rs::api::features(&state.api, &state.device).await?;
    let snapshot = Snapshot::build(document, &state.device_settings);

    let mut refresh = state
        .refresh
        .lock()
        .or(Err(vicare_rs::Error::InternalError))?;
    if refresh.apply(sequence, snapshot) {
        if let Some(current) = refresh.current() {
            log::debug!(
                "publishing refresh #{} with {} key features",
                sequence,
                current.key_features.present().count()
            );
            publish(current, &state.device.device_id);
        }
    }

    Ok(())
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, vicare_rs::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(vicare_rs::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(vicare_rs::Error::FormatError))
}
