//! Physical quantities derived from the key features. All functions are pure; a missing or
//! unusable input yields `None` instead of a misleading zero.

use crate::catalog::KeyField;
use crate::circuits::CurveParameters;
use crate::feature::Feature;
use crate::key_features::KeyFeatures;
use crate::normalize::{self, UNIT_KILOWATT, UNIT_REVOLUTIONS_PER_SECOND};
use crate::settings::DeviceSettings;

/// J/(kg·K)
pub const SPECIFIC_HEAT_WATER: f64 = 4180.0;
/// Below this volumetric flow (l/h) the temperature spread is sensor noise.
pub const MIN_SPREIZUNG_FLOW: f64 = 50.0;
const LITERS_PER_HOUR_IN_CUBIC_METERS_PER_SECOND: f64 = 1.0 / 3_600_000.0;

pub const SECONDARY_SPREIZUNG_LABEL: &str = "Spreizung Sekundärkreis";
pub const CIRCUIT_SPREIZUNG_LABEL: &str = "Spreizung Heizkreis";

/// Water density in kg/m³. Linear approximation for heating water between 0 and 90 °C.
pub fn water_density(temperature_celsius: f64) -> f64 {
    1000.0 - 0.3 * temperature_celsius
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreizungResult {
    pub spreizung: Option<f64>,
    pub supply_temp: Option<f64>,
    pub return_temp: Option<f64>,
    pub label: &'static str,
    pub is_valid: bool,
}

impl SpreizungResult {
    fn new(label: &'static str, supply_temp: Option<f64>, return_temp: Option<f64>) -> Self {
        let spreizung = match (supply_temp, return_temp) {
            (Some(supply), Some(ret)) if supply > ret => Some(supply - ret),
            _ => None,
        };
        SpreizungResult {
            spreizung,
            supply_temp,
            return_temp,
            label,
            is_valid: spreizung.is_some(),
        }
    }

    /// The spread as it may be shown: only with enough flow through the loop.
    pub fn displayable(&self, volumetric_flow: Option<f64>) -> Option<f64> {
        if flow_permits_spreizung(volumetric_flow) {
            self.spreizung
        } else {
            None
        }
    }
}

pub fn flow_permits_spreizung(volumetric_flow: Option<f64>) -> bool {
    matches!(volumetric_flow, Some(flow) if flow > MIN_SPREIZUNG_FLOW)
}

/// Supply/return pair the spread is computed from. With a hot water buffer the secondary circuit
/// is measured (primary as fallback pair), without one the heating circuit itself.
pub fn resolve_spreizung(record: &KeyFeatures, has_hot_water_buffer: bool) -> SpreizungResult {
    if has_hot_water_buffer {
        let pair = |supply: KeyField, ret: KeyField| match (record.number(supply), record.number(ret)) {
            (Some(s), Some(r)) => Some((s, r)),
            _ => None,
        };
        /* on air-source units the primary pair is intake/exhaust air, not water */
        match pair(KeyField::SecondarySupplyTemp, KeyField::SecondaryReturnTemp).or_else(|| {
            let primary = pair(KeyField::PrimarySupplyTemp, KeyField::PrimaryReturnTemp);
            if primary.is_some() {
                log::debug!("no secondary circuit temperatures, using primary circuit pair");
            }
            primary
        }) {
            Some((supply, ret)) => {
                SpreizungResult::new(SECONDARY_SPREIZUNG_LABEL, Some(supply), Some(ret))
            }
            None => SpreizungResult::new(
                SECONDARY_SPREIZUNG_LABEL,
                record
                    .number(KeyField::SecondarySupplyTemp)
                    .or_else(|| record.number(KeyField::PrimarySupplyTemp)),
                None,
            ),
        }
    } else {
        SpreizungResult::new(
            CIRCUIT_SPREIZUNG_LABEL,
            record.number(KeyField::SupplyTemp),
            record.number(KeyField::ReturnTemp),
        )
    }
}

/// Q = ṁ · c · ΔT in watts, with ṁ from the supply-side density.
pub fn thermal_power(spreizung: &SpreizungResult, volumetric_flow: Option<f64>) -> Option<f64> {
    if !spreizung.is_valid || !flow_permits_spreizung(volumetric_flow) {
        return None;
    }
    let delta = spreizung.spreizung?;
    let supply = spreizung.supply_temp?;
    let flow = volumetric_flow?;

    let mass_flow = water_density(supply) * flow * LITERS_PER_HOUR_IN_CUBIC_METERS_PER_SECOND;
    Some(mass_flow * SPECIFIC_HEAT_WATER * delta)
}

/// Instantaneous coefficient of performance.
pub fn cop(thermal_power_w: Option<f64>, electrical_power_w: Option<f64>) -> Option<f64> {
    match (thermal_power_w, electrical_power_w) {
        (Some(thermal), Some(electrical)) if electrical > 0.0 => {
            Some(thermal / electrical).filter(|c| c.is_finite())
        }
        _ => None,
    }
}

/// Electrical power in watts after the device correction factor.
pub fn electrical_power_watts(feature: Option<&Feature>, correction_factor: f64) -> Option<f64> {
    let watts = normalize::numeric_value(feature)?
        * match feature.and_then(|f| f.unit.as_deref()) {
            Some(UNIT_KILOWATT) => 1000.0,
            _ => 1.0,
        };
    Some(watts * correction_factor)
}

/// Compressor speed in RPM.
pub fn compressor_rpm(feature: Option<&Feature>) -> Option<f64> {
    let speed = normalize::numeric_value(feature)?;
    match feature.and_then(|f| f.unit.as_deref()) {
        Some(unit @ UNIT_REVOLUTIONS_PER_SECOND) => {
            Some(normalize::convert_unit(speed, Some(unit)).value)
        }
        _ => Some(speed),
    }
}

/// Compressor speed scaled into the configured RPM range, 0..=100.
pub fn compressor_speed_percent(feature: Option<&Feature>, settings: &DeviceSettings) -> Option<f64> {
    let (min, max) = settings.compressor_rpm_range()?;
    let rpm = compressor_rpm(feature)?;
    Some(((rpm - min) / (max - min) * 100.0).max(0.0).min(100.0))
}

/// Target supply temperature of the heating curve.
///
/// ```text
/// DAR = AT − RTSoll
/// VT  = RTSoll + shift − slope · DAR · (1.4347 + 0.021·DAR + 247.9e-6·DAR²)
/// ```
///
/// Clamped to the configured maximum first, then the minimum. `None` when the configured limits
/// contradict each other.
pub fn target_supply_temperature(
    outside_temp: f64,
    room_setpoint: f64,
    params: &CurveParameters,
) -> Option<f64> {
    if let (Some(min), Some(max)) = (params.min_supply, params.max_supply) {
        if min > max {
            log::warn!(
                "heating curve minimum supply {} exceeds maximum {}, not computing target",
                min,
                max
            );
            return None;
        }
    }

    let dar = outside_temp - room_setpoint;
    let mut target = room_setpoint + params.shift
        - params.slope * dar * (1.4347 + 0.021 * dar + 247.9e-6 * dar * dar);

    if let Some(max) = params.max_supply {
        target = target.min(max);
    }
    if let Some(min) = params.min_supply {
        target = target.max(min);
    }
    Some(target)
}

/// Upper bound on points produced by [`heating_curve_series`].
pub const MAX_CURVE_SAMPLES: usize = 10_000;

/// Sampled curve for charting, `(outside, target)` from `from` up to and including `to`.
pub fn heating_curve_series(
    room_setpoint: f64,
    params: &CurveParameters,
    from: f64,
    to: f64,
    step: f64,
) -> Vec<(f64, f64)> {
    if !(step > 0.0) || from > to {
        return Vec::new();
    }
    let intervals = ((to - from) / step).floor();
    if !intervals.is_finite() || intervals >= MAX_CURVE_SAMPLES as f64 {
        log::warn!(
            "heating curve from {} to {} in steps of {} exceeds {} samples, not sampling",
            from,
            to,
            step,
            MAX_CURVE_SAMPLES
        );
        return Vec::new();
    }
    let samples = intervals as usize + 1;
    (0..samples)
        .map(|i| from + step * i as f64)
        .filter_map(|outside| {
            target_supply_temperature(outside, room_setpoint, params).map(|vt| (outside, vt))
        })
        .collect()
}
