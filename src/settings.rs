//! Per-device overrides, read-only to this crate.

use crate::catalog::KeyField;
use crate::key_features::KeyFeatures;
use serde::Deserialize;

pub const AIR_INTAKE_LABEL: &str = "Lufteintrittstemperatur";
pub const PRIMARY_SUPPLY_LABEL: &str = "Primärkreis Vorlauf";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    /// RPM at 0 % for speed percentage scaling.
    pub compressor_rpm_min: Option<u32>,
    /// RPM at 100 %.
    pub compressor_rpm_max: Option<u32>,
    /// `None` means a buffer is assumed.
    pub has_hot_water_buffer: Option<bool>,
    /// `None` means auto-detect from the presence of compressor sensors.
    pub use_air_intake_temperature_label: Option<bool>,
    pub power_correction_factor: Option<f64>,
}

impl DeviceSettings {
    pub fn has_hot_water_buffer(&self) -> bool {
        self.has_hot_water_buffer.unwrap_or(true)
    }

    pub fn power_correction_factor(&self) -> f64 {
        match self.power_correction_factor {
            Some(factor) if factor.is_finite() && factor > 0.0 => factor,
            Some(factor) => {
                log::warn!("ignoring invalid power correction factor {}", factor);
                1.0
            }
            None => 1.0,
        }
    }

    /// Both limits, if configured and ordered.
    pub fn compressor_rpm_range(&self) -> Option<(f64, f64)> {
        match (self.compressor_rpm_min, self.compressor_rpm_max) {
            (Some(min), Some(max)) if max > min => Some((f64::from(min), f64::from(max))),
            _ => None,
        }
    }

    /// On air-source heat pumps the primary supply sensor measures the intake air.
    pub fn primary_supply_label(&self, record: &KeyFeatures) -> &'static str {
        let air_intake = self.use_air_intake_temperature_label.unwrap_or_else(|| {
            record.is_present(KeyField::CompressorSpeed)
                || record.is_present(KeyField::CompressorInletTemp)
                || record.is_present(KeyField::CompressorOutletTemp)
        });
        if air_intake {
            AIR_INTAKE_LABEL
        } else {
            PRIMARY_SUPPLY_LABEL
        }
    }
}
