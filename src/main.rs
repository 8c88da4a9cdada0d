#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::{Build, Rocket, State};
use serde_json::json;
use std::sync::Mutex;
use std::time::Instant;
use vicare_rs::api;
use vicare_rs::model::{Api, DeviceRef};
use vicare_rs::settings::DeviceSettings;
use vicare_rs::snapshot::{RefreshState, Snapshot};

mod metrics;

const API_URL: &str = "https://api.viessmann.com/iot/v2";

#[derive(Clone, serde::Deserialize)]
pub struct ExporterConfig {
    api_url: String,
    access_token: String,
    installation_id: u64,
    gateway_serial: String,
    device_id: String,
    interval: u64,
    timeout: u64,
    compressor_rpm_min: Option<u32>,
    compressor_rpm_max: Option<u32>,
    has_hot_water_buffer: Option<bool>,
    use_air_intake_temperature_label: Option<bool>,
    power_correction_factor: Option<f64>,
}

impl ExporterConfig {
    fn device(&self) -> DeviceRef {
        DeviceRef {
            installation_id: self.installation_id,
            gateway_serial: self.gateway_serial.to_owned(),
            device_id: self.device_id.to_owned(),
        }
    }

    fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            compressor_rpm_min: self.compressor_rpm_min,
            compressor_rpm_max: self.compressor_rpm_max,
            has_hot_water_buffer: self.has_hot_water_buffer,
            use_air_intake_temperature_label: self.use_air_intake_temperature_label,
            power_correction_factor: self.power_correction_factor,
        }
    }
}

/// Structure containing state for API handlers.
pub struct StateData {
    api: Api,
    device: DeviceRef,
    device_settings: DeviceSettings,
    interval: u64,
    /// Timestamp of last successful metric collection via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
    refresh: Mutex<RefreshState>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_secs` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        match elapsed_opt {
            Some(elapsed) => elapsed > interval_secs,
            /* never collected */
            None => true,
        }
    }

    /// Tag a new refresh so its result can be ordered against concurrent ones.
    fn begin_refresh(&self) -> Result<u64, api::Error> {
        self.refresh
            .lock()
            .map(|mut refresh| refresh.begin())
            .or(Err(api::Error::InternalError))
    }
}

pub fn read_settings() -> Result<ExporterConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", API_URL)?
        .set_default("interval", 60i64)?
        .set_default("timeout", 30i64)?
        .merge(config::Environment::with_prefix("VICARE"))?;

    settings.try_into()
}

#[get("/metrics?<refresh>")]
async fn metrics_route(
    state: &State<StateData>,
    refresh: Option<bool>,
) -> Result<String, api::Error> {
    if refresh.unwrap_or(false) || state.interval_elapsed(state.interval) {
        metrics::collect(state).await?;
        state.touch();
    } else {
        log::info!("interval time not yet elapsed since last run; returning cached result")
    }
    metrics::read().await
}

/// Raw device metadata, categorised features and the derived record, for diagnosing
/// unsupported devices.
#[get("/dump-features")]
async fn dump_features_route(state: &State<StateData>) -> Result<String, api::Error> {
    let (info, document) = tokio::try_join!(
        api::device(&state.api, &state.device),
        api::features(&state.api, &state.device)
    )?;
    let snapshot = Snapshot::build(document, &state.device_settings);

    let dump = json!({
        "device": {
            "id": info.id,
            "deviceType": info.device_type,
            "modelId": info.model_id,
            "roles": info.roles,
            "status": info.status,
            "isHeatPump": info.is_heat_pump(),
        },
        "circuits": snapshot.circuits,
        "keyFeatures": snapshot.key_features.to_json(),
        "document": snapshot.document,
    });

    serde_json::to_string_pretty(&dump).or(Err(api::Error::FormatError))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    let api = api::api(
        settings.api_url.to_owned(),
        settings.access_token.to_owned(),
        settings.timeout,
    )
    .expect("Unable to build HTTP client");
    let state = StateData {
        api,
        device: settings.device(),
        device_settings: settings.device_settings(),
        interval: settings.interval,
        timestamp: Mutex::new(None),
        refresh: Mutex::new(RefreshState::default()),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, dump_features_route])
}
