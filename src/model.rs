#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub access_token: String,
    pub client: reqwest::Client,
}

/// Identifies one device behind a gateway of an installation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    pub installation_id: u64,
    pub gateway_serial: String,
    pub device_id: String,
}

/// Device metadata delivered alongside, but outside of, the feature categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub device_type: String,
    pub model_id: String,
    pub roles: Vec<String>,
    pub status: Option<String>,
}

impl DeviceInfo {
    pub fn is_heat_pump(&self) -> bool {
        self.roles.iter().any(|role| role == "type:heatpump")
    }
}
