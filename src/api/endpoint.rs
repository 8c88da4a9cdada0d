use crate::model::DeviceRef;

pub type Endpoint = str;

pub const FEATURES: &Endpoint = "/features";
pub const EQUIPMENT: &Endpoint = "/equipment";

pub fn device_features(device: &DeviceRef) -> String {
    format!(
        "{}/installations/{}/gateways/{}/devices/{}/features",
        FEATURES, device.installation_id, device.gateway_serial, device.device_id
    )
}

pub fn gateway_devices(installation_id: u64, gateway_serial: &str) -> String {
    format!(
        "{}/installations/{}/gateways/{}/devices",
        EQUIPMENT, installation_id, gateway_serial
    )
}
