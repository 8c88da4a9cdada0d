use crate::feature::RawFeature;
use serde::Deserialize;

pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
pub const EXPIRED_TOKEN: &str = "EXPIRED TOKEN";

#[derive(Deserialize)]
pub struct GetFeatures {
    pub data: Vec<RawFeature>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    pub id: String,
    pub device_type: String,
    pub model_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct GetDevices {
    pub data: Vec<DeviceData>,
}

/* Generic error */
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub error_type: String,
    pub message: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    #[test]
    fn get_features() {
        let input = read_resource("features.json");
        let output: GetFeatures = serde_json::from_str(&input).unwrap();
        assert_eq!("heating.sensors.temperature.outside", output.data[0].feature);
        assert!(output.data[0].is_enabled);
        assert!(output
            .data
            .iter()
            .any(|raw| raw.feature == "heating.burners.0.modulation" && !raw.is_enabled));
    }

    #[test]
    fn get_devices() {
        let input = read_resource("getDevices.json");
        let output: GetDevices = serde_json::from_str(&input).unwrap();
        assert_eq!("gateway", output.data[0].id);
        assert_eq!("0", output.data[1].id);
        assert_eq!("heating", output.data[1].device_type);
        assert_eq!("E3_Vitocal", output.data[1].model_id);
        assert!(output.data[0].roles.is_empty());
    }

    #[test]
    fn error_response() {
        let input = read_resource("error_rate_limit.json");
        let output: ErrorResponse = serde_json::from_str(&input).unwrap();
        assert_eq!(429, output.status_code);
        assert_eq!(RATE_LIMIT_EXCEEDED, output.error_type);
    }

    #[test]
    #[should_panic]
    fn get_features_invalid_json() {
        let _output: GetFeatures = serde_json::from_str("{\"data\": [").unwrap();
    }
}
