pub mod endpoint;
pub mod error;
pub mod response;

use crate::feature::TelemetryDocument;
use crate::model;
pub use error::Error;
use http::StatusCode;
use response::{ErrorResponse, GetDevices, GetFeatures};
use serde_json::Value;
use std::time::Duration;

pub fn api(api_url: String, access_token: String, timeout_secs: u64) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .or(Err(Error::InternalError))?;

    Ok(model::Api {
        api_url,
        access_token,
        client,
    })
}

/// Map transport-level failure to Error
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(StatusCode::TOO_MANY_REQUESTS) => Error::RateExceeded(error.to_string()),
        Some(StatusCode::UNAUTHORIZED) => Error::LoginError(error.to_string()),
        _ => Error::ApiError(error.to_string()),
    }
}

/// Carry the `value` of a 2xx response forward. Anything else is turned into a specific error,
/// preferring the `errorType` of the vendor error body over the bare HTTP status.
fn map_response_status(status: StatusCode, value: Value) -> Result<Value, Error> {
    if status.is_success() {
        return Ok(value);
    }

    let error_type = serde_json::from_value::<ErrorResponse>(value.clone())
        .ok()
        .map(|e| e.error_type);

    match (status, error_type.as_deref()) {
        /* {"statusCode":429,"errorType":"RATE_LIMIT_EXCEEDED","message":"API calls rate limit has been exceeded."} */
        (_, Some(response::RATE_LIMIT_EXCEEDED)) | (StatusCode::TOO_MANY_REQUESTS, _) => {
            Err(Error::RateExceeded(value.to_string()))
        }
        (_, Some(response::EXPIRED_TOKEN)) | (StatusCode::UNAUTHORIZED, _) => {
            Err(Error::LoginError(value.to_string()))
        }
        _ => Err(Error::ApiError(value.to_string())),
    }
}

async fn get(api: &model::Api, path: &str) -> Result<Value, Error> {
    let url = format!("{}{}", api.api_url, path);

    let response = api
        .client
        .get(url)
        .bearer_auth(&api.access_token)
        .send()
        .await
        .map_err(map_api_err)?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))?;
    log::trace!("path: {}, status: {}, response: {}", path, status, text);

    let value = serde_json::from_str::<Value>(&text)
        .map_err(|e| Error::InvalidResponse(text.clone(), e.to_string()))?;
    map_response_status(status, value)
}

/// Fetch every feature of `device` and categorise it.
pub async fn features(
    api: &model::Api,
    device: &model::DeviceRef,
) -> Result<TelemetryDocument, Error> {
    get(api, &endpoint::device_features(device))
        .await
        .map(serde_json::from_value::<GetFeatures>)?
        .or(Err(Error::UnexpectedApiResponse))
        .map(|response| TelemetryDocument::from_raw_features(response.data))
}

/// List all devices behind the gateway.
pub async fn devices(
    api: &model::Api,
    installation_id: u64,
    gateway_serial: &str,
) -> Result<Vec<model::DeviceInfo>, Error> {
    get(api, &endpoint::gateway_devices(installation_id, gateway_serial))
        .await
        .map(serde_json::from_value::<GetDevices>)?
        .or(Err(Error::UnexpectedApiResponse))
        .map(|response| {
            response
                .data
                .into_iter()
                .map(|resp| model::DeviceInfo {
                    id: resp.id,
                    device_type: resp.device_type,
                    model_id: resp.model_id,
                    roles: resp.roles,
                    status: resp.status,
                })
                .collect()
        })
}

/// Metadata of the single device `device` points at.
pub async fn device(
    api: &model::Api,
    device: &model::DeviceRef,
) -> Result<model::DeviceInfo, Error> {
    devices(api, device.installation_id, &device.gateway_serial)
        .await?
        .into_iter()
        .find(|info| info.id == device.device_id)
        .ok_or_else(|| Error::UnknownDevice(device.device_id.to_owned()))
}
