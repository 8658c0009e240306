use super::common::{self, ApiError, Coordinates};
use crate::widget::location::{LocationDevice, PositionError, PositionOptions};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Instant;

pub const DEFAULT_BASE_URL: &str = "http://ip-api.com";

/// ip-api.com answers with HTTP 200 in both cases and tells them apart by `status`
#[derive(Deserialize, Debug)]
struct IpLookupResult {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}
impl From<IpLookupResult> for Result<Coordinates, PositionError> {
    fn from(result: IpLookupResult) -> Self {
        match (result.status.as_str(), result.lat, result.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(PositionError::Unavailable(result.message)),
        }
    }
}

#[derive(Deserialize, Debug)]
struct IpLookupError {
    message: String,
}
impl From<IpLookupError> for ApiError {
    fn from(error: IpLookupError) -> Self {
        ApiError::BadRequest { reason: error.message }
    }
}


/// Approximates the device position from the public IP address.
/// Keeps its last fix around so callers within `maximum_age` get the same answer.
#[derive(Debug)]
pub struct IpLocator {
    client: reqwest::Client,
    base_url: String,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}
impl IpLocator {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        IpLocator { client, base_url: base_url.into(), last_fix: Mutex::new(None) }
    }

    fn recent_fix(&self, options: &PositionOptions) -> Option<Coordinates> {
        let last_fix = self.last_fix.lock().ok()?;
        last_fix.filter(|(taken, _)| taken.elapsed() <= options.maximum_age)
            .map(|(_, coords)| coords)
    }
}

#[async_trait]
impl LocationDevice for IpLocator {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError> {
        if let Some(coords) = self.recent_fix(options) {
            log::debug!("Reusing IP location fix {}", coords);
            return Ok(coords);
        }

        if options.high_accuracy {
            log::debug!("IP lookup cannot honor a high accuracy request");
        }
        let url = common::endpoint(&self.base_url, "json");
        let params = [("fields", "status,message,lat,lon".to_string())];
        let lookup = common::query_api::<IpLookupResult, IpLookupResult, IpLookupError>
            (&self.client, &url, params).await
            .map_err(|e| PositionError::Unavailable(Some(e.to_string())))?;

        let coords = Result::<Coordinates, PositionError>::from(lookup)?;
        if let Ok(mut last_fix) = self.last_fix.lock() {
            *last_fix = Some((Instant::now(), coords));
        }
        Ok(coords)
    }
}
