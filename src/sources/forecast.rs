use super::common::{self, ApiError, Coordinates};
use crate::widget::weather::WeatherSource;
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";
const CURRENT_FIELDS: &str = "temperature_2m,weather_code,wind_speed_10m,relative_humidity_2m,visibility";

#[derive(Deserialize, Debug)]
struct CurrentConditionsResult {
    current: CurrentConditions,
}
impl From<CurrentConditionsResult> for CurrentConditions {
    fn from(result: CurrentConditionsResult) -> Self {
        result.current
    }
}

/// Current weather in the units Open-Meteo reports by default
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// °C
    pub temperature_2m: f64,
    /// WMO weather interpretation code
    pub weather_code: i32,
    /// km/h
    pub wind_speed_10m: f64,
    /// %
    pub relative_humidity_2m: f64,
    /// metres
    pub visibility: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OpenMeteoError {
    pub reason: String,
}
impl From<OpenMeteoError> for ApiError {
    fn from(error: OpenMeteoError) -> Self {
        ApiError::BadRequest { reason: error.reason }
    }
}


#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    client: reqwest::Client,
    base_url: String,
}
impl OpenMeteoForecast {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        OpenMeteoForecast { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoForecast {
    async fn current_conditions(&self, point: Coordinates) -> Result<CurrentConditions, ApiError> {
        let url = common::endpoint(&self.base_url, "forecast");
        let params = [
            ("latitude", point.latitude.to_string()),
            ("longitude", point.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];

        common::query_api::<CurrentConditions, CurrentConditionsResult, OpenMeteoError>
            (&self.client, &url, params).await
    }
}
