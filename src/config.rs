//! Settings loaded from environment variables at startup. A `.env` file in the working
//! directory is honored for local development.

use crate::localization::{LanguageIdentifier, DEFAULT_LANGUAGE};
use crate::sources::common::Coordinates;
use crate::sources::{aladhan, forecast, ip_location, nominatim};
use crate::widget::weather::DEFAULT_REFRESH_INTERVAL;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),

    #[error("{0} is set but {1} is missing, both coordinates are required")]
    IncompleteCoordinates(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub calendar_url: String,
    pub weather_url: String,
    pub location_url: String,
    pub ip_location_url: String,
    pub calendar_method: u8,
    pub weather_refresh: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
    /// skips device location when set
    pub coordinates: Option<Coordinates>,
    pub language: LanguageIdentifier,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source, `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        let url = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let calendar_method = parse_or(&var, "CALENDAR_METHOD", aladhan::DEFAULT_METHOD)?;
        let weather_refresh = parse_or(&var, "WEATHER_REFRESH_SECS", DEFAULT_REFRESH_INTERVAL.as_secs())?;
        let http_timeout = parse_or(&var, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT.as_secs())?;
        if weather_refresh == 0 {
            return Err(ConfigError::InvalidValue("WEATHER_REFRESH_SECS".to_string(), "must be at least 1".to_string()));
        }

        let language = match var("COUNTDOWN_LANGUAGE") {
            Some(language) => parse::<LanguageIdentifier>("COUNTDOWN_LANGUAGE", &language)?,
            None => parse("COUNTDOWN_LANGUAGE", DEFAULT_LANGUAGE)?,
        };

        Ok(Config {
            calendar_url: url("CALENDAR_API_URL", aladhan::DEFAULT_BASE_URL),
            weather_url: url("WEATHER_API_URL", forecast::DEFAULT_BASE_URL),
            location_url: url("LOCATION_API_URL", nominatim::DEFAULT_BASE_URL),
            ip_location_url: url("IP_LOCATION_API_URL", ip_location::DEFAULT_BASE_URL),
            calendar_method,
            weather_refresh: Duration::from_secs(weather_refresh),
            http_timeout: Duration::from_secs(http_timeout),
            user_agent: var("USER_AGENT")
                .unwrap_or_else(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))),
            coordinates: coordinates(&var)?,
            language,
        })
    }
}

fn parse<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

fn coordinates(var: &impl Fn(&str) -> Option<String>) -> Result<Option<Coordinates>, ConfigError> {
    const LATITUDE: &str = "COUNTDOWN_LATITUDE";
    const LONGITUDE: &str = "COUNTDOWN_LONGITUDE";

    let (latitude, longitude) = match (var(LATITUDE), var(LONGITUDE)) {
        (None, None) => return Ok(None),
        (Some(latitude), Some(longitude)) => (parse::<f64>(LATITUDE, &latitude)?, parse::<f64>(LONGITUDE, &longitude)?),
        (Some(_), None) => return Err(ConfigError::IncompleteCoordinates(LATITUDE.to_string(), LONGITUDE.to_string())),
        (None, Some(_)) => return Err(ConfigError::IncompleteCoordinates(LONGITUDE.to_string(), LATITUDE.to_string())),
    };

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ConfigError::InvalidValue(LATITUDE.to_string(), format!("{latitude} is outside of -90..=90")));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ConfigError::InvalidValue(LONGITUDE.to_string(), format!("{longitude} is outside of -180..=180")));
    }

    Ok(Some(Coordinates::new(latitude, longitude)))
}
