use super::task::{spawn_periodic, CancelHandle};
use crate::localization::localize;
use crate::sources::common::{ApiError, Coordinates};
use crate::sources::forecast::CurrentConditions;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_conditions(&self, point: Coordinates) -> Result<CurrentConditions, ApiError>;
}

/// Reverse geocoding down to a human readable settlement name, `None` if there is none nearby
#[async_trait]
pub trait PlaceNameSource: Send + Sync {
    async fn place_name(&self, point: Coordinates) -> Result<Option<String>, ApiError>;
}

/// What the weather card shows. Replaced as a whole on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSnapshot {
    pub temperature_c: i32,
    pub weather_code: i32,
    pub wind_speed_kmh: i32,
    pub humidity_pct: i32,
    pub visibility_km: i32,
    pub place_name: String,
    pub loading: bool,
    pub error: Option<String>,
}
impl Default for WeatherSnapshot {
    fn default() -> Self {
        WeatherSnapshot {
            temperature_c: 0,
            weather_code: 0,
            wind_speed_kmh: 0,
            humidity_pct: 0,
            visibility_km: 0,
            place_name: String::new(),
            loading: true,
            error: None,
        }
    }
}
impl WeatherSnapshot {
    fn from_conditions(conditions: &CurrentConditions, place_name: String) -> Self {
        WeatherSnapshot {
            temperature_c: conditions.temperature_2m.round() as i32,
            weather_code: conditions.weather_code,
            wind_speed_kmh: conditions.wind_speed_10m.round() as i32,
            humidity_pct: conditions.relative_humidity_2m.round() as i32,
            visibility_km: (conditions.visibility / 1000.0).round() as i32,
            place_name,
            loading: false,
            error: None,
        }
    }

    /// Same numbers as before, flagged with the reason they could not be refreshed
    fn failed(&self, reason: String) -> Self {
        WeatherSnapshot {
            loading: false,
            error: Some(reason),
            ..self.clone()
        }
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.weather_code)
    }
}

/// Coarse grouping of the WMO weather interpretation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Unknown,
}
impl WeatherCondition {
    pub fn from_code(code: i32) -> Self {
        use WeatherCondition::*;
        match code {
            0 => Clear,
            1 | 2 => PartlyCloudy,
            3 => Overcast,
            45 | 48 => Fog,
            51..=57 => Drizzle,
            61..=67 => Rain,
            71..=77 | 85 | 86 => Snow,
            80..=82 => Showers,
            95..=99 => Thunderstorm,
            _ => Unknown,
        }
    }

    fn message_id(&self) -> &'static str {
        use WeatherCondition::*;
        match self {
            Clear => "weather-clear",
            PartlyCloudy => "weather-partly-cloudy",
            Overcast => "weather-overcast",
            Fog => "weather-fog",
            Drizzle => "weather-drizzle",
            Rain => "weather-rain",
            Snow => "weather-snow",
            Showers => "weather-showers",
            Thunderstorm => "weather-thunderstorm",
            Unknown => "weather-unknown",
        }
    }
}
impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", localize!(self.message_id()))
    }
}


#[derive(Clone)]
pub struct WeatherProvider {
    weather: Arc<dyn WeatherSource>,
    places: Arc<dyn PlaceNameSource>,
}

impl WeatherProvider {
    pub fn new(weather: Arc<dyn WeatherSource>, places: Arc<dyn PlaceNameSource>) -> Self {
        WeatherProvider { weather, places }
    }

    /// Refreshes right away and then every `interval`, handing each snapshot to `on_update`.
    /// Nothing is delivered once the returned handle has been cancelled or dropped.
    pub fn start<F>(&self, point: Coordinates, on_update: F, interval: Duration) -> CancelHandle
    where
        F: FnMut(WeatherSnapshot) + Send + 'static,
    {
        let latest = Arc::new(Mutex::new(WeatherSnapshot::default()));
        let on_update = Arc::new(Mutex::new(on_update));
        let provider = self.clone();

        spawn_periodic(interval, move || {
            let provider = provider.clone();
            let latest = latest.clone();
            let on_update = on_update.clone();

            async move {
                let previous = latest.lock().map(|snapshot| snapshot.clone()).unwrap_or_default();
                let snapshot = provider.refresh(point, &previous).await;

                if let Ok(mut latest) = latest.lock() {
                    *latest = snapshot.clone();
                }
                if let Ok(mut on_update) = on_update.lock() {
                    (*on_update)(snapshot);
                }
                true
            }
        })
    }

    /// One fetch cycle: conditions first, then the place name for them.
    pub async fn refresh(&self, point: Coordinates, previous: &WeatherSnapshot) -> WeatherSnapshot {
        let conditions = match self.weather.current_conditions(point).await {
            Ok(conditions) => conditions,
            Err(e) => {
                log::error!("Failed to fetch weather for {}: {}", point, e);
                return previous.failed(localize!("weather-failed"));
            }
        };

        let place_name = match self.places.place_name(point).await {
            Ok(Some(name)) => name,
            Ok(None) => localize!("place-unknown"),
            Err(e) => {
                log::warn!("Reverse geocoding of {} failed: {}", point, e);
                localize!("place-fallback")
            }
        };

        WeatherSnapshot::from_conditions(&conditions, place_name)
    }
}
