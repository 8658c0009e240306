use super::session::{self, SessionStore, COORDS_KEY};
use crate::localization::localize;
use crate::sources::common::Coordinates;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Query options handed to the device, mirroring what a browser geolocation request takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// how old a position the device already knows may be to still be acceptable
    pub maximum_age: Duration,
}
impl Default for PositionOptions {
    fn default() -> Self {
        PositionOptions {
            high_accuracy: false,
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

/// What a device reports when it cannot produce a position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("User denied the request for geolocation")]
    PermissionDenied,

    #[error("{}", .0.as_deref().unwrap_or("Position unavailable"))]
    Unavailable(Option<String>),

    #[error("Timeout expired")]
    Timeout,

    #[error("Geolocation is not supported on this system")]
    Unsupported,
}
impl PositionError {
    /// The message reported by the device, if it gave one
    fn device_message(&self) -> Option<String> {
        match self {
            PositionError::Unavailable(message) => message.clone().filter(|m| !m.trim().is_empty()),
            other => Some(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LocationDevice: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError>;
}

/// A device with a preconfigured position, or none at all
#[derive(Debug, Clone, Copy)]
pub struct FixedDevice(pub Option<Coordinates>);

#[async_trait]
impl LocationDevice for FixedDevice {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, PositionError> {
        self.0.ok_or(PositionError::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("{0}")]
    Unavailable(String),
}
impl From<PositionError> for LocationError {
    fn from(error: PositionError) -> Self {
        let message = error.device_message()
            .unwrap_or_else(|| localize!("location-unavailable"));
        LocationError::Unavailable(message)
    }
}


/// Resolves the coordinates of the session. The device is asked at most once; the answer is
/// shared by every caller and a successful fix is also kept in the session store.
pub struct LocationProvider {
    device: Arc<dyn LocationDevice>,
    session: Arc<dyn SessionStore>,
    options: PositionOptions,
    outcome: OnceCell<Result<Coordinates, LocationError>>,
}

impl LocationProvider {
    pub fn new(device: Arc<dyn LocationDevice>, session: Arc<dyn SessionStore>) -> Self {
        Self::with_options(device, session, PositionOptions::default())
    }

    pub fn with_options(device: Arc<dyn LocationDevice>, session: Arc<dyn SessionStore>,
                        options: PositionOptions) -> Self {
        LocationProvider { device, session, options, outcome: OnceCell::new() }
    }

    pub async fn resolve(&self) -> Result<Coordinates, LocationError> {
        if let Some(coords) = session::load::<Coordinates>(self.session.as_ref(), COORDS_KEY) {
            log::debug!("Using session coordinates {}", coords);
            return Ok(coords);
        }

        self.outcome.get_or_init(|| self.query_device()).await.clone()
    }

    async fn query_device(&self) -> Result<Coordinates, LocationError> {
        let query = self.device.current_position(&self.options);
        let position = match tokio::time::timeout(self.options.timeout, query).await {
            Ok(position) => position,
            Err(_) => Err(PositionError::Timeout),
        };

        match position {
            Ok(coords) => {
                log::info!("Located device at {}", coords);
                session::save(self.session.as_ref(), COORDS_KEY, &coords);
                Ok(coords)
            }
            Err(e) => {
                log::warn!("Geolocation failed: {}", e);
                Err(e.into())
            }
        }
    }
}
