use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Communication(#[from] reqwest::Error),

    #[error("Failed to construct URL and parameters: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to parse API response: {0}")]
    Parsing(#[from] serde_json::Error),

    #[error("Bad request: {reason:?}")]
    BadRequest {
        reason: String
    },
}

/// A point on the globe as reported by a location device.
/// Serialized with the short `lat`/`lon` keys used in the session store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64
}
impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates {latitude, longitude}
    }
}
impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        // coordinates are only ever copied around, never computed, so bitwise equality is enough
        self.latitude.to_bits() == other.latitude.to_bits() && self.longitude.to_bits() == other.longitude.to_bits()
    }
}
impl Eq for Coordinates {}
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[lat: {:.4}, lon: {:.4}]", self.latitude, self.longitude)
    }
}


/// Joins a configured base URL with a path below it, tolerating a trailing slash on the base.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends a GET request and parses the body as the success type `S`, falling back to the
/// service specific failure body `F` when that does not match.
pub async fn query_api<O, S, F>(client: &reqwest::Client, url: &str, params: impl IntoIterator<Item = (&str, String)>)
                                -> Result<O, ApiError>
where
    S: for<'de> Deserialize<'de> + Into<O>,
    F: for<'de> Deserialize<'de> + Into<ApiError>,
{
    let url = reqwest::Url::parse_with_params(url, params)?;
    log::debug!("GET {}", url);

    let response = client.get(url).send().await?;
    let payload = response.text().await?;

    // try to parse the response body as the given success type S
    match serde_json::from_str::<S>(&payload) {
        Ok(result) => Ok(result.into()),
        Err(e) => {
            // If it fails, attempt to parse the body as the given failure type F
            match serde_json::from_str::<F>(&payload) {
                Ok(api_error) => Err(api_error.into()),
                Err(_) => Err(ApiError::Parsing(e)), // Return the error if both parsing attempts fail
            }
        }
    }
}
