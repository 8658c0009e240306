use super::common::{self, ApiError, Coordinates};
use crate::widget::weather::PlaceNameSource;
use async_trait::async_trait;
use countdown_macros::first_present;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";


#[derive(Deserialize, Debug)]
struct ReverseResult {
    address: Address,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[first_present({
   settlement = [city, town, village]
})]
pub struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

/// e.g. `{"error": "Unable to geocode"}` for points in the middle of the ocean
#[derive(Deserialize, Debug, Clone)]
pub struct NominatimError {
    pub error: String,
}
impl From<NominatimError> for ApiError {
    fn from(nomi_error: NominatimError) -> Self {
        ApiError::BadRequest { reason: nomi_error.error }
    }
}


#[derive(Debug, Clone)]
pub struct NominatimReverse {
    client: reqwest::Client,
    base_url: String,
}
impl NominatimReverse {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        NominatimReverse { client, base_url: base_url.into() }
    }

    pub async fn reverse(&self, point: Coordinates) -> Result<Address, ApiError> {
        let url = common::endpoint(&self.base_url, "reverse");
        let params = [
            ("format", "json".to_string()),
            ("lat", point.latitude.to_string()),
            ("lon", point.longitude.to_string()),
        ];

        common::query_api::<ReverseResult, ReverseResult, NominatimError>
            (&self.client, &url, params).await
            .map(|result| result.address)
    }
}

#[async_trait]
impl PlaceNameSource for NominatimReverse {
    async fn place_name(&self, point: Coordinates) -> Result<Option<String>, ApiError> {
        let address = self.reverse(point).await?;
        Ok(address.settlement().map(str::to_string))
    }
}
