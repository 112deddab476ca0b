use serde::Deserialize;
use std::fmt;

/// Client for the Geoapify geocoding HTTP API. Cloning is cheap; the inner
/// `reqwest::Client` shares its connection pool across clones.
#[derive(Clone)]
pub struct GeocodeClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug)]
pub enum GeocodeError {
    NoMatch,
    OutOfRange(&'static str),
    Transport(reqwest::Error),
    BadResponse(String),
}

impl std::error::Error for GeocodeError {}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::NoMatch => write!(f, "GeocodeError: No location matched the query"),
            GeocodeError::OutOfRange(coord) => {
                write!(f, "GeocodeError: {coord} is out of range")
            }
            GeocodeError::Transport(e) => write!(f, "GeocodeError: Request failed: {e}"),
            GeocodeError::BadResponse(msg) => {
                write!(f, "GeocodeError: Unusable response from geocoding API: {msg}")
            }
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(error: reqwest::Error) -> Self {
        GeocodeError::Transport(error)
    }
}

/// A single geocoding match as returned by the API.
#[derive(Clone, Debug, Deserialize)]
pub struct GeocodingData {
    pub lat: f64,
    pub lon: f64,
    pub formatted: String,

    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<String>,

    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<GeocodingData>,
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), GeocodeError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(GeocodeError::OutOfRange("latitude"));
    }

    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeocodeError::OutOfRange("longitude"));
    }

    Ok(())
}

impl GeocodeClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    /// Resolves a free-form street address to coordinates. Returns the single
    /// best match or `NoMatch` when the API finds nothing.
    pub async fn search_by_address(
        &self,
        street: &str,
        house_number: &str,
        city: &str,
        country: &str,
    ) -> Result<GeocodingData, GeocodeError> {
        let text = format!("{street} {house_number}, {city}, {country}");
        self.search(&text, "amenity").await
    }

    /// Resolves a postal code to coordinates.
    pub async fn search_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<GeocodingData, GeocodeError> {
        self.search(postal_code, "postcode").await
    }

    /// Resolves coordinates to the nearest address. Coordinates are validated
    /// before the request goes out.
    pub async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<GeocodingData, GeocodeError> {
        validate_coordinates(latitude, longitude)?;

        let url = format!("{}/geocode/reverse", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
                ("lang", "en"),
                ("limit", "1"),
                ("format", "json"),
                ("apiKey", &self.api_key),
            ])
            .send()
            .await?
            .error_for_status()?;

        Self::first_result(response.json::<SearchResponse>().await?)
    }

    async fn search(&self, text: &str, result_type: &str) -> Result<GeocodingData, GeocodeError> {
        let url = format!("{}/geocode/search", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("text", text),
                ("type", result_type),
                ("lang", "en"),
                ("limit", "1"),
                ("format", "json"),
                ("apiKey", &self.api_key),
            ])
            .send()
            .await?
            .error_for_status()?;

        Self::first_result(response.json::<SearchResponse>().await?)
    }

    fn first_result(response: SearchResponse) -> Result<GeocodingData, GeocodeError> {
        response
            .results
            .into_iter()
            .next()
            .ok_or(GeocodeError::NoMatch)
    }
}
