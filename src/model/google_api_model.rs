//! Response of the Google Maps geocoding endpoint, only the fields we read.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    /// `OK` on success, `ZERO_RESULTS`, `OVER_QUERY_LIMIT`, `REQUEST_DENIED`... otherwise
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}
