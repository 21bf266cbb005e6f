//! Looks up the coordinates of every stop and reshapes the routes into the school document
use std::{path::Path, time::Duration};

use anyhow::{Error, bail};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    model::{
        google_api_model::GeocodeResponse,
        parsed_model::ParsedDocument,
        school_model::{Coordinates, SchoolDocument, SchoolRoute},
    },
    utils::{read_json, write_json},
};

pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_ADDRESS_SUFFIX: &str = ", Merrimack, NH";
pub const DEFAULT_SCHOOL: &str = "James Mastricola Upper Elementary School";

#[derive(Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
    /// Appended to every stop location before the lookup, the sheets only hold street addresses
    pub address_suffix: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            base_url: DEFAULT_GEOCODE_URL.to_string(),
            api_key: String::new(),
            address_suffix: DEFAULT_ADDRESS_SUFFIX.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// Keeps the key out of the logs
impl std::fmt::Debug for GeocoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderConfig")
            .field("base_url", &self.base_url)
            .field("address_suffix", &self.address_suffix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    #[error("error fetching coordinates")]
    HttpRequestError(#[from] reqwest::Error),

    #[error("error parsing the geocoding response")]
    ParsingError(#[from] serde_json::Error),
}

pub trait Geocoder {
    /// The address actually looked up for a stop location
    fn full_address(&self, location: &str) -> String {
        location.to_string()
    }

    /// `Ok(None)` when the service answered but couldn't place the address
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

#[derive(Debug)]
pub struct GoogleGeocoder {
    client: Client,
    config: GeocoderConfig,
}

impl GoogleGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(GoogleGeocoder { client, config })
    }
}

impl Geocoder for GoogleGeocoder {
    fn full_address(&self, location: &str) -> String {
        format!("{location}{}", self.config.address_suffix)
    }

    #[tracing::instrument(skip(self), err)]
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("address", address),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .instrument(info_span!("Fetching coordinates"))
            .await?
            .error_for_status()?;

        let body = response
            .text()
            .instrument(info_span!("Reading body of response"))
            .await?;

        let response: GeocodeResponse = serde_json::from_str(&body)?;

        if response.status != "OK" {
            debug!(address, status = %response.status, "geocoding returned no result");
            return Ok(None);
        }

        Ok(response.results.first().map(|result| Coordinates {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }))
    }
}

/// Geocodes every stop one request at a time, waiting `request_delay` between requests.
///
/// A failed lookup only leaves that stop without coordinates.
pub async fn enrich_routes<G: Geocoder>(
    geocoder: &G,
    parsed: ParsedDocument,
    school: String,
    request_delay: Duration,
) -> Result<SchoolDocument, Error> {
    if let Some(index) = parsed.routes.iter().position(|r| r.name.is_none()) {
        bail!("route #{} has no name", index + 1);
    }

    let mut routes = Vec::with_capacity(parsed.routes.len());
    let mut first_request = true;

    for route in parsed.routes {
        let mut coordinates = Vec::with_capacity(route.stops.len());

        for stop in &route.stops {
            if !first_request {
                sleep(request_delay).await;
            }
            first_request = false;

            let address = geocoder.full_address(&stop.location);
            let result = match geocoder.geocode(&address).await {
                Ok(Some(c)) => {
                    info!("Geocoding successful for address: {address}");
                    Some(c)
                }
                Ok(None) => {
                    warn!("Geocoding failed for address: {address}");
                    None
                }
                Err(e) => {
                    warn!("Geocoding failed for address: {address} ({e})");
                    None
                }
            };
            coordinates.push(result);
        }

        routes.push(SchoolRoute::try_from_parsed_route(route, coordinates)?);
    }

    Ok(SchoolDocument { school, routes })
}

#[tracing::instrument(err, skip(config))]
pub async fn geocode(
    input: &Path,
    output: &Path,
    school: String,
    config: GeocoderConfig,
    request_delay: Duration,
) -> Result<SchoolDocument, Error> {
    let parsed: ParsedDocument = read_json(input)?;
    let geocoder = GoogleGeocoder::new(config)?;

    let document = enrich_routes(&geocoder, parsed, school, request_delay).await?;

    write_json(output, &document)?;

    let stops = document.routes.iter().flat_map(|r| &r.stops).count();
    let located = document
        .routes
        .iter()
        .flat_map(|r| &r.stops)
        .filter(|s| s.coordinates.is_some())
        .count();
    info!("geocoded {located} of {stops} stops, saved to {}", output.display());

    Ok(document)
}
