use anyhow::{Error, anyhow};
use serde::{Deserialize, Serialize};

use super::parsed_model::{ParsedRoute, ParsedStop};
use crate::utils::zero_pad_time;

/// Output of the geocode stage and input of the upload and restructure stages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchoolDocument {
    pub school: String,
    pub routes: Vec<SchoolRoute>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchoolRoute {
    /// The route name as written in the source text
    pub id: String,
    /// Display name, `Route {id}`
    pub name: String,
    pub stops: Vec<SchoolStop>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchoolStop {
    /// `{route id}-{stop number}`
    pub id: String,
    #[serde(rename = "stopNumber")]
    pub stop_number: u32,
    /// Always `HH:MM`
    pub time: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl SchoolRoute {
    /// `coordinates` must hold one entry per stop, in stop order.
    pub fn try_from_parsed_route(
        route: ParsedRoute,
        coordinates: Vec<Option<Coordinates>>,
    ) -> Result<Self, Error> {
        let route_name = route
            .name
            .ok_or_else(|| anyhow!("Unexpected route without a name"))?;

        if route.stops.len() != coordinates.len() {
            return Err(anyhow!(
                "route {route_name} has {} stops but {} coordinate lookups",
                route.stops.len(),
                coordinates.len()
            ));
        }

        let stops = route
            .stops
            .into_iter()
            .zip(coordinates)
            .map(|(stop, coordinates)| SchoolStop::from_parsed_stop(&route_name, stop, coordinates))
            .collect();

        Ok(SchoolRoute {
            name: format!("Route {route_name}"),
            id: route_name,
            stops,
        })
    }
}

impl SchoolStop {
    pub fn from_parsed_stop(
        route_name: &str,
        stop: ParsedStop,
        coordinates: Option<Coordinates>,
    ) -> Self {
        SchoolStop {
            id: format!("{route_name}-{}", stop.stop_number),
            stop_number: stop.stop_number,
            time: zero_pad_time(&stop.time),
            location: stop.location,
            coordinates,
        }
    }
}
