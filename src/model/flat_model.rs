use serde::{Deserialize, Serialize};

use super::school_model::{SchoolDocument, SchoolRoute, SchoolStop};

/// Output of the restructure stage. The file holds a list of these.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlatSchool {
    pub name: String,
    pub routes: Vec<FlatRoute>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlatRoute {
    pub id: String,
    pub name: String,
    pub stops: Vec<FlatStop>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlatStop {
    pub id: String,
    #[serde(rename = "stopNumber")]
    pub stop_number: u32,
    pub time: String,
    pub location: String,
    /// Only present together with `longitude`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<SchoolDocument> for FlatSchool {
    fn from(value: SchoolDocument) -> Self {
        FlatSchool {
            name: value.school,
            routes: value.routes.into_iter().map(FlatRoute::from).collect(),
        }
    }
}

impl From<SchoolRoute> for FlatRoute {
    fn from(value: SchoolRoute) -> Self {
        FlatRoute {
            id: value.id,
            name: value.name,
            stops: value.stops.into_iter().map(FlatStop::from).collect(),
        }
    }
}

impl From<SchoolStop> for FlatStop {
    fn from(value: SchoolStop) -> Self {
        FlatStop {
            id: value.id,
            stop_number: value.stop_number,
            time: value.time,
            location: value.location,
            latitude: value.coordinates.map(|c| c.latitude),
            longitude: value.coordinates.map(|c| c.longitude),
        }
    }
}
