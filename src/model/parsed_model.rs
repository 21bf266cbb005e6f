use serde::{Deserialize, Serialize};

/// Output of the extract stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedDocument {
    pub routes: Vec<ParsedRoute>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedRoute {
    /// Missing when the file ends (or another `ROUTE:` line comes) right after the sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub stops: Vec<ParsedStop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParsedStop {
    pub stop_number: u32,
    /// As written in the source, `H:MM` or `HH:MM`
    pub time: String,
    pub location: String,
}
