//! Turns the route text sheet into `{"routes": [...]}` JSON
use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use anyhow::Error;
use tracing::{info, warn};

use crate::{
    model::parsed_model::ParsedDocument,
    parser::parse_reader,
    utils::write_json,
};

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("couldn't open route file {path}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't read route file {path}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `routes.txt` becomes `routes.json` next to it
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("json")
}

pub fn read_route_file(path: &Path) -> Result<ParsedDocument, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    let routes = parse_reader(BufReader::new(file)).map_err(|source| ExtractError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ParsedDocument { routes })
}

#[tracing::instrument(err)]
pub fn extract(input: &Path, output: &Path) -> Result<ParsedDocument, Error> {
    let document = read_route_file(input)?;

    write_json(output, &document)?;

    info!(
        "parsed {} routes, saved to {}",
        document.routes.len(),
        output.display()
    );

    match document.routes.first() {
        Some(route) => info!("first route:\n{}", serde_json::to_string_pretty(route)?),
        None => warn!("no routes were parsed"),
    }

    Ok(document)
}
