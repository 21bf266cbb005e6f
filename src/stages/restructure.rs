//! Flattens the school document: coordinates become top level `latitude`/`longitude`
//! and the school is wrapped in a one element list
use std::path::Path;

use anyhow::Error;
use tracing::info;

use crate::{
    model::{flat_model::FlatSchool, school_model::SchoolDocument},
    utils::{read_json, write_json},
};

pub fn flatten(document: SchoolDocument) -> Vec<FlatSchool> {
    vec![FlatSchool::from(document)]
}

#[tracing::instrument(err)]
pub fn restructure(input: &Path, output: &Path) -> Result<Vec<FlatSchool>, Error> {
    let document: SchoolDocument = read_json(input)?;

    let flattened = flatten(document);

    write_json(output, &flattened)?;

    info!("Restructured JSON has been written to {}", output.display());

    Ok(flattened)
}
