//! Writes the school document into the document store:
//! `{collection}/{school}` and `{collection}/{school}/routes/{route id}`
use std::{collections::HashSet, path::Path};

use anyhow::{Context, Error};
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    dal::DocumentWriter,
    model::{
        document_model::{Document, DocumentPath},
        school_model::{SchoolDocument, SchoolStop},
    },
    utils::read_json,
};

pub const DEFAULT_COLLECTION: &str = "schools";
pub const ROUTES_COLLECTION: &str = "routes";

/// Stops are stored inline, there are no stop documents
#[derive(Serialize)]
struct RouteDocument<'a> {
    name: &'a str,
    stops: &'a [SchoolStop],
}

pub fn build_documents(collection: &str, school: &SchoolDocument) -> Result<Vec<Document>, Error> {
    let school_path = DocumentPath::new(collection, &school.school);

    let mut documents = vec![Document {
        path: school_path.clone(),
        data: json!({ "name": school.school }),
    }];

    for route in &school.routes {
        let data = serde_json::to_value(RouteDocument {
            name: &route.name,
            stops: &route.stops,
        })?;

        documents.push(Document {
            path: school_path.child(ROUTES_COLLECTION, &route.id),
            data,
        });
    }

    Ok(last_write_wins(documents))
}

/// Two routes with the same id write the same document, the later one is what ends up stored
fn last_write_wins(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();

    let mut kept = documents
        .into_iter()
        .rev()
        .filter(|d| seen.insert(d.path.clone()))
        .collect_vec();
    kept.reverse();

    kept
}

/// Returns the number of documents written
pub async fn upload<W: DocumentWriter>(
    writer: &mut W,
    collection: &str,
    school: &SchoolDocument,
) -> Result<usize, Error> {
    let documents = build_documents(collection, school)?;
    for document in &documents {
        debug!(path = %document.path, "writing document");
    }

    writer.write_documents(&documents).await?;

    Ok(documents.len())
}

#[tracing::instrument(err, skip(database_url))]
pub async fn upload_file(input: &Path, collection: &str, database_url: &str) -> Result<(), Error> {
    let school: SchoolDocument = read_json(input)?;

    let pool = sqlx::PgPool::connect(database_url)
        .await
        .context("couldn't connect to the database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let mut tx = pool.begin().await?;
    let written = upload(&mut tx, collection, &school).await?;
    tx.commit().await?;

    info!("wrote {written} documents");
    info!("Data imported successfully for {}", school.school);

    Ok(())
}
