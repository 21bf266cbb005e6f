use anyhow::Error;
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::{Instrument, info_span};

use crate::model::document_model::Document;

/// Anything that can store whole documents by path
pub trait DocumentWriter {
    /// Every document replaces the one stored at its path
    async fn write_documents(&mut self, documents: &[Document]) -> Result<(), Error>;
}

impl DocumentWriter for Transaction<'_, Postgres> {
    async fn write_documents(&mut self, documents: &[Document]) -> Result<(), Error> {
        upsert_documents(documents, self).await
    }
}

/// Paths must be unique within `documents`, postgres refuses to update a row twice in one statement
pub async fn upsert_documents(
    documents: &[Document],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    for documents in documents.chunks(1024) {
        let mut query_builder = QueryBuilder::new(
            "INSERT INTO documents (
                collection_path,
                document_id,
                data
            )",
        );

        query_builder.push_values(documents, |mut b, document| {
            b.push_bind(document.path.collection_path())
                .push_bind(document.path.document_id())
                .push_bind(&document.data);
        });

        query_builder.push(
            " ON CONFLICT ( collection_path, document_id ) DO UPDATE SET data = EXCLUDED.data, updated_at = now()",
        );

        query_builder
            .build()
            .execute(&mut **tx)
            .instrument(info_span!("Upserting documents"))
            .await?;
    }

    Ok(())
}
