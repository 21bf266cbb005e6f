use std::fmt;

use serde_json::Value;

/// Path of a document in the hierarchical store, e.g. `schools/Some School/routes/7`.
///
/// Always alternates collection and document id, ending on a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection_path: Vec<String>,
    document_id: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        DocumentPath {
            collection_path: vec![collection.into()],
            document_id: document_id.into(),
        }
    }

    /// Path of a document in a subcollection of this document
    pub fn child(&self, collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        let mut collection_path = self.collection_path.clone();
        collection_path.push(self.document_id.clone());
        collection_path.push(collection.into());

        DocumentPath {
            collection_path,
            document_id: document_id.into(),
        }
    }

    /// Everything but the last segment, joined with `/`
    pub fn collection_path(&self) -> String {
        self.collection_path.join("/")
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection_path(), self.document_id)
    }
}

/// A whole document. Writing it replaces whatever was stored at `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub data: Value,
}
