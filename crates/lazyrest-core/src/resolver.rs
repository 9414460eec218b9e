//! Single-resource versus collection resolution.
//!
//! A key is first looked up as a document. Only when nothing is stored there
//! is it treated as a collection prefix. A key that holds a document *and*
//! has children therefore always resolves to the document; its children stay
//! reachable through their own keys.

use lazyrest_store::{Document, DocumentStore, Key, StoreResult};
use tracing::trace;

/// What a retrieval key resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Document(Document),
    /// Immediate children, in no particular order.
    Collection(Vec<Document>),
}

impl Resolved {
    /// The JSON payload returned to the client.
    pub fn into_document(self) -> Document {
        match self {
            Self::Document(document) => document,
            Self::Collection(members) => Document::Array(members),
        }
    }
}

/// Resolve `key` to a document or a non-empty collection.
///
/// Returns `Ok(None)` when neither exists. An empty collection is reported
/// the same way as a missing one.
pub fn resolve(store: &dyn DocumentStore, key: &Key) -> StoreResult<Option<Resolved>> {
    if let Some(document) = store.get(key)? {
        trace!(%key, "resolved to document");
        return Ok(Some(Resolved::Document(document)));
    }

    let members: Vec<Document> = store
        .list_children(key)?
        .into_iter()
        .map(|(_, document)| document)
        .collect();
    trace!(%key, members = members.len(), "resolved as collection");

    if members.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Resolved::Collection(members)))
    }
}
