use crate::error::StoreResult;
use crate::key::Key;
use crate::Document;

/// Hierarchical document store.
///
/// All implementations must satisfy these invariants:
/// - A key may hold a document, have descendants, or both.
/// - `get` after `put` on the same key (with no delete in between) observes
///   the written document.
/// - Callers always receive copies; mutating a returned document never
///   touches stored state.
/// - Mutations are serialized against concurrent readers and writers.
/// - All I/O errors are propagated, never silently ignored.
pub trait DocumentStore: Send + Sync {
    /// Read the document stored at `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there, including when `key`
    /// only groups other documents.
    fn get(&self, key: &Key) -> StoreResult<Option<Document>>;

    /// Whether `key` has at least one stored descendant.
    fn is_container(&self, key: &Key) -> StoreResult<bool>;

    /// Documents exactly one segment below `key`, as `(segment, document)`.
    ///
    /// Deeper descendants are never included. Order is unspecified.
    fn list_children(&self, key: &Key) -> StoreResult<Vec<(String, Document)>>;

    /// Create or replace the document at `key`.
    fn put(&self, key: &Key, document: &Document) -> StoreResult<()>;

    /// Delete the document at `key`. Returns `true` if it existed.
    fn delete(&self, key: &Key) -> StoreResult<bool>;

    /// Whether a document is stored at `key`.
    fn contains(&self, key: &Key) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Write several documents.
    ///
    /// Default implementation calls `put()` for each entry. Backends may
    /// override to apply the batch under a single lock.
    fn put_batch(&self, entries: &[(Key, Document)]) -> StoreResult<()> {
        entries.iter().try_for_each(|(key, doc)| self.put(key, doc))
    }
}
