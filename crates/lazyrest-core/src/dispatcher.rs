use std::sync::Arc;

use lazyrest_store::{to_collection_key, to_resource_key, Document, DocumentStore, Key};
use tracing::{debug, error};

use crate::error::{RestError, RestResult};
use crate::identifier::{prepare_batch, reconcile};
use crate::reply::{Method, Reply, Status};
use crate::resolver::resolve;

/// Routes one request to retrieve, create, replace or delete.
///
/// The dispatcher holds no state of its own besides the shared store, so it
/// is cheap to clone into every request task.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Handle `method path` with an optional body. Never fails: every error
    /// is resolved into a status and a message.
    pub fn handle(&self, method: &Method, path: &str, body: Option<&[u8]>) -> Reply {
        match self.try_handle(method, path, body.unwrap_or_default()) {
            Ok(reply) => reply,
            Err(err) if err.is_internal() => {
                error!(%method, path, error = %err, "request failed");
                Reply::text(err.status(), "Internal Server Error")
            }
            Err(err) => {
                debug!(%method, path, error = %err, "request rejected");
                Reply::text(err.status(), err.to_string())
            }
        }
    }

    fn try_handle(&self, method: &Method, path: &str, body: &[u8]) -> RestResult<Reply> {
        match method {
            Method::Get => self.retrieve(&to_resource_key(path)),
            Method::Post => self.create(&to_collection_key(path), body),
            Method::Put => self.replace(&to_resource_key(path), body),
            Method::Delete => self.remove(&to_resource_key(path)),
            Method::Other(name) => Err(RestError::Unsupported(name.clone())),
        }
    }

    /// GET: the document at `key`, else its immediate children.
    pub fn retrieve(&self, key: &Key) -> RestResult<Reply> {
        let resolved = resolve(self.store.as_ref(), key)?
            .ok_or_else(|| RestError::NotFound(key.to_string()))?;
        Ok(Reply::json(Status::Ok, resolved.into_document()))
    }

    /// POST: store every object in `body` below `collection`.
    pub fn create(&self, collection: &Key, body: &[u8]) -> RestResult<Reply> {
        let batch = prepare_batch(collection, body)?;
        self.store.put_batch(&batch)?;
        debug!(collection = %collection.as_collection(), count = batch.len(), "batch created");
        Ok(Reply::text(Status::Created, format!("Created {} items", batch.len())))
    }

    /// PUT: store `body` at `key` after identifier reconciliation.
    pub fn replace(&self, key: &Key, body: &[u8]) -> RestResult<Reply> {
        let document: Document = serde_json::from_slice(body).map_err(RestError::InvalidJson)?;
        let document = reconcile(key, document)?;
        self.store.put(key, &document)?;
        debug!(%key, "document replaced");
        Ok(Reply::empty(Status::Accepted))
    }

    /// DELETE: remove the document at `key` if present.
    pub fn remove(&self, key: &Key) -> RestResult<Reply> {
        if self.store.delete(key)? {
            debug!(%key, "document deleted");
            Ok(Reply::empty(Status::Accepted))
        } else {
            Err(RestError::NotFound(key.to_string()))
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Body;
    use lazyrest_store::{FsDocumentStore, InMemoryDocumentStore, StoreError, StoreResult};
    use serde_json::json;

    fn dispatcher() -> (Arc<InMemoryDocumentStore>, Dispatcher) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let dispatcher = Dispatcher::new(store.clone());
        (store, dispatcher)
    }

    fn get(d: &Dispatcher, path: &str) -> Reply {
        d.handle(&Method::Get, path, None)
    }

    fn post(d: &Dispatcher, path: &str, body: &str) -> Reply {
        d.handle(&Method::Post, path, Some(body.as_bytes()))
    }

    fn put(d: &Dispatcher, path: &str, body: &str) -> Reply {
        d.handle(&Method::Put, path, Some(body.as_bytes()))
    }

    fn delete(d: &Dispatcher, path: &str) -> Reply {
        d.handle(&Method::Delete, path, None)
    }

    fn json_body(reply: Reply) -> Document {
        match reply.body {
            Body::Json(doc) => doc,
            other => panic!("expected a JSON body, got {other:?}"),
        }
    }

    /// Store whose writes always fail, as a full disk would.
    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn get(&self, _key: &Key) -> StoreResult<Option<Document>> {
            Ok(None)
        }
        fn is_container(&self, _key: &Key) -> StoreResult<bool> {
            Ok(false)
        }
        fn list_children(&self, _key: &Key) -> StoreResult<Vec<(String, Document)>> {
            Err(StoreError::LockPoisoned)
        }
        fn put(&self, _key: &Key, _document: &Document) -> StoreResult<()> {
            Err(StoreError::LockPoisoned)
        }
        fn delete(&self, _key: &Key) -> StoreResult<bool> {
            Err(StoreError::LockPoisoned)
        }
    }

    // -----------------------------------------------------------------------
    // GET
    // -----------------------------------------------------------------------

    #[test]
    fn get_document() {
        let (_, d) = dispatcher();
        assert_eq!(put(&d, "/items/42", r#"{"name":"x"}"#).status, Status::Accepted);
        let reply = get(&d, "/items/42");
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(json_body(reply), json!({"name": "x", "id": "42"}));
    }

    #[test]
    fn get_collection_with_immediate_children() {
        let (_, d) = dispatcher();
        put(&d, "/a/x", "{}");
        put(&d, "/a/y", "{}");
        put(&d, "/a/z/w", "{}");

        let reply = get(&d, "/a/");
        assert_eq!(reply.status, Status::Ok);
        let members = json_body(reply);
        let mut ids: Vec<&str> = members
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|m| m["id"].as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn empty_collection_is_not_found() {
        let (_, d) = dispatcher();
        put(&d, "/a/z/w", "{}");
        let empty = get(&d, "/a");
        let unknown = get(&d, "/nothing");
        assert_eq!(empty.status, Status::NotFound);
        assert_eq!(empty, unknown);
        assert_eq!(empty.body, Body::Text("Not Found".into()));
    }

    // -----------------------------------------------------------------------
    // POST
    // -----------------------------------------------------------------------

    #[test]
    fn post_batch_generates_distinct_ids() {
        let (store, d) = dispatcher();
        let reply = post(&d, "/items/", r#"[{"n":1},{"n":2},{"n":3},{"n":4},{"n":5}]"#);
        assert_eq!(reply.status, Status::Created);
        assert_eq!(reply.body, Body::Text("Created 5 items".into()));

        let members = store.list_children(&to_resource_key("items")).unwrap();
        assert_eq!(members.len(), 5);
        for (name, doc) in members {
            assert_eq!(doc["id"], json!(name));
            assert_eq!(get(&d, &format!("/items/{name}")).status, Status::Ok);
        }
    }

    #[test]
    fn post_without_trailing_separator_targets_the_collection() {
        let (store, d) = dispatcher();
        let reply = post(&d, "/items", r#"{"id":"abc"}"#);
        assert_eq!(reply.body, Body::Text("Created 1 items".into()));
        assert!(store.contains(&to_resource_key("items/abc")).unwrap());
    }

    #[test]
    fn post_invalid_json_writes_nothing() {
        let (store, d) = dispatcher();
        let reply = post(&d, "/items/", r#"[{"id":"a"}, {"id": "#);
        assert_eq!(reply.status, Status::BadRequest);
        assert_eq!(reply.body, Body::Text("Invalid JSON".into()));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn post_bad_item_aborts_whole_batch() {
        let (store, d) = dispatcher();
        let reply = post(&d, "/items/", r#"[{"id":"a"}, [1, 2]]"#);
        assert_eq!(reply.status, Status::BadRequest);
        assert!(store.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // PUT
    // -----------------------------------------------------------------------

    #[test]
    fn put_injects_id() {
        let (store, d) = dispatcher();
        put(&d, "/items/42", r#"{"name":"x"}"#);
        let stored = store.get(&to_resource_key("items/42")).unwrap().unwrap();
        assert_eq!(serde_json::to_string(&stored).unwrap(), r#"{"name":"x","id":"42"}"#);
    }

    #[test]
    fn put_id_mismatch_leaves_prior_value() {
        let (store, d) = dispatcher();
        put(&d, "/items/42", r#"{"name":"before"}"#);
        let reply = put(&d, "/items/42", r#"{"id":"99"}"#);
        assert_eq!(reply.status, Status::BadRequest);
        assert_eq!(
            reply.body,
            Body::Text("Mismatch between id field `99` and address `42`".into())
        );
        assert_eq!(
            store.get(&to_resource_key("items/42")).unwrap(),
            Some(json!({"name": "before", "id": "42"}))
        );
    }

    #[test]
    fn put_non_object_is_stored_as_is() {
        let (_, d) = dispatcher();
        assert_eq!(put(&d, "/lists/1", "[1,2,3]").status, Status::Accepted);
        assert_eq!(json_body(get(&d, "/lists/1")), json!([1, 2, 3]));
    }

    #[test]
    fn put_invalid_json_is_bad_request() {
        let (_, d) = dispatcher();
        assert_eq!(put(&d, "/items/1", "nope").status, Status::BadRequest);
        assert_eq!(d.handle(&Method::Put, "/items/1", None).status, Status::BadRequest);
    }

    #[test]
    fn put_root_is_bad_request() {
        let (_, d) = dispatcher();
        assert_eq!(put(&d, "/", "{}").status, Status::BadRequest);
    }

    // -----------------------------------------------------------------------
    // DELETE
    // -----------------------------------------------------------------------

    #[test]
    fn delete_then_delete_again() {
        let (_, d) = dispatcher();
        put(&d, "/items/42", "{}");
        assert_eq!(delete(&d, "/items/42").status, Status::Accepted);
        assert_eq!(delete(&d, "/items/42").status, Status::NotFound);
        assert_eq!(get(&d, "/items/42").status, Status::NotFound);
    }

    // -----------------------------------------------------------------------
    // Other verbs and failures
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_verb_is_not_implemented() {
        let (_, d) = dispatcher();
        let reply = d.handle(&Method::parse("PATCH"), "/items/1", Some(b"{}"));
        assert_eq!(reply.status, Status::NotImplemented);
        assert_eq!(reply.body, Body::Text("Not Implemented".into()));
    }

    #[test]
    fn storage_failures_are_internal_errors() {
        let d = Dispatcher::new(Arc::new(FailingStore));
        for reply in [
            get(&d, "/items"),
            post(&d, "/items/", "{}"),
            put(&d, "/items/1", "{}"),
            delete(&d, "/items/1"),
        ] {
            assert_eq!(reply.status, Status::InternalServerError);
            assert_eq!(reply.body, Body::Text("Internal Server Error".into()));
        }
    }

    #[test]
    fn filesystem_backend_behaves_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let d = Dispatcher::new(Arc::new(FsDocumentStore::open(dir.path()).unwrap()));

        assert_eq!(put(&d, "/items/42", r#"{"name":"x"}"#).status, Status::Accepted);
        assert_eq!(post(&d, "/items/", r#"[{"id":"a"},{"id":"b"}]"#).status, Status::Created);
        assert_eq!(json_body(get(&d, "/items")).as_array().unwrap().len(), 3);
        assert_eq!(put(&d, "/items/42", r#"{"id":"7"}"#).status, Status::BadRequest);
        assert_eq!(delete(&d, "/items/42").status, Status::Accepted);
        assert_eq!(delete(&d, "/items/42").status, Status::NotFound);
    }
}
