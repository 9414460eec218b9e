//! HTTP server for lazyrest.
//!
//! Exposes a document store over plain HTTP: the request path is the key,
//! the method picks the operation. Requests run on tokio's blocking pool
//! because the filesystem backend does synchronous I/O.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::{ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use server::{shutdown_signal, LazyRestServer};

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use lazyrest_store::{FsDocumentStore, InMemoryDocumentStore};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn app() -> Router {
        LazyRestServer::with_store(ServerConfig::default(), Arc::new(InMemoryDocumentStore::new()))
            .router()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String, String) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn put_then_get_injects_id() {
        let app = app();
        let (status, _, body) = send(&app, "PUT", "/items/42", r#"{"name":"x"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());

        let (status, content_type, body) = send(&app, "GET", "/items/42", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"name":"x","id":"42"}"#);
    }

    #[tokio::test]
    async fn id_mismatch_keeps_prior_value() {
        let app = app();
        send(&app, "PUT", "/items/42", r#"{"name":"x"}"#).await;
        let (status, content_type, body) = send(&app, "PUT", "/items/42", r#"{"id":"99"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, "Mismatch between id field `99` and address `42`");

        let (_, _, body) = send(&app, "GET", "/items/42", "").await;
        assert_eq!(body, r#"{"name":"x","id":"42"}"#);
    }

    #[tokio::test]
    async fn batch_create_then_list() {
        let app = app();
        let (status, _, body) =
            send(&app, "POST", "/items/", r#"[{"n":1},{"n":2},{"n":3},{"n":4},{"n":5}]"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, "Created 5 items");

        let (status, _, body) = send(&app, "GET", "/items", "").await;
        assert_eq!(status, StatusCode::OK);
        let members: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(members.len(), 5);
        let mut ids: Vec<&str> = members.iter().map(|m| m["id"].as_str().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn collection_lists_immediate_children_only() {
        let app = app();
        for path in ["/a/x", "/a/y", "/a/z/w"] {
            send(&app, "PUT", path, "{}").await;
        }
        let (_, _, body) = send(&app, "GET", "/a/", "").await;
        let members: Value = serde_json::from_str(&body).unwrap();
        let mut ids: Vec<&str> =
            members.as_array().unwrap().iter().map(|m| m["id"].as_str().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn empty_collection_is_not_found() {
        let app = app();
        send(&app, "PUT", "/a/z/w", "{}").await;
        let (status, _, body) = send(&app, "GET", "/a", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
        let (status, _, _) = send(&app, "GET", "/missing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_delete_again() {
        let app = app();
        send(&app, "PUT", "/items/42", "{}").await;
        let (status, _, _) = send(&app, "DELETE", "/items/42", "").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (status, _, _) = send(&app, "DELETE", "/items/42", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_verbs_are_not_implemented() {
        let app = app();
        for method in ["PATCH", "HEAD", "OPTIONS"] {
            let (status, _, _) = send(&app, method, "/items/42", "").await;
            assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{method}");
        }
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_request() {
        let app = app();
        let (status, _, body) = send(&app, "POST", "/items/", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid JSON");
        let (status, _, _) = send(&app, "PUT", "/", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = send(&app, "GET", "/items", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn created_ids_are_reachable_at_their_encoded_address() {
        let app = app();
        let (status, _, body) =
            send(&app, "POST", "/items/", r#"[{"id":"a b"},{"id":"café"}]"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, "Created 2 items");

        let (status, _, body) = send(&app, "GET", "/items/a%20b", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"id":"a b"}"#);
        let (status, _, body) = send(&app, "GET", "/items/caf%C3%A9", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"id":"café"}"#);

        let (status, _, _) = send(&app, "PUT", "/items/a%20b", r#"{"id":"a b","v":2}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (_, _, body) = send(&app, "GET", "/items/a%20b", "").await;
        assert_eq!(body, r#"{"id":"a b","v":2}"#);

        let (status, _, body) = send(&app, "PUT", "/items/a%20b", r#"{"id":"a%20b"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Mismatch between id field `a%20b` and address `a b`");
    }

    #[tokio::test]
    async fn encoded_separator_addresses_one_document() {
        let app = app();
        let (status, _, _) = send(&app, "PUT", "/docs/a%2Fb", "{}").await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let (_, _, body) = send(&app, "GET", "/docs/a%2Fb", "").await;
        assert_eq!(body, r#"{"id":"a/b"}"#);
        let (status, _, _) = send(&app, "GET", "/docs/a/b", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = ServerConfig::default();
        config.max_body_bytes = 16;
        let app = LazyRestServer::with_store(config, Arc::new(InMemoryDocumentStore::new())).router();
        let big = json!({"padding": "x".repeat(64)}).to_string();
        let (status, _, _) = send(&app, "PUT", "/items/1", &big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn filesystem_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsDocumentStore::open(dir.path()).unwrap());
        let app = LazyRestServer::with_store(ServerConfig::default(), store).router();

        let (status, _, _) = send(&app, "POST", "/users", r#"{"id":"ann","age":41}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(dir.path().join("users").join("ann.json").is_file());

        let (_, _, body) = send(&app, "GET", "/users/ann", "").await;
        assert_eq!(body, r#"{"id":"ann","age":41}"#);
    }
}
