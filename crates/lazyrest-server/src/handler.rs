use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{self, header, HeaderMap, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Json, Response};
use lazyrest_core::{Body, Dispatcher, Method, Reply, Status};
use tracing::{debug, error, info};

/// Header consulted for the client address when no peer address is known.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Who sent a request, as recorded in the access log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOrigin {
    pub host: String,
    pub user_agent: String,
    pub remote: String,
    pub protocol: String,
}

impl RequestOrigin {
    /// Missing values are logged as `-`.
    pub fn new(headers: &HeaderMap, version: Version, peer: Option<SocketAddr>) -> Self {
        let header_text = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let remote = peer.map(|addr| addr.ip().to_string()).or_else(|| {
            header_text(FORWARDED_FOR)
                .and_then(|list| list.split(',').next().map(|ip| ip.trim().to_string()))
        });

        Self {
            host: header_text(header::HOST.as_str()).unwrap_or_else(|| "-".to_string()),
            user_agent: header_text(header::USER_AGENT.as_str())
                .unwrap_or_else(|| "-".to_string()),
            remote: remote.unwrap_or_else(|| "-".to_string()),
            protocol: format!("{version:?}"),
        }
    }
}

/// Catch-all handler: every path names a key, so routing is left to the
/// dispatcher.
pub async fn dispatch_handler(
    State(dispatcher): State<Dispatcher>,
    peer: Option<ConnectInfo<SocketAddr>>,
    method: http::Method,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let origin = RequestOrigin::new(&headers, version, peer.map(|ConnectInfo(addr)| addr));
    let method = Method::parse(method.as_str());
    let path = uri.path().to_string();
    let request_body = body.clone();

    let task = {
        let method = method.clone();
        let path = path.clone();
        tokio::task::spawn_blocking(move || dispatcher.handle(&method, &path, Some(&body[..])))
    };
    let reply = match task.await {
        Ok(reply) => reply,
        Err(e) => {
            error!(%method, %path, error = %e, "dispatch task failed");
            Reply::text(Status::InternalServerError, "Internal Server Error")
        }
    };

    info!(
        %method,
        %path,
        status = reply.status.code(),
        body_len = request_body.len(),
        host = %origin.host,
        user_agent = %origin.user_agent,
        remote = %origin.remote,
        protocol = %origin.protocol,
        "request handled"
    );
    debug!(
        %method,
        %path,
        request = %String::from_utf8_lossy(&request_body),
        response = ?reply.body,
        "request bodies"
    );
    into_response(reply)
}

fn into_response(reply: Reply) -> Response {
    let status =
        StatusCode::from_u16(reply.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match reply.body {
        Body::Empty => status.into_response(),
        Body::Json(document) => (status, Json(document)).into_response(),
        Body::Text(message) => (status, message).into_response(),
    }
}
