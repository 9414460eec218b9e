use axum::extract::DefaultBodyLimit;
use axum::Router;
use lazyrest_core::Dispatcher;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Build the router. There are no fixed routes: every request falls through
/// to the dispatcher.
pub fn build_router(dispatcher: Dispatcher, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(handler::dispatch_handler)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}
