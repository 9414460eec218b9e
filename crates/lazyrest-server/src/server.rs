use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use lazyrest_core::Dispatcher;
use lazyrest_store::DocumentStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// lazyrest HTTP server.
pub struct LazyRestServer {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl LazyRestServer {
    /// Open the configured store and prepare a server around it.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = config.open_store()?;
        Ok(Self::with_store(config, store))
    }

    /// Serve an existing store, ignoring `config.storage`.
    pub fn with_store(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, dispatcher: Dispatcher::new(store) }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.dispatcher.clone(), self.config.max_body_bytes)
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` completes. In-flight requests are
    /// drained before returning.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        info!(
            %host,
            addr = %local_addr,
            storage = %self.config.storage_label(),
            "lazyrest listening"
        );

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!("lazyrest stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
