//! Storage Proxy Server
//!
//! HTTP server that maps every request path onto an object in the bucket.
//! There is no routing: a single fallback handler receives all paths and
//! dispatches on the method.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handler::handle_request;
use crate::error::{Error, Result};
use crate::key::ProxyConfig;
use crate::store::BlobStore;

/// HTTP to blob store proxy
///
/// Cheap to clone; the key mapping and the store handle are shared
/// read-only by every request.
#[derive(Clone)]
pub struct StorageProxy {
    config: Arc<ProxyConfig>,
    store: Arc<dyn BlobStore>,
}

impl StorageProxy {
    pub fn new(store: Arc<dyn BlobStore>, config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Key mapping used for every request
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Blob store behind the proxy
    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Create the router
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(handle_request)
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Bind `address` and serve until a fatal error
    pub async fn serve(&self, address: &str) -> Result<()> {
        self.serve_with_shutdown(address, std::future::pending()).await
    }

    /// Bind `address` and serve until `signal` resolves
    pub async fn serve_with_shutdown<F>(&self, address: &str, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(address).await.map_err(|source| {
            tracing::error!("Failed to listen on {}: {}", address, source);
            Error::Bind {
                address: address.to_string(),
                source,
            }
        })?;

        self.serve_listener(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves
    pub async fn serve_listener<F>(&self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        tracing::info!("Storage proxy listening on {}", local_addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error on {}: {}", local_addr, e);
                Error::Network(format!("HTTP server error: {}", e))
            })?;

        tracing::info!("Storage proxy on {} shut down", local_addr);
        Ok(())
    }
}
