//! Shadowsocks layer-4 handler
//!
//! [`ShadowsocksHandler`] holds the key configuration. Provisioning builds the
//! cipher registry and binds the protocol handlers exactly once, producing a
//! [`ProvisionedShadowsocksHandler`]. Only the provisioned handler can serve
//! connections.
//!
//! # Dispatch
//!
//! | Connection type | Metrics opened               | Handler invoked         |
//! |-----------------|------------------------------|-------------------------|
//! | `Stream`        | `add_open_tcp_connection`    | `handle_stream`         |
//! | `Packet`        | `add_open_udp_association`   | `handle_association`    |
//! | none            | nothing                      | nothing, error returned |

mod context;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, trace};

use crate::cipher::CipherRegistry;
use crate::config::ShadowsocksHandlerConfig;
use crate::connection::{ConnectionType, Layer4Connection};
use crate::error::{ConfigError, DispatchError};
use crate::service::{bind, BoundHandlers};

pub use context::ProvisionContext;

/// A handler the host routes layer-4 connections to
#[async_trait]
pub trait Layer4Handler: Send + Sync {
    /// Serve one inbound connection
    async fn handle(&self, conn: Layer4Connection) -> Result<(), DispatchError>;
}

/// Unprovisioned Shadowsocks handler
#[derive(Debug, Clone, Default)]
pub struct ShadowsocksHandler {
    config: ShadowsocksHandlerConfig,
}

impl ShadowsocksHandler {
    /// Create a handler from its key configuration
    #[must_use]
    pub fn new(config: ShadowsocksHandlerConfig) -> Self {
        Self { config }
    }

    /// Key configuration
    #[must_use]
    pub fn config(&self) -> &ShadowsocksHandlerConfig {
        &self.config
    }

    /// Build the cipher registry and bind the protocol handlers
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` if any configured key cannot be
    /// used. Nothing is bound in that case.
    pub fn provision(
        self,
        ctx: &ProvisionContext,
    ) -> Result<ProvisionedShadowsocksHandler, ConfigError> {
        let ciphers = Arc::new(CipherRegistry::build(&self.config.keys)?);

        let methods: Vec<String> = ciphers
            .method_counts()
            .into_iter()
            .map(|(method, count)| format!("{method}={count}"))
            .collect();
        info!(
            keys = ciphers.len(),
            configured = self.config.keys.len(),
            methods = %methods.join(","),
            "Provisioned Shadowsocks cipher registry"
        );

        let handlers = bind(
            ctx.builder().as_ref(),
            ciphers,
            ctx.replay_cache().cloned(),
            ctx.metrics().cloned(),
        );

        Ok(ProvisionedShadowsocksHandler { handlers })
    }
}

/// Shadowsocks handler ready to serve connections
///
/// Shared across connections behind an `Arc`; dispatch never mutates it.
#[derive(Clone)]
pub struct ProvisionedShadowsocksHandler {
    handlers: BoundHandlers,
}

impl ProvisionedShadowsocksHandler {
    /// Registry of accepted keys
    #[must_use]
    pub fn ciphers(&self) -> &Arc<CipherRegistry> {
        self.handlers.ciphers()
    }

    /// Bound protocol handlers
    #[must_use]
    pub fn handlers(&self) -> &BoundHandlers {
        &self.handlers
    }

    /// Route one connection to the bound handler for its type
    ///
    /// The per-connection metrics tracker is opened before the handler runs
    /// and handed to it. Handler errors are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownConnectionType` if the connection was
    /// never classified, or `DispatchError::Handler` with the handler's own
    /// error.
    pub async fn dispatch(&self, conn: Layer4Connection) -> Result<(), DispatchError> {
        let (cx, stream, connection_type) = conn.into_parts();

        let Some(connection_type) = connection_type else {
            trace!(conn_id = cx.id(), client = %cx.client_addr(), "Connection has no type");
            return Err(DispatchError::UnknownConnectionType);
        };

        trace!(
            conn_id = cx.id(),
            client = %cx.client_addr(),
            kind = %connection_type,
            "Dispatching connection"
        );

        match connection_type {
            ConnectionType::Stream => {
                let tracker = self.handlers.metrics().add_open_tcp_connection(&cx);
                self.handlers
                    .stream()
                    .handle_stream(cx, stream, tracker)
                    .await
                    .map_err(DispatchError::Handler)
            }
            ConnectionType::Packet => {
                let tracker = self.handlers.metrics().add_open_udp_association(&cx);
                self.handlers
                    .association()
                    .handle_association(cx, stream, tracker)
                    .await
                    .map_err(DispatchError::Handler)
            }
        }
    }
}

#[async_trait]
impl Layer4Handler for ProvisionedShadowsocksHandler {
    async fn handle(&self, conn: Layer4Connection) -> Result<(), DispatchError> {
        self.dispatch(conn).await
    }
}

impl fmt::Debug for ProvisionedShadowsocksHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionedShadowsocksHandler")
            .field("handlers", &self.handlers)
            .finish()
    }
}
