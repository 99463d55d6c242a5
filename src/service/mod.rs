//! Protocol handler seams
//!
//! The Shadowsocks framing itself lives outside this crate. The host plugs it
//! in through [`HandlerBuilder`], which turns a cipher registry plus the
//! optional collaborators into a [`StreamHandler`] and an
//! [`AssociationHandler`]. [`bind`] performs that construction once, at
//! provisioning time.

mod factory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::{BoxedStream, ConnectionContext};
use crate::error::HandlerError;
use crate::metrics::{TcpConnectionMetrics, UdpAssociationMetrics};

pub use factory::{bind, BoundHandlers, HandlerOptions, DEFAULT_NAT_TIMEOUT};

/// Replay protection store shared by all handlers of a service
pub trait ReplayCache: Send + Sync {
    /// Record a salt seen under `key_id`
    ///
    /// Returns `false` if the salt was already recorded, i.e. the message is
    /// a replay and must be rejected.
    fn add(&self, key_id: &str, salt: &[u8]) -> bool;
}

/// Handler for byte-stream (TCP-like) connections
#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// Serve one stream connection to completion
    ///
    /// The handler owns the connection's lifetime from here on, including
    /// watching `cx` for cancellation.
    async fn handle_stream(
        &self,
        cx: ConnectionContext,
        stream: BoxedStream,
        metrics: Box<dyn TcpConnectionMetrics>,
    ) -> Result<(), HandlerError>;
}

/// Handler for datagram-association (UDP-like) connections
#[async_trait]
pub trait AssociationHandler: Send + Sync {
    /// Serve one association to completion
    async fn handle_association(
        &self,
        cx: ConnectionContext,
        conn: BoxedStream,
        metrics: Box<dyn UdpAssociationMetrics>,
    ) -> Result<(), HandlerError>;
}

/// Constructs protocol handlers bound to a cipher registry
pub trait HandlerBuilder: Send + Sync {
    /// Build the stream and association handlers for `options`
    fn build(&self, options: HandlerOptions) -> (Arc<dyn StreamHandler>, Arc<dyn AssociationHandler>);
}
