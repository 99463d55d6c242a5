//! Inbound connections as handed over by the host router
//!
//! The host accepts a connection, classifies it as a byte stream or a
//! datagram association, and attaches the result as a typed
//! [`ConnectionType`] before the connection reaches the Shadowsocks handler.
//!
//! A connection without a classification is passed through unchanged; the
//! dispatcher rejects it rather than guessing.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Combined trait for async read + write + unpin + send
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed connection object
pub type BoxedStream = Box<dyn AsyncStream>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Classification attached to an inbound connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Byte stream (TCP-like)
    Stream,
    /// Datagram association (UDP-like)
    Packet,
}

impl ConnectionType {
    /// Get the type name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Packet => "packet",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution context of one connection
///
/// Cloned freely; clones share the cancellation token. The handler that
/// receives the context owns the connection's lifetime and watches the token
/// for cancellation.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    id: u64,
    client_addr: SocketAddr,
    local_addr: SocketAddr,
    cancel: CancellationToken,
}

impl ConnectionContext {
    /// Create a context with a fresh cancellation token
    #[must_use]
    pub fn new(client_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self::with_cancellation(client_addr, local_addr, CancellationToken::new())
    }

    /// Create a context tied to an existing cancellation token
    #[must_use]
    pub fn with_cancellation(
        client_addr: SocketAddr,
        local_addr: SocketAddr,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            client_addr,
            local_addr,
            cancel,
        }
    }

    /// Process-unique connection id
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote (client) address
    #[must_use]
    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    /// Local address the connection was accepted on
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Cancellation token for this connection
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Check if the connection has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// An inbound connection routed to the handler
pub struct Layer4Connection {
    context: ConnectionContext,
    conn: BoxedStream,
    connection_type: Option<ConnectionType>,
}

impl Layer4Connection {
    /// Wrap an unclassified connection
    pub fn new(context: ConnectionContext, conn: impl AsyncStream + 'static) -> Self {
        Self {
            context,
            conn: Box::new(conn),
            connection_type: None,
        }
    }

    /// Attach a classification
    #[must_use]
    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    /// Set or replace the classification
    pub fn set_connection_type(&mut self, connection_type: ConnectionType) {
        self.connection_type = Some(connection_type);
    }

    /// Classification, if the classifier has run
    #[must_use]
    pub fn connection_type(&self) -> Option<ConnectionType> {
        self.connection_type
    }

    /// Execution context
    #[must_use]
    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Split into context, connection object and classification
    #[must_use]
    pub fn into_parts(self) -> (ConnectionContext, BoxedStream, Option<ConnectionType>) {
        (self.context, self.conn, self.connection_type)
    }
}

impl fmt::Debug for Layer4Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer4Connection")
            .field("context", &self.context)
            .field("connection_type", &self.connection_type)
            .finish_non_exhaustive()
    }
}
