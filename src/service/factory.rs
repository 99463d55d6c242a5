//! Handler factory
//!
//! Binding is pure construction. Missing optional collaborators degrade the
//! service and are reported once here, never per connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{AssociationHandler, HandlerBuilder, ReplayCache, StreamHandler};
use crate::cipher::CipherRegistry;
use crate::metrics::{NoopMetrics, ServiceMetrics};

/// Default idle timeout for UDP associations (RFC 4787 §4.3)
pub const DEFAULT_NAT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Everything a [`HandlerBuilder`] needs to build handlers
#[derive(Clone)]
pub struct HandlerOptions {
    /// Registry of accepted keys
    pub ciphers: Arc<CipherRegistry>,
    /// Replay protection, if the host provides one
    pub replay_cache: Option<Arc<dyn ReplayCache>>,
    /// Metrics sink, never absent
    pub metrics: Arc<dyn ServiceMetrics>,
    /// Idle timeout for UDP associations
    pub nat_timeout: Duration,
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("keys", &self.ciphers.len())
            .field("replay_cache", &self.replay_cache.is_some())
            .field("nat_timeout", &self.nat_timeout)
            .finish_non_exhaustive()
    }
}

/// Handlers bound to one cipher registry
#[derive(Clone)]
pub struct BoundHandlers {
    stream: Arc<dyn StreamHandler>,
    association: Arc<dyn AssociationHandler>,
    metrics: Arc<dyn ServiceMetrics>,
    ciphers: Arc<CipherRegistry>,
    replay_protected: bool,
}

impl BoundHandlers {
    /// Stream (TCP-like) handler
    #[must_use]
    pub fn stream(&self) -> &Arc<dyn StreamHandler> {
        &self.stream
    }

    /// Association (UDP-like) handler
    #[must_use]
    pub fn association(&self) -> &Arc<dyn AssociationHandler> {
        &self.association
    }

    /// Metrics sink the handlers report to
    #[must_use]
    pub fn metrics(&self) -> &Arc<dyn ServiceMetrics> {
        &self.metrics
    }

    /// Registry the handlers were bound to
    #[must_use]
    pub fn ciphers(&self) -> &Arc<CipherRegistry> {
        &self.ciphers
    }

    /// Whether a replay cache was supplied
    #[must_use]
    pub fn is_replay_protected(&self) -> bool {
        self.replay_protected
    }
}

impl fmt::Debug for BoundHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandlers")
            .field("keys", &self.ciphers.len())
            .field("replay_protected", &self.replay_protected)
            .finish_non_exhaustive()
    }
}

/// Bind protocol handlers to a registry
///
/// An absent metrics sink is replaced by [`NoopMetrics`]. Each absent
/// collaborator logs one warning.
pub fn bind(
    builder: &dyn HandlerBuilder,
    ciphers: Arc<CipherRegistry>,
    replay_cache: Option<Arc<dyn ReplayCache>>,
    metrics: Option<Arc<dyn ServiceMetrics>>,
) -> BoundHandlers {
    if replay_cache.is_none() {
        warn!("Replay cache not available; handlers will accept replayed salts");
    }

    let metrics = metrics.unwrap_or_else(|| {
        warn!("Metrics sink not available; connection metrics are discarded");
        Arc::new(NoopMetrics)
    });

    let replay_protected = replay_cache.is_some();
    let options = HandlerOptions {
        ciphers: Arc::clone(&ciphers),
        replay_cache,
        metrics: Arc::clone(&metrics),
        nat_timeout: DEFAULT_NAT_TIMEOUT,
    };
    debug!(?options, "Building Shadowsocks handlers");

    let (stream, association) = builder.build(options);

    BoundHandlers {
        stream,
        association,
        metrics,
        ciphers,
        replay_protected,
    }
}
