//! Provisioning context

use std::fmt;
use std::sync::Arc;

use crate::metrics::ServiceMetrics;
use crate::service::{HandlerBuilder, ReplayCache};

/// Host-supplied collaborators available at provisioning time
#[derive(Clone)]
pub struct ProvisionContext {
    builder: Arc<dyn HandlerBuilder>,
    replay_cache: Option<Arc<dyn ReplayCache>>,
    metrics: Option<Arc<dyn ServiceMetrics>>,
}

impl ProvisionContext {
    /// Create a context with no replay cache and no metrics sink
    pub fn new(builder: Arc<dyn HandlerBuilder>) -> Self {
        Self {
            builder,
            replay_cache: None,
            metrics: None,
        }
    }

    /// Attach a replay cache
    #[must_use]
    pub fn with_replay_cache(mut self, replay_cache: Arc<dyn ReplayCache>) -> Self {
        self.replay_cache = Some(replay_cache);
        self
    }

    /// Attach a metrics sink
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn ServiceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Protocol handler builder
    #[must_use]
    pub fn builder(&self) -> &Arc<dyn HandlerBuilder> {
        &self.builder
    }

    /// Replay cache, if any
    #[must_use]
    pub fn replay_cache(&self) -> Option<&Arc<dyn ReplayCache>> {
        self.replay_cache.as_ref()
    }

    /// Metrics sink, if any
    #[must_use]
    pub fn metrics(&self) -> Option<&Arc<dyn ServiceMetrics>> {
        self.metrics.as_ref()
    }
}

impl fmt::Debug for ProvisionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionContext")
            .field("replay_cache", &self.replay_cache.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
