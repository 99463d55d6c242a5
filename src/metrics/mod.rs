//! Service metrics sinks
//!
//! The Shadowsocks handlers report through [`ServiceMetrics`]. A tracker is
//! opened per TCP connection or UDP association before the handler runs, and
//! the handler reports authentication, traffic and close events to it.
//!
//! [`NoopMetrics`] stands in when the host supplies no sink.
//! [`ServiceStats`] is an in-process atomic counter sink.

mod stats;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionContext;

pub use stats::{ServiceStats, ServiceStatsSnapshot};

/// Byte counts of one proxied TCP connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyMetrics {
    /// Client -> proxy
    pub client_proxy: u64,
    /// Proxy -> target
    pub proxy_target: u64,
    /// Target -> proxy
    pub target_proxy: u64,
    /// Proxy -> client
    pub proxy_client: u64,
}

impl ProxyMetrics {
    /// Total bytes in all four legs
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.client_proxy + self.proxy_target + self.target_proxy + self.proxy_client
    }
}

/// Per-connection TCP metrics
pub trait TcpConnectionMetrics: Send + Sync {
    /// The connection authenticated with the given access key id
    fn add_authentication(&self, access_key: &str);

    /// The connection closed
    fn add_closed(&self, status: &str, data: ProxyMetrics, duration: Duration);

    /// The connection failed authentication and was drained as a probe
    fn add_probe(&self, status: &str, drain_result: &str, client_proxy_bytes: u64);
}

/// Per-association UDP metrics
pub trait UdpAssociationMetrics: Send + Sync {
    /// The association authenticated with the given access key id
    fn add_authentication(&self, access_key: &str);

    /// A packet from the client was handled
    fn add_packet_from_client(&self, status: &str, client_proxy_bytes: u64, proxy_target_bytes: u64);

    /// A packet from the target was handled
    fn add_packet_from_target(&self, status: &str, target_proxy_bytes: u64, proxy_client_bytes: u64);

    /// The association closed
    fn add_close(&self);
}

/// Factory for per-connection trackers
pub trait ServiceMetrics: Send + Sync {
    /// Open a tracker for a new TCP connection
    fn add_open_tcp_connection(&self, cx: &ConnectionContext) -> Box<dyn TcpConnectionMetrics>;

    /// Open a tracker for a new UDP association
    fn add_open_udp_association(&self, cx: &ConnectionContext) -> Box<dyn UdpAssociationMetrics>;
}

/// Metrics sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl ServiceMetrics for NoopMetrics {
    fn add_open_tcp_connection(&self, _cx: &ConnectionContext) -> Box<dyn TcpConnectionMetrics> {
        Box::new(Self)
    }

    fn add_open_udp_association(&self, _cx: &ConnectionContext) -> Box<dyn UdpAssociationMetrics> {
        Box::new(Self)
    }
}

impl TcpConnectionMetrics for NoopMetrics {
    fn add_authentication(&self, _access_key: &str) {}

    fn add_closed(&self, _status: &str, _data: ProxyMetrics, _duration: Duration) {}

    fn add_probe(&self, _status: &str, _drain_result: &str, _client_proxy_bytes: u64) {}
}

impl UdpAssociationMetrics for NoopMetrics {
    fn add_authentication(&self, _access_key: &str) {}

    fn add_packet_from_client(&self, _status: &str, _client_proxy_bytes: u64, _proxy_target_bytes: u64) {}

    fn add_packet_from_target(&self, _status: &str, _target_proxy_bytes: u64, _proxy_client_bytes: u64) {}

    fn add_close(&self) {}
}
