//! In-process service statistics
//!
//! Lock-free counters shared by all trackers of one service. Trackers keep
//! the active gauges honest through `Drop`, so a handler that exits early
//! without reporting a close still releases its slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{ProxyMetrics, ServiceMetrics, TcpConnectionMetrics, UdpAssociationMetrics};
use crate::connection::ConnectionContext;

#[derive(Debug, Default)]
struct StatsInner {
    tcp_opened: AtomicU64,
    tcp_active: AtomicU64,
    tcp_closed: AtomicU64,
    tcp_probes: AtomicU64,
    udp_opened: AtomicU64,
    udp_active: AtomicU64,
    udp_closed: AtomicU64,
    packets_from_client: AtomicU64,
    packets_from_target: AtomicU64,
    bytes_client_proxy: AtomicU64,
    bytes_proxy_target: AtomicU64,
    bytes_target_proxy: AtomicU64,
    bytes_proxy_client: AtomicU64,
    /// Authentications per access key id
    authentications: DashMap<String, u64>,
}

impl StatsInner {
    fn record_authentication(&self, access_key: &str) {
        *self
            .authentications
            .entry(access_key.to_string())
            .or_insert(0) += 1;
    }
}

/// Atomic statistics sink for one Shadowsocks service
///
/// Cheap to clone; clones share counters. Hand one clone to the handlers as
/// their [`ServiceMetrics`] and keep another for [`ServiceStats::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    inner: Arc<StatsInner>,
}

impl ServiceStats {
    /// Create empty statistics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently open TCP connections
    #[must_use]
    pub fn active_tcp_connections(&self) -> u64 {
        self.inner.tcp_active.load(Ordering::Relaxed)
    }

    /// Currently open UDP associations
    #[must_use]
    pub fn active_udp_associations(&self) -> u64 {
        self.inner.udp_active.load(Ordering::Relaxed)
    }

    /// Authentications recorded for an access key id
    #[must_use]
    pub fn authentications(&self, access_key: &str) -> u64 {
        self.inner
            .authentications
            .get(access_key)
            .map_or(0, |count| *count)
    }

    /// Get a snapshot of all statistics
    #[must_use]
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        let inner = &self.inner;
        let mut authentications: Vec<(String, u64)> = inner
            .authentications
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        authentications.sort();

        ServiceStatsSnapshot {
            tcp_opened: inner.tcp_opened.load(Ordering::Relaxed),
            tcp_active: inner.tcp_active.load(Ordering::Relaxed),
            tcp_closed: inner.tcp_closed.load(Ordering::Relaxed),
            tcp_probes: inner.tcp_probes.load(Ordering::Relaxed),
            udp_opened: inner.udp_opened.load(Ordering::Relaxed),
            udp_active: inner.udp_active.load(Ordering::Relaxed),
            udp_closed: inner.udp_closed.load(Ordering::Relaxed),
            packets_from_client: inner.packets_from_client.load(Ordering::Relaxed),
            packets_from_target: inner.packets_from_target.load(Ordering::Relaxed),
            bytes: ProxyMetrics {
                client_proxy: inner.bytes_client_proxy.load(Ordering::Relaxed),
                proxy_target: inner.bytes_proxy_target.load(Ordering::Relaxed),
                target_proxy: inner.bytes_target_proxy.load(Ordering::Relaxed),
                proxy_client: inner.bytes_proxy_client.load(Ordering::Relaxed),
            },
            authentications,
            timestamp_ms: u64::try_from(
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis(),
            )
            .unwrap_or(u64::MAX),
        }
    }
}

impl ServiceMetrics for ServiceStats {
    fn add_open_tcp_connection(&self, _cx: &ConnectionContext) -> Box<dyn TcpConnectionMetrics> {
        Box::new(TcpConnectionTracker::new(Arc::clone(&self.inner)))
    }

    fn add_open_udp_association(&self, _cx: &ConnectionContext) -> Box<dyn UdpAssociationMetrics> {
        Box::new(UdpAssociationTracker::new(Arc::clone(&self.inner)))
    }
}

/// Tracker for one TCP connection
///
/// Holds an active-connection slot until dropped.
struct TcpConnectionTracker {
    stats: Arc<StatsInner>,
}

impl TcpConnectionTracker {
    fn new(stats: Arc<StatsInner>) -> Self {
        stats.tcp_opened.fetch_add(1, Ordering::Relaxed);
        stats.tcp_active.fetch_add(1, Ordering::Relaxed);
        Self { stats }
    }
}

impl TcpConnectionMetrics for TcpConnectionTracker {
    fn add_authentication(&self, access_key: &str) {
        self.stats.record_authentication(access_key);
    }

    fn add_closed(&self, _status: &str, data: ProxyMetrics, _duration: Duration) {
        let stats = &self.stats;
        stats.tcp_closed.fetch_add(1, Ordering::Relaxed);
        stats.bytes_client_proxy.fetch_add(data.client_proxy, Ordering::Relaxed);
        stats.bytes_proxy_target.fetch_add(data.proxy_target, Ordering::Relaxed);
        stats.bytes_target_proxy.fetch_add(data.target_proxy, Ordering::Relaxed);
        stats.bytes_proxy_client.fetch_add(data.proxy_client, Ordering::Relaxed);
    }

    fn add_probe(&self, _status: &str, _drain_result: &str, client_proxy_bytes: u64) {
        self.stats.tcp_probes.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_client_proxy
            .fetch_add(client_proxy_bytes, Ordering::Relaxed);
    }
}

impl Drop for TcpConnectionTracker {
    fn drop(&mut self) {
        self.stats.tcp_active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Tracker for one UDP association
///
/// Holds an active-association slot until dropped.
struct UdpAssociationTracker {
    stats: Arc<StatsInner>,
}

impl UdpAssociationTracker {
    fn new(stats: Arc<StatsInner>) -> Self {
        stats.udp_opened.fetch_add(1, Ordering::Relaxed);
        stats.udp_active.fetch_add(1, Ordering::Relaxed);
        Self { stats }
    }
}

impl UdpAssociationMetrics for UdpAssociationTracker {
    fn add_authentication(&self, access_key: &str) {
        self.stats.record_authentication(access_key);
    }

    fn add_packet_from_client(&self, _status: &str, client_proxy_bytes: u64, proxy_target_bytes: u64) {
        let stats = &self.stats;
        stats.packets_from_client.fetch_add(1, Ordering::Relaxed);
        stats.bytes_client_proxy.fetch_add(client_proxy_bytes, Ordering::Relaxed);
        stats.bytes_proxy_target.fetch_add(proxy_target_bytes, Ordering::Relaxed);
    }

    fn add_packet_from_target(&self, _status: &str, target_proxy_bytes: u64, proxy_client_bytes: u64) {
        let stats = &self.stats;
        stats.packets_from_target.fetch_add(1, Ordering::Relaxed);
        stats.bytes_target_proxy.fetch_add(target_proxy_bytes, Ordering::Relaxed);
        stats.bytes_proxy_client.fetch_add(proxy_client_bytes, Ordering::Relaxed);
    }

    fn add_close(&self) {
        self.stats.udp_closed.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for UdpAssociationTracker {
    fn drop(&mut self) {
        self.stats.udp_active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Snapshot of service statistics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatsSnapshot {
    /// TCP connections opened
    pub tcp_opened: u64,
    /// TCP connections currently open
    pub tcp_active: u64,
    /// TCP connections that reported a close
    pub tcp_closed: u64,
    /// TCP connections drained as probes
    pub tcp_probes: u64,
    /// UDP associations opened
    pub udp_opened: u64,
    /// UDP associations currently open
    pub udp_active: u64,
    /// UDP associations that reported a close
    pub udp_closed: u64,
    /// Packets handled from clients
    pub packets_from_client: u64,
    /// Packets handled from targets
    pub packets_from_target: u64,
    /// Byte totals across TCP and UDP
    pub bytes: ProxyMetrics,
    /// Authentications per access key id, sorted by id
    pub authentications: Vec<(String, u64)>,
    /// Timestamp in milliseconds
    pub timestamp_ms: u64,
}
