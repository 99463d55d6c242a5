//! Shared test doubles for the handler integration tests

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use shadowsocks_l4::connection::{BoxedStream, ConnectionContext};
use shadowsocks_l4::error::HandlerError;
use shadowsocks_l4::metrics::{
    NoopMetrics, ServiceMetrics, TcpConnectionMetrics, UdpAssociationMetrics,
};
use shadowsocks_l4::service::{
    AssociationHandler, HandlerBuilder, HandlerOptions, ReplayCache, StreamHandler,
};

/// Observable side effect, tagged with the connection id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    OpenTcp(u64),
    OpenUdp(u64),
    Stream(u64),
    Association(u64),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// `(id, cancelled)` of every context a handler received
pub type ContextLog = Arc<Mutex<Vec<(u64, bool)>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Metrics sink that records tracker opens
pub struct RecordingMetrics {
    log: EventLog,
}

impl RecordingMetrics {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl ServiceMetrics for RecordingMetrics {
    fn add_open_tcp_connection(&self, cx: &ConnectionContext) -> Box<dyn TcpConnectionMetrics> {
        self.log.lock().push(Event::OpenTcp(cx.id()));
        Box::new(NoopMetrics)
    }

    fn add_open_udp_association(&self, cx: &ConnectionContext) -> Box<dyn UdpAssociationMetrics> {
        self.log.lock().push(Event::OpenUdp(cx.id()));
        Box::new(NoopMetrics)
    }
}

/// In-memory replay cache
#[derive(Default)]
pub struct MemoryReplayCache {
    seen: Mutex<HashSet<(String, Vec<u8>)>>,
}

impl ReplayCache for MemoryReplayCache {
    fn add(&self, key_id: &str, salt: &[u8]) -> bool {
        self.seen.lock().insert((key_id.to_string(), salt.to_vec()))
    }
}

/// What the builder saw when it was asked to build handlers
#[derive(Debug, Clone)]
pub struct BuildRecord {
    pub key_ids: Vec<String>,
    pub replay_cache: bool,
    pub nat_timeout: Duration,
}

/// Handler builder with scripted handlers
///
/// The stream handler echoes one 4-byte frame and reports an authentication
/// for the first registry key. The association handler fails when
/// `fail_associations` is set.
pub struct MockBuilder {
    log: EventLog,
    contexts: ContextLog,
    fail_associations: bool,
    builds: AtomicUsize,
    record: Mutex<Option<BuildRecord>>,
}

impl MockBuilder {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            contexts: Arc::new(Mutex::new(Vec::new())),
            fail_associations: false,
            builds: AtomicUsize::new(0),
            record: Mutex::new(None),
        }
    }

    pub fn failing_associations(mut self) -> Self {
        self.fail_associations = true;
        self
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn record(&self) -> Option<BuildRecord> {
        self.record.lock().clone()
    }

    pub fn contexts(&self) -> ContextLog {
        Arc::clone(&self.contexts)
    }
}

impl HandlerBuilder for MockBuilder {
    fn build(&self, options: HandlerOptions) -> (Arc<dyn StreamHandler>, Arc<dyn AssociationHandler>) {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let key_ids: Vec<String> = options.ciphers.ids().map(str::to_string).collect();
        *self.record.lock() = Some(BuildRecord {
            key_ids: key_ids.clone(),
            replay_cache: options.replay_cache.is_some(),
            nat_timeout: options.nat_timeout,
        });

        let stream = EchoStream {
            log: Arc::clone(&self.log),
            contexts: Arc::clone(&self.contexts),
            first_key: key_ids.first().cloned(),
        };
        let association = ScriptedAssociation {
            log: Arc::clone(&self.log),
            contexts: Arc::clone(&self.contexts),
            fail: self.fail_associations,
        };
        (Arc::new(stream), Arc::new(association))
    }
}

struct EchoStream {
    log: EventLog,
    contexts: ContextLog,
    first_key: Option<String>,
}

#[async_trait]
impl StreamHandler for EchoStream {
    async fn handle_stream(
        &self,
        cx: ConnectionContext,
        mut stream: BoxedStream,
        metrics: Box<dyn TcpConnectionMetrics>,
    ) -> Result<(), HandlerError> {
        self.log.lock().push(Event::Stream(cx.id()));
        self.contexts.lock().push((cx.id(), cx.is_cancelled()));
        if let Some(key) = &self.first_key {
            metrics.add_authentication(key);
        }

        let mut frame = [0u8; 4];
        stream.read_exact(&mut frame).await?;
        stream.write_all(&frame).await?;
        stream.flush().await?;
        Ok(())
    }
}

struct ScriptedAssociation {
    log: EventLog,
    contexts: ContextLog,
    fail: bool,
}

#[async_trait]
impl AssociationHandler for ScriptedAssociation {
    async fn handle_association(
        &self,
        cx: ConnectionContext,
        _conn: BoxedStream,
        metrics: Box<dyn UdpAssociationMetrics>,
    ) -> Result<(), HandlerError> {
        self.log.lock().push(Event::Association(cx.id()));
        self.contexts.lock().push((cx.id(), cx.is_cancelled()));
        if self.fail {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "association reset by peer",
            )));
        }
        metrics.add_packet_from_client("OK", 32, 20);
        metrics.add_close();
        Ok(())
    }
}

/// A client/local address pair for tests
pub fn context() -> ConnectionContext {
    ConnectionContext::new(
        "198.51.100.7:51000".parse().unwrap(),
        "127.0.0.1:8388".parse().unwrap(),
    )
}
