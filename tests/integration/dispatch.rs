//! Dispatch tests: routing classified connections to bound handlers

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use shadowsocks_l4::config::{KeyConfig, ShadowsocksHandlerConfig};
use shadowsocks_l4::connection::{ConnectionType, Layer4Connection};
use shadowsocks_l4::error::DispatchError;
use shadowsocks_l4::handler::{
    Layer4Handler, ProvisionContext, ProvisionedShadowsocksHandler, ShadowsocksHandler,
};
use shadowsocks_l4::metrics::ServiceStats;

use super::support::{context, event_log, Event, EventLog, MockBuilder, RecordingMetrics};

fn provision(builder: MockBuilder, metrics: Option<Arc<RecordingMetrics>>) -> ProvisionedShadowsocksHandler {
    let mut ctx = ProvisionContext::new(Arc::new(builder));
    if let Some(metrics) = metrics {
        ctx = ctx.with_metrics(metrics);
    }
    let config = ShadowsocksHandlerConfig::new(vec![KeyConfig::new("user-0", "aes-256-gcm", "s1")]);
    ShadowsocksHandler::new(config).provision(&ctx).unwrap()
}

fn recorded(log: &EventLog) -> Vec<Event> {
    log.lock().clone()
}

#[tokio::test]
async fn test_stream_connection_reaches_stream_handler() {
    let log = event_log();
    let handler = provision(
        MockBuilder::new(log.clone()),
        Some(Arc::new(RecordingMetrics::new(log.clone()))),
    );

    let (server, mut client) = tokio::io::duplex(64);
    let cx = context();
    let id = cx.id();
    let conn = Layer4Connection::new(cx, server).with_connection_type(ConnectionType::Stream);

    let client_task = tokio::spawn(async move {
        client.write_all(b"ping").await.unwrap();
        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).await.unwrap();
        reply
    });

    handler.handle(conn).await.unwrap();
    assert_eq!(&client_task.await.unwrap(), b"ping");

    // The tracker is opened before the handler runs
    assert_eq!(recorded(&log), vec![Event::OpenTcp(id), Event::Stream(id)]);
}

#[tokio::test]
async fn test_packet_connection_reaches_association_handler() {
    let log = event_log();
    let handler = provision(
        MockBuilder::new(log.clone()),
        Some(Arc::new(RecordingMetrics::new(log.clone()))),
    );

    let (server, _client) = tokio::io::duplex(64);
    let cx = context();
    let id = cx.id();
    let conn = Layer4Connection::new(cx, server).with_connection_type(ConnectionType::Packet);

    handler.handle(conn).await.unwrap();
    assert_eq!(recorded(&log), vec![Event::OpenUdp(id), Event::Association(id)]);
}

#[tokio::test]
async fn test_unclassified_connection_has_no_side_effects() {
    let log = event_log();
    let handler = provision(
        MockBuilder::new(log.clone()),
        Some(Arc::new(RecordingMetrics::new(log.clone()))),
    );

    let (server, _client) = tokio::io::duplex(64);
    let conn = Layer4Connection::new(context(), server);

    let err = handler.handle(conn).await.unwrap_err();
    assert!(matches!(err, DispatchError::UnknownConnectionType));
    assert_eq!(err.to_string(), "unknown outline connection type");
    assert!(recorded(&log).is_empty());
}

#[tokio::test]
async fn test_handler_error_is_returned_unchanged() {
    let log = event_log();
    let handler = provision(
        MockBuilder::new(log.clone()).failing_associations(),
        Some(Arc::new(RecordingMetrics::new(log.clone()))),
    );

    let (server, _client) = tokio::io::duplex(64);
    let conn = Layer4Connection::new(context(), server).with_connection_type(ConnectionType::Packet);

    let err = handler.handle(conn).await.unwrap_err();
    assert_eq!(err.to_string(), "association reset by peer");
    match err {
        DispatchError::Handler(inner) => {
            let io_err = inner.downcast_ref::<std::io::Error>().unwrap();
            assert_eq!(io_err.kind(), std::io::ErrorKind::ConnectionReset);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Exactly one invocation, no retry
    let handler_calls = recorded(&log)
        .into_iter()
        .filter(|event| matches!(event, Event::Association(_)))
        .count();
    assert_eq!(handler_calls, 1);
}

#[tokio::test]
async fn test_dispatch_without_metrics_sink() {
    let log = event_log();
    let handler = provision(MockBuilder::new(log.clone()), None);

    let (server, _client) = tokio::io::duplex(64);
    let cx = context();
    let id = cx.id();
    let conn = Layer4Connection::new(cx, server).with_connection_type(ConnectionType::Packet);

    handler.handle(conn).await.unwrap();
    assert_eq!(recorded(&log), vec![Event::Association(id)]);
}

#[tokio::test]
async fn test_concurrent_stream_and_packet_dispatch() {
    let log = event_log();
    let handler: Arc<dyn Layer4Handler> = Arc::new(provision(
        MockBuilder::new(log.clone()),
        Some(Arc::new(RecordingMetrics::new(log.clone()))),
    ));

    let (stream_server, mut stream_client) = tokio::io::duplex(64);
    let stream_cx = context();
    let stream_id = stream_cx.id();
    let stream_conn =
        Layer4Connection::new(stream_cx, stream_server).with_connection_type(ConnectionType::Stream);

    let (packet_server, _packet_client) = tokio::io::duplex(64);
    let packet_cx = context();
    let packet_id = packet_cx.id();
    let packet_conn =
        Layer4Connection::new(packet_cx, packet_server).with_connection_type(ConnectionType::Packet);

    let client = async move {
        stream_client.write_all(b"abcd").await.unwrap();
        let mut reply = [0u8; 4];
        stream_client.read_exact(&mut reply).await.unwrap();
        reply
    };

    let (stream_result, packet_result, reply) =
        tokio::join!(handler.handle(stream_conn), handler.handle(packet_conn), client);

    stream_result.unwrap();
    packet_result.unwrap();
    assert_eq!(&reply, b"abcd");

    let events = recorded(&log);
    assert_eq!(events.len(), 4);
    let position = |event: Event| events.iter().position(|e| *e == event).unwrap();
    assert!(position(Event::OpenTcp(stream_id)) < position(Event::Stream(stream_id)));
    assert!(position(Event::OpenUdp(packet_id)) < position(Event::Association(packet_id)));
}

#[tokio::test]
async fn test_stats_sink_observes_dispatch() {
    let stats = ServiceStats::new();
    let ctx = ProvisionContext::new(Arc::new(MockBuilder::new(event_log())))
        .with_metrics(Arc::new(stats.clone()));
    let config = ShadowsocksHandlerConfig::new(vec![KeyConfig::new("user-0", "aes-256-gcm", "s1")]);
    let handler = ShadowsocksHandler::new(config).provision(&ctx).unwrap();

    let (server, mut client) = tokio::io::duplex(64);
    let conn = Layer4Connection::new(context(), server).with_connection_type(ConnectionType::Stream);
    client.write_all(b"wxyz").await.unwrap();
    handler.handle(conn).await.unwrap();

    let (server, _client) = tokio::io::duplex(64);
    let conn = Layer4Connection::new(context(), server).with_connection_type(ConnectionType::Packet);
    handler.handle(conn).await.unwrap();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.tcp_opened, 1);
    assert_eq!(snapshot.tcp_active, 0);
    assert_eq!(snapshot.udp_opened, 1);
    assert_eq!(snapshot.udp_closed, 1);
    assert_eq!(snapshot.packets_from_client, 1);
    assert_eq!(stats.authentications("user-0"), 1);
}

#[tokio::test]
async fn test_cancellation_token_reaches_handler_context() {
    let log = event_log();
    let builder = MockBuilder::new(log.clone());
    let contexts = builder.contexts();
    let handler = provision(builder, None);

    let (server, _client) = tokio::io::duplex(64);
    let cx = context();
    let id = cx.id();
    let token = cx.cancellation_token().clone();
    token.cancel();
    let conn = Layer4Connection::new(cx, server).with_connection_type(ConnectionType::Packet);

    // The dispatcher imposes no policy of its own on a cancelled context
    handler.handle(conn).await.unwrap();
    assert_eq!(recorded(&log), vec![Event::Association(id)]);
    assert_eq!(*contexts.lock(), vec![(id, true)]);
}

#[tokio::test]
async fn test_live_context_reaches_stream_handler_uncancelled() {
    let log = event_log();
    let builder = MockBuilder::new(log.clone());
    let contexts = builder.contexts();
    let handler = provision(builder, None);

    let (server, mut client) = tokio::io::duplex(64);
    let cx = context();
    let id = cx.id();
    let token = cx.cancellation_token().clone();
    let conn = Layer4Connection::new(cx, server).with_connection_type(ConnectionType::Stream);

    client.write_all(b"ping").await.unwrap();
    handler.handle(conn).await.unwrap();

    assert_eq!(*contexts.lock(), vec![(id, false)]);
    assert!(!token.is_cancelled());
}
