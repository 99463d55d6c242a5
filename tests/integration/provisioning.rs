//! Provisioning tests: registry build and handler binding

use std::sync::Arc;

use serde_json::json;

use shadowsocks_l4::config::{KeyConfig, ShadowsocksHandlerConfig};
use shadowsocks_l4::error::ConfigError;
use shadowsocks_l4::handler::{ProvisionContext, ShadowsocksHandler};
use shadowsocks_l4::metrics::ServiceStats;
use shadowsocks_l4::module::{ModuleRegistry, SHADOWSOCKS_MODULE_ID};
use shadowsocks_l4::service::DEFAULT_NAT_TIMEOUT;
use shadowsocks_l4::shadowsocks::ShadowsocksError;

use super::support::{event_log, MemoryReplayCache, MockBuilder};

fn keys(entries: &[(&str, &str, &str)]) -> ShadowsocksHandlerConfig {
    ShadowsocksHandlerConfig::new(
        entries
            .iter()
            .map(|(id, cipher, secret)| KeyConfig::new(*id, *cipher, *secret))
            .collect(),
    )
}

#[test]
fn test_duplicate_credentials_collapse_to_first() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone());

    let handler = ShadowsocksHandler::new(keys(&[
        ("a", "aes-256-gcm", "s1"),
        ("b", "aes-256-gcm", "s1"),
        ("c", "aes-256-gcm", "s2"),
    ]))
    .provision(&ctx)
    .unwrap();

    assert_eq!(handler.ciphers().ids().collect::<Vec<_>>(), vec!["a", "c"]);
    let record = builder.record().unwrap();
    assert_eq!(record.key_ids, vec!["a", "c"]);
}

#[test]
fn test_bogus_cipher_aborts_provisioning() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone());

    let err = ShadowsocksHandler::new(keys(&[("x", "bogus-cipher", "s")]))
        .provision(&ctx)
        .unwrap_err();

    match err {
        ConfigError::InvalidKey { id, source } => {
            assert_eq!(id, "x");
            assert!(matches!(source, ShadowsocksError::InvalidMethod(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(builder.builds(), 0, "no handlers may be bound after a failed build");
}

#[test]
fn test_error_message_names_the_key() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder);

    let err = ShadowsocksHandler::new(keys(&[
        ("ok", "aes-128-gcm", "s1"),
        ("broken", "2022-blake3-aes-256-gcm", "not base64!"),
    ]))
    .provision(&ctx)
    .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("failed to create encryption key for key broken"));
}

#[test]
fn test_empty_key_list_still_binds() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone());

    let handler = ShadowsocksHandler::new(ShadowsocksHandlerConfig::default())
        .provision(&ctx)
        .unwrap();

    assert!(handler.ciphers().is_empty());
    assert_eq!(builder.builds(), 1);
}

#[test]
fn test_missing_collaborators_are_not_fatal() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone());

    let handler = ShadowsocksHandler::new(keys(&[("a", "aes-256-gcm", "s1")]))
        .provision(&ctx)
        .unwrap();

    assert!(!handler.handlers().is_replay_protected());
    let record = builder.record().unwrap();
    assert!(!record.replay_cache);
    assert_eq!(record.nat_timeout, DEFAULT_NAT_TIMEOUT);
}

#[test]
fn test_collaborators_reach_the_builder() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone())
        .with_replay_cache(Arc::new(MemoryReplayCache::default()))
        .with_metrics(Arc::new(ServiceStats::new()));

    let handler = ShadowsocksHandler::new(keys(&[("a", "aes-256-gcm", "s1")]))
        .provision(&ctx)
        .unwrap();

    assert!(handler.handlers().is_replay_protected());
    assert!(builder.record().unwrap().replay_cache);
}

#[test]
fn test_module_registry_provisions_from_json() {
    let builder = Arc::new(MockBuilder::new(event_log()));
    let ctx = ProvisionContext::new(builder.clone());
    let modules = ModuleRegistry::with_defaults();

    let config = json!({
        "keys": [
            {"id": "user-0", "cipher": "chacha20-ietf-poly1305", "secret": "p0"},
            {"id": "user-1", "cipher": "2022-blake3-aes-128-gcm", "secret": "AAAAAAAAAAAAAAAAAAAAAA=="},
            {"id": "user-2", "cipher": "chacha20-ietf-poly1305", "secret": "p0"}
        ]
    });

    assert!(modules
        .instantiate(SHADOWSOCKS_MODULE_ID, config, &ctx)
        .is_ok());
    assert_eq!(builder.record().unwrap().key_ids, vec!["user-0", "user-1"]);
}

#[test]
fn test_module_registry_rejects_unknown_id() {
    let ctx = ProvisionContext::new(Arc::new(MockBuilder::new(event_log())));
    let modules = ModuleRegistry::with_defaults();

    let result = modules.instantiate("layer4.handlers.tls", json!({}), &ctx);
    assert!(matches!(result, Err(ConfigError::UnknownModule(_))));
}
