//! Integration tests for shadowsocks-l4
//!
//! These tests drive the public API end to end with scripted protocol
//! handlers and in-memory `tokio::io::duplex` connections.
//!
//! # Test Organization
//!
//! - `support`: mock handler builder, recording metrics, replay cache
//! - `provisioning`: registry build, binding, module registration
//! - `dispatch`: routing of classified connections
//! - `logging`: warnings emitted while provisioning and dispatching
//! - `config_file`: configuration files through to a provisioned handler
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration_tests
//! cargo test --test integration_tests dispatch
//! ```

pub mod dispatch;
pub mod provisioning;
pub mod support;
