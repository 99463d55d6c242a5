//! shadowsocks-l4: multi-user Shadowsocks handler for a layer-4 router
//!
//! This crate turns a list of access keys into a deduplicated cipher registry,
//! binds protocol handlers to it, and routes classified inbound connections
//! to those handlers.
//!
//! # Architecture
//!
//! ```text
//! keys → CipherRegistry → bind(HandlerBuilder) → ProvisionedShadowsocksHandler
//!                                                      ↓
//!                               Layer4Connection (Stream | Packet)
//!                                                      ↓
//!                                   open metrics tracker → handler
//! ```
//!
//! The Shadowsocks framing is supplied by the host through
//! [`service::HandlerBuilder`]; replay protection and metrics are optional
//! collaborators.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shadowsocks_l4::config::load_config;
//! use shadowsocks_l4::handler::{ProvisionContext, ShadowsocksHandler};
//! use shadowsocks_l4::metrics::ServiceStats;
//! use shadowsocks_l4::service::HandlerBuilder;
//!
//! # fn example(builder: Arc<dyn HandlerBuilder>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("/etc/shadowsocks-l4/config.json")?;
//! let stats = ServiceStats::new();
//! let ctx = ProvisionContext::new(builder).with_metrics(Arc::new(stats.clone()));
//!
//! let handler = ShadowsocksHandler::new(config.shadowsocks).provision(&ctx)?;
//! println!("{} keys loaded", handler.ciphers().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`cipher`]: Cipher registry
//! - [`config`]: Configuration types and loading
//! - [`connection`]: Inbound connection and execution context
//! - [`error`]: Error types
//! - [`handler`]: Provisioning and connection dispatch
//! - [`metrics`]: Metrics sinks
//! - [`module`]: Handler module registration
//! - [`service`]: Protocol handler traits and binding
//! - [`shadowsocks`]: Cipher methods and key derivation

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cipher;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod module;
pub mod service;
pub mod shadowsocks;

// Re-export commonly used types at the crate root
pub use cipher::{CipherEntry, CipherIdentity, CipherRegistry};
pub use config::{Config, KeyConfig, ShadowsocksHandlerConfig};
pub use connection::{ConnectionContext, ConnectionType, Layer4Connection};
pub use error::{ConfigError, DispatchError, Error, HandlerError};
pub use handler::{Layer4Handler, ProvisionContext, ProvisionedShadowsocksHandler, ShadowsocksHandler};
pub use metrics::{NoopMetrics, ServiceMetrics, ServiceStats};
pub use module::{ModuleRegistry, SHADOWSOCKS_MODULE_ID};
pub use service::{AssociationHandler, HandlerBuilder, ReplayCache, StreamHandler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
