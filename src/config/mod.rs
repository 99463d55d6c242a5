//! Configuration module
//!
//! Configuration types and loading utilities. The handler's own schema is
//! [`ShadowsocksHandlerConfig`]: an ordered list of [`KeyConfig`].
//!
//! # Example
//!
//! ```no_run
//! use shadowsocks_l4::config::load_config;
//!
//! let config = load_config("/etc/shadowsocks-l4/config.json").unwrap();
//! println!("{} keys configured", config.shadowsocks.keys.len());
//! ```

mod loader;
mod types;

pub use loader::{
    create_default_config, load_config, load_config_str, load_config_with_env, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL,
};
pub use types::{Config, KeyConfig, LogConfig, ShadowsocksHandlerConfig};
