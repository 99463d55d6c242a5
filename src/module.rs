//! Handler module registration
//!
//! The host looks up layer-4 handlers by a stable module id and builds them
//! from their JSON configuration. The table is explicit: it is populated by
//! [`ModuleRegistry::with_defaults`] or by [`ModuleRegistry::register`] at
//! startup, never by a side effect of linking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ShadowsocksHandlerConfig;
use crate::error::ConfigError;
use crate::handler::{Layer4Handler, ProvisionContext, ShadowsocksHandler};

/// Module id of the Shadowsocks handler
pub const SHADOWSOCKS_MODULE_ID: &str = "layer4.handlers.shadowsocks";

/// Builds a provisioned handler from its JSON configuration
pub type ModuleConstructor =
    fn(serde_json::Value, &ProvisionContext) -> Result<Arc<dyn Layer4Handler>, ConfigError>;

/// Table of handler constructors by module id
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    constructors: HashMap<String, ModuleConstructor>,
}

impl ModuleRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the Shadowsocks handler registered
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SHADOWSOCKS_MODULE_ID, new_shadowsocks_handler);
        registry
    }

    /// Register a constructor, returning the one it replaces
    pub fn register(
        &mut self,
        id: impl Into<String>,
        constructor: ModuleConstructor,
    ) -> Option<ModuleConstructor> {
        self.constructors.insert(id.into(), constructor)
    }

    /// Check if a module id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered module ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build and provision the handler registered under `id`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownModule` for an unregistered id, or the
    /// constructor's own error.
    pub fn instantiate(
        &self,
        id: &str,
        config: serde_json::Value,
        ctx: &ProvisionContext,
    ) -> Result<Arc<dyn Layer4Handler>, ConfigError> {
        let constructor = self
            .constructors
            .get(id)
            .ok_or_else(|| ConfigError::UnknownModule(id.to_string()))?;
        debug!(module = id, "Instantiating handler module");
        constructor(config, ctx)
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.ids())
            .finish()
    }
}

fn new_shadowsocks_handler(
    config: serde_json::Value,
    ctx: &ProvisionContext,
) -> Result<Arc<dyn Layer4Handler>, ConfigError> {
    let config: ShadowsocksHandlerConfig =
        serde_json::from_value(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    let handler = ShadowsocksHandler::new(config).provision(ctx)?;
    Ok(Arc::new(handler))
}
