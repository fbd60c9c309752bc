//! Resolves the configured `game_module` identifier to a loaded
//! [`GameLogic`] implementation. A compile-time registry keyed by
//! string id — no dynamic loading, matching spec §9's "interface
//! abstraction resolved by a registry keyed by a configured identifier,
//! no dynamic patching, no inheritance required."

use std::collections::HashMap;
use std::sync::Arc;

use crate::game_logic::GameLogic;

/// Maps game-module identifiers to their loaded implementation.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn GameLogic>>,
}

impl ModuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` under `id`, replacing any prior registration.
    pub fn register(&mut self, id: impl Into<String>, module: Arc<dyn GameLogic>) {
        self.modules.insert(id.into(), module);
    }

    /// Resolves `id` to its registered module, if any.
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn GameLogic>> {
        self.modules.get(id).cloned()
    }
}
