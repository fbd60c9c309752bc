//! The only component that calls into the game-logic module.
//!
//! Isolates module failures so that a panicking or erroring `on_tick`
//! aborts only its own zone, and a panicking or erroring
//! `get_player_state` aborts only its own subscriber's emission.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use game_model::{BaseState, Entity, Intent, PlayerId, TickResult, ZoneId};
use serde_json::Value;

use crate::error::GameLogicError;
use crate::game_logic::{FrameworkHandle, GameLogic};

/// Wraps a loaded [`GameLogic`] module and isolates its failures.
#[derive(Clone)]
pub struct GameLogicAdapter {
    module: Arc<dyn GameLogic>,
}

impl GameLogicAdapter {
    /// Wraps a module for exclusive use by the tick pipeline.
    pub fn new(module: Arc<dyn GameLogic>) -> Self {
        Self { module }
    }

    /// Runs the module's one-time setup.
    pub async fn init(&self, framework: FrameworkHandle) -> Result<(), GameLogicError> {
        self.module.on_init(framework).await
    }

    /// Resolves one zone's tick. A panic inside the module surfaces as
    /// [`GameLogicError::Panicked`] rather than taking down the tick
    /// engine's task.
    pub async fn on_tick(
        &self,
        zone_id: ZoneId,
        entities: &[Entity],
        intents: &[Intent],
        tick_number: u64,
    ) -> Result<TickResult, GameLogicError> {
        let module = self.module.clone();
        let entities = entities.to_vec();
        let intents = intents.to_vec();
        match tokio::spawn(
            async move { module.on_tick(zone_id, &entities, &intents, tick_number).await },
        )
        .await
        {
            Ok(result) => result,
            Err(join_err) => Err(GameLogicError::Panicked(join_err.to_string())),
        }
    }

    /// Filters `base_state` for one subscriber. A panic inside the module
    /// surfaces as [`GameLogicError::Panicked`] and only skips this
    /// subscriber's emission, never the others'.
    pub fn get_player_state(
        &self,
        zone_id: ZoneId,
        player_id: PlayerId,
        base_state: &BaseState,
    ) -> Result<Value, GameLogicError> {
        // get_player_state is synchronous and module-supplied; a panic
        // here must not take the broadcast fanout task down with it.
        let module = &self.module;
        match panic::catch_unwind(AssertUnwindSafe(|| {
            module.get_player_state(zone_id, player_id, base_state)
        })) {
            Ok(result) => result,
            Err(payload) => Err(GameLogicError::Panicked(panic_message(payload))),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
