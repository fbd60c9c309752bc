//! Fixtures shared by the integration tests: a scripted `GameLogic`
//! whose `on_tick`/`get_player_state` behavior is supplied per test as
//! a closure, and an in-memory sink that records everything sent to
//! it instead of writing to a real transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use game_core::error::GameLogicError;
use game_core::game_logic::{FrameworkHandle, GameLogic};
use game_core::sink::{OutboundSink, SinkError};
use game_model::{BaseState, Entity, EntityDeltas, Intent, PlayerId, TickResult, Zone, ZoneId};
use persistence_api::{Gateway, InMemoryGateway, PersistenceError, ZoneSession};
use protocol::ServerMessage;
use serde_json::Value;

type OnTickFn =
    dyn Fn(ZoneId, &[Entity], &[Intent], u64) -> Result<TickResult, GameLogicError> + Send + Sync;
type FilterFn =
    dyn Fn(ZoneId, PlayerId, &BaseState) -> Result<Value, GameLogicError> + Send + Sync;

/// A `GameLogic` whose two hook methods are supplied as closures, so
/// each test can script exactly the module behavior it needs without a
/// new named type per scenario.
pub struct ScriptedLogic {
    on_tick: Box<OnTickFn>,
    get_player_state: Box<FilterFn>,
}

impl ScriptedLogic {
    /// An identity module: no deltas, and `get_player_state` returns
    /// `base_state` verbatim (still invoked — never skipped).
    pub fn identity() -> Self {
        Self {
            on_tick: Box::new(|_zone, _entities, _intents, _tick| Ok(TickResult::default())),
            get_player_state: Box::new(|_zone, _player, base_state| {
                serde_json::to_value(base_state).map_err(|e| GameLogicError::Failed(e.to_string()))
            }),
        }
    }

    pub fn with_on_tick(
        mut self,
        f: impl Fn(ZoneId, &[Entity], &[Intent], u64) -> Result<TickResult, GameLogicError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.on_tick = Box::new(f);
        self
    }

    pub fn with_get_player_state(
        mut self,
        f: impl Fn(ZoneId, PlayerId, &BaseState) -> Result<Value, GameLogicError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.get_player_state = Box::new(f);
        self
    }
}

#[async_trait]
impl GameLogic for ScriptedLogic {
    async fn on_init(&self, _framework: FrameworkHandle) -> Result<(), GameLogicError> {
        Ok(())
    }

    async fn on_tick(
        &self,
        zone_id: ZoneId,
        entities: &[Entity],
        intents: &[Intent],
        tick_number: u64,
    ) -> Result<TickResult, GameLogicError> {
        (self.on_tick)(zone_id, entities, intents, tick_number)
    }

    fn get_player_state(
        &self,
        zone_id: ZoneId,
        player_id: PlayerId,
        base_state: &BaseState,
    ) -> Result<Value, GameLogicError> {
        (self.get_player_state)(zone_id, player_id, base_state)
    }
}

/// A sink that records every message sent to it instead of writing to
/// a real transport, so tests can assert on exactly what a subscriber
/// would have received.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<ServerMessage>>,
    closed: Mutex<bool>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<ServerMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl OutboundSink for RecordingSink {
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

/// Wraps an [`InMemoryGateway`] and counts how many zone transactions
/// were opened, so a test can assert the tick engine never loads a
/// zone with no subscriber and no queued intent.
pub struct CountingGateway {
    inner: InMemoryGateway,
    sessions_opened: AtomicUsize,
}

impl CountingGateway {
    pub fn new(inner: InMemoryGateway) -> Self {
        Self {
            inner,
            sessions_opened: AtomicUsize::new(0),
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for CountingGateway {
    async fn begin_zone_session(
        &self,
        zone_id: ZoneId,
    ) -> Result<Box<dyn ZoneSession>, PersistenceError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_zone_session(zone_id).await
    }

    async fn create_zone(
        &self,
        name: &str,
        width: i32,
        height: i32,
        metadata: Vec<u8>,
    ) -> Result<Zone, PersistenceError> {
        self.inner.create_zone(name, width, height, metadata).await
    }
}

/// A `GameLogic` whose `on_tick` raises for a configured zone and
/// creates one entity at `(1, 1)` for every other active zone —
/// used to exercise per-zone failure isolation.
pub struct FailingZoneLogic {
    pub failing_zone: ZoneId,
}

#[async_trait]
impl GameLogic for FailingZoneLogic {
    async fn on_init(&self, _framework: FrameworkHandle) -> Result<(), GameLogicError> {
        Ok(())
    }

    async fn on_tick(
        &self,
        zone_id: ZoneId,
        _entities: &[Entity],
        _intents: &[Intent],
        _tick_number: u64,
    ) -> Result<TickResult, GameLogicError> {
        if zone_id == self.failing_zone {
            return Err(GameLogicError::Failed("scripted zone failure".to_string()));
        }
        Ok(TickResult {
            deltas: EntityDeltas {
                creates: vec![game_model::EntityCreate {
                    x: 1,
                    y: 1,
                    width: 1,
                    height: 1,
                    metadata: Vec::new(),
                }],
                updates: Vec::new(),
                deletes: Vec::new(),
            },
            extras: Value::Null,
        })
    }

    fn get_player_state(
        &self,
        _zone_id: ZoneId,
        _player_id: PlayerId,
        base_state: &BaseState,
    ) -> Result<Value, GameLogicError> {
        serde_json::to_value(base_state).map_err(|e| GameLogicError::Failed(e.to_string()))
    }
}
