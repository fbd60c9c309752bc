//! Drives `TicTacToeLogic` through the real tick engine and an
//! `InMemoryGateway`, rather than calling `on_tick` directly, to check
//! the module's rules survive the framework's transactional pipeline
//! (zone bounds, same-tick visibility of a just-placed mark) and not
//! just its own logic in isolation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use game_core::sink::{OutboundSink, SinkError};
use game_core::{GameLogicAdapter, IntentQueue, SubscriptionRegistry, TickEngine};
use game_model::{ConnectionId, Intent, PlayerId};
use persistence_api::InMemoryGateway;
use protocol::ServerMessage;
use serde_json::json;
use tic_tac_toe::TicTacToeLogic;
use tokio::sync::Mutex;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<ServerMessage>>,
}

#[async_trait]
impl OutboundSink for RecordingSink {
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError> {
        self.sent.lock().await.push(message);
        Ok(())
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn a_placed_mark_is_visible_in_the_same_tick_it_lands() {
    let gateway = InMemoryGateway::new();
    let zone = gateway
        .create_zone("board", 3, 3, Vec::new())
        .await
        .unwrap();

    let registry = Arc::new(SubscriptionRegistry::new());
    let intents = Arc::new(IntentQueue::new());
    let adapter = GameLogicAdapter::new(Arc::new(TicTacToeLogic::new()));
    let engine = Arc::new(TickEngine::new(
        Arc::new(gateway),
        adapter,
        registry.clone(),
        intents.clone(),
        Duration::from_millis(20),
    ));

    let sink = Arc::new(RecordingSink::default());
    let connection_id = registry.register(PlayerId(1), sink.clone()).await;
    registry
        .subscribe(PlayerId(1), connection_id, zone.id)
        .await
        .unwrap();

    intents
        .enqueue(Intent {
            player_id: PlayerId(1),
            connection_id,
            zone_id: zone.id,
            body: json!({ "x": 1, "y": 1 }),
        })
        .await;

    let engine_handle = engine.clone();
    tokio::spawn(async move { engine_handle.run().await });
    tokio::time::sleep(Duration::from_millis(80)).await;
    engine.shutdown().await;

    let state = sink
        .sent
        .lock()
        .await
        .iter()
        .find_map(|m| match m {
            ServerMessage::Tick { state, .. } => Some(state.clone()),
            _ => None,
        })
        .expect("subscriber should have received a tick");

    let entities = state["entities"].as_array().unwrap();
    assert!(entities
        .iter()
        .any(|e| e["x"] == json!(1) && e["y"] == json!(1) && e["metadata"] == json!([0])));
}
