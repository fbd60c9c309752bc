//! Scenario 2 (spec.md §8): two subscribers of the same zone, same
//! tick, can legitimately receive different `state.entities` once the
//! module's `get_player_state` redacts by distance.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSink, ScriptedLogic};
use game_core::{GameLogicAdapter, IntentQueue, SubscriptionRegistry, TickEngine};
use game_model::{EntityCreate, EntityDeltas, PlayerId, TickResult};
use persistence_api::InMemoryGateway;
use protocol::ServerMessage;
use serde_json::json;

#[tokio::test]
async fn subscribers_can_diverge_on_the_same_tick() {
    let gateway = InMemoryGateway::new();
    let zone = gateway
        .create_zone("arena", 10, 10, Vec::new())
        .await
        .unwrap();

    // Player 1's home is (0,0), player 2's home is (5,5). Each only
    // sees entities within distance 2 of their own home.
    let mut homes = HashMap::new();
    homes.insert(PlayerId(1), (0i32, 0i32));
    homes.insert(PlayerId(2), (5i32, 5i32));

    let logic = ScriptedLogic::identity()
        .with_on_tick(|_zone, entities, _intents, _tick| {
            if !entities.is_empty() {
                return Ok(TickResult::default());
            }
            Ok(TickResult {
                deltas: EntityDeltas {
                    creates: vec![
                        EntityCreate { x: 0, y: 0, width: 1, height: 1, metadata: Vec::new() },
                        EntityCreate { x: 5, y: 5, width: 1, height: 1, metadata: Vec::new() },
                    ],
                    updates: Vec::new(),
                    deletes: Vec::new(),
                },
                extras: json!(null),
            })
        })
        .with_get_player_state(move |_zone, player_id, base_state| {
            let (hx, hy) = homes[&player_id];
            let visible: Vec<_> = base_state
                .entities
                .iter()
                .filter(|e| (e.x - hx).abs() <= 2 && (e.y - hy).abs() <= 2)
                .cloned()
                .collect();
            Ok(json!({ "tick_number": base_state.tick_number, "entities": visible }))
        });

    let registry = Arc::new(SubscriptionRegistry::new());
    let intents = Arc::new(IntentQueue::new());
    let adapter = GameLogicAdapter::new(Arc::new(logic));
    let engine = Arc::new(TickEngine::new(
        Arc::new(gateway),
        adapter,
        registry.clone(),
        intents.clone(),
        Duration::from_millis(20),
    ));

    let sink1 = RecordingSink::new();
    let c1 = registry.register(PlayerId(1), sink1.clone()).await;
    registry.subscribe(PlayerId(1), c1, zone.id).await.unwrap();

    let sink2 = RecordingSink::new();
    let c2 = registry.register(PlayerId(2), sink2.clone()).await;
    registry.subscribe(PlayerId(2), c2, zone.id).await.unwrap();

    let engine_handle = engine.clone();
    tokio::spawn(async move { engine_handle.run().await });
    tokio::time::sleep(Duration::from_millis(80)).await;
    engine.shutdown().await;

    let state1 = first_tick_state(&sink1.sent());
    let state2 = first_tick_state(&sink2.sent());

    assert_eq!(state1["tick_number"], state2["tick_number"]);
    assert_eq!(state1["entities"].as_array().unwrap().len(), 1);
    assert_eq!(state2["entities"].as_array().unwrap().len(), 1);
    assert_eq!(state1["entities"][0]["x"], json!(0));
    assert_eq!(state2["entities"][0]["x"], json!(5));
}

fn first_tick_state(sent: &[ServerMessage]) -> serde_json::Value {
    sent.iter()
        .find_map(|m| match m {
            ServerMessage::Tick { state, .. } => Some(state.clone()),
            _ => None,
        })
        .expect("subscriber should have received a tick message")
}
