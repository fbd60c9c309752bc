//! Pause/resume/step semantics (SPEC_FULL.md §9): while paused the
//! cadence loop must not process any zone at all, and intents
//! accumulated during the pause are drained in a single batch on the
//! next processed tick — not smoothed out across several.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSink, ScriptedLogic};
use game_core::{GameLogicAdapter, IntentQueue, SubscriptionRegistry, TickEngine};
use game_model::{EntityCreate, EntityDeltas, Intent, PlayerId, TickResult};
use persistence_api::InMemoryGateway;
use protocol::ServerMessage;
use serde_json::json;

#[tokio::test]
async fn paused_engine_neither_ticks_nor_drops_queued_intents() {
    let gateway = InMemoryGateway::new();
    let zone = gateway
        .create_zone("arena", 10, 10, Vec::new())
        .await
        .unwrap();

    let batch_sizes_seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let on_tick_calls = Arc::new(AtomicUsize::new(0));

    let batch_sizes_for_closure = batch_sizes_seen.clone();
    let calls_for_closure = on_tick_calls.clone();
    let logic = ScriptedLogic::identity().with_on_tick(move |_zone, _entities, intents, _tick| {
        calls_for_closure.fetch_add(1, Ordering::SeqCst);
        batch_sizes_for_closure.lock().unwrap().push(intents.len());
        let creates = intents
            .iter()
            .enumerate()
            .map(|(i, _)| EntityCreate {
                x: i as i32,
                y: 0,
                width: 1,
                height: 1,
                metadata: Vec::new(),
            })
            .collect();
        Ok(TickResult {
            deltas: EntityDeltas {
                creates,
                updates: Vec::new(),
                deletes: Vec::new(),
            },
            extras: json!(null),
        })
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

    let sink = RecordingSink::new();
    let connection_id = registry.register(PlayerId(1), sink.clone()).await;
    registry
        .subscribe(PlayerId(1), connection_id, zone.id)
        .await
        .unwrap();

    engine.pause().await;

    for i in 0..5 {
        intents
            .enqueue(Intent {
                player_id: PlayerId(1),
                connection_id,
                zone_id: zone.id,
                body: json!({ "seq": i }),
            })
            .await;
    }

    let engine_handle = engine.clone();
    let run_handle = tokio::spawn(async move { engine_handle.run().await });

    // Give the paused loop several cadence periods to (not) do anything.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(
        on_tick_calls.load(Ordering::SeqCst),
        0,
        "a paused engine must not invoke on_tick at all"
    );
    assert!(
        sink.sent().is_empty(),
        "a paused engine must not broadcast anything"
    );

    // A single step must process every queued intent as one batch.
    engine.step().await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(
        on_tick_calls.load(Ordering::SeqCst),
        1,
        "step must run the pipeline exactly once"
    );
    assert_eq!(
        batch_sizes_seen.lock().unwrap().as_slice(),
        &[5],
        "all five queued intents must be drained together, not smoothed across ticks"
    );

    let tick_message = sink
        .sent()
        .iter()
        .find_map(|m| match m {
            ServerMessage::Tick { state, .. } => Some(state.clone()),
            _ => None,
        })
        .expect("the stepped tick should have been broadcast");
    assert_eq!(tick_message["entities"].as_array().unwrap().len(), 5);

    engine.resume().await;
    engine.shutdown().await;
    run_handle.await.unwrap();
}
