//! spec.md §7.4 / SPEC_FULL.md: a `get_player_state` failure skips only
//! that tick's emission for the offending subscriber; only a run of
//! consecutive failures marks the subscriber for disconnect. A single
//! bad tick must never disconnect anyone, and an unrelated subscriber
//! is never affected either way.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSink, ScriptedLogic};
use game_core::error::GameLogicError;
use game_core::{GameLogicAdapter, IntentQueue, SubscriptionRegistry, TickEngine};
use game_model::PlayerId;
use persistence_api::InMemoryGateway;

#[tokio::test]
async fn only_repeated_filter_failures_disconnect_the_subscriber() {
    let gateway = InMemoryGateway::new();
    let zone = gateway
        .create_zone("arena", 10, 10, Vec::new())
        .await
        .unwrap();

    let failing_player = PlayerId(1);
    let healthy_player = PlayerId(2);

    let logic = ScriptedLogic::identity().with_get_player_state(move |_zone, player_id, base_state| {
        if player_id == failing_player {
            Err(GameLogicError::Failed("scripted filter failure".to_string()))
        } else {
            Ok(serde_json::to_value(base_state).unwrap())
        }
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

    let failing_sink = RecordingSink::new();
    let failing_connection = registry.register(failing_player, failing_sink.clone()).await;
    registry
        .subscribe(failing_player, failing_connection, zone.id)
        .await
        .unwrap();

    let healthy_sink = RecordingSink::new();
    let healthy_connection = registry.register(healthy_player, healthy_sink.clone()).await;
    registry
        .subscribe(healthy_player, healthy_connection, zone.id)
        .await
        .unwrap();

    engine.pause().await;
    let engine_handle = engine.clone();
    let run_handle = tokio::spawn(async move { engine_handle.run().await });

    // One failing tick must not disconnect the subscriber.
    engine.step().await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(
        !failing_sink.is_closed(),
        "a lone get_player_state failure must not disconnect the subscriber"
    );
    assert!(!healthy_sink.is_closed());
    assert!(!healthy_sink.sent().is_empty(), "the unaffected subscriber must still receive ticks");

    // A second consecutive failure still must not cross the threshold.
    engine.step().await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(
        !failing_sink.is_closed(),
        "two consecutive failures must still not disconnect the subscriber"
    );

    // The third consecutive failure crosses the threshold.
    engine.step().await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(
        failing_sink.is_closed(),
        "repeated consecutive get_player_state failures must eventually disconnect the subscriber"
    );
    assert!(
        !healthy_sink.is_closed(),
        "the other subscriber's session must be unaffected by the first one's failures"
    );

    engine.shutdown().await;
    run_handle.await.unwrap();
}

#[tokio::test]
async fn a_success_in_between_resets_the_consecutive_failure_count() {
    let gateway = InMemoryGateway::new();
    let zone = gateway
        .create_zone("arena", 10, 10, Vec::new())
        .await
        .unwrap();

    let player_id = PlayerId(1);
    let call_count = Arc::new(AtomicUsize::new(0));
    let calls_for_closure = call_count.clone();

    // Fails on the first two ticks, succeeds on the third, fails again
    // after that — never two consecutive failures in a row past a
    // success, so the subscriber must never be disconnected.
    let logic = ScriptedLogic::identity().with_get_player_state(move |_zone, _player_id, base_state| {
        let call = calls_for_closure.fetch_add(1, Ordering::SeqCst);
        if call == 2 {
            Ok(serde_json::to_value(base_state).unwrap())
        } else {
            Err(GameLogicError::Failed("scripted filter failure".to_string()))
        }
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
    let connection_id = registry.register(player_id, sink.clone()).await;
    registry.subscribe(player_id, connection_id, zone.id).await.unwrap();

    engine.pause().await;
    let engine_handle = engine.clone();
    let run_handle = tokio::spawn(async move { engine_handle.run().await });

    for _ in 0..4 {
        engine.step().await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(
            !sink.is_closed(),
            "an intervening success must reset the consecutive failure count"
        );
    }

    engine.shutdown().await;
    run_handle.await.unwrap();
}
