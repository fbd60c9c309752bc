//! For each of a zone's subscribers, filters the tick's base state
//! through the game-logic module and emits it. One subscriber's
//! failure — a module panic in the filter, or a send error — never
//! blocks or drops another's. A lone filter failure only skips that
//! tick's emission; only a run of consecutive failures disconnects the
//! subscriber. A failed send disconnects immediately.

use game_model::{BaseState, ZoneId};
use tracing::warn;

use crate::adapter::GameLogicAdapter;
use crate::registry::SubscriptionRegistry;
use protocol::ServerMessage;

/// Filters and emits `base_state` to every current subscriber of
/// `zone_id`. A subscriber whose filter fails repeatedly, or whose send
/// fails outright, is disconnected through the registry (gated on
/// connection id, so a reconnect racing this fanout is never torn down
/// by mistake).
pub async fn fanout(
    zone_id: ZoneId,
    registry: &SubscriptionRegistry,
    adapter: &GameLogicAdapter,
    base_state: &BaseState,
) {
    let subscribers = registry.subscribers_of(zone_id).await;
    let emissions = subscribers.into_iter().map(|(player_id, connection_id, sink)| {
        let adapter = adapter.clone();
        let base_state = base_state.clone();
        async move {
            let filtered = match adapter.get_player_state(zone_id, player_id, &base_state) {
                Ok(value) => {
                    registry.clear_filter_failure(zone_id, player_id).await;
                    value
                }
                Err(err) => {
                    let past_threshold = registry.record_filter_failure(zone_id, player_id).await;
                    if past_threshold {
                        warn!(%zone_id, %player_id, error = %err, "get_player_state failed repeatedly, disconnecting subscriber");
                        return Some((player_id, connection_id));
                    }
                    warn!(%zone_id, %player_id, error = %err, "get_player_state failed, skipping subscriber this tick");
                    return None;
                }
            };
            let message = ServerMessage::Tick {
                tick_number: base_state.tick_number,
                state: filtered,
            };
            if let Err(err) = sink.send(message).await {
                warn!(%zone_id, %player_id, error = %err, "tick emission failed, disconnecting subscriber");
                return Some((player_id, connection_id));
            }
            None
        }
    });

    let failures: Vec<_> = futures_util::future::join_all(emissions)
        .await
        .into_iter()
        .flatten()
        .collect();

    for (player_id, connection_id) in failures {
        registry.disconnect(player_id, connection_id).await;
    }
}
