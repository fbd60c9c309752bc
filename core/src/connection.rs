//! Ingress: owns the message boundary for one connection from
//! handshake to close. The disconnect path is owned entirely by this
//! loop's lifetime — nothing it calls into disconnects directly, they
//! only report errors upward — so a connection is torn down exactly
//! once, mirroring the teacher's single-owner `shutdown_connection`.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use game_model::{Intent, PlayerId};
use protocol::{ClientMessage, ServerMessage};
use tracing::warn;

use crate::error::ProtocolError;
use crate::intent_queue::IntentQueue;
use crate::registry::SubscriptionRegistry;
use crate::sink::OutboundSink;

/// Drives one connection's ingress loop to completion, registering it
/// on entry and disconnecting it exactly once on exit, regardless of
/// which branch ended the loop.
///
/// `messages` is transport-agnostic: the caller (the binary wiring
/// axum's WebSocket split) is responsible for turning raw frames into
/// typed [`ClientMessage`]s or a [`ProtocolError`] before they reach
/// here.
pub async fn run_connection<S>(
    registry: &SubscriptionRegistry,
    intents: &IntentQueue,
    player_id: PlayerId,
    sink: Arc<dyn OutboundSink>,
    mut messages: S,
) where
    S: Stream<Item = Result<ClientMessage, ProtocolError>> + Unpin,
{
    let connection_id = registry.register(player_id, sink.clone()).await;

    while let Some(message) = messages.next().await {
        match message {
            Ok(ClientMessage::Subscribe { zone_id }) => {
                let zone_id = game_model::ZoneId(zone_id);
                match registry.subscribe(player_id, connection_id, zone_id).await {
                    Ok(()) => {
                        let _ = sink.send(ServerMessage::Subscribed { zone_id: zone_id.0 }).await;
                    }
                    Err(err) => {
                        let _ = sink
                            .send(ServerMessage::Error {
                                message: err.to_string(),
                            })
                            .await;
                    }
                }
            }
            Ok(ClientMessage::Intent { data }) => {
                let Some(zone_id) = registry.current_zone(connection_id).await else {
                    let _ = sink
                        .send(ServerMessage::Error {
                            message: ProtocolError::InvalidTransition(
                                "intent received with no active subscription".to_string(),
                            )
                            .to_string(),
                        })
                        .await;
                    continue;
                };
                let intent = Intent {
                    player_id,
                    connection_id,
                    zone_id,
                    body: data,
                };
                intents.enqueue(intent).await;
                let _ = sink.send(ServerMessage::IntentReceived).await;
            }
            Err(err) => {
                warn!(%player_id, error = %err, "protocol error on connection, closing");
                let _ = sink
                    .send(ServerMessage::Error {
                        message: err.to_string(),
                    })
                    .await;
                break;
            }
        }
    }

    registry.disconnect(player_id, connection_id).await;
}
