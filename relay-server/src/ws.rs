//! The push-channel WebSocket endpoint: upgrades the connection, runs
//! the handshake through the external `Authenticator`, then hands the
//! split socket to `game_core::run_connection` — mirroring the
//! teacher's upgrade/split/spawn shape in `main.rs::websocket`, minus
//! the room-relay logic that shape used to carry.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::{SplitSink, Stream};
use futures_util::{SinkExt, StreamExt};
use game_core::error::ProtocolError;
use game_core::sink::{OutboundSink, SinkError};
use protocol::{ClientMessage, ServerMessage};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app_state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    // First frame is the handshake: opaque credentials, authenticated
    // through the external boundary before anything else runs.
    let Some(Ok(Message::Text(credentials))) = receiver.next().await else {
        warn!("websocket closed before handshake credentials arrived");
        return;
    };
    let player_id = match state.authenticator.authenticate(credentials.as_bytes()).await {
        Ok(id) => id,
        Err(err) => {
            warn!(error = %err, "handshake authentication failed");
            let mut sender = sender.lock().await;
            let _ = sender
                .send(Message::Text(
                    serde_json::to_string(&ServerMessage::Error {
                        message: "authentication failed".to_string(),
                    })
                    .unwrap()
                    .into(),
                ))
                .await;
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    info!(%player_id, "connection authenticated");

    if state.max_connections > 0
        && state.registry.connection_count().await >= state.max_connections
    {
        warn!(%player_id, max_connections = state.max_connections, "connection cap reached, rejecting");
        let mut sender = sender.lock().await;
        let _ = sender
            .send(Message::Text(
                serde_json::to_string(&ServerMessage::Error {
                    message: "server is at its connection limit".to_string(),
                })
                .unwrap()
                .into(),
            ))
            .await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    let sink: Arc<dyn OutboundSink> = Arc::new(AxumSink {
        sender: sender.clone(),
    });
    let messages = ClientMessageStream { receiver };

    game_core::run_connection(&state.registry, &state.intents, player_id, sink, messages).await;

    let mut sender = sender.lock().await;
    let _ = sender.send(Message::Close(None)).await;
}

/// Adapts a split axum `WebSocket` receiver into the typed,
/// already-classified message stream `run_connection` expects. Parse
/// failures surface as `ProtocolError::Unparseable` rather than
/// panicking or silently dropping the frame.
struct ClientMessageStream {
    receiver: futures_util::stream::SplitStream<WebSocket>,
}

impl Stream for ClientMessageStream {
    type Item = Result<ClientMessage, ProtocolError>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;
        let this = self.get_mut();
        loop {
            return match futures_util::Stream::poll_next(
                std::pin::Pin::new(&mut this.receiver),
                cx,
            ) {
                Poll::Ready(Some(Ok(Message::Text(text)))) => {
                    Poll::Ready(Some(serde_json::from_str::<ClientMessage>(&text).map_err(
                        |e| ProtocolError::Unparseable(e.to_string()),
                    )))
                }
                Poll::Ready(Some(Ok(Message::Close(_)))) | Poll::Ready(None) => Poll::Ready(None),
                Poll::Ready(Some(Ok(_))) => continue, // Ping/pong/binary: ignored, not an error.
                Poll::Ready(Some(Err(err))) => {
                    Poll::Ready(Some(Err(ProtocolError::Unparseable(err.to_string()))))
                }
                Poll::Pending => Poll::Pending,
            };
        }
    }
}

/// The outbound half of a connection's websocket, bounded by a write
/// timeout so one slow subscriber can't stall the broadcast fanout
/// beyond the contracted window.
struct AxumSink {
    sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
}

const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[async_trait]
impl OutboundSink for AxumSink {
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError> {
        let text = serde_json::to_string(&message)
            .map_err(|e| SinkError(format!("failed to encode message: {e}")))?;
        let mut sender = self.sender.lock().await;
        tokio::time::timeout(SEND_TIMEOUT, sender.send(Message::Text(text.into())))
            .await
            .map_err(|_| SinkError("send timed out".to_string()))?
            .map_err(|e| SinkError(e.to_string()))
    }

    async fn close(&self) {
        let mut sender = self.sender.lock().await;
        let _ = sender.send(Message::Close(None)).await;
    }
}
