use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::sink::{ChannelSink, OutFrame};
use crate::state::GatewayState;

/// `PingInterval`: the client is expected to send a
/// heartbeat at least this often.
pub const PING_INTERVAL: Duration = Duration::from_secs(10);
/// `PingWait`: extra grace period tacked onto `PingInterval` before the
/// gateway gives up on a silent connection.
pub const PING_WAIT: Duration = Duration::from_secs(10);
const HEARTBEAT_TEXT: &str = "heartbeat";

/// `GET /ws/{user_id}` — upgrades an already-authenticated HTTP session to a
/// websocket. Authentication itself is out of this core's scope; callers
/// are expected to have validated the session before routing here (e.g. a
/// session-cache lookup middleware backed by
/// `chatcore-presence::SessionCache`).
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

async fn handle_socket(socket: WebSocket, user_id: String, state: GatewayState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<OutFrame>(256);

    let sink = Arc::new(ChannelSink::new(tx.clone()));
    let pid = match state.hub.create_user(user_id.clone(), sink).await {
        Ok(pid) => pid,
        Err(err) => {
            tracing::error!(user_id = %user_id, error = %err, "failed to spawn user actor for websocket upgrade");
            return;
        }
    };
    state.registry.insert(user_id.clone(), pid.clone());
    tracing::info!(user_id = %user_id, pid = %pid, "websocket connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = match frame {
                OutFrame::Envelope(bytes) => Message::Binary(bytes.into()),
                OutFrame::HeartbeatEcho => Message::Text(HEARTBEAT_TEXT.to_string().into()),
            };
            if ws_sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let read_deadline = PING_INTERVAL + PING_WAIT;
    loop {
        match tokio::time::timeout(read_deadline, ws_stream.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                if text.as_str() == HEARTBEAT_TEXT && tx.send(OutFrame::HeartbeatEcho).await.is_err() {
                    break;
                }
                // Any other inbound text frame is ignored: the
                // client-to-server control plane is HTTP.
            }
            Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Ok(_))) => {
                // Binary/ping/pong frames carry no inbound protocol here.
            }
            Ok(Some(Err(err))) => {
                tracing::warn!(user_id = %user_id, error = %err, "websocket read error");
                break;
            }
            Ok(None) => break,
            Err(_elapsed) => {
                tracing::info!(user_id = %user_id, "no heartbeat within deadline, closing connection");
                break;
            }
        }
    }

    writer.abort();
    state.registry.remove(&user_id);
    state.hub.kill_actor(&pid).await;
    tracing::info!(user_id = %user_id, "websocket disconnected");
}
