//! WebSocket stream endpoint for live dashboards.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use telemetry::{ConnectionId, TelemetryEvent, MONITOR_ROOM};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::server::AppState;

/// `GET /livestock-health-stream`
pub async fn stream_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one dashboard connection for its whole lifetime.
///
/// The connection joins the monitoring room before anything else, and
/// leaves it on every exit path; the monitor's idle-tick optimization
/// depends on that membership being accurate. Joining also lazily starts
/// the monitor loop, which is idempotent.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection: ConnectionId = Uuid::new_v4();
    let mut events = state.broadcaster.join(MONITOR_ROOM, connection);
    state.monitor.ensure_started();
    info!(%connection, "dashboard connection joined");

    let (mut sink, mut stream) = socket.split();

    let greeting = TelemetryEvent::Connected {
        room: MONITOR_ROOM.to_string(),
    };
    if send_event(&mut sink, &greeting).await.is_err() {
        state.broadcaster.leave(MONITOR_ROOM, connection);
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%connection, skipped, "slow dashboard connection, frames dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    // Clients only ever speak to keep the connection alive.
                    if text.as_str() == "ping"
                        && sink.send(Message::Text("pong".into())).await.is_err()
                    {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(%connection, error = %err, "websocket receive error");
                    break;
                }
            },
        }
    }

    state.broadcaster.leave(MONITOR_ROOM, connection);
    info!(%connection, "dashboard connection left");
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &TelemetryEvent,
) -> Result<(), ()> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            error!(error = %err, "failed to serialize telemetry event");
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await.map_err(|err| {
        debug!(error = %err, "websocket send failed");
    })
}
