use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::realtime::channel::LocationUpdate;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(subject_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, subject_id, state))
}

async fn handle_socket(socket: WebSocket, subject_id: Uuid, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let subscription = state.location_channel.join(subject_id);
    let connection = subscription.id;
    state.metrics.location_listeners.inc();

    info!(
        subject = %subject_id,
        connection = connection.0,
        listeners = state.location_channel.listener_count(subject_id),
        "location socket connected"
    );

    let mut updates = ReceiverStream::new(subscription.receiver);
    let mut send_task = tokio::spawn(async move {
        while let Some(update) = updates.next().await {
            let json = match serde_json::to_string(&update) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize location update for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<LocationUpdate>(&text) {
                Ok(update) => {
                    recv_state
                        .location_channel
                        .publish(subject_id, update, Some(subject_id));
                    recv_state.metrics.location_broadcasts_total.inc();
                }
                Err(err) => {
                    warn!(subject = %subject_id, error = %err, "ignoring malformed location frame");
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.location_channel.leave(subject_id, connection);
    state.metrics.location_listeners.dec();
    info!(
        subject = %subject_id,
        connection = connection.0,
        listeners = state.location_channel.listener_count(subject_id),
        "location socket disconnected"
    );
}
