//! WebSocket route for live matches. Each socket gets a writer task that
//! drains the connection's outbox while the read loop feeds commands to the
//! session handler one at a time.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};

use crate::session::SessionHandler;

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(sessions): Extension<Arc<SessionHandler>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, sessions))
}

async fn handle_socket(socket: WebSocket, sessions: Arc<SessionHandler>) {
    let (mut sender, mut receiver) = socket.split();
    let (mut connection, mut outbox) = sessions.connect();
    let connection_id = connection.id();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(connection = connection_id, "Failed to encode message: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };
        sessions.handle_text(&mut connection, &text).await;
    }

    // Dropping the connection closes the last outbox sender, which ends
    // the writer once it has flushed.
    sessions.disconnect(connection);
    let _ = writer.await;
}
