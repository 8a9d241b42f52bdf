#![allow(dead_code)]

use std::sync::Arc;

use chess_server::auth::{jwt, Authenticator};
use chess_server::fabric::BroadcastFabric;
use chess_server::protocol::ServerMessage;
use chess_server::registry::{MatchId, MatchRegistry};
use chess_server::session::{Connection, SessionHandler};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

pub const SECRET: &str = "integration-test-secret";

pub fn token(username: &str) -> String {
    jwt::create_token(username, SECRET, 1).unwrap()
}

/// Fresh in-memory handler with its own registry and fabric.
pub fn sessions() -> SessionHandler {
    SessionHandler::new(
        Arc::new(MatchRegistry::in_memory()),
        Arc::new(BroadcastFabric::new()),
        Authenticator::new(SECRET),
    )
}

/// One simulated socket: a connection plus everything delivered to it.
pub struct TestClient {
    pub connection: Connection,
    inbox: UnboundedReceiver<ServerMessage>,
    token: String,
}

impl TestClient {
    pub fn connect(sessions: &SessionHandler, username: &str) -> Self {
        let (connection, inbox) = sessions.connect();
        Self {
            connection,
            inbox,
            token: token(username),
        }
    }

    /// Send a command frame; `auth_token` is filled in.
    pub async fn send(&mut self, sessions: &SessionHandler, mut frame: Value) {
        frame["auth_token"] = json!(self.token);
        sessions
            .handle_text(&mut self.connection, &frame.to_string())
            .await;
    }

    pub async fn join(&mut self, sessions: &SessionHandler, match_id: MatchId, color: &str) {
        self.send(
            sessions,
            json!({"type": "join_player", "match_id": match_id, "color": color}),
        )
        .await;
    }

    pub async fn observe(&mut self, sessions: &SessionHandler, match_id: MatchId) {
        self.send(sessions, json!({"type": "join_observer", "match_id": match_id}))
            .await;
    }

    /// Squares as (row, column).
    pub async fn play(
        &mut self,
        sessions: &SessionHandler,
        match_id: MatchId,
        from: (u8, u8),
        to: (u8, u8),
    ) {
        self.send(
            sessions,
            json!({
                "type": "make_move",
                "match_id": match_id,
                "move": {
                    "start": {"row": from.0, "column": from.1},
                    "end": {"row": to.0, "column": to.1},
                },
            }),
        )
        .await;
    }

    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(m) = self.inbox.try_recv() {
            messages.push(m);
        }
        messages
    }
}

pub fn is_snapshot(message: &ServerMessage) -> bool {
    matches!(message, ServerMessage::StateSnapshot { .. })
}

pub fn notification_text(message: &ServerMessage) -> Option<&str> {
    match message {
        ServerMessage::Notification { message } => Some(message),
        _ => None,
    }
}

pub fn error_text(message: &ServerMessage) -> Option<&str> {
    match message {
        ServerMessage::Error { message } => Some(message),
        _ => None,
    }
}
