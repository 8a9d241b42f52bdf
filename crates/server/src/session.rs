//! Per-connection command dispatch: authenticate, resolve the match, run the
//! command against the registry and fan the result out through the fabric.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chess_core::{Color, Move, Outcome};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::error::SessionError;
use crate::fabric::{BroadcastFabric, ConnectionId, Outbox};
use crate::protocol::{parse_command, Command, CommandEnvelope, ServerMessage};
use crate::registry::{MatchId, MatchRegistry, MoveApplied};

/// One live client. Attached to at most one match at a time.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbox: Outbox,
    identity: Option<String>,
    attached: Option<MatchId>,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn attached(&self) -> Option<MatchId> {
        self.attached
    }

    fn send(&self, message: ServerMessage) {
        if self.outbox.send(message).is_err() {
            debug!(connection = self.id, "Outbox closed, dropping message");
        }
    }
}

pub struct SessionHandler {
    registry: Arc<MatchRegistry>,
    fabric: Arc<BroadcastFabric>,
    authenticator: Authenticator,
    next_connection: AtomicU64,
}

impl SessionHandler {
    pub fn new(
        registry: Arc<MatchRegistry>,
        fabric: Arc<BroadcastFabric>,
        authenticator: Authenticator,
    ) -> Self {
        Self {
            registry,
            fabric,
            authenticator,
            next_connection: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<MatchRegistry> {
        &self.registry
    }

    pub fn fabric(&self) -> &Arc<BroadcastFabric> {
        &self.fabric
    }

    /// Open a connection. The receiver yields everything addressed to it.
    pub fn connect(&self) -> (Connection, mpsc::UnboundedReceiver<ServerMessage>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let id = self.next_connection.fetch_add(1, Ordering::Relaxed);
        debug!(connection = id, "Connection opened");
        let connection = Connection {
            id,
            outbox,
            identity: None,
            attached: None,
        };
        (connection, inbox)
    }

    /// Drop the connection from broadcast membership. Seats are kept.
    pub fn disconnect(&self, connection: Connection) {
        if let Some(match_id) = connection.attached {
            self.fabric.detach(match_id, connection.id);
        }
        info!(
            connection = connection.id,
            user = connection.identity.as_deref().unwrap_or("-"),
            "Connection closed"
        );
    }

    /// Entry point for a raw text frame.
    pub async fn handle_text(&self, connection: &mut Connection, text: &str) {
        match parse_command(text) {
            Ok(envelope) => self.handle(connection, envelope).await,
            Err(e) => {
                let err = SessionError::MalformedCommand(e.to_string());
                debug!(connection = connection.id, "{err}");
                connection.send(ServerMessage::error(&err));
            }
        }
    }

    pub async fn handle(&self, connection: &mut Connection, envelope: CommandEnvelope) {
        let identity = match self.authenticator.authenticate(&envelope.auth_token) {
            Ok(identity) => identity,
            Err(e) => {
                debug!(connection = connection.id, "Rejected unauthenticated command");
                connection.send(ServerMessage::error(&e));
                return;
            }
        };
        connection.identity = Some(identity.clone());

        let match_id = envelope.command.match_id();
        let result = match envelope.command {
            Command::JoinPlayer { color, .. } => {
                self.join_player(connection, &identity, match_id, color).await
            }
            Command::JoinObserver { .. } => {
                self.join_observer(connection, &identity, match_id).await
            }
            Command::MakeMove { mv, .. } => {
                self.make_move(connection, &identity, match_id, mv).await
            }
            Command::Leave { .. } => self.leave(connection, &identity, match_id).await,
            Command::Resign { .. } => self.resign(connection, &identity, match_id).await,
        };

        if let Err(e) = result {
            debug!(match_id, user = %identity, "Command rejected: {e}");
            connection.send(ServerMessage::error(&e));
        }
    }

    async fn join_player(
        &self,
        connection: &mut Connection,
        identity: &str,
        match_id: MatchId,
        color: Color,
    ) -> Result<(), SessionError> {
        self.registry
            .attach_player_then(match_id, identity, color, |snapshot| {
                self.attach(connection, match_id);
                connection.send(ServerMessage::StateSnapshot {
                    snapshot: snapshot.clone(),
                });
                self.fabric.broadcast(
                    match_id,
                    &ServerMessage::notification(format!(
                        "{identity} joined the match as {color}"
                    )),
                    Some(connection.id),
                );
            })
            .await?;
        Ok(())
    }

    async fn join_observer(
        &self,
        connection: &mut Connection,
        identity: &str,
        match_id: MatchId,
    ) -> Result<(), SessionError> {
        self.registry
            .attach_spectator_then(match_id, identity, |snapshot| {
                self.attach(connection, match_id);
                connection.send(ServerMessage::StateSnapshot {
                    snapshot: snapshot.clone(),
                });
                self.fabric.broadcast(
                    match_id,
                    &ServerMessage::notification(format!(
                        "{identity} joined the match as an observer"
                    )),
                    Some(connection.id),
                );
            })
            .await?;
        Ok(())
    }

    async fn make_move(
        &self,
        connection: &mut Connection,
        identity: &str,
        match_id: MatchId,
        mv: Move,
    ) -> Result<(), SessionError> {
        self.registry
            .apply_move_then(match_id, identity, mv, |applied| {
                let snapshot = ServerMessage::StateSnapshot {
                    snapshot: applied.snapshot.clone(),
                };
                connection.send(snapshot.clone());
                self.fabric.broadcast(match_id, &snapshot, Some(connection.id));
                self.fabric.broadcast(
                    match_id,
                    &ServerMessage::notification(describe_move(identity, applied)),
                    Some(connection.id),
                );
            })
            .await?;
        Ok(())
    }

    async fn leave(
        &self,
        connection: &mut Connection,
        identity: &str,
        match_id: MatchId,
    ) -> Result<(), SessionError> {
        self.registry.detach(match_id, identity).await?;
        if connection.attached == Some(match_id) {
            self.fabric.detach(match_id, connection.id);
            connection.attached = None;
        }

        self.fabric.broadcast(
            match_id,
            &ServerMessage::notification(format!("{identity} has left the match")),
            Some(connection.id),
        );
        connection.send(ServerMessage::notification("You have left the match."));
        Ok(())
    }

    async fn resign(
        &self,
        connection: &mut Connection,
        identity: &str,
        match_id: MatchId,
    ) -> Result<(), SessionError> {
        let color = self.registry.resign(match_id, identity).await?;
        let winner = color.opponent();

        connection.send(ServerMessage::notification(format!(
            "You have resigned. {winner} wins."
        )));
        self.fabric.broadcast(
            match_id,
            &ServerMessage::notification(format!(
                "{identity} ({color}) has resigned. {winner} wins."
            )),
            Some(connection.id),
        );
        Ok(())
    }

    fn attach(&self, connection: &mut Connection, match_id: MatchId) {
        if let Some(previous) = connection.attached {
            if previous != match_id {
                self.fabric.detach(previous, connection.id);
            }
        }
        self.fabric
            .attach(match_id, connection.id, connection.outbox.clone());
        connection.attached = Some(match_id);
    }
}

fn describe_move(identity: &str, applied: &MoveApplied) -> String {
    let mut text = format!("{identity} ({}) moved {}", applied.mover, applied.mv);
    match applied.outcome {
        Outcome::WhiteWon | Outcome::BlackWon => {
            text.push_str(&format!(". Checkmate, {} wins.", applied.mover));
        }
        Outcome::Draw => text.push_str(". Stalemate, the match is drawn."),
        Outcome::InProgress if applied.check => {
            text.push_str(&format!(". {} is in check.", applied.mover.opponent()));
        }
        Outcome::InProgress => {}
    }
    text
}
