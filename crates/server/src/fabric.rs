//! Fan-out of server messages to every connection attached to a match.
//!
//! Membership lives in a concurrent map and is independent of the match
//! lock. Sends go through unbounded channels and never block; a
//! connection whose channel is closed is pruned on the next delivery.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::ServerMessage;
use crate::registry::MatchId;

pub type ConnectionId = u64;
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Default)]
pub struct BroadcastFabric {
    members: DashMap<MatchId, HashMap<ConnectionId, Outbox>>,
}

impl BroadcastFabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, match_id: MatchId, connection: ConnectionId, outbox: Outbox) {
        self.members
            .entry(match_id)
            .or_default()
            .insert(connection, outbox);
    }

    pub fn detach(&self, match_id: MatchId, connection: ConnectionId) {
        if let Some(mut set) = self.members.get_mut(&match_id) {
            set.remove(&connection);
        }
        self.members.remove_if(&match_id, |_, set| set.is_empty());
    }

    pub fn members(&self, match_id: MatchId) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self
            .members
            .get(&match_id)
            .map(|set| set.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Deliver `message` to every member of the match except `except`.
    /// Returns how many connections it reached.
    pub fn broadcast(
        &self,
        match_id: MatchId,
        message: &ServerMessage,
        except: Option<ConnectionId>,
    ) -> usize {
        let recipients: Vec<(ConnectionId, Outbox)> = self
            .members
            .get(&match_id)
            .map(|set| {
                set.iter()
                    .filter(|(id, _)| Some(**id) != except)
                    .map(|(id, outbox)| (*id, outbox.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, outbox) in recipients {
            if outbox.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in dead {
            debug!(match_id, connection = id, "Pruning closed connection");
            self.detach(match_id, id);
        }
        delivered
    }
}
