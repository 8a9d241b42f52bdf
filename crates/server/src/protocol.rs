//! Wire messages exchanged over a live match connection (JSON text frames).

use chess_core::{Color, Move};
use serde::{Deserialize, Serialize};

use crate::registry::{MatchId, MatchSnapshot};

/// Client → Server. Every command carries the caller's token.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    pub auth_token: String,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    JoinPlayer { match_id: MatchId, color: Color },
    JoinObserver { match_id: MatchId },
    MakeMove {
        match_id: MatchId,
        #[serde(rename = "move")]
        mv: Move,
    },
    Leave { match_id: MatchId },
    Resign { match_id: MatchId },
}

impl Command {
    pub fn match_id(&self) -> MatchId {
        match self {
            Command::JoinPlayer { match_id, .. }
            | Command::JoinObserver { match_id }
            | Command::MakeMove { match_id, .. }
            | Command::Leave { match_id }
            | Command::Resign { match_id } => *match_id,
        }
    }
}

/// Server → Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateSnapshot {
        #[serde(rename = "match")]
        snapshot: MatchSnapshot,
    },
    Notification {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage::Notification {
            message: message.into(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        ServerMessage::Error {
            message: format!("Error: {message}"),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn parse_command(text: &str) -> Result<CommandEnvelope, serde_json::Error> {
    serde_json::from_str(text)
}
