use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_core::{ChessError, Color};
use serde_json::json;

use crate::registry::MatchId;

/// Errors raised while handling a live session command. Every variant is
/// reported privately to the offending connection and never changes match
/// state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("wrong turn")]
    WrongTurn,

    #[error("match {0} does not exist")]
    MatchNotFound(MatchId),

    #[error("color {0} already taken")]
    ColorAlreadyTaken(Color),

    #[error("not a participant in this match")]
    NotAParticipant,

    #[error("match is already decided")]
    MatchAlreadyDecided,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("malformed command: {0}")]
    MalformedCommand(String),
}

impl From<ChessError> for SessionError {
    fn from(e: ChessError) -> Self {
        match e {
            ChessError::InvalidMove(reason) => SessionError::InvalidMove(reason),
            other => SessionError::InvalidMove(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MatchNotFound(_) => AppError::NotFound(e.to_string()),
            SessionError::Unauthenticated => AppError::Unauthorized,
            other => AppError::BadRequest(other.to_string()),
        }
    }
}
