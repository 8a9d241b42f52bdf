//! Transport-neutral view of a game for storage and display layers.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::ChessError;
use crate::game::Game;
use crate::piece::{Color, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    InProgress,
    WhiteWon,
    BlackWon,
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }

    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => Outcome::WhiteWon,
            Color::Black => Outcome::BlackWon,
        }
    }
}

/// Board as 64 optional pieces in row-major order from (1,1), plus turn and
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Vec<Option<Piece>>,
    pub turn: Color,
    pub outcome: Outcome,
}

impl GameSnapshot {
    pub fn capture(game: &Game, outcome: Outcome) -> Self {
        Self {
            board: game.board().cells().to_vec(),
            turn: game.turn(),
            outcome,
        }
    }
}

impl Game {
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Result<Game, ChessError> {
        let cells: [Option<Piece>; 64] = snapshot
            .board
            .as_slice()
            .try_into()
            .map_err(|_| ChessError::MalformedSnapshot(snapshot.board.len()))?;
        Ok(Game::with_board(Board::from_cells(cells), snapshot.turn))
    }
}
