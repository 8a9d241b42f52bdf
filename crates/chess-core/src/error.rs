use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Position ({row}, {column}) is off the board")]
    InvalidPosition { row: i32, column: i32 },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Snapshot board must have 64 cells, got {0}")]
    MalformedSnapshot(usize),
}
