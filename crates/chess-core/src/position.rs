use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;

/// A square on the board. Rows and columns both run 1..=8, row 1 being
/// White's back rank and column 1 the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: u8,
    column: u8,
}

/// Unchecked wire form; range is enforced on conversion.
#[derive(Deserialize)]
struct RawPosition {
    row: i32,
    column: i32,
}

impl TryFrom<RawPosition> for Position {
    type Error = ChessError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.row, raw.column)
    }
}

impl Position {
    pub fn new(row: i32, column: i32) -> Result<Self, ChessError> {
        if (1..=8).contains(&row) && (1..=8).contains(&column) {
            Ok(Self {
                row: row as u8,
                column: column as u8,
            })
        } else {
            Err(ChessError::InvalidPosition { row, column })
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn column(self) -> u8 {
        self.column
    }

    /// Row-major cell index, 0 for (1,1) through 63 for (8,8).
    pub fn index(self) -> usize {
        (self.row as usize - 1) * 8 + (self.column as usize - 1)
    }

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < 64);
        Self {
            row: (index / 8) as u8 + 1,
            column: (index % 8) as u8 + 1,
        }
    }

    /// The square `(d_row, d_column)` away, or `None` if that leaves the board.
    pub fn offset(self, d_row: i8, d_column: i8) -> Option<Position> {
        let row = self.row as i32 + d_row as i32;
        let column = self.column as i32 + d_column as i32;
        Position::new(row, column).ok()
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..64).map(Position::from_index)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.column - 1) as char;
        write!(f, "{}{}", file, self.row)
    }
}
