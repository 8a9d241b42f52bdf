use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    pub fn pawn_start_row(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// The opponent's back rank, where this color's pawns promote.
    pub fn promotion_row(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("WHITE"),
            Color::Black => f.write_str("BLACK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

/// What a pawn may become on the back rank. Kept separate from
/// [`PieceKind`] so a pawn or king promotion cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionKind {
    pub const ALL: [PromotionKind; 4] = [
        PromotionKind::Queen,
        PromotionKind::Rook,
        PromotionKind::Bishop,
        PromotionKind::Knight,
    ];

    pub fn letter(self) -> char {
        match self {
            PromotionKind::Queen => 'Q',
            PromotionKind::Rook => 'R',
            PromotionKind::Bishop => 'B',
            PromotionKind::Knight => 'N',
        }
    }
}

impl From<PromotionKind> for PieceKind {
    fn from(kind: PromotionKind) -> Self {
        match kind {
            PromotionKind::Queen => PieceKind::Queen,
            PromotionKind::Rook => PieceKind::Rook,
            PromotionKind::Bishop => PieceKind::Bishop,
            PromotionKind::Knight => PieceKind::Knight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }
}
