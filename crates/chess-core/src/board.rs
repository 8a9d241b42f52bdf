//! Plain 8x8 piece container. No chess rules live here.

use crate::piece::{Color, Piece, PieceKind};
use crate::position::Position;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Piece>; 64],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self { cells: [None; 64] }
    }

    /// Board in the standard starting arrangement.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    pub fn get(&self, position: Position) -> Option<Piece> {
        self.cells[position.index()]
    }

    pub fn set(&mut self, position: Position, piece: Option<Piece>) {
        self.cells[position.index()] = piece;
    }

    pub fn reset(&mut self) {
        self.cells = [None; 64];
        for (i, kind) in BACK_RANK.iter().enumerate() {
            let column = i + 1;
            self.cells[column - 1] = Some(Piece::new(*kind, Color::White));
            self.cells[8 + column - 1] = Some(Piece::new(PieceKind::Pawn, Color::White));
            self.cells[48 + column - 1] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            self.cells[56 + column - 1] = Some(Piece::new(*kind, Color::Black));
        }
    }

    /// Move whatever stands on `start` to `end`, overwriting `end`.
    pub fn relocate(&mut self, start: Position, end: Position) {
        let piece = self.cells[start.index()].take();
        self.cells[end.index()] = piece;
    }

    /// Occupied cells in row-major order starting at (1,1).
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|piece| (Position::from_index(i), piece)))
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.kind == PieceKind::King && piece.color == color)
            .map(|(position, _)| position)
    }

    pub fn cells(&self) -> &[Option<Piece>; 64] {
        &self.cells
    }

    pub fn from_cells(cells: [Option<Piece>; 64]) -> Self {
        Self { cells }
    }
}
