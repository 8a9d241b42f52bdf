//! Rules engine: one board plus whose turn it is.

use crate::board::Board;
use crate::chess_move::Move;
use crate::error::ChessError;
use crate::movegen::{attacks_square, piece_moves};
use crate::piece::{Color, Piece, PieceKind};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: Color,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        Self {
            board: Board::standard(),
            turn: Color::White,
        }
    }

    pub fn with_board(board: Board, turn: Color) -> Self {
        Self { board, turn }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    /// Legal moves of the piece on `from`, or `None` if the square is empty.
    ///
    /// Every pseudo-legal candidate is played on a scratch copy of the board
    /// and kept only if the mover's king is not attacked afterwards. The live
    /// board is never touched.
    pub fn valid_moves(&self, from: Position) -> Option<Vec<Move>> {
        let piece = self.board.get(from)?;
        let moves = piece_moves(&self.board, from)
            .into_iter()
            .filter(|mv| {
                let mut scratch = self.board;
                scratch.relocate(mv.start, mv.end);
                !king_in_check(&scratch, piece.color)
            })
            .collect();
        Some(moves)
    }

    pub fn make_move(&mut self, mv: Move) -> Result<(), ChessError> {
        let piece = self
            .board
            .get(mv.start)
            .ok_or_else(|| ChessError::InvalidMove(format!("no piece at {}", mv.start)))?;

        if piece.color != self.turn {
            return Err(ChessError::InvalidMove(format!(
                "it is {}'s turn",
                self.turn
            )));
        }

        let legal = self.valid_moves(mv.start).unwrap_or_default();
        if !legal.contains(&mv) {
            return Err(ChessError::InvalidMove(format!("{mv} is not a legal move")));
        }

        let mut next = self.board;
        next.relocate(mv.start, mv.end);

        // Membership in `valid_moves` already rules out self-check.
        debug_assert!(!king_in_check(&next, piece.color));

        if let Some(kind) = mv.promotion {
            if piece.kind == PieceKind::Pawn && mv.end.row() == piece.color.promotion_row() {
                next.set(mv.end, Some(Piece::new(kind.into(), piece.color)));
            }
        }

        self.board = next;
        self.turn = self.turn.opponent();
        Ok(())
    }

    /// A missing king counts as not in check.
    pub fn is_in_check(&self, color: Color) -> bool {
        king_in_check(&self.board, color)
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_legal_moves(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        color == self.turn && !self.is_in_check(color) && !self.has_legal_moves(color)
    }

    pub fn has_legal_moves(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(from, _)| self.valid_moves(from).is_some_and(|moves| !moves.is_empty()))
    }

    /// Every legal move for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == self.turn)
            .flat_map(|(from, _)| self.valid_moves(from).unwrap_or_default())
            .collect()
    }
}

fn king_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king) => attacks_square(board, color.opponent(), king),
        None => false,
    }
}
