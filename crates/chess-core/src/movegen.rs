//! Pseudo-legal move generation, one function per piece kind.
//!
//! Nothing here looks at king safety; that filtering happens in
//! [`crate::game::Game::valid_moves`].

use crate::board::Board;
use crate::chess_move::Move;
use crate::piece::{Color, PieceKind, PromotionKind};
use crate::position::Position;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Pseudo-legal moves of whatever piece stands on `from`. Empty if the
/// square is empty.
pub fn piece_moves(board: &Board, from: Position) -> Vec<Move> {
    let piece = match board.get(from) {
        Some(p) => p,
        None => return Vec::new(),
    };

    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece.color),
        PieceKind::Knight => knight_moves(board, from, piece.color),
        PieceKind::Bishop => bishop_moves(board, from, piece.color),
        PieceKind::Rook => rook_moves(board, from, piece.color),
        PieceKind::Queen => queen_moves(board, from, piece.color),
        PieceKind::King => king_moves(board, from, piece.color),
    }
}

pub fn pawn_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    let forward = color.forward();

    if let Some(one) = from.offset(forward, 0) {
        if board.get(one).is_none() {
            push_pawn_move(&mut moves, from, one, color);

            if from.row() == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * forward, 0) {
                    if board.get(two).is_none() {
                        moves.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    for side in [-1, 1] {
        if let Some(target) = from.offset(forward, side) {
            match board.get(target) {
                Some(victim) if victim.color != color => {
                    push_pawn_move(&mut moves, from, target, color)
                }
                _ => {}
            }
        }
    }

    moves
}

/// A pawn landing on the back rank is emitted once per promotion choice.
fn push_pawn_move(moves: &mut Vec<Move>, from: Position, to: Position, color: Color) {
    if to.row() == color.promotion_row() {
        for kind in PromotionKind::ALL {
            moves.push(Move::promoting(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

pub fn knight_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    step_moves(board, from, color, &KNIGHT_OFFSETS)
}

pub fn bishop_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    ray_moves(board, from, color, &DIAGONAL)
}

pub fn rook_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    ray_moves(board, from, color, &ORTHOGONAL)
}

pub fn queen_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    ray_moves(board, from, color, &ALL_DIRECTIONS)
}

/// No castling.
pub fn king_moves(board: &Board, from: Position, color: Color) -> Vec<Move> {
    step_moves(board, from, color, &ALL_DIRECTIONS)
}

fn step_moves(board: &Board, from: Position, color: Color, offsets: &[(i8, i8)]) -> Vec<Move> {
    offsets
        .iter()
        .filter_map(|&(d_row, d_column)| from.offset(d_row, d_column))
        .filter(|&to| board.get(to).map_or(true, |p| p.color != color))
        .map(|to| Move::new(from, to))
        .collect()
}

fn ray_moves(board: &Board, from: Position, color: Color, directions: &[(i8, i8)]) -> Vec<Move> {
    let mut moves = Vec::new();
    for &(d_row, d_column) in directions {
        let mut cursor = from;
        while let Some(next) = cursor.offset(d_row, d_column) {
            match board.get(next) {
                None => moves.push(Move::new(from, next)),
                Some(blocker) => {
                    if blocker.color != color {
                        moves.push(Move::new(from, next));
                    }
                    break;
                }
            }
            cursor = next;
        }
    }
    moves
}

/// Whether any piece of color `by` has a pseudo-legal move ending on `target`.
pub fn attacks_square(board: &Board, by: Color, target: Position) -> bool {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == by)
        .any(|(from, _)| piece_moves(board, from).iter().any(|mv| mv.end == target))
}
