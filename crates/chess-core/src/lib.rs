//! Chess rules: board model, pseudo-legal move generation and the rules
//! engine that filters by king safety and tracks whose turn it is.
//!
//! Castling and en passant are not part of these rules.

pub mod board;
pub mod chess_move;
pub mod error;
pub mod game;
pub mod movegen;
pub mod piece;
pub mod position;
pub mod snapshot;

pub use board::Board;
pub use chess_move::Move;
pub use error::ChessError;
pub use game::Game;
pub use piece::{Color, Piece, PieceKind, PromotionKind};
pub use position::Position;
pub use snapshot::{GameSnapshot, Outcome};
