use std::fmt;

use serde::{Deserialize, Serialize};

use crate::piece::PromotionKind;
use crate::position::Position;

/// A move from `start` to `end`. `promotion` is only ever set on a pawn
/// move that lands on the opponent's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub start: Position,
    pub end: Position,
    #[serde(default)]
    pub promotion: Option<PromotionKind>,
}

impl Move {
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            promotion: None,
        }
    }

    pub fn promoting(start: Position, end: Position, kind: PromotionKind) -> Self {
        Self {
            start,
            end,
            promotion: Some(kind),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)?;
        if let Some(kind) = self.promotion {
            write!(f, "={}", kind.letter())?;
        }
        Ok(())
    }
}
