//! Match record persistence seam. The registry writes a record after every
//! successful mutation and falls back to it when a match is not live.

use chess_core::GameSnapshot;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::registry::MatchId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub snapshot: GameSnapshot,
}

pub trait MatchStore: Send + Sync {
    fn find(&self, match_id: MatchId) -> Option<MatchRecord>;
    fn persist(&self, record: MatchRecord);
    fn records(&self) -> Vec<MatchRecord>;
}

#[derive(Debug, Default)]
pub struct MemoryMatchStore {
    records: DashMap<MatchId, MatchRecord>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MatchStore for MemoryMatchStore {
    fn find(&self, match_id: MatchId) -> Option<MatchRecord> {
        self.records.get(&match_id).map(|r| r.value().clone())
    }

    fn persist(&self, record: MatchRecord) {
        self.records.insert(record.match_id, record);
    }

    fn records(&self) -> Vec<MatchRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }
}
