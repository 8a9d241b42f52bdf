//! Authoritative store of live matches.
//!
//! Each match sits behind its own async mutex, so every mutation of one
//! match (seating, moves, resignations) is serialized while different
//! matches proceed independently.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chess_core::{ChessError, Color, Game, GameSnapshot, Move, Outcome};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::store::{MatchRecord, MatchStore, MemoryMatchStore};

pub type MatchId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player(Color),
    Spectator,
}

/// Full view of a match sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub spectators: Vec<String>,
    pub game: GameSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub spectator_count: usize,
    pub outcome: Outcome,
}

/// Result of a move accepted by the rules engine.
#[derive(Debug, Clone)]
pub struct MoveApplied {
    pub mover: Color,
    pub mv: Move,
    pub outcome: Outcome,
    /// Whether the side now to move is in check.
    pub check: bool,
    pub snapshot: MatchSnapshot,
}

#[derive(Debug)]
pub struct MatchState {
    id: MatchId,
    name: String,
    white: Option<String>,
    black: Option<String>,
    spectators: BTreeSet<String>,
    game: Game,
    outcome: Outcome,
}

impl MatchState {
    fn new(id: MatchId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            white: None,
            black: None,
            spectators: BTreeSet::new(),
            game: Game::new(),
            outcome: Outcome::InProgress,
        }
    }

    fn from_record(record: MatchRecord) -> Result<Self, ChessError> {
        let game = Game::from_snapshot(&record.snapshot)?;
        Ok(Self {
            id: record.match_id,
            name: record.name,
            white: record.white,
            black: record.black,
            spectators: BTreeSet::new(),
            game,
            outcome: record.snapshot.outcome,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn seat(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white.as_deref(),
            Color::Black => self.black.as_deref(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Option<String> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Colors held by `identity`; one player may hold both.
    pub fn seats_of(&self, identity: &str) -> Vec<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .filter(|c| self.seat(*c) == Some(identity))
            .collect()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id,
            name: self.name.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
            spectators: self.spectators.iter().cloned().collect(),
            game: GameSnapshot::capture(&self.game, self.outcome),
        }
    }

    fn record(&self) -> MatchRecord {
        MatchRecord {
            match_id: self.id,
            name: self.name.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
            snapshot: GameSnapshot::capture(&self.game, self.outcome),
        }
    }

    fn summary(&self) -> MatchSummary {
        MatchSummary {
            match_id: self.id,
            name: self.name.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
            spectator_count: self.spectators.len(),
            outcome: self.outcome,
        }
    }
}

pub struct MatchRegistry {
    matches: DashMap<MatchId, Arc<Mutex<MatchState>>>,
    next_id: AtomicU32,
    store: Arc<dyn MatchStore>,
}

impl MatchRegistry {
    pub fn new(store: Arc<dyn MatchStore>) -> Self {
        Self {
            matches: DashMap::new(),
            next_id: AtomicU32::new(1),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMatchStore::new()))
    }

    pub fn create(&self, name: &str) -> MatchId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let state = MatchState::new(id, name);
        self.store.persist(state.record());
        self.matches.insert(id, Arc::new(Mutex::new(state)));
        info!(match_id = id, name, "Match created");
        id
    }

    /// Live match handle. A match that is not live is rebuilt from the
    /// store if a record exists.
    pub fn find(&self, id: MatchId) -> Option<Arc<Mutex<MatchState>>> {
        let live = self.matches.get(&id).map(|m| m.value().clone());
        if live.is_some() {
            return live;
        }

        let record = self.store.find(id)?;
        let state = match MatchState::from_record(record) {
            Ok(s) => s,
            Err(e) => {
                warn!(match_id = id, "Stored match record is unusable: {e}");
                return None;
            }
        };
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
        debug!(match_id = id, "Match restored from store");
        let handle = self
            .matches
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(state)))
            .value()
            .clone();
        Some(handle)
    }

    fn handle(&self, id: MatchId) -> Result<Arc<Mutex<MatchState>>, SessionError> {
        self.find(id).ok_or(SessionError::MatchNotFound(id))
    }

    pub async fn snapshot(&self, id: MatchId) -> Result<MatchSnapshot, SessionError> {
        let handle = self.handle(id)?;
        let state = handle.lock().await;
        Ok(state.snapshot())
    }

    /// Live matches, plus stored matches that have not been loaded yet.
    pub async fn list(&self) -> Vec<MatchSummary> {
        let handles: Vec<_> = self.matches.iter().map(|m| m.value().clone()).collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }

        let live: HashSet<MatchId> = summaries.iter().map(|s| s.match_id).collect();
        summaries.extend(
            self.store
                .records()
                .into_iter()
                .filter(|r| !live.contains(&r.match_id))
                .map(|r| MatchSummary {
                    match_id: r.match_id,
                    name: r.name,
                    white: r.white,
                    black: r.black,
                    spectator_count: 0,
                    outcome: r.snapshot.outcome,
                }),
        );
        summaries.sort_by_key(|s| s.match_id);
        summaries
    }

    /// Seat `identity` as `color`. Re-seating the current holder is a no-op.
    pub async fn attach_player(
        &self,
        id: MatchId,
        identity: &str,
        color: Color,
    ) -> Result<MatchSnapshot, SessionError> {
        self.attach_player_then(id, identity, color, |_| {}).await
    }

    /// [`attach_player`](Self::attach_player), running `publish` before the
    /// match lock is released so fan-out cannot be overtaken by a later
    /// mutation of the same match.
    pub async fn attach_player_then<F>(
        &self,
        id: MatchId,
        identity: &str,
        color: Color,
        publish: F,
    ) -> Result<MatchSnapshot, SessionError>
    where
        F: FnOnce(&MatchSnapshot),
    {
        let handle = self.handle(id)?;
        let mut state = handle.lock().await;

        if let Some(holder) = state.seat(color) {
            if holder != identity {
                return Err(SessionError::ColorAlreadyTaken(color));
            }
        }

        *state.seat_mut(color) = Some(identity.to_string());
        state.spectators.remove(identity);
        self.store.persist(state.record());
        info!(match_id = id, user = identity, %color, "Player seated");
        let snapshot = state.snapshot();
        publish(&snapshot);
        Ok(snapshot)
    }

    pub async fn attach_spectator(
        &self,
        id: MatchId,
        identity: &str,
    ) -> Result<MatchSnapshot, SessionError> {
        self.attach_spectator_then(id, identity, |_| {}).await
    }

    pub async fn attach_spectator_then<F>(
        &self,
        id: MatchId,
        identity: &str,
        publish: F,
    ) -> Result<MatchSnapshot, SessionError>
    where
        F: FnOnce(&MatchSnapshot),
    {
        let handle = self.handle(id)?;
        let mut state = handle.lock().await;
        state.spectators.insert(identity.to_string());
        info!(match_id = id, user = identity, "Spectator attached");
        let snapshot = state.snapshot();
        publish(&snapshot);
        Ok(snapshot)
    }

    /// Remove `identity` from every role it holds. Vacated seats stay open
    /// for anyone to take; leaving never ends the game.
    pub async fn detach(&self, id: MatchId, identity: &str) -> Result<Vec<Role>, SessionError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock().await;

        let mut roles = Vec::new();
        for color in state.seats_of(identity) {
            *state.seat_mut(color) = None;
            roles.push(Role::Player(color));
        }
        if state.spectators.remove(identity) {
            roles.push(Role::Spectator);
        }
        if roles.is_empty() {
            return Err(SessionError::NotAParticipant);
        }

        self.store.persist(state.record());
        info!(match_id = id, user = identity, "Participant detached");
        Ok(roles)
    }

    pub async fn apply_move(
        &self,
        id: MatchId,
        identity: &str,
        mv: Move,
    ) -> Result<MoveApplied, SessionError> {
        self.apply_move_then(id, identity, mv, |_| {}).await
    }

    /// `publish` sees the accepted move while the match is still locked, so
    /// consecutive moves reach every connection in the order they were played.
    pub async fn apply_move_then<F>(
        &self,
        id: MatchId,
        identity: &str,
        mv: Move,
        publish: F,
    ) -> Result<MoveApplied, SessionError>
    where
        F: FnOnce(&MoveApplied),
    {
        let handle = self.handle(id)?;
        let mut state = handle.lock().await;

        if state.outcome.is_terminal() {
            return Err(SessionError::MatchAlreadyDecided);
        }
        let seats = state.seats_of(identity);
        if seats.is_empty() {
            return Err(SessionError::NotAParticipant);
        }
        let mover = state.game.turn();
        if !seats.contains(&mover) {
            return Err(SessionError::WrongTurn);
        }

        state.game.make_move(mv)?;

        let opponent = mover.opponent();
        state.outcome = if state.game.is_in_checkmate(opponent) {
            Outcome::win_for(mover)
        } else if state.game.is_in_stalemate(opponent) {
            Outcome::Draw
        } else {
            Outcome::InProgress
        };
        let check = state.game.is_in_check(opponent);

        self.store.persist(state.record());
        debug!(match_id = id, user = identity, %mv, outcome = ?state.outcome, "Move applied");

        let applied = MoveApplied {
            mover,
            mv,
            outcome: state.outcome,
            check,
            snapshot: state.snapshot(),
        };
        publish(&applied);
        Ok(applied)
    }

    /// Concede the game. Returns the color that resigned.
    pub async fn resign(&self, id: MatchId, identity: &str) -> Result<Color, SessionError> {
        let handle = self.handle(id)?;
        let mut state = handle.lock().await;

        let seats = state.seats_of(identity);
        let color = match seats.as_slice() {
            [] => return Err(SessionError::NotAParticipant),
            [only] => *only,
            _ => state.game.turn(),
        };
        if state.outcome.is_terminal() {
            return Err(SessionError::MatchAlreadyDecided);
        }

        *state.seat_mut(color) = None;
        state.outcome = Outcome::win_for(color.opponent());
        self.store.persist(state.record());
        info!(match_id = id, user = identity, %color, "Player resigned");
        Ok(color)
    }
}
