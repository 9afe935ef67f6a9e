//! Repository contract consumed by the engine.
//!
//! The engine only ever reads a transactionally consistent snapshot of
//! one tournament; pairings it returns are persisted by the caller as
//! new match records. Backends implement this trait; the in-memory
//! implementation here backs tests and examples.

use std::collections::HashMap;

use crate::errors::SwissResult;
use crate::models::{Match, Registration, TournamentId};

/// Read-only view of a tournament's registrations and match log.
pub trait TournamentRepository {
    /// All registrations for the tournament, in registration order.
    fn list_registrations(&self, tournament_id: TournamentId) -> SwissResult<Vec<Registration>>;

    /// All matches for the tournament, optionally capped at a round.
    fn list_matches(
        &self,
        tournament_id: TournamentId,
        up_to_round: Option<u32>,
    ) -> SwissResult<Vec<Match>>;
}

/// HashMap-backed repository for tests and examples.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    registrations: HashMap<TournamentId, Vec<Registration>>,
    matches: HashMap<TournamentId, Vec<Match>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_registration(&mut self, registration: Registration) {
        self.registrations
            .entry(registration.tournament_id)
            .or_default()
            .push(registration);
    }

    pub fn add_match(&mut self, m: Match) {
        self.matches.entry(m.tournament_id).or_default().push(m);
    }

    /// Replace a stored match with an updated copy, matched by id.
    pub fn update_match(&mut self, updated: Match) {
        if let Some(all) = self.matches.get_mut(&updated.tournament_id) {
            if let Some(slot) = all.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated;
            }
        }
    }
}

impl TournamentRepository for InMemoryRepository {
    fn list_registrations(&self, tournament_id: TournamentId) -> SwissResult<Vec<Registration>> {
        Ok(self
            .registrations
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_matches(
        &self,
        tournament_id: TournamentId,
        up_to_round: Option<u32>,
    ) -> SwissResult<Vec<Match>> {
        let mut matches = self
            .matches
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default();
        if let Some(cap) = up_to_round {
            matches.retain(|m| m.round_number <= cap);
        }
        Ok(matches)
    }
}
