//! Tournament data models consumed and produced by the Swiss engine.
//!
//! Registrations and matches are owned by the caller's repository and
//! supplied by value; the engine returns freshly built `Pairing` and
//! `StandingsEntry` values and keeps no state between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ByePoints, Tiebreaker};

/// Tournament ID type
pub type TournamentId = Uuid;
/// Player ID type
pub type PlayerId = Uuid;
/// Registration ID type
pub type RegistrationId = Uuid;
/// Match ID type
pub type MatchId = Uuid;

/// Registration status within a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Playing normally
    Active,
    /// Withdrew; stays in standings, no longer paired
    Dropped,
    /// Joined after round 1; paired from `entry_round` onwards
    LateEntry,
}

/// A player's identity within a single tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Registration ID
    pub id: RegistrationId,
    /// Tournament this registration belongs to
    pub tournament_id: TournamentId,
    /// The registered player
    pub player_id: PlayerId,
    /// 1-based registration order, unique within the tournament
    pub sequence_id: u32,
    /// Current status
    pub status: RegistrationStatus,
    /// Last round the player is paired in; set when status is Dropped
    pub drop_round: Option<u32>,
    /// First round a late entry actually plays; set when status is LateEntry
    pub entry_round: Option<u32>,
    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    /// Create an active registration.
    pub fn new(
        tournament_id: TournamentId,
        player_id: PlayerId,
        sequence_id: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            player_id,
            sequence_id,
            status: RegistrationStatus::Active,
            drop_round: None,
            entry_round: None,
            registered_at: Utc::now(),
        }
    }

    /// Create a late entry that first plays in `entry_round`.
    pub fn late_entry(
        tournament_id: TournamentId,
        player_id: PlayerId,
        sequence_id: u32,
        entry_round: u32,
    ) -> Self {
        Self {
            status: RegistrationStatus::LateEntry,
            entry_round: Some(entry_round),
            ..Self::new(tournament_id, player_id, sequence_id)
        }
    }

    /// Mark the registration dropped after `round`.
    pub fn drop_after(&mut self, round: u32) {
        self.status = RegistrationStatus::Dropped;
        self.drop_round = Some(round);
    }

    /// Whether this registration should appear in pairings for `round`.
    pub fn is_paired_in(&self, round: u32) -> bool {
        match self.status {
            RegistrationStatus::Active => true,
            RegistrationStatus::Dropped => self.drop_round.is_some_and(|r| round <= r),
            RegistrationStatus::LateEntry => self.entry_round.is_some_and(|r| round >= r),
        }
    }
}

/// One head-to-head result, bye, or forfeit loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Match ID
    pub id: MatchId,
    /// Tournament this match belongs to
    pub tournament_id: TournamentId,
    /// Round number (1-based)
    pub round_number: u32,
    /// First player
    pub player1_id: PlayerId,
    /// Second player; absent for byes and forfeit losses
    pub player2_id: Option<PlayerId>,
    /// Games won by player 1
    pub player1_game_wins: u32,
    /// Games won by player 2
    pub player2_game_wins: u32,
    /// Drawn games
    pub draws: u32,
    /// Presentation-only table number; byes are unnumbered
    pub table_number: Option<u32>,
    /// Set once the result is final; unset means still in progress
    pub end_time: Option<DateTime<Utc>>,
    /// True for the phantom losses credited to a late entry's missed rounds
    pub is_loss_forfeit: bool,
}

impl Match {
    /// Create an unreported match between two players.
    pub fn new(
        tournament_id: TournamentId,
        round_number: u32,
        player1_id: PlayerId,
        player2_id: PlayerId,
        table_number: Option<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1_id,
            player2_id: Some(player2_id),
            player1_game_wins: 0,
            player2_game_wins: 0,
            draws: 0,
            table_number,
            end_time: None,
            is_loss_forfeit: false,
        }
    }

    /// Create a finalized bye scored from the configured bye points.
    pub fn bye(
        tournament_id: TournamentId,
        round_number: u32,
        player_id: PlayerId,
        bye_points: ByePoints,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1_id: player_id,
            player2_id: None,
            player1_game_wins: bye_points.wins,
            player2_game_wins: 0,
            draws: bye_points.draws,
            table_number: None,
            end_time: Some(Utc::now()),
            is_loss_forfeit: false,
        }
    }

    /// Create a finalized forfeit loss for a round the player missed.
    pub fn loss_forfeit(
        tournament_id: TournamentId,
        round_number: u32,
        player_id: PlayerId,
        bye_points: ByePoints,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round_number,
            player1_id: player_id,
            player2_id: None,
            player1_game_wins: 0,
            player2_game_wins: bye_points.wins,
            draws: 0,
            table_number: None,
            end_time: Some(Utc::now()),
            is_loss_forfeit: true,
        }
    }

    /// Record a final result and close the match.
    pub fn report(&mut self, player1_game_wins: u32, player2_game_wins: u32, draws: u32) {
        self.player1_game_wins = player1_game_wins;
        self.player2_game_wins = player2_game_wins;
        self.draws = draws;
        self.end_time = Some(Utc::now());
    }

    /// Whether this match is a bye.
    pub fn is_bye(&self) -> bool {
        self.player2_id.is_none() && !self.is_loss_forfeit
    }

    /// Whether the result has been reported.
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether `player_id` took part in this match.
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == Some(player_id)
    }

    /// The other player, if this was a head-to-head match.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.player1_id == player_id {
            self.player2_id
        } else if self.player2_id == Some(player_id) {
            Some(self.player1_id)
        } else {
            None
        }
    }

    /// Game wins from `player_id`'s side, paired with the other side's.
    pub fn game_wins_for(&self, player_id: PlayerId) -> (u32, u32) {
        if self.player1_id == player_id {
            (self.player1_game_wins, self.player2_game_wins)
        } else {
            (self.player2_game_wins, self.player1_game_wins)
        }
    }
}

/// Outcome of a match from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Loss,
    Draw,
}

impl MatchOutcome {
    /// Score a completed match for `player_id`. Equal game wins is a draw,
    /// including the all-zero draw of a force-finalized match.
    pub fn for_player(m: &Match, player_id: PlayerId) -> Self {
        let (own, theirs) = m.game_wins_for(player_id);
        if own > theirs {
            Self::Win
        } else if own < theirs {
            Self::Loss
        } else {
            Self::Draw
        }
    }

    /// Match result as a game value: 1 for a win, 0.5 for a draw, 0 for a loss.
    pub fn value(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Draw => 0.5,
            Self::Loss => 0.0,
        }
    }
}

/// One row of the standings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsEntry {
    /// The ranked registration
    pub registration: Registration,
    /// 1-based rank after the stable sort
    pub rank: u32,
    /// Match wins (byes included)
    pub match_wins: u32,
    /// Match losses (forfeits included)
    pub match_losses: u32,
    /// Match draws
    pub match_draws: u32,
    /// 3 per win, 1 per draw
    pub match_points: u32,
    /// Game wins (bye games included)
    pub game_wins: u32,
    /// Game losses
    pub game_losses: u32,
    /// Game draws
    pub game_draws: u32,
    /// Completed matches, byes and forfeits included
    pub matches_played: u32,
    /// Byes received so far
    pub bye_count: u32,
    /// Opponents faced in encounter order; byes and forfeits excluded
    pub opponents: Vec<PlayerId>,
    /// Tiebreaker values in configured chain order
    pub tiebreakers: Vec<(Tiebreaker, f64)>,
    /// Visible drop marker so final standings can flag withdrawn players
    pub dropped: bool,
}

impl StandingsEntry {
    /// Look up a tiebreaker value by kind.
    pub fn tiebreaker(&self, kind: Tiebreaker) -> Option<f64> {
        self.tiebreakers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
    }
}

/// One pairing produced for the next round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pairing {
    /// Round the pairing belongs to
    pub round_number: u32,
    /// First player (the bye receiver, for byes)
    pub player1_id: PlayerId,
    /// Second player; absent for byes
    pub player2_id: Option<PlayerId>,
    /// Table number in emission order; byes are unnumbered
    pub table_number: Option<u32>,
    /// True when the two players entered the round in different
    /// match-point brackets
    pub is_pair_down: bool,
    /// True when this pairing is a bye
    pub is_bye: bool,
}

impl Pairing {
    /// Materialize this pairing as an unreported match record.
    /// Byes come back already finalized with the configured score.
    pub fn into_match(self, tournament_id: TournamentId, bye_points: ByePoints) -> Match {
        match self.player2_id {
            Some(p2) => Match::new(
                tournament_id,
                self.round_number,
                self.player1_id,
                p2,
                self.table_number,
            ),
            None => Match::bye(tournament_id, self.round_number, self.player1_id, bye_points),
        }
    }
}
