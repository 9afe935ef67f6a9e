//! Swiss engine configuration.
//!
//! A `SwissConfig` is immutable for the life of a tournament and is
//! validated up front: a bad tiebreaker chain or an out-of-range floor
//! fails at construction time, not on the first round that happens to
//! exercise it.

use serde::{Deserialize, Serialize};

use crate::errors::{SwissError, SwissResult};

/// A tiebreaker calculator. Higher values rank better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiebreaker {
    /// Match win percentage, floored
    Mw,
    /// Game win percentage, floored
    Gw,
    /// Opponents' average match win percentage
    Omw,
    /// Opponents' average game win percentage
    Ogw,
    /// Raw match wins
    MatchWins,
    /// Raw game wins
    GameWins,
    /// Sum of opponents' match points
    Buchholz,
    /// Opponents' match points weighted by the result against them
    SonnebornBerger,
    /// Seeded random value in [0, 1)
    Random,
    /// 1 / sequence_id, so earlier registrations rank higher
    PlayerNumber,
}

impl Tiebreaker {
    /// Whether this tiebreaker alone produces a total order over players.
    pub fn is_total(self) -> bool {
        matches!(self, Self::Random | Self::PlayerNumber)
    }
}

/// Buchholz scoring variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuchholzVariant {
    /// Plain sum of opponents' match points
    Standard,
    /// Drops the single highest and lowest opponent score; needs 3+ opponents
    Median,
    /// Drops only the lowest opponent score; needs 2+ opponents
    Modified,
}

/// How the bye recipient is chosen among tied candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByeAssignment {
    /// Uniform pick with the seeded PRNG
    Random,
    /// The candidate last in pairing-tiebreaker order, deterministic
    LowestTiebreaker,
}

/// First-round pairing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round1Mode {
    /// Seeded shuffle, then pair adjacent players
    Random,
    /// Sort by sequence_id and pair 1v2, 3v4, ...
    Seeded,
}

/// Per-player bye cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxByes {
    Limit(u32),
    Unlimited,
}

impl MaxByes {
    /// Whether a player holding `bye_count` byes may receive another.
    pub fn allows(self, bye_count: u32) -> bool {
        match self {
            Self::Limit(cap) => bye_count < cap,
            Self::Unlimited => true,
        }
    }
}

/// Score credited to a bye receiver, expressed in games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByePoints {
    /// Game wins credited
    pub wins: u32,
    /// Game draws credited
    pub draws: u32,
}

impl Default for ByePoints {
    fn default() -> Self {
        Self { wins: 2, draws: 0 }
    }
}

/// Immutable Swiss tournament configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwissConfig {
    /// Total Swiss rounds planned (1..=20)
    pub rounds: u32,
    /// Tiebreaker chain used for bracket ordering while pairing
    pub pairing_tiebreakers: Vec<Tiebreaker>,
    /// Tiebreaker chain used for final rankings
    pub standings_tiebreakers: Vec<Tiebreaker>,
    /// Enforce the no-rematch constraint
    pub avoid_repeat_pairings: bool,
    /// Consult pair-down counts when choosing carry-down candidates
    pub track_pair_downs: bool,
    /// Per-player bye cap
    pub max_byes_per_player: MaxByes,
    /// Bye selection policy among tied candidates
    pub bye_assignment: ByeAssignment,
    /// Score credited to the bye receiver
    pub bye_points: ByePoints,
    /// Lower cap applied to each opponent's MW% before averaging
    pub omw_floor: f64,
    /// Lower cap on GW%
    pub gw_floor: f64,
    /// Below this many games, GW% is 0
    pub min_games_for_gw: u32,
    /// Buchholz scoring variant
    pub buchholz_variant: BuchholzVariant,
    /// First-round pairing mode
    pub round1_mode: Round1Mode,
    /// PRNG seed; all randomness in the engine derives from it
    pub seed: u64,
}

impl SwissConfig {
    /// Baseline configuration: MTG-style tiebreakers, 2-0 byes,
    /// at most one bye per player.
    pub fn new(rounds: u32, seed: u64) -> Self {
        Self {
            rounds,
            pairing_tiebreakers: vec![
                Tiebreaker::Omw,
                Tiebreaker::Gw,
                Tiebreaker::Ogw,
                Tiebreaker::Random,
            ],
            standings_tiebreakers: vec![
                Tiebreaker::Omw,
                Tiebreaker::Gw,
                Tiebreaker::Ogw,
                Tiebreaker::Random,
            ],
            avoid_repeat_pairings: true,
            track_pair_downs: true,
            max_byes_per_player: MaxByes::Limit(1),
            bye_assignment: ByeAssignment::Random,
            bye_points: ByePoints::default(),
            omw_floor: 0.33,
            gw_floor: 0.33,
            min_games_for_gw: 1,
            buchholz_variant: BuchholzVariant::Standard,
            round1_mode: Round1Mode::Random,
            seed,
        }
    }

    /// Magic: the Gathering tournament rules.
    pub fn mtg_standard(rounds: u32, seed: u64) -> Self {
        Self::new(rounds, seed)
    }

    /// Pokemon TCG tournament rules: no GW% in the chain, 0.25 floors.
    pub fn pokemon_standard(rounds: u32, seed: u64) -> Self {
        Self {
            pairing_tiebreakers: vec![Tiebreaker::Omw, Tiebreaker::Ogw, Tiebreaker::Random],
            standings_tiebreakers: vec![Tiebreaker::Omw, Tiebreaker::Ogw, Tiebreaker::Random],
            omw_floor: 0.25,
            gw_floor: 0.25,
            ..Self::new(rounds, seed)
        }
    }

    /// Chess federation style: Buchholz and Sonneborn-Berger, 1-0 byes,
    /// deterministic bye assignment.
    pub fn chess_style(rounds: u32, seed: u64) -> Self {
        Self {
            pairing_tiebreakers: vec![
                Tiebreaker::Buchholz,
                Tiebreaker::SonnebornBerger,
                Tiebreaker::PlayerNumber,
            ],
            standings_tiebreakers: vec![
                Tiebreaker::Buchholz,
                Tiebreaker::SonnebornBerger,
                Tiebreaker::PlayerNumber,
            ],
            bye_points: ByePoints { wins: 1, draws: 0 },
            bye_assignment: ByeAssignment::LowestTiebreaker,
            ..Self::new(rounds, seed)
        }
    }

    /// Casual play: pairing order is pure chance, standings keep the
    /// default chain.
    pub fn simple_random(rounds: u32, seed: u64) -> Self {
        Self {
            pairing_tiebreakers: vec![Tiebreaker::Random],
            ..Self::new(rounds, seed)
        }
    }

    /// Validate the configuration.
    ///
    /// Called by every engine entry point; violations surface as
    /// [`SwissError::InvalidConfig`].
    pub fn validate(&self) -> SwissResult<()> {
        if self.rounds == 0 || self.rounds > 20 {
            return Err(SwissError::InvalidConfig {
                reason: format!("rounds must be within 1..=20, got {}", self.rounds),
            });
        }
        for (name, floor) in [("omw_floor", self.omw_floor), ("gw_floor", self.gw_floor)] {
            if !(0.0..=1.0).contains(&floor) {
                return Err(SwissError::InvalidConfig {
                    reason: format!("{name} must be within [0, 1], got {floor}"),
                });
            }
        }
        for (name, chain) in [
            ("pairing_tiebreakers", &self.pairing_tiebreakers),
            ("standings_tiebreakers", &self.standings_tiebreakers),
        ] {
            match chain.last() {
                None => {
                    return Err(SwissError::InvalidConfig {
                        reason: format!("{name} must not be empty"),
                    });
                }
                Some(last) if !last.is_total() => {
                    return Err(SwissError::InvalidConfig {
                        reason: format!(
                            "{name} must end in a total tiebreaker (random or player_number)"
                        ),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
