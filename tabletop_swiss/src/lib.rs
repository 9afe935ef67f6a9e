//! # Tabletop Swiss
//!
//! A deterministic Swiss pairing and standings engine for competitive
//! tabletop tournaments (Magic: the Gathering, Pokemon TCG, chess).
//!
//! The engine is a synchronous, purely computational core: it takes a
//! consistent snapshot of registrations and matches, and returns the
//! next round's pairings or the current standings. It holds no state
//! between calls and all randomness derives from the configured seed,
//! so identical inputs always produce bitwise-identical output.
//!
//! ## Core modules
//!
//! - [`models`]: registrations, matches, pairings, standings entries
//! - [`config`]: tournament configuration, presets, validation
//! - [`record`]: per-player match-record aggregation
//! - [`tiebreakers`]: OMW%, GW%, OGW%, Buchholz, Sonneborn-Berger, and
//!   friends
//! - [`standings`]: ranked standings with a configurable tiebreaker
//!   chain
//! - [`pairing`]: round 1 and bracket-based pairing with no-rematch,
//!   pair-down, and bye-cap handling
//! - [`lifecycle`]: round status, drops, late entries
//! - [`repo`]: the read-only repository contract the engine consumes
//!
//! ## Example
//!
//! ```
//! use tabletop_swiss::{pairing, SwissConfig, Registration};
//! use uuid::Uuid;
//!
//! let tournament = Uuid::new_v4();
//! let registrations: Vec<Registration> = (1..=8)
//!     .map(|seq| Registration::new(tournament, Uuid::new_v4(), seq))
//!     .collect();
//!
//! let config = SwissConfig::mtg_standard(3, 42);
//! let round1 = pairing::pair_round_1(tournament, &registrations, &config).unwrap();
//! assert_eq!(round1.len(), 4);
//! ```

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod pairing;
pub mod record;
pub mod repo;
pub mod standings;
pub mod tiebreakers;

pub use config::{
    BuchholzVariant, ByeAssignment, ByePoints, MaxByes, Round1Mode, SwissConfig, Tiebreaker,
};
pub use errors::{RemedialAction, SwissError, SwissResult};
pub use lifecycle::RoundStatus;
pub use models::{
    Match, MatchId, MatchOutcome, Pairing, PlayerId, Registration, RegistrationId,
    RegistrationStatus, StandingsEntry, TournamentId,
};
pub use pairing::{pair_round, pair_round_1};
pub use repo::{InMemoryRepository, TournamentRepository};
pub use standings::{calculate_standings, StandingsMode};
