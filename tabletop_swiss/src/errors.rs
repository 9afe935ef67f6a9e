//! Engine error types.
//!
//! Every failure crossing the engine boundary is one of these kinds;
//! nothing is recovered silently. `InternalConsistency` is reserved for
//! invariant violations detected after an otherwise successful pass, so
//! operator tooling can tell "this tournament cannot proceed" apart from
//! "the engine is broken".

use thiserror::Error;
use uuid::Uuid;

/// An operator action that could unblock a tournament the engine cannot
/// pair on its own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RemedialAction {
    /// Drop the named player from the tournament.
    DropPlayer(Uuid),
    /// Explicitly permit a rematch between the two players this round.
    AllowRematch(Uuid, Uuid),
    /// End the Swiss portion early and cut to final standings.
    EndSwiss,
}

/// Swiss engine errors
#[derive(Debug, Error)]
pub enum SwissError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("too few players to pair: {eligible} eligible")]
    TooFewPlayers { eligible: usize },

    #[error("impossible pairing: {reason}")]
    ImpossiblePairing {
        reason: String,
        /// Operator actions that would let the tournament continue.
        suggestions: Vec<RemedialAction>,
    },

    #[error("round {round} is not ready: {unfinished} unfinished matches in earlier rounds")]
    RoundNotReady { round: u32, unfinished: usize },

    #[error("internal consistency violation: {reason}")]
    InternalConsistency { reason: String },
}

pub type SwissResult<T> = Result<T, SwissError>;
