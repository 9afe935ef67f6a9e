//! Round lifecycle helpers.
//!
//! The engine itself never writes; these helpers produce the finalized
//! match records that drops, late entries, and an early end of Swiss
//! require, for the caller to persist.

use chrono::{DateTime, Utc};
use log::info;

use crate::config::SwissConfig;
use crate::errors::{SwissError, SwissResult};
use crate::models::{Match, PlayerId, Registration, TournamentId};

/// Lifecycle state of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RoundStatus {
    /// No matches created yet
    Pending,
    /// Matches exist, at least one unreported
    Active,
    /// Every match has a final result
    Completed,
}

/// Status of `round` given the match log.
pub fn round_status(matches: &[Match], round: u32) -> RoundStatus {
    let mut any = false;
    for m in matches.iter().filter(|m| m.round_number == round) {
        if !m.is_complete() {
            return RoundStatus::Active;
        }
        any = true;
    }
    if any {
        RoundStatus::Completed
    } else {
        RoundStatus::Pending
    }
}

/// Whether every match of `round` has been reported.
pub fn is_round_complete(matches: &[Match], round: u32) -> bool {
    round_status(matches, round) == RoundStatus::Completed
}

/// Guard for advancing to `next_round`: the previous round must be
/// complete and the round must exist in the schedule.
pub fn ensure_round_ready(
    matches: &[Match],
    next_round: u32,
    config: &SwissConfig,
) -> SwissResult<()> {
    if next_round > config.rounds {
        return Err(SwissError::InvalidInput {
            reason: format!(
                "round {next_round} is past the {}-round schedule",
                config.rounds
            ),
        });
    }
    let unfinished = matches
        .iter()
        .filter(|m| m.round_number < next_round && !m.is_complete())
        .count();
    if unfinished > 0 {
        return Err(SwissError::RoundNotReady {
            round: next_round,
            unfinished,
        });
    }
    Ok(())
}

/// Close a dropping player's unreported matches as wins for their
/// opponents, scored like a bye. Returns the finalized copies for the
/// caller to persist; the input log is untouched.
pub fn close_unfinished_for_drop(
    matches: &[Match],
    player_id: PlayerId,
    config: &SwissConfig,
    end_time: DateTime<Utc>,
) -> Vec<Match> {
    matches
        .iter()
        .filter(|m| !m.is_complete() && m.involves(player_id))
        .map(|m| {
            let mut closed = m.clone();
            if closed.player1_id == player_id {
                closed.player1_game_wins = 0;
                closed.player2_game_wins = config.bye_points.wins;
            } else {
                closed.player1_game_wins = config.bye_points.wins;
                closed.player2_game_wins = 0;
            }
            closed.draws = 0;
            closed.end_time = Some(end_time);
            info!(
                "closed match {} as a forfeit win after {player_id} dropped",
                closed.id
            );
            closed
        })
        .collect()
}

/// Forfeit losses for every round a late entry missed.
///
/// The phantom matches carry no opponent, so they never feed opponent
/// win percentages; they only weigh the late entry's own record down.
pub fn forfeit_losses_for_late_entry(
    tournament_id: TournamentId,
    registration: &Registration,
    config: &SwissConfig,
) -> SwissResult<Vec<Match>> {
    let entry_round = registration.entry_round.ok_or_else(|| SwissError::InvalidInput {
        reason: format!(
            "registration {} has no entry round",
            registration.id
        ),
    })?;
    Ok((1..entry_round)
        .map(|round| {
            Match::loss_forfeit(
                tournament_id,
                round,
                registration.player_id,
                config.bye_points,
            )
        })
        .collect())
}

/// Force-finalize every open match of `round` as a 0-0 draw. Used when
/// the organizer ends Swiss early with results outstanding.
pub fn finalize_round_as_draws(
    matches: &[Match],
    round: u32,
    end_time: DateTime<Utc>,
) -> Vec<Match> {
    matches
        .iter()
        .filter(|m| m.round_number == round && !m.is_complete())
        .map(|m| {
            let mut closed = m.clone();
            closed.player1_game_wins = 0;
            closed.player2_game_wins = 0;
            closed.draws = 0;
            closed.end_time = Some(end_time);
            closed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_round_status_progression() {
        let t = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(round_status(&[], 1), RoundStatus::Pending);

        let mut m = Match::new(t, 1, a, b, Some(1));
        assert_eq!(round_status(std::slice::from_ref(&m), 1), RoundStatus::Active);

        m.report(2, 0, 0);
        assert_eq!(round_status(std::slice::from_ref(&m), 1), RoundStatus::Completed);
        assert!(is_round_complete(std::slice::from_ref(&m), 1));
    }

    #[test]
    fn test_ensure_round_ready_blocks_on_open_matches() {
        let t = Uuid::new_v4();
        let config = SwissConfig::new(3, 0);
        let open = Match::new(t, 1, Uuid::new_v4(), Uuid::new_v4(), Some(1));

        let err = ensure_round_ready(&[open], 2, &config).unwrap_err();
        assert!(matches!(err, SwissError::RoundNotReady { round: 2, unfinished: 1 }));
    }

    #[test]
    fn test_ensure_round_ready_rejects_past_schedule() {
        let config = SwissConfig::new(3, 0);
        assert!(ensure_round_ready(&[], 4, &config).is_err());
        assert!(ensure_round_ready(&[], 3, &config).is_ok());
    }

    #[test]
    fn test_drop_closure_awards_opponent_the_win() {
        let t = Uuid::new_v4();
        let dropper = Uuid::new_v4();
        let opponent = Uuid::new_v4();
        let open = Match::new(t, 3, dropper, opponent, Some(2));
        let config = SwissConfig::new(5, 0);

        let closed = close_unfinished_for_drop(&[open], dropper, &config, Utc::now());

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].player1_game_wins, 0);
        assert_eq!(closed[0].player2_game_wins, 2);
        assert!(closed[0].is_complete());
    }

    #[test]
    fn test_drop_closure_ignores_finished_matches() {
        let t = Uuid::new_v4();
        let dropper = Uuid::new_v4();
        let mut done = Match::new(t, 1, dropper, Uuid::new_v4(), Some(1));
        done.report(2, 1, 0);
        let config = SwissConfig::new(5, 0);

        assert!(close_unfinished_for_drop(&[done], dropper, &config, Utc::now()).is_empty());
    }

    #[test]
    fn test_late_entry_forfeits_cover_missed_rounds() {
        let t = Uuid::new_v4();
        let reg = Registration::late_entry(t, Uuid::new_v4(), 9, 3);
        let config = SwissConfig::new(5, 0);

        let forfeits = forfeit_losses_for_late_entry(t, &reg, &config).unwrap();

        assert_eq!(forfeits.len(), 2);
        for (index, m) in forfeits.iter().enumerate() {
            assert_eq!(m.round_number, index as u32 + 1);
            assert!(m.is_loss_forfeit);
            assert!(!m.is_bye());
            assert_eq!(m.player1_game_wins, 0);
        }
    }

    #[test]
    fn test_forfeits_require_entry_round() {
        let t = Uuid::new_v4();
        let reg = Registration::new(t, Uuid::new_v4(), 1);
        let config = SwissConfig::new(5, 0);
        assert!(forfeit_losses_for_late_entry(t, &reg, &config).is_err());
    }

    #[test]
    fn test_finalize_round_as_draws() {
        let t = Uuid::new_v4();
        let open = Match::new(t, 2, Uuid::new_v4(), Uuid::new_v4(), Some(1));
        let closed = finalize_round_as_draws(&[open], 2, Utc::now());
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].player1_game_wins, 0);
        assert_eq!(closed[0].player2_game_wins, 0);
        assert!(closed[0].is_complete());
    }
}
