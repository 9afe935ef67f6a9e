//! Standings calculation.
//!
//! Aggregates every player's record, computes the configured tiebreaker
//! chain, and produces a stably sorted, totally ordered ranking. The
//! same snapshot plus the same seed always yields bitwise-identical
//! output.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::config::SwissConfig;
use crate::errors::SwissResult;
use crate::models::{
    Match, PlayerId, Registration, RegistrationStatus, StandingsEntry, TournamentId,
};
use crate::record::{self, PlayerRecord};
use crate::tiebreakers::TiebreakerContext;

/// Which tiebreaker chain a standings pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingsMode {
    /// `pairing_tiebreakers`, for bracket ordering
    Pairing,
    /// `standings_tiebreakers`, for display and final rankings
    Final,
}

/// Calculate standings over a consistent snapshot of the tournament.
///
/// Every active registration appears, as does any registration with at
/// least one completed match: dropped players keep their place in the
/// standings until the tournament ends. Residual ties after the full
/// chain break on ascending `sequence_id`.
pub fn calculate_standings(
    tournament_id: TournamentId,
    registrations: &[Registration],
    matches: &[Match],
    config: &SwissConfig,
    mode: StandingsMode,
) -> SwissResult<Vec<StandingsEntry>> {
    config.validate()?;
    record::validate_match_log(registrations, matches, config)?;

    let through_round = record::latest_completed_round(matches);

    // Records for every registration, not just the ranked ones: an
    // opponent who dropped still feeds OMW% and Buchholz.
    let records: HashMap<PlayerId, PlayerRecord> = registrations
        .iter()
        .map(|r| (r.player_id, record::aggregate(r.player_id, matches, through_round)))
        .collect();

    let chain = match mode {
        StandingsMode::Pairing => &config.pairing_tiebreakers,
        StandingsMode::Final => &config.standings_tiebreakers,
    };

    let ctx = TiebreakerContext {
        config,
        tournament_id,
        through_round,
        records: &records,
        matches,
    };

    let mut entries: Vec<StandingsEntry> = registrations
        .iter()
        .filter(|reg| {
            reg.status == RegistrationStatus::Active
                || records[&reg.player_id].matches_played > 0
        })
        .map(|reg| {
            let rec = &records[&reg.player_id];
            let tiebreakers: Vec<_> = chain.iter().map(|tb| (*tb, tb.compute(reg, &ctx))).collect();
            StandingsEntry {
                registration: reg.clone(),
                rank: 0,
                match_wins: rec.match_wins,
                match_losses: rec.match_losses,
                match_draws: rec.match_draws,
                match_points: rec.match_points,
                game_wins: rec.game_wins,
                game_losses: rec.game_losses,
                game_draws: rec.game_draws,
                matches_played: rec.matches_played,
                bye_count: rec.bye_count,
                opponents: rec.opponents.clone(),
                tiebreakers,
                dropped: reg.status == RegistrationStatus::Dropped,
            }
        })
        .collect();

    entries.sort_by(compare_entries);

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index as u32 + 1;
    }

    debug!(
        "standings for tournament {tournament_id}: {} players through round {through_round}",
        entries.len()
    );

    Ok(entries)
}

/// Sort key: match points, then the tiebreaker chain left to right, all
/// descending; ascending sequence_id settles anything left over.
fn compare_entries(a: &StandingsEntry, b: &StandingsEntry) -> Ordering {
    b.match_points
        .cmp(&a.match_points)
        .then_with(|| {
            for ((_, va), (_, vb)) in a.tiebreakers.iter().zip(&b.tiebreakers) {
                let ord = vb.total_cmp(va);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        })
        .then_with(|| a.registration.sequence_id.cmp(&b.registration.sequence_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tiebreaker;
    use crate::models::Match;
    use uuid::Uuid;

    fn registrations(tournament: TournamentId, count: u32) -> Vec<Registration> {
        (1..=count)
            .map(|i| Registration::new(tournament, Uuid::new_v4(), i))
            .collect()
    }

    fn reported(
        tournament: TournamentId,
        round: u32,
        p1: PlayerId,
        p2: PlayerId,
        score: (u32, u32),
    ) -> Match {
        let mut m = Match::new(tournament, round, p1, p2, None);
        m.report(score.0, score.1, 0);
        m
    }

    #[test]
    fn test_no_matches_all_zero_records() {
        let t = Uuid::new_v4();
        let regs = registrations(t, 4);
        let config = SwissConfig::new(3, 42);

        let standings =
            calculate_standings(t, &regs, &[], &config, StandingsMode::Final).unwrap();

        assert_eq!(standings.len(), 4);
        for entry in &standings {
            assert_eq!(entry.match_points, 0);
            assert_eq!(entry.matches_played, 0);
        }
        let mut ranks: Vec<u32> = standings.iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_points_dominate_rank() {
        let t = Uuid::new_v4();
        let regs = registrations(t, 4);
        let [a, b, c, d] = [
            regs[0].player_id,
            regs[1].player_id,
            regs[2].player_id,
            regs[3].player_id,
        ];
        let matches = vec![
            reported(t, 1, a, b, (2, 0)),
            reported(t, 1, c, d, (2, 0)),
            reported(t, 2, a, c, (2, 0)),
            reported(t, 2, b, d, (2, 0)),
        ];
        let config = SwissConfig::new(3, 42);

        let standings =
            calculate_standings(t, &regs, &matches, &config, StandingsMode::Final).unwrap();

        assert_eq!(standings[0].registration.player_id, a);
        assert_eq!(standings[0].match_points, 6);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[3].registration.player_id, d);
        assert_eq!(standings[3].match_points, 0);
        assert_eq!(standings[3].rank, 4);
    }

    #[test]
    fn test_draw_scores_one_point_each() {
        let t = Uuid::new_v4();
        let regs = registrations(t, 2);
        let mut m = Match::new(t, 1, regs[0].player_id, regs[1].player_id, None);
        m.report(1, 1, 1);
        let config = SwissConfig::new(3, 42);

        let standings =
            calculate_standings(t, &regs, &[m], &config, StandingsMode::Final).unwrap();

        for entry in &standings {
            assert_eq!(entry.match_draws, 1);
            assert_eq!(entry.match_points, 1);
        }
    }

    #[test]
    fn test_dropped_player_stays_ranked_with_flag() {
        let t = Uuid::new_v4();
        let mut regs = registrations(t, 2);
        let m = reported(t, 1, regs[0].player_id, regs[1].player_id, (2, 0));
        regs[1].drop_after(1);
        let config = SwissConfig::new(3, 42);

        let standings =
            calculate_standings(t, &regs, &[m], &config, StandingsMode::Final).unwrap();

        assert_eq!(standings.len(), 2);
        let dropped = &standings[1];
        assert!(dropped.dropped);
        assert_eq!(dropped.match_losses, 1);
    }

    #[test]
    fn test_tiebreaker_chain_order_preserved_in_entry() {
        let t = Uuid::new_v4();
        let regs = registrations(t, 2);
        let m = reported(t, 1, regs[0].player_id, regs[1].player_id, (2, 1));
        let config = SwissConfig::new(3, 42);

        let standings =
            calculate_standings(t, &regs, &[m], &config, StandingsMode::Final).unwrap();

        let kinds: Vec<Tiebreaker> = standings[0].tiebreakers.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                Tiebreaker::Omw,
                Tiebreaker::Gw,
                Tiebreaker::Ogw,
                Tiebreaker::Random
            ]
        );
    }

    #[test]
    fn test_determinism_with_fixed_seed() {
        let t = Uuid::new_v4();
        let regs = registrations(t, 3);
        let [a, b, c] = [regs[0].player_id, regs[1].player_id, regs[2].player_id];
        let matches = vec![
            reported(t, 1, a, b, (2, 0)),
            reported(t, 2, b, c, (2, 0)),
            reported(t, 3, c, a, (2, 0)),
        ];
        let config = SwissConfig::new(3, 42);

        let one =
            calculate_standings(t, &regs, &matches, &config, StandingsMode::Final).unwrap();
        let two =
            calculate_standings(t, &regs, &matches, &config, StandingsMode::Final).unwrap();

        let order_one: Vec<PlayerId> = one.iter().map(|e| e.registration.player_id).collect();
        let order_two: Vec<PlayerId> = two.iter().map(|e| e.registration.player_id).collect();
        assert_eq!(order_one, order_two);
        for (x, y) in one.iter().zip(&two) {
            for ((_, vx), (_, vy)) in x.tiebreakers.iter().zip(&y.tiebreakers) {
                assert_eq!(vx.to_bits(), vy.to_bits());
            }
        }
    }

    #[test]
    fn test_late_entry_without_matches_not_listed() {
        let t = Uuid::new_v4();
        let mut regs = registrations(t, 3);
        regs[2] = Registration::late_entry(t, Uuid::new_v4(), 3, 3);
        let m = reported(t, 1, regs[0].player_id, regs[1].player_id, (2, 0));
        let config = SwissConfig::new(5, 42);

        let standings =
            calculate_standings(t, &regs, &[m], &config, StandingsMode::Final).unwrap();

        assert_eq!(standings.len(), 2);
    }
}
