//! Tiebreaker calculators.
//!
//! Each calculator is a pure function of the match log; dispatch is a
//! closed enum so an unknown tiebreaker is unrepresentable. Randomness
//! is never ambient: the random tiebreaker derives a fresh PRNG from
//! the configured seed keyed by tournament, round, and player, so the
//! same inputs always produce the same value.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BuchholzVariant, SwissConfig, Tiebreaker};
use crate::models::{Match, MatchOutcome, PlayerId, Registration, TournamentId};
use crate::record::PlayerRecord;

/// Shared inputs for a tiebreaker pass over one tournament snapshot.
pub struct TiebreakerContext<'a> {
    pub config: &'a SwissConfig,
    pub tournament_id: TournamentId,
    /// Highest completed round in the snapshot
    pub through_round: u32,
    /// Aggregated record for every player in the snapshot
    pub records: &'a HashMap<PlayerId, PlayerRecord>,
    pub matches: &'a [Match],
}

/// Derive a PRNG from the configured seed and a set of domain keys.
///
/// `DefaultHasher` uses fixed SipHash keys, so the derivation is stable
/// across runs and platforms.
pub fn derive_rng(seed: u64, tournament_id: TournamentId, round: u32, player: Option<PlayerId>) -> StdRng {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    tournament_id.hash(&mut hasher);
    round.hash(&mut hasher);
    if let Some(player) = player {
        player.hash(&mut hasher);
    }
    StdRng::seed_from_u64(hasher.finish())
}

impl Tiebreaker {
    /// Compute this tiebreaker for `player`. Higher is better.
    pub fn compute(self, player: &Registration, ctx: &TiebreakerContext) -> f64 {
        let record = ctx
            .records
            .get(&player.player_id)
            .cloned()
            .unwrap_or_default();

        match self {
            Self::Mw => match_win_percentage(&record, ctx.config),
            Self::Gw => game_win_percentage(&record, ctx.config),
            Self::Omw => opponent_average(&record, ctx, |r, c| match_win_percentage(r, c)),
            Self::Ogw => opponent_average(&record, ctx, |r, c| game_win_percentage(r, c)),
            Self::MatchWins => f64::from(record.match_wins),
            Self::GameWins => f64::from(record.game_wins),
            Self::Buchholz => buchholz(&record, ctx),
            Self::SonnebornBerger => sonneborn_berger(player.player_id, ctx),
            Self::Random => {
                let mut rng = derive_rng(
                    ctx.config.seed,
                    ctx.tournament_id,
                    ctx.through_round,
                    Some(player.player_id),
                );
                rng.random::<f64>()
            }
            Self::PlayerNumber => 1.0 / f64::from(player.sequence_id.max(1)),
        }
    }
}

/// MW%: match points over points available in non-bye matches, floored.
/// With no non-bye matches the floor is returned outright.
fn match_win_percentage(record: &PlayerRecord, config: &SwissConfig) -> f64 {
    let denominator = record.matches_excluding_byes();
    if denominator == 0 {
        return config.omw_floor;
    }
    let ratio = f64::from(record.match_points) / (3.0 * f64::from(denominator));
    ratio.max(config.omw_floor)
}

/// GW%: game wins over total games, floored. Bye games count on both
/// sides of the ratio. Below the minimum game count the value is 0.
fn game_win_percentage(record: &PlayerRecord, config: &SwissConfig) -> f64 {
    let total = record.total_games();
    if total < config.min_games_for_gw || total == 0 {
        return 0.0;
    }
    let ratio = f64::from(record.game_wins) / f64::from(total);
    ratio.max(config.gw_floor)
}

/// Mean of `stat` over the player's non-bye opponents; 0 with none.
fn opponent_average(
    record: &PlayerRecord,
    ctx: &TiebreakerContext,
    stat: impl Fn(&PlayerRecord, &SwissConfig) -> f64,
) -> f64 {
    if record.opponents.is_empty() {
        return 0.0;
    }
    let sum: f64 = record
        .opponents
        .iter()
        .map(|opponent| {
            ctx.records
                .get(opponent)
                .map(|r| stat(r, ctx.config))
                .unwrap_or(0.0)
        })
        .sum();
    sum / record.opponents.len() as f64
}

/// Sum of opponents' match points, with the configured variant's drops.
fn buchholz(record: &PlayerRecord, ctx: &TiebreakerContext) -> f64 {
    let mut scores: Vec<u32> = record
        .opponents
        .iter()
        .map(|opponent| {
            ctx.records
                .get(opponent)
                .map(|r| r.match_points)
                .unwrap_or(0)
        })
        .collect();
    scores.sort_unstable();

    let dropped: &[u32] = match ctx.config.buchholz_variant {
        BuchholzVariant::Median if scores.len() >= 3 => &scores[1..scores.len() - 1],
        BuchholzVariant::Modified if scores.len() >= 2 => &scores[1..],
        _ => &scores[..],
    };
    dropped.iter().map(|&p| f64::from(p)).sum()
}

/// Sum over opponents of their match points weighted by the result
/// against them: 1 for a win, 0.5 for a draw, 0 for a loss.
fn sonneborn_berger(player_id: PlayerId, ctx: &TiebreakerContext) -> f64 {
    ctx.matches
        .iter()
        .filter(|m| {
            m.is_complete()
                && m.round_number <= ctx.through_round
                && !m.is_bye()
                && !m.is_loss_forfeit
                && m.involves(player_id)
        })
        .filter_map(|m| {
            let opponent = m.opponent_of(player_id)?;
            let opponent_points = ctx.records.get(&opponent).map(|r| r.match_points)?;
            let result = MatchOutcome::for_player(m, player_id).value();
            Some(f64::from(opponent_points) * result)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ByePoints;
    use crate::record::aggregate;
    use uuid::Uuid;

    fn record_with(wins: u32, losses: u32, draws: u32, byes: u32) -> PlayerRecord {
        PlayerRecord {
            match_wins: wins + byes,
            match_losses: losses,
            match_draws: draws,
            match_points: (wins + byes) * 3 + draws,
            matches_played: wins + losses + draws + byes,
            bye_count: byes,
            ..Default::default()
        }
    }

    #[test]
    fn test_mw_floor_applies() {
        let config = SwissConfig::new(5, 0);
        // 0-3 record sits on the floor.
        let record = record_with(0, 3, 0, 0);
        assert_eq!(match_win_percentage(&record, &config), 0.33);

        // 2-1 record: 6 points of 9 available.
        let record = record_with(2, 1, 0, 0);
        let mw = match_win_percentage(&record, &config);
        assert!((mw - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mw_all_byes_returns_floor() {
        let config = SwissConfig::new(5, 0);
        let record = record_with(0, 0, 0, 2);
        assert_eq!(match_win_percentage(&record, &config), 0.33);
    }

    #[test]
    fn test_gw_counts_bye_games() {
        let t = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut m = Match::new(t, 1, a, b, Some(1));
        m.report(2, 1, 0);
        let bye = Match::bye(t, 2, a, ByePoints::default());
        let matches = vec![m, bye];

        let config = SwissConfig::new(5, 0);
        let record = aggregate(a, &matches, 2);
        // 4 game wins of 5 total, bye games included.
        let gw = game_win_percentage(&record, &config);
        assert!((gw - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_gw_below_min_games_is_zero() {
        let mut config = SwissConfig::new(5, 0);
        config.min_games_for_gw = 4;
        let record = PlayerRecord {
            game_wins: 2,
            game_losses: 1,
            ..Default::default()
        };
        assert_eq!(game_win_percentage(&record, &config), 0.0);
    }

    fn triangle() -> (Vec<Registration>, Vec<Match>, TournamentId) {
        // A beat B, B beat C, C beat A, all 2-0.
        let t = Uuid::new_v4();
        let regs: Vec<Registration> = (1..=3)
            .map(|i| Registration::new(t, Uuid::new_v4(), i))
            .collect();
        let mut m1 = Match::new(t, 1, regs[0].player_id, regs[1].player_id, Some(1));
        m1.report(2, 0, 0);
        let mut m2 = Match::new(t, 2, regs[1].player_id, regs[2].player_id, Some(1));
        m2.report(2, 0, 0);
        let mut m3 = Match::new(t, 3, regs[2].player_id, regs[0].player_id, Some(1));
        m3.report(2, 0, 0);
        (regs, vec![m1, m2, m3], t)
    }

    fn context_records(matches: &[Match], regs: &[Registration]) -> HashMap<PlayerId, PlayerRecord> {
        regs.iter()
            .map(|r| (r.player_id, aggregate(r.player_id, matches, 3)))
            .collect()
    }

    #[test]
    fn test_omw_triangle_is_half() {
        let (regs, matches, t) = triangle();
        let config = SwissConfig::new(3, 42);
        let records = context_records(&matches, &regs);
        let ctx = TiebreakerContext {
            config: &config,
            tournament_id: t,
            through_round: 3,
            records: &records,
            matches: &matches,
        };

        for reg in &regs {
            let omw = Tiebreaker::Omw.compute(reg, &ctx);
            assert!((omw - 0.5).abs() < 1e-9, "triangle OMW should be 0.5");
        }
    }

    #[test]
    fn test_omw_only_byes_is_zero() {
        let t = Uuid::new_v4();
        let reg = Registration::new(t, Uuid::new_v4(), 1);
        let bye = Match::bye(t, 1, reg.player_id, ByePoints::default());
        let matches = vec![bye];
        let records = context_records(&matches, std::slice::from_ref(&reg));
        let config = SwissConfig::new(3, 0);
        let ctx = TiebreakerContext {
            config: &config,
            tournament_id: t,
            through_round: 1,
            records: &records,
            matches: &matches,
        };

        assert_eq!(Tiebreaker::Omw.compute(&reg, &ctx), 0.0);
        assert_eq!(Tiebreaker::Ogw.compute(&reg, &ctx), 0.0);
    }

    #[test]
    fn test_buchholz_variants() {
        let record = PlayerRecord {
            opponents: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            ..Default::default()
        };
        let mut records = HashMap::new();
        for (i, opponent) in record.opponents.iter().enumerate() {
            records.insert(
                *opponent,
                PlayerRecord {
                    match_points: [9, 3, 6][i],
                    ..Default::default()
                },
            );
        }
        let matches: Vec<Match> = Vec::new();
        let t = Uuid::new_v4();

        let expectations = [
            (BuchholzVariant::Standard, 18.0),
            (BuchholzVariant::Median, 6.0),
            (BuchholzVariant::Modified, 15.0),
        ];

        for (variant, expected) in expectations {
            let mut config = SwissConfig::chess_style(5, 0);
            config.buchholz_variant = variant;
            let ctx = TiebreakerContext {
                config: &config,
                tournament_id: t,
                through_round: 3,
                records: &records,
                matches: &matches,
            };
            assert_eq!(buchholz(&record, &ctx), expected, "{variant:?}");
        }
    }

    #[test]
    fn test_buchholz_median_falls_back_below_three_opponents() {
        let record = PlayerRecord {
            opponents: vec![Uuid::new_v4(), Uuid::new_v4()],
            ..Default::default()
        };
        let mut records = HashMap::new();
        for opponent in &record.opponents {
            records.insert(
                *opponent,
                PlayerRecord {
                    match_points: 3,
                    ..Default::default()
                },
            );
        }
        let matches: Vec<Match> = Vec::new();
        let mut config = SwissConfig::chess_style(5, 0);
        config.buchholz_variant = BuchholzVariant::Median;
        let ctx = TiebreakerContext {
            config: &config,
            tournament_id: Uuid::new_v4(),
            through_round: 2,
            records: &records,
            matches: &matches,
        };

        assert_eq!(buchholz(&record, &ctx), 6.0);
    }

    #[test]
    fn test_sonneborn_berger_weighted_by_result() {
        let (regs, matches, t) = triangle();
        let config = SwissConfig::chess_style(3, 0);
        let records = context_records(&matches, &regs);
        let ctx = TiebreakerContext {
            config: &config,
            tournament_id: t,
            through_round: 3,
            records: &records,
            matches: &matches,
        };

        // Everyone is on 3 points; each player beat exactly one opponent.
        for reg in &regs {
            let sb = Tiebreaker::SonnebornBerger.compute(reg, &ctx);
            assert!((sb - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_random_is_deterministic_per_key() {
        let t = Uuid::new_v4();
        let p = Uuid::new_v4();
        let a: f64 = derive_rng(42, t, 3, Some(p)).random();
        let b: f64 = derive_rng(42, t, 3, Some(p)).random();
        assert_eq!(a.to_bits(), b.to_bits());

        let other: f64 = derive_rng(42, t, 4, Some(p)).random();
        assert_ne!(a.to_bits(), other.to_bits());
    }

    #[test]
    fn test_player_number_prefers_earlier_registration() {
        let t = Uuid::new_v4();
        let first = Registration::new(t, Uuid::new_v4(), 1);
        let later = Registration::new(t, Uuid::new_v4(), 8);
        let records = HashMap::new();
        let matches: Vec<Match> = Vec::new();
        let config = SwissConfig::new(3, 0);
        let ctx = TiebreakerContext {
            config: &config,
            tournament_id: t,
            through_round: 0,
            records: &records,
            matches: &matches,
        };

        assert!(
            Tiebreaker::PlayerNumber.compute(&first, &ctx)
                > Tiebreaker::PlayerNumber.compute(&later, &ctx)
        );
    }
}
