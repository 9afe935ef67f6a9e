//! Match-record aggregation.
//!
//! Derives a player's win/loss/draw record, game tallies, match points,
//! bye count, and opponent list from the match log. Only completed
//! matches count; byes and forfeit losses contribute to the record but
//! never to the opponent list.

use std::collections::{HashMap, HashSet};

use crate::config::SwissConfig;
use crate::errors::{SwissError, SwissResult};
use crate::models::{Match, MatchOutcome, PlayerId, Registration};

/// Everything a standings entry needs except rank and tiebreakers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub match_wins: u32,
    pub match_losses: u32,
    pub match_draws: u32,
    pub match_points: u32,
    pub game_wins: u32,
    pub game_losses: u32,
    pub game_draws: u32,
    pub matches_played: u32,
    pub bye_count: u32,
    pub forfeit_count: u32,
    /// Opponents in encounter order, byes and forfeits excluded
    pub opponents: Vec<PlayerId>,
}

impl PlayerRecord {
    /// Match points are 3 per win and 1 per draw.
    fn finish(mut self) -> Self {
        self.match_points = self.match_wins * 3 + self.match_draws;
        self
    }

    /// Matches that count toward the MW% denominator (byes excluded).
    pub fn matches_excluding_byes(&self) -> u32 {
        self.matches_played - self.bye_count
    }

    /// Total games played, bye games included.
    pub fn total_games(&self) -> u32 {
        self.game_wins + self.game_losses + self.game_draws
    }
}

/// Aggregate `player_id`'s record from completed matches at or below
/// `through_round`.
pub fn aggregate(player_id: PlayerId, matches: &[Match], through_round: u32) -> PlayerRecord {
    let mut record = PlayerRecord::default();

    let mut considered: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_complete() && m.round_number <= through_round && m.involves(player_id))
        .collect();
    considered.sort_by_key(|m| m.round_number);

    for m in considered {
        record.matches_played += 1;

        match MatchOutcome::for_player(m, player_id) {
            MatchOutcome::Win => record.match_wins += 1,
            MatchOutcome::Loss => record.match_losses += 1,
            MatchOutcome::Draw => record.match_draws += 1,
        }

        let (own, theirs) = m.game_wins_for(player_id);
        record.game_wins += own;
        record.game_losses += theirs;
        record.game_draws += m.draws;

        if m.is_bye() {
            record.bye_count += 1;
        } else if m.is_loss_forfeit {
            record.forfeit_count += 1;
        } else if let Some(opponent) = m.opponent_of(player_id) {
            record.opponents.push(opponent);
        }
    }

    record.finish()
}

/// The highest round with at least one completed match, or 0.
pub fn latest_completed_round(matches: &[Match]) -> u32 {
    matches
        .iter()
        .filter(|m| m.is_complete())
        .map(|m| m.round_number)
        .max()
        .unwrap_or(0)
}

/// Count of past byes per player.
pub fn bye_counts(matches: &[Match]) -> HashMap<PlayerId, u32> {
    let mut counts = HashMap::new();
    for m in matches.iter().filter(|m| m.is_bye() && m.is_complete()) {
        *counts.entry(m.player1_id).or_insert(0) += 1;
    }
    counts
}

/// Map from player to the set of opponents previously faced in any
/// non-bye match.
pub fn pairing_history(matches: &[Match]) -> HashMap<PlayerId, HashSet<PlayerId>> {
    let mut history: HashMap<PlayerId, HashSet<PlayerId>> = HashMap::new();
    for m in matches {
        if let Some(p2) = m.player2_id {
            history.entry(m.player1_id).or_default().insert(p2);
            history.entry(p2).or_default().insert(m.player1_id);
        }
    }
    history
}

/// Sanity-check the match log against the registration list.
///
/// Rejects players missing from registrations, duplicate same-round
/// pairings, degenerate self-matches, and gaps in round numbering.
pub fn validate_match_log(
    registrations: &[Registration],
    matches: &[Match],
    config: &SwissConfig,
) -> SwissResult<()> {
    let known: HashSet<PlayerId> = registrations.iter().map(|r| r.player_id).collect();
    let mut seen_rounds: HashSet<u32> = HashSet::new();
    let mut round_pairs: HashSet<(u32, PlayerId, PlayerId)> = HashSet::new();

    for m in matches {
        if m.round_number == 0 {
            return Err(SwissError::InvalidInput {
                reason: format!("match {} has round number 0", m.id),
            });
        }
        if !known.contains(&m.player1_id) {
            return Err(SwissError::InvalidInput {
                reason: format!("match {} references unregistered player {}", m.id, m.player1_id),
            });
        }
        seen_rounds.insert(m.round_number);

        if let Some(p2) = m.player2_id {
            if p2 == m.player1_id {
                return Err(SwissError::InvalidInput {
                    reason: format!("match {} pairs a player against themselves", m.id),
                });
            }
            if !known.contains(&p2) {
                return Err(SwissError::InvalidInput {
                    reason: format!("match {} references unregistered player {p2}", m.id),
                });
            }
            let (lo, hi) = if m.player1_id < p2 {
                (m.player1_id, p2)
            } else {
                (p2, m.player1_id)
            };
            if !round_pairs.insert((m.round_number, lo, hi)) {
                return Err(SwissError::InvalidInput {
                    reason: format!(
                        "players {lo} and {hi} are paired twice in round {}",
                        m.round_number
                    ),
                });
            }
        }
    }

    if let Some(&max_round) = seen_rounds.iter().max() {
        if max_round > config.rounds {
            return Err(SwissError::InvalidInput {
                reason: format!(
                    "match log reaches round {max_round} of a {}-round tournament",
                    config.rounds
                ),
            });
        }
        for round in 1..=max_round {
            if !seen_rounds.contains(&round) {
                return Err(SwissError::InvalidInput {
                    reason: format!("round numbering is not contiguous: round {round} is missing"),
                });
            }
        }
    }

    Ok(())
}
