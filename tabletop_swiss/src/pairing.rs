//! Swiss pairing engine.
//!
//! Round 1 pairs by seeded shuffle or registration order. Later rounds
//! pair inside match-point brackets with a greedy scan, carrying
//! unpairable players down, rotating byes under the per-player cap, and
//! refusing to ever emit a silent rematch. When the constraints cannot
//! be satisfied the engine reports the failure together with the
//! operator actions that would unblock the tournament.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{ByeAssignment, Round1Mode, SwissConfig};
use crate::errors::{RemedialAction, SwissError, SwissResult};
use crate::models::{Match, MatchOutcome, Pairing, PlayerId, Registration, TournamentId};
use crate::record;
use crate::standings::{self, StandingsMode};
use crate::tiebreakers::derive_rng;

/// Pair the first round.
///
/// `random` mode permutes the field with the seeded PRNG; `seeded` mode
/// pairs 1v2, 3v4 and so on by `sequence_id`. With an odd field the
/// last player after ordering takes the bye, so in seeded mode the
/// lowest seed sits out.
pub fn pair_round_1(
    tournament_id: TournamentId,
    registrations: &[Registration],
    config: &SwissConfig,
) -> SwissResult<Vec<Pairing>> {
    config.validate()?;

    let mut field: Vec<&Registration> = registrations
        .iter()
        .filter(|r| r.is_paired_in(1))
        .collect();
    if field.len() < 2 {
        return Err(SwissError::TooFewPlayers {
            eligible: field.len(),
        });
    }

    field.sort_by_key(|r| r.sequence_id);
    if config.round1_mode == Round1Mode::Random {
        let mut rng = derive_rng(config.seed, tournament_id, 1, None);
        field.shuffle(&mut rng);
    }

    let mut pairings = Vec::with_capacity(field.len() / 2 + 1);
    for (table, pair) in field.chunks_exact(2).enumerate() {
        pairings.push(Pairing {
            round_number: 1,
            player1_id: pair[0].player_id,
            player2_id: Some(pair[1].player_id),
            table_number: Some(table as u32 + 1),
            is_pair_down: false,
            is_bye: false,
        });
    }
    if field.len() % 2 == 1 {
        let bye = field[field.len() - 1];
        info!(
            "round 1 bye for tournament {tournament_id} goes to sequence {}",
            bye.sequence_id
        );
        pairings.push(bye_pairing(1, bye.player_id));
    }

    Ok(pairings)
}

/// Pair round `round_number` (2 or later) from the completed match log.
pub fn pair_round(
    tournament_id: TournamentId,
    registrations: &[Registration],
    matches: &[Match],
    config: &SwissConfig,
    round_number: u32,
) -> SwissResult<Vec<Pairing>> {
    config.validate()?;
    record::validate_match_log(registrations, matches, config)?;

    if round_number < 2 {
        return Err(SwissError::InvalidInput {
            reason: "pair_round handles rounds 2 and later; use pair_round_1".into(),
        });
    }
    if round_number > config.rounds {
        return Err(SwissError::InvalidInput {
            reason: format!(
                "cannot pair round {round_number} of a {}-round tournament",
                config.rounds
            ),
        });
    }
    if matches.iter().any(|m| m.round_number >= round_number) {
        return Err(SwissError::InvalidInput {
            reason: format!("match log already contains round {round_number} or later"),
        });
    }
    let unfinished = matches.iter().filter(|m| !m.is_complete()).count();
    if unfinished > 0 {
        return Err(SwissError::RoundNotReady {
            round: round_number,
            unfinished,
        });
    }

    let standings = standings::calculate_standings(
        tournament_id,
        registrations,
        matches,
        config,
        StandingsMode::Pairing,
    )?;

    // Seats in rank order, restricted to players who sit in this round.
    let eligible: HashSet<PlayerId> = registrations
        .iter()
        .filter(|r| r.is_paired_in(round_number))
        .map(|r| r.player_id)
        .collect();
    let pair_down = pair_down_counts(matches);
    let mut seats: Vec<Seat> = standings
        .iter()
        .filter(|e| eligible.contains(&e.registration.player_id))
        .enumerate()
        .map(|(position, entry)| Seat {
            player_id: entry.registration.player_id,
            match_points: entry.match_points,
            // Random and player-number never tie, so only the
            // substantive tiebreakers decide who counts as level for
            // bye assignment.
            tiebreakers: entry
                .tiebreakers
                .iter()
                .filter(|(kind, _)| !kind.is_total())
                .map(|(_, v)| *v)
                .collect(),
            pair_down_count: pair_down
                .get(&entry.registration.player_id)
                .copied()
                .unwrap_or(0),
            position,
        })
        .collect();

    // A late entry whose forfeit losses have not been recorded yet has
    // no standings row; seat them at the bottom of the field.
    let seated: HashSet<PlayerId> = seats.iter().map(|s| s.player_id).collect();
    let mut unseated: Vec<&Registration> = registrations
        .iter()
        .filter(|r| eligible.contains(&r.player_id) && !seated.contains(&r.player_id))
        .collect();
    unseated.sort_by_key(|r| r.sequence_id);
    for reg in unseated {
        let position = seats.len();
        seats.push(Seat {
            player_id: reg.player_id,
            match_points: 0,
            tiebreakers: Vec::new(),
            pair_down_count: 0,
            position,
        });
    }

    if seats.len() < 2 {
        return Err(SwissError::TooFewPlayers {
            eligible: seats.len(),
        });
    }

    let history = if config.avoid_repeat_pairings {
        record::pairing_history(matches)
    } else {
        HashMap::new()
    };
    let byes = record::bye_counts(matches);
    let mut rng = derive_rng(config.seed, tournament_id, round_number, None);

    let plan = if seats.len() % 2 == 0 {
        pair_field(&seats, &history, config)
            .map(|pairs| (pairs, None))
            .map_err(|leftovers| impossible(&leftovers, &seats))?
    } else {
        pair_odd_field(&seats, &history, &byes, config, &mut rng)?
    };
    let (pairs, bye) = plan;

    let mut pairings = Vec::with_capacity(pairs.len() + 1);
    for (table, (p, q)) in pairs.iter().enumerate() {
        pairings.push(Pairing {
            round_number,
            player1_id: p.player_id,
            player2_id: Some(q.player_id),
            table_number: Some(table as u32 + 1),
            is_pair_down: p.match_points != q.match_points,
            is_bye: false,
        });
    }
    if let Some(bye_seat) = bye {
        pairings.push(bye_pairing(round_number, bye_seat.player_id));
    }

    verify_round(&pairings, &seats)?;
    debug!(
        "round {round_number} for tournament {tournament_id}: {} tables, {} byes",
        pairs.len(),
        pairings.len() - pairs.len()
    );
    Ok(pairings)
}

/// One player's place in the pairing pass.
#[derive(Debug, Clone)]
struct Seat {
    player_id: PlayerId,
    match_points: u32,
    tiebreakers: Vec<f64>,
    pair_down_count: u32,
    /// Index in pairing-standings rank order
    position: usize,
}

impl Seat {
    fn same_key(&self, other: &Seat) -> bool {
        self.match_points == other.match_points
            && self.tiebreakers.len() == other.tiebreakers.len()
            && self
                .tiebreakers
                .iter()
                .zip(&other.tiebreakers)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

fn bye_pairing(round_number: u32, player_id: PlayerId) -> Pairing {
    Pairing {
        round_number,
        player1_id: player_id,
        player2_id: None,
        table_number: None,
        is_pair_down: false,
        is_bye: true,
    }
}

fn compatible(p: &Seat, q: &Seat, history: &HashMap<PlayerId, HashSet<PlayerId>>) -> bool {
    history
        .get(&p.player_id)
        .map_or(true, |faced| !faced.contains(&q.player_id))
}

/// Pair an even field bracket by bracket.
///
/// Carried players sit at the top of the next bracket in their prior
/// order; a carried player who fails again simply keeps falling, which
/// covers the occasional two-bracket carry without special casing.
/// Returns the pairs in emission order, or the unpairable leftovers.
fn pair_field<'a>(
    seats: &'a [Seat],
    history: &HashMap<PlayerId, HashSet<PlayerId>>,
    config: &SwissConfig,
) -> Result<Vec<(&'a Seat, &'a Seat)>, Vec<&'a Seat>> {
    let mut pairs: Vec<(&Seat, &Seat)> = Vec::with_capacity(seats.len() / 2);
    let mut carried: Vec<&Seat> = Vec::new();

    for bracket in brackets(seats) {
        let mut group: Vec<&Seat> = carried.drain(..).chain(bracket.iter().copied()).collect();

        // Someone has to leave an odd bracket; let pair-down history
        // pick who, rather than whoever the greedy scan strands.
        if group.len() % 2 == 1 && config.track_pair_downs {
            let chosen = group
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.pair_down_count
                        .cmp(&b.pair_down_count)
                        .then(b.position.cmp(&a.position))
                })
                .map(|(index, _)| index);
            if let Some(index) = chosen {
                carried.push(group.remove(index));
            }
        }

        let mut bracket_pairs = Vec::new();
        while group.len() >= 2 {
            let p = group.remove(0);
            match group.iter().position(|q| compatible(p, q, history)) {
                Some(q_index) => {
                    let q = group.remove(q_index);
                    bracket_pairs.push((p, q));
                }
                None => carried.push(p),
            }
        }
        carried.extend(group.drain(..));
        carried.sort_by_key(|s| s.position);
        pairs.extend(bracket_pairs);
    }

    if carried.is_empty() {
        return Ok(pairs);
    }
    debug!("backtracking over {} stranded players", carried.len());
    backtrack(pairs, carried, history)
}

/// One-level backtrack: break an already-emitted pair to free opponents
/// for the stranded players, latest pairs first.
fn backtrack<'a>(
    mut pairs: Vec<(&'a Seat, &'a Seat)>,
    mut stranded: Vec<&'a Seat>,
    history: &HashMap<PlayerId, HashSet<PlayerId>>,
) -> Result<Vec<(&'a Seat, &'a Seat)>, Vec<&'a Seat>> {
    'outer: while stranded.len() >= 2 {
        let x = stranded[0];
        let y = stranded[1];
        for index in (0..pairs.len()).rev() {
            let (a, b) = pairs[index];
            let rearranged = if compatible(a, x, history) && compatible(b, y, history) {
                Some(((a, x), (b, y)))
            } else if compatible(a, y, history) && compatible(b, x, history) {
                Some(((a, y), (b, x)))
            } else {
                None
            };
            if let Some((first, second)) = rearranged {
                pairs.splice(index..=index, [first, second]);
                stranded.drain(..2);
                continue 'outer;
            }
        }
        return Err(stranded);
    }
    if stranded.is_empty() {
        Ok(pairs)
    } else {
        Err(stranded)
    }
}

/// Pair an odd field: pick the bye first, then pair the rest. If the
/// chosen bye strands the field, shift the bye upward through the
/// remaining candidates before giving up.
fn pair_odd_field<'a>(
    seats: &'a [Seat],
    history: &HashMap<PlayerId, HashSet<PlayerId>>,
    byes: &HashMap<PlayerId, u32>,
    config: &SwissConfig,
    rng: &mut impl Rng,
) -> SwissResult<(Vec<(&'a Seat, &'a Seat)>, Option<&'a Seat>)> {
    let candidates = bye_candidates(seats, byes, config, rng)?;

    let mut last_leftovers: Vec<&Seat> = Vec::new();
    for (attempt, bye_index) in candidates.iter().enumerate() {
        let bye_seat = &seats[*bye_index];
        let rest: Vec<Seat> = seats
            .iter()
            .filter(|s| s.player_id != bye_seat.player_id)
            .cloned()
            .collect();
        match pair_field(&rest, history, config) {
            Ok(pairs) => {
                if attempt > 0 {
                    warn!(
                        "bye shifted upward {attempt} candidate(s) to keep the field pairable"
                    );
                }
                // Re-borrow the pairs against the caller's seat slice.
                let by_id: HashMap<PlayerId, &Seat> =
                    seats.iter().map(|s| (s.player_id, s)).collect();
                let pairs = pairs
                    .into_iter()
                    .map(|(p, q)| (by_id[&p.player_id], by_id[&q.player_id]))
                    .collect();
                return Ok((pairs, Some(bye_seat)));
            }
            Err(leftovers) => {
                last_leftovers = leftovers
                    .into_iter()
                    .filter_map(|s| seats.iter().find(|orig| orig.player_id == s.player_id))
                    .collect();
            }
        }
    }

    Err(impossible(&last_leftovers, seats))
}

/// Bye candidates from the bottom of the standings upward. The bye cap
/// only filters: a cap-ineligible player at the bottom shifts the bye
/// to the next player up, it never sends the bye to a better-placed
/// player with fewer byes. The configured policy breaks exact
/// standings ties.
fn bye_candidates(
    seats: &[Seat],
    byes: &HashMap<PlayerId, u32>,
    config: &SwissConfig,
    rng: &mut impl Rng,
) -> SwissResult<Vec<usize>> {
    let mut eligible: Vec<usize> = (0..seats.len())
        .filter(|&i| {
            let count = byes.get(&seats[i].player_id).copied().unwrap_or(0);
            config.max_byes_per_player.allows(count)
        })
        .collect();

    if eligible.is_empty() {
        let mut suggestions: Vec<RemedialAction> = seats
            .last()
            .map(|s| RemedialAction::DropPlayer(s.player_id))
            .into_iter()
            .collect();
        suggestions.push(RemedialAction::EndSwiss);
        return Err(SwissError::ImpossiblePairing {
            reason: "every player has reached the bye cap".into(),
            suggestions,
        });
    }

    // Lowest-ranked first: the structurally stranded player at the
    // bottom of the lowest bracket takes the bye whenever eligible.
    eligible.sort_by(|&a, &b| b.cmp(&a));

    // Among candidates tied on the full standings key, the policy picks.
    if config.bye_assignment == ByeAssignment::Random {
        let first = eligible[0];
        let tied: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&i| seats[i].same_key(&seats[first]))
            .collect();
        if tied.len() > 1 {
            let pick = tied[rng.random_range(0..tied.len())];
            if let Some(pos) = eligible.iter().position(|&i| i == pick) {
                eligible.swap(0, pos);
            }
        }
    }

    Ok(eligible)
}

fn impossible(leftovers: &[&Seat], seats: &[Seat]) -> SwissError {
    let mut suggestions = Vec::new();
    if let [x, y, ..] = leftovers {
        suggestions.push(RemedialAction::AllowRematch(x.player_id, y.player_id));
    }
    let drop_target = leftovers
        .last()
        .map(|s| s.player_id)
        .or_else(|| seats.last().map(|s| s.player_id));
    if let Some(player) = drop_target {
        suggestions.push(RemedialAction::DropPlayer(player));
    }
    suggestions.push(RemedialAction::EndSwiss);

    SwissError::ImpossiblePairing {
        reason: format!(
            "{} players cannot be paired without a rematch",
            leftovers.len().max(1)
        ),
        suggestions,
    }
}

/// Contiguous runs of seats sharing a match-point total, in rank order.
fn brackets(seats: &[Seat]) -> Vec<Vec<&Seat>> {
    let mut out: Vec<Vec<&Seat>> = Vec::new();
    for seat in seats {
        match out.last_mut() {
            Some(bracket) if bracket[0].match_points == seat.match_points => bracket.push(seat),
            _ => out.push(vec![seat]),
        }
    }
    out
}

/// Reconstruct how often each player has been paired below their
/// bracket: a completed head-to-head where the entering match points
/// differed counts once against the higher-placed player.
fn pair_down_counts(matches: &[Match]) -> HashMap<PlayerId, u32> {
    let mut points: HashMap<PlayerId, u32> = HashMap::new();
    let mut counts: HashMap<PlayerId, u32> = HashMap::new();
    let last = record::latest_completed_round(matches);

    for round in 1..=last {
        let in_round: Vec<&Match> = matches
            .iter()
            .filter(|m| m.round_number == round && m.is_complete())
            .collect();

        for m in &in_round {
            if let Some(p2) = m.player2_id {
                let before1 = points.get(&m.player1_id).copied().unwrap_or(0);
                let before2 = points.get(&p2).copied().unwrap_or(0);
                if before1 > before2 {
                    *counts.entry(m.player1_id).or_insert(0) += 1;
                } else if before2 > before1 {
                    *counts.entry(p2).or_insert(0) += 1;
                }
            }
        }
        for m in &in_round {
            for player in [Some(m.player1_id), m.player2_id].into_iter().flatten() {
                let gained = match MatchOutcome::for_player(m, player) {
                    MatchOutcome::Win => 3,
                    MatchOutcome::Draw => 1,
                    MatchOutcome::Loss => 0,
                };
                *points.entry(player).or_insert(0) += gained;
            }
        }
    }
    counts
}

/// Post-pass invariant check: every seat appears exactly once.
fn verify_round(pairings: &[Pairing], seats: &[Seat]) -> SwissResult<()> {
    let mut seen: HashSet<PlayerId> = HashSet::new();
    for pairing in pairings {
        for player in [Some(pairing.player1_id), pairing.player2_id]
            .into_iter()
            .flatten()
        {
            if !seen.insert(player) {
                return Err(SwissError::InternalConsistency {
                    reason: format!("player {player} appears twice in one round"),
                });
            }
        }
    }
    if seen.len() != seats.len() {
        return Err(SwissError::InternalConsistency {
            reason: format!(
                "{} of {} eligible players were paired",
                seen.len(),
                seats.len()
            ),
        });
    }
    Ok(())
}
