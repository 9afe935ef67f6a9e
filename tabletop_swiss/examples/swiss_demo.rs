//! Swiss Tournament Example
//!
//! Walks an 8-player, 3-round Swiss tournament through the engine:
//! round 1 pairing, standings-based bracket pairing, and final
//! standings with tiebreakers.

use std::collections::HashMap;

use tabletop_swiss::{
    calculate_standings, pair_round, pair_round_1, Match, Pairing, PlayerId, Registration,
    StandingsEntry, StandingsMode, SwissConfig,
};
use uuid::Uuid;

fn print_pairings(round: u32, pairings: &[Pairing], names: &HashMap<PlayerId, String>) {
    println!("Round {round} pairings:");
    for pairing in pairings {
        match pairing.player2_id {
            Some(p2) => println!(
                "  Table {}: {} vs {}{}",
                pairing.table_number.unwrap_or(0),
                names[&pairing.player1_id],
                names[&p2],
                if pairing.is_pair_down { "  (pair-down)" } else { "" },
            ),
            None => println!("  Bye: {}", names[&pairing.player1_id]),
        }
    }
    println!();
}

fn print_standings(standings: &[StandingsEntry], names: &HashMap<PlayerId, String>) {
    println!(
        "{:<6}{:<12}{:<10}{:<8}{}",
        "Rank", "Player", "Record", "Points", "Tiebreakers"
    );
    for entry in standings {
        let record = format!(
            "{}-{}-{}",
            entry.match_wins, entry.match_losses, entry.match_draws
        );
        let tiebreakers: Vec<String> = entry
            .tiebreakers
            .iter()
            .map(|(kind, value)| format!("{kind:?}={value:.3}"))
            .collect();
        println!(
            "{:<6}{:<12}{:<10}{:<8}{}",
            entry.rank,
            names[&entry.registration.player_id],
            record,
            entry.match_points,
            tiebreakers.join("  "),
        );
    }
    println!();
}

/// Report every table as a win for the higher-seeded side.
fn report_all(pairings: &[Pairing], tournament: Uuid, config: &SwissConfig) -> Vec<Match> {
    pairings
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let mut m = p.clone().into_match(tournament, config.bye_points);
            if !m.is_complete() {
                if index % 2 == 0 {
                    m.report(2, 0, 0);
                } else {
                    m.report(2, 1, 0);
                }
            }
            m
        })
        .collect()
}

fn main() {
    env_logger::init();

    println!("=== Swiss Tournament Example: 8 players, 3 rounds ===\n");

    let tournament = Uuid::new_v4();
    let registrations: Vec<Registration> = (1..=8)
        .map(|seq| Registration::new(tournament, Uuid::new_v4(), seq))
        .collect();
    let names: HashMap<PlayerId, String> = registrations
        .iter()
        .map(|r| (r.player_id, format!("Player {}", r.sequence_id)))
        .collect();

    let config = SwissConfig::mtg_standard(3, 42);
    let mut all_matches: Vec<Match> = Vec::new();

    let round1 = pair_round_1(tournament, &registrations, &config).expect("round 1 pairs");
    print_pairings(1, &round1, &names);
    all_matches.extend(report_all(&round1, tournament, &config));

    for round in 2..=3 {
        let standings = calculate_standings(
            tournament,
            &registrations,
            &all_matches,
            &config,
            StandingsMode::Final,
        )
        .expect("standings compute");
        println!("Standings after round {}:", round - 1);
        print_standings(&standings, &names);

        let pairings = pair_round(tournament, &registrations, &all_matches, &config, round)
            .expect("round pairs");
        print_pairings(round, &pairings, &names);
        all_matches.extend(report_all(&pairings, tournament, &config));
    }

    let final_standings = calculate_standings(
        tournament,
        &registrations,
        &all_matches,
        &config,
        StandingsMode::Final,
    )
    .expect("final standings");
    println!("Final standings:");
    print_standings(&final_standings, &names);

    let champion = &final_standings[0];
    println!(
        "Champion: {} ({}-{}-{})",
        names[&champion.registration.player_id],
        champion.match_wins,
        champion.match_losses,
        champion.match_draws,
    );
}
