//! Self-play driver: every seat follows the advisor for a whole game.
//!
//! Usage: cantstop-coach [--players N] [--iters N] [--seed S] [--risk averse|neutral|seeking] [--max-turns N]

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use cantstop::constants::COLUMNS;
use cantstop::game_mechanics::{compute_turn_gain, play_pairing, roll_turn, stop_turn};
use cantstop::mcts::{recommend_pairing_after_roll, recommend_press_or_park, PressOrPark, RiskProfile};
use cantstop::types::{new_game, GameState};

struct Args {
    players: usize,
    iters: usize,
    seed: u64,
    risk: RiskProfile,
    max_turns: usize,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Invalid {} value: {}", flag, value.map_or("<missing>", |v| v.as_str()));
            std::process::exit(1);
        }
    }
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut players = 2usize;
    let mut iters = 500usize;
    let mut seed = 42u64;
    let mut risk = RiskProfile::Neutral;
    let mut max_turns = 200usize;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--players" => {
                i += 1;
                players = parse_value("--players", args.get(i));
            }
            "--iters" => {
                i += 1;
                iters = parse_value("--iters", args.get(i));
            }
            "--seed" => {
                i += 1;
                seed = parse_value("--seed", args.get(i));
            }
            "--risk" => {
                i += 1;
                risk = parse_value("--risk", args.get(i));
            }
            "--max-turns" => {
                i += 1;
                max_turns = parse_value("--max-turns", args.get(i));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: cantstop-coach [--players N] [--iters N] [--seed S] \
                     [--risk averse|neutral|seeking] [--max-turns N]"
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Args {
        players,
        iters,
        seed,
        risk,
        max_turns,
    }
}

/// Play one turn for the current player. Returns a one-line summary.
fn play_turn(
    state: &mut GameState,
    dice: &mut SmallRng,
    args: &Args,
    search_seed: &mut u64,
) -> cantstop::Result<String> {
    let player = state.current;
    loop {
        if !state.turn.active_runners.is_empty() {
            let advice = recommend_press_or_park(state, args.iters, *search_seed, args.risk);
            *search_seed = search_seed.wrapping_add(1);
            println!(
                "    q_stop={:.3} q_press={:.3} p_bust={:.3} -> {:?}",
                advice.q_stop, advice.q_press, advice.p_bust, advice.action
            );
            if advice.action == PressOrPark::Park {
                let gain = compute_turn_gain(state);
                stop_turn(state)?;
                return Ok(format!("P{} parks, +{} steps", player, gain));
            }
        }

        let report = roll_turn(state, dice)?;
        if report.busted {
            return Ok(format!("P{} busts on {:?}", player, report.roll));
        }

        let advice =
            recommend_pairing_after_roll(state, report.roll, args.iters, *search_seed, args.risk)?;
        *search_seed = search_seed.wrapping_add(1);
        let Some(pairing) = advice.pairing() else {
            return Ok(format!("P{} busts on {:?}", player, report.roll));
        };
        println!("    roll {:?} -> play {:?}", report.roll, pairing);
        if play_pairing(state, pairing)?.busted {
            return Ok(format!("P{} busts after {:?}", player, pairing));
        }
    }
}

fn print_board(state: &GameState) {
    for (i, p) in state.players.iter().enumerate() {
        let steps: Vec<String> = COLUMNS
            .iter()
            .map(|&c| format!("{:>2}", p.permanent_pos[c as usize]))
            .collect();
        println!("  P{} [{}] claimed {:?}", i, steps.join(" "), p.claimed_columns());
    }
}

fn main() {
    cantstop::env_config::init_tracing();
    cantstop::env_config::init_rayon_threads_lenient();
    let args = parse_args();

    let mut state = match new_game(args.players) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Self-play: {} players, {} iterations, risk {}, seed {}",
        args.players, args.iters, args.risk, args.seed
    );

    let mut dice = SmallRng::seed_from_u64(args.seed);
    let mut search_seed = args.seed;
    let start = Instant::now();

    let mut turns = 0;
    while !state.is_over() && turns < args.max_turns {
        println!("Turn {} (P{}):", turns + 1, state.current);
        match play_turn(&mut state, &mut dice, &args, &mut search_seed) {
            Ok(summary) => println!("  {}", summary),
            Err(e) => {
                eprintln!("Turn aborted: {}", e);
                std::process::exit(1);
            }
        }
        turns += 1;
    }

    println!();
    print_board(&state);
    match state.winner {
        Some(w) => println!("P{} wins after {} turns", w, turns),
        None => println!("No winner after {} turns", turns),
    }
    println!("Elapsed: {:.2}s", start.elapsed().as_secs_f64());
}
