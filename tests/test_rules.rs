//! Scenario tests for the rules engine and the checked turn drivers.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use cantstop::constants::*;
use cantstop::dice_mechanics::pairings_from_roll;
use cantstop::game_mechanics::*;
use cantstop::odds::bust_prob;
use cantstop::types::{check_consistency, new_game, GameState};
use cantstop::{CantStopError, IllegalMove};

fn claim(state: &mut GameState, c: Column, player: usize) {
    state.claimed_by[c as usize] = Some(player);
    state.players[player].claim(c);
    state.players[player].permanent_pos[c as usize] = column_height(c);
}

#[test]
fn test_column_heights() {
    let heights: Vec<u8> = COLUMNS.iter().map(|&c| column_height(c)).collect();
    assert_eq!(heights, vec![3, 5, 7, 9, 11, 13, 11, 9, 7, 5, 3]);
    for &c in &COLUMNS {
        assert_eq!(column_height(c), column_height(14 - c), "column {c} is not symmetric");
        if c != 7 {
            assert!(column_height(c) < column_height(7));
        }
    }
}

#[test]
fn test_fresh_turn_has_zero_bust_probability() {
    for players in MIN_PLAYERS..=MAX_PLAYERS {
        let s = new_game(players).unwrap();
        assert_eq!(bust_prob(&s), 0.0);
    }
}

#[test]
fn test_banking_with_no_runners_only_advances() {
    let mut s = new_game(3).unwrap();
    s.players[0].permanent_pos[5] = 4;
    let players_before = s.players.clone();
    let claimed_before = s.claimed_by;
    stop_and_bank(&mut s);
    assert_eq!(s.players, players_before);
    assert_eq!(s.claimed_by, claimed_before);
    assert_eq!(s.current, 1);
    assert_eq!(s.winner, None);
}

#[test]
fn test_double_seven_advances_twice() {
    let mut s = new_game(2).unwrap();
    s.turn.active_runners.insert(7, 1);
    let roll = [1, 6, 2, 5];
    assert_eq!(pairings_from_roll(&roll), [(7, 7), (3, 11), (6, 8)]);

    s.turn.last_roll = Some(roll);
    let legal = legal_pairings(&s, &roll);
    assert!(legal.contains(&(7, 7)));

    let report = play_pairing(&mut s, (7, 7)).unwrap();
    assert!(report.outcome.moved1 && report.outcome.moved2);
    assert_eq!(report.outcome.deltas.get(&7), Some(&2));
    assert!(!report.busted);
    assert_eq!(s.turn.active_runners[&7], 3);
}

#[test]
fn test_roll_onto_claimed_columns_busts() {
    let mut s = new_game(2).unwrap();
    claim(&mut s, 2, 1);
    claim(&mut s, 3, 1);
    s.turn.active_runners.insert(6, 1);
    s.turn.active_runners.insert(7, 1);
    s.turn.active_runners.insert(8, 1);
    check_consistency(&s).unwrap();

    // (1,1,1,2): pairs (2,3), (2,3), (3,2); every sum is claimed.
    let roll = [1, 1, 1, 2];
    assert!(legal_pairings(&s, &roll).is_empty());
    s.turn.last_roll = Some(roll);
    assert!(has_busted(&s));
}

#[test]
fn test_full_turn_then_bank_claims_column() {
    let mut s = new_game(2).unwrap();
    s.players[0].permanent_pos[12] = 2;
    s.turn.last_roll = Some([6, 6, 1, 1]);

    let report = play_pairing(&mut s, (12, 2)).unwrap();
    assert_eq!(report.outcome.deltas.get(&12), Some(&1));
    assert_eq!(report.outcome.deltas.get(&2), Some(&1));
    assert_eq!(finished_columns_this_turn(&s), vec![12]);
    assert_eq!(compute_turn_gain(&s), 2);

    stop_turn(&mut s).unwrap();
    assert_eq!(s.claimed_by[12], Some(0));
    assert!(s.players[0].has_claimed(12));
    assert_eq!(s.players[0].permanent_pos[2], 1);
    assert_eq!(s.current, 1);
    assert!(!is_column_open(&s, 12));
    check_consistency(&s).unwrap();
}

#[test]
fn test_illegal_pairing_reports_context_and_keeps_state() {
    let mut s = new_game(2).unwrap();
    claim(&mut s, 12, 1);
    s.turn.last_roll = Some([6, 6, 6, 6]);
    let before = s.clone();

    let err = play_pairing(&mut s, (12, 12)).unwrap_err();
    assert_eq!(s, before);
    match &err {
        CantStopError::IllegalMove(IllegalMove::PairingNotLegal {
            pairing,
            roll,
            legal,
            player,
        }) => {
            assert_eq!(*pairing, (12, 12));
            assert_eq!(*roll, [6, 6, 6, 6]);
            assert!(legal.is_empty());
            assert_eq!(*player, 0);
        }
        other => panic!("unexpected {other:?}"),
    }
    let msg = err.to_string();
    assert!(msg.contains("(12, 12)"), "{msg}");
    assert!(msg.contains("[6, 6, 6, 6]"), "{msg}");
}

#[test]
fn test_pairing_not_from_roll_is_rejected() {
    let mut s = new_game(2).unwrap();
    s.turn.last_roll = Some([1, 2, 3, 4]);
    assert!(matches!(
        play_pairing(&mut s, (7, 8)),
        Err(CantStopError::IllegalMove(IllegalMove::PairingNotLegal { .. }))
    ));
    assert!(matches!(
        play_pairing(&mut new_game(2).unwrap(), (7, 7)),
        Err(CantStopError::IllegalMove(IllegalMove::NoRollPending))
    ));
}

#[test]
fn test_invalid_player_counts() {
    for n in [0, 1, 5, 9] {
        assert!(matches!(
            new_game(n),
            Err(CantStopError::InvalidConfiguration { num_players }) if num_players == n
        ));
    }
}

#[test]
fn test_simple_policy_plays_a_game_to_the_end() {
    // Roll up to three times per turn, always taking the first legal pairing.
    let mut rng = SmallRng::seed_from_u64(2024);
    let mut s = new_game(2).unwrap();
    let mut turns = 0;
    while s.winner.is_none() {
        assert!(turns < 10_000, "game did not finish");
        let player = s.current;
        for _ in 0..3 {
            let report = roll_turn(&mut s, &mut rng).unwrap();
            if report.busted {
                break;
            }
            if play_pairing(&mut s, report.pairings[0]).unwrap().busted {
                break;
            }
        }
        if s.current == player && s.winner.is_none() {
            stop_turn(&mut s).unwrap();
        }
        check_consistency(&s).unwrap();
        turns += 1;
    }

    let winner = s.winner.unwrap();
    assert!(s.players[winner].claimed_count() >= COLUMNS_TO_WIN);
    assert!(matches!(
        roll_turn(&mut s, &mut rng),
        Err(CantStopError::IllegalMove(IllegalMove::GameOver { .. }))
    ));
    assert!(stop_turn(&mut s).is_err());
}
