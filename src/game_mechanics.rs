//! Rules engine: legality of sum-pairings, runner movement, banking and busts.
//!
//! The primitives ([`legal_pairings`], [`apply_pairing`], [`stop_and_bank`],
//! [`handle_bust`]) trust their caller and never fail. The checked drivers
//! ([`roll_turn`], [`play_pairing`], [`stop_turn`]) validate requests first and
//! reject them with [`IllegalMove`] without touching the state.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use crate::constants::*;
use crate::dice_mechanics::{pairings_from_roll, roll_dice, Pairing, Roll};
use crate::error::{IllegalMove, Result};
use crate::odds::bust_prob;
use crate::types::GameState;

/// Result of applying one pairing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PairingOutcome {
    pub moved1: bool,
    pub moved2: bool,
    /// Net step change per column this application caused.
    pub deltas: BTreeMap<Column, i32>,
}

/// What a checked roll produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RollReport {
    pub roll: Roll,
    pub pairings: Vec<Pairing>,
    /// True when no pairing was playable; the turn has already passed on.
    pub busted: bool,
}

/// What a checked pairing play produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayReport {
    pub outcome: PairingOutcome,
    /// True when the turn was lost right after the play.
    pub busted: bool,
}

/// Canonical odds signature of a turn: open columns, active columns with
/// their at-top flag, and free runners. Sub-top runner steps are left out
/// because legality only distinguishes "below the top" from "at the top".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TurnKey {
    pub open_columns: Vec<Column>,
    pub active: Vec<(Column, bool)>,
    pub free_runners: usize,
}

#[inline]
pub fn is_column_open(state: &GameState, s: Column) -> bool {
    state.claimed_by[s as usize].is_none()
}

/// Whether sum `s` can move a runner right now.
pub fn can_play_sum(state: &GameState, s: Column) -> bool {
    if !is_column_open(state, s) {
        return false;
    }
    match state.turn.active_runners.get(&s) {
        Some(&at) => at < column_height(s),
        None => state.turn.free_runners() > 0,
    }
}

/// Legal sum-pairings for `roll`, de-duplicated by value in dice-grouping order.
///
/// Each candidate is tested as "s1 playable, or s2 playable after s1 is
/// hypothetically applied". An empty result is a bust.
pub fn legal_pairings(state: &GameState, roll: &Roll) -> Vec<Pairing> {
    let mut legal: Vec<Pairing> = Vec::with_capacity(3);
    for (s1, s2) in pairings_from_roll(roll) {
        let p1 = can_play_sum(state, s1);

        // Hypothetical runner layout after s1, tracked without cloning the map.
        let mut free = state.turn.free_runners();
        let mut s1_step = state.turn.active_runners.get(&s1).copied();
        if p1 {
            let top = column_height(s1);
            s1_step = Some(match s1_step {
                Some(at) => (at + 1).min(top),
                None => {
                    free -= 1;
                    (state.banked(s1) + 1).min(top)
                }
            });
        }

        let p2 = if !is_column_open(state, s2) {
            false
        } else {
            let at = if s2 == s1 {
                s1_step
            } else {
                state.turn.active_runners.get(&s2).copied()
            };
            match at {
                Some(at) => at < column_height(s2),
                None => free > 0,
            }
        };

        if (p1 || p2) && !legal.contains(&(s1, s2)) {
            legal.push((s1, s2));
        }
    }
    legal
}

/// Move one runner for sum `s` if possible. Returns whether a move happened.
pub fn apply_sum_once(state: &mut GameState, s: Column) -> bool {
    if !is_column_open(state, s) {
        return false;
    }
    let top = column_height(s);
    if let Some(at) = state.turn.active_runners.get_mut(&s) {
        if *at >= top {
            return false;
        }
        *at = (*at + 1).min(top);
        return true;
    }
    if state.turn.free_runners() == 0 {
        return false;
    }
    let start = (state.banked(s) + 1).min(top);
    state.turn.active_runners.insert(s, start);
    true
}

/// Apply `s1` then `s2`, each only if it can move at that point.
///
/// The caller is responsible for `pairing` being legal for the pending roll;
/// see [`play_pairing`] for the checked form.
pub fn apply_pairing(state: &mut GameState, pairing: Pairing) -> PairingOutcome {
    let (s1, s2) = pairing;
    let before = state.turn.active_runners.clone();
    let moved1 = apply_sum_once(state, s1);
    let moved2 = apply_sum_once(state, s2);

    let mut deltas = BTreeMap::new();
    for (&c, &now) in &state.turn.active_runners {
        let prev = before.get(&c).copied().unwrap_or_else(|| state.banked(c));
        if now != prev {
            deltas.insert(c, now as i32 - prev as i32);
        }
    }
    PairingOutcome {
        moved1,
        moved2,
        deltas,
    }
}

/// End the turn voluntarily: bank runners, claim topped columns, check the win.
pub fn stop_and_bank(state: &mut GameState) {
    let cur = state.current;
    let runners = std::mem::take(&mut state.turn.active_runners);
    for (c, pos) in runners {
        let player = &mut state.players[cur];
        if pos > player.permanent_pos[c as usize] {
            player.permanent_pos[c as usize] = pos;
        }
        if pos >= column_height(c) {
            player.claim(c);
            state.claimed_by[c as usize] = Some(cur);
        }
    }
    state.turn.clear();

    if state.players[cur].claimed_count() >= COLUMNS_TO_WIN {
        state.winner = Some(cur);
    } else {
        advance_player(state);
    }
}

/// End the turn with nothing banked.
pub fn handle_bust(state: &mut GameState) {
    state.turn.clear();
    advance_player(state);
}

#[inline]
fn advance_player(state: &mut GameState) {
    state.current = (state.current + 1) % state.num_players();
}

/// Whether the current player has busted.
///
/// With a roll pending: true iff that roll has no legal pairing. With no roll
/// pending (it was just played): true iff no possible next roll could be
/// played either.
pub fn has_busted(state: &GameState) -> bool {
    match state.turn.last_roll {
        Some(roll) => legal_pairings(state, &roll).is_empty(),
        None => !state.turn.active_runners.is_empty() && bust_prob(state) >= 1.0,
    }
}

/// Steps gained this turn above the banked positions.
pub fn compute_turn_gain(state: &GameState) -> u32 {
    state
        .turn
        .active_runners
        .iter()
        .map(|(&c, &at)| at.saturating_sub(state.banked(c)) as u32)
        .sum()
}

/// Columns whose runner currently sits at the top.
pub fn finished_columns_this_turn(state: &GameState) -> Vec<Column> {
    state
        .turn
        .active_runners
        .iter()
        .filter(|(&c, &at)| at >= column_height(c))
        .map(|(&c, _)| c)
        .collect()
}

pub fn turn_key_for_odds(state: &GameState) -> TurnKey {
    TurnKey {
        open_columns: state.open_columns(),
        active: state
            .turn
            .active_runners
            .iter()
            .map(|(&c, &at)| (c, at >= column_height(c)))
            .collect(),
        free_runners: state.turn.free_runners(),
    }
}

// ── Checked turn drivers ────────────────────────────────────────────

fn ensure_in_play(state: &GameState) -> Result<()> {
    match state.winner {
        Some(winner) => Err(IllegalMove::GameOver { winner }.into()),
        None => Ok(()),
    }
}

/// Roll for the current player and record it as pending.
///
/// A roll with no legal pairing ends the turn through [`handle_bust`].
pub fn roll_turn<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> Result<RollReport> {
    ensure_in_play(state)?;
    if let Some(roll) = state.turn.last_roll {
        return Err(IllegalMove::RollPending { roll }.into());
    }
    let roll = roll_dice(rng);
    state.turn.last_roll = Some(roll);
    let pairings = legal_pairings(state, &roll);
    let busted = pairings.is_empty();
    if busted {
        tracing::debug!(player = state.current, ?roll, "bust on roll");
        handle_bust(state);
    }
    Ok(RollReport {
        roll,
        pairings,
        busted,
    })
}

/// Play `pairing` against the pending roll, then re-check for a bust.
pub fn play_pairing(state: &mut GameState, pairing: Pairing) -> Result<PlayReport> {
    ensure_in_play(state)?;
    let roll = state.turn.last_roll.ok_or(IllegalMove::NoRollPending)?;
    let legal = legal_pairings(state, &roll);
    if !legal.contains(&pairing) {
        return Err(IllegalMove::PairingNotLegal {
            pairing,
            roll,
            legal,
            player: state.current,
        }
        .into());
    }

    let outcome = apply_pairing(state, pairing);
    state.turn.last_roll = None;
    let busted = has_busted(state);
    if busted {
        tracing::debug!(player = state.current, ?pairing, "no playable roll remains");
        handle_bust(state);
    }
    Ok(PlayReport { outcome, busted })
}

/// Bank the turn for the current player.
pub fn stop_turn(state: &mut GameState) -> Result<()> {
    ensure_in_play(state)?;
    if has_busted(state) {
        return Err(IllegalMove::StopAfterBust {
            roll: state.turn.last_roll,
        }
        .into());
    }
    stop_and_bank(state);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CantStopError;
    use crate::types::new_game;

    fn claim(state: &mut GameState, c: Column, player: usize) {
        state.claimed_by[c as usize] = Some(player);
        state.players[player].claim(c);
        state.players[player].permanent_pos[c as usize] = column_height(c);
    }

    #[test]
    fn test_can_play_sum() {
        let mut s = new_game(2).unwrap();
        assert!(can_play_sum(&s, 7));

        claim(&mut s, 7, 1);
        assert!(!can_play_sum(&s, 7));

        s.turn.active_runners.insert(2, 3);
        assert!(!can_play_sum(&s, 2), "runner already at top");
        s.turn.active_runners.insert(4, 1);
        s.turn.active_runners.insert(6, 1);
        assert!(!can_play_sum(&s, 8), "no free runner");
        assert!(can_play_sum(&s, 6));
    }

    #[test]
    fn test_legal_pairings_double_with_active_runner() {
        let mut s = new_game(2).unwrap();
        s.turn.active_runners.insert(7, 1);
        let pairs = legal_pairings(&s, &[1, 6, 2, 5]);
        assert!(pairs.contains(&(7, 7)));
        assert_eq!(pairs, vec![(7, 7), (3, 11), (6, 8)]);

        let out = apply_pairing(&mut s, (7, 7));
        assert_eq!(s.turn.active_runners[&7], 3);
        assert!(out.moved1 && out.moved2);
        assert_eq!(out.deltas.get(&7), Some(&2));
    }

    #[test]
    fn test_legal_pairings_dedups_by_value() {
        let s = new_game(2).unwrap();
        assert_eq!(legal_pairings(&s, &[1, 1, 1, 1]), vec![(2, 2)]);
        assert_eq!(legal_pairings(&s, &[3, 3, 4, 4]), vec![(6, 8), (7, 7)]);
    }

    #[test]
    fn test_double_sum_on_last_runner_advances_twice() {
        let mut s = new_game(2).unwrap();
        s.turn.active_runners.insert(4, 1);
        s.turn.active_runners.insert(10, 1);
        let out = apply_pairing(&mut s, (6, 6));
        assert_eq!(s.turn.active_runners[&6], 2);
        assert!(out.moved1 && out.moved2);
        assert_eq!(s.turn.free_runners(), 0);
    }

    #[test]
    fn test_second_sum_skipped_without_free_runner() {
        let mut s = new_game(2).unwrap();
        s.turn.active_runners.insert(4, 1);
        s.turn.active_runners.insert(10, 1);
        let out = apply_pairing(&mut s, (5, 9));
        assert!(out.moved1);
        assert!(!out.moved2);
        assert_eq!(s.turn.active_runners.len(), 3);
        assert!(!s.turn.active_runners.contains_key(&9));
    }

    #[test]
    fn test_bust_when_all_sums_claimed_and_runners_spent() {
        let mut s = new_game(2).unwrap();
        for c in [3, 9, 4, 8, 7] {
            claim(&mut s, c, 1);
        }
        s.turn.active_runners.insert(2, 1);
        s.turn.active_runners.insert(6, 1);
        s.turn.active_runners.insert(12, 1);
        assert!(legal_pairings(&s, &[1, 2, 3, 6]).is_empty());
    }

    #[test]
    fn test_runner_starts_above_banked_and_caps() {
        let mut s = new_game(2).unwrap();
        s.players[0].permanent_pos[12] = 2;
        assert!(apply_sum_once(&mut s, 12));
        assert_eq!(s.turn.active_runners[&12], 3);
        assert!(!apply_sum_once(&mut s, 12), "already at top");
        assert_eq!(s.turn.active_runners[&12], 3);
    }

    #[test]
    fn test_stop_and_bank_claims_and_advances() {
        let mut s = new_game(3).unwrap();
        s.turn.active_runners.insert(2, 3);
        s.turn.active_runners.insert(7, 4);
        s.turn.last_roll = Some([1, 1, 3, 4]);
        stop_and_bank(&mut s);
        assert_eq!(s.players[0].permanent_pos[2], 3);
        assert_eq!(s.players[0].permanent_pos[7], 4);
        assert_eq!(s.claimed_by[2], Some(0));
        assert!(s.players[0].has_claimed(2));
        assert_eq!(s.claimed_by[7], None);
        assert_eq!(s.current, 1);
        assert!(s.turn.active_runners.is_empty());
        assert!(s.turn.last_roll.is_none());
        assert!(s.winner.is_none());
    }

    #[test]
    fn test_stop_and_bank_sets_winner() {
        let mut s = new_game(2).unwrap();
        s.current = 1;
        claim(&mut s, 2, 1);
        claim(&mut s, 12, 1);
        s.turn.active_runners.insert(3, 5);
        stop_and_bank(&mut s);
        assert_eq!(s.winner, Some(1));
        assert_eq!(s.current, 1, "winner keeps the seat");
    }

    #[test]
    fn test_stop_and_bank_without_runners_only_advances() {
        let mut s = new_game(2).unwrap();
        s.players[0].permanent_pos[5] = 4;
        let before = s.clone();
        stop_and_bank(&mut s);
        assert_eq!(s.players, before.players);
        assert_eq!(s.claimed_by, before.claimed_by);
        assert_eq!(s.current, 1);
    }

    #[test]
    fn test_handle_bust_discards_progress() {
        let mut s = new_game(2).unwrap();
        s.current = 1;
        s.turn.active_runners.insert(8, 6);
        s.turn.last_roll = Some([2, 6, 4, 4]);
        handle_bust(&mut s);
        assert_eq!(s.players[1].permanent_pos[8], 0);
        assert!(s.turn.active_runners.is_empty());
        assert!(s.turn.last_roll.is_none());
        assert_eq!(s.current, 0);
    }

    #[test]
    fn test_turn_gain_and_finished() {
        let mut s = new_game(2).unwrap();
        s.players[0].permanent_pos[4] = 3;
        s.turn.active_runners.insert(4, 7);
        s.turn.active_runners.insert(8, 2);
        assert_eq!(compute_turn_gain(&s), 6);
        assert_eq!(finished_columns_this_turn(&s), vec![4]);
    }

    #[test]
    fn test_turn_key_ignores_sub_top_steps() {
        let mut a = new_game(2).unwrap();
        a.turn.active_runners.insert(6, 2);
        let mut b = a.clone();
        b.turn.active_runners.insert(6, 9);
        assert_eq!(turn_key_for_odds(&a), turn_key_for_odds(&b));
        b.turn.active_runners.insert(6, 11);
        assert_ne!(turn_key_for_odds(&a), turn_key_for_odds(&b));
    }

    #[test]
    fn test_play_pairing_rejects_without_mutation() {
        let mut s = new_game(2).unwrap();
        let err = play_pairing(&mut s, (7, 7)).unwrap_err();
        assert!(matches!(
            err,
            CantStopError::IllegalMove(IllegalMove::NoRollPending)
        ));

        s.turn.last_roll = Some([1, 2, 3, 6]);
        let before = s.clone();
        let err = play_pairing(&mut s, (2, 12)).unwrap_err();
        match err {
            CantStopError::IllegalMove(IllegalMove::PairingNotLegal {
                pairing,
                roll,
                legal,
                player,
            }) => {
                assert_eq!(pairing, (2, 12));
                assert_eq!(roll, [1, 2, 3, 6]);
                assert_eq!(legal, vec![(3, 9), (4, 8), (7, 5)]);
                assert_eq!(player, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(s, before);
    }

    #[test]
    fn test_play_pairing_consumes_roll() {
        let mut s = new_game(2).unwrap();
        s.turn.last_roll = Some([1, 2, 3, 6]);
        let report = play_pairing(&mut s, (4, 8)).unwrap();
        assert!(!report.busted);
        assert_eq!(report.outcome.deltas.len(), 2);
        assert!(s.turn.last_roll.is_none());
        assert_eq!(s.turn.active_runners.len(), 2);
        assert!(matches!(
            play_pairing(&mut s, (4, 8)),
            Err(CantStopError::IllegalMove(IllegalMove::NoRollPending))
        ));
    }

    #[test]
    fn test_play_pairing_busts_when_no_roll_can_follow() {
        let mut s = new_game(2).unwrap();
        s.turn.active_runners.insert(2, 2);
        s.turn.active_runners.insert(12, 3);
        s.turn.active_runners.insert(3, 5);
        s.turn.last_roll = Some([1, 1, 1, 6]);
        let report = play_pairing(&mut s, (2, 7)).unwrap();
        assert!(report.busted);
        assert_eq!(s.current, 1);
        assert_eq!(s.players[0].permanent_pos[2], 0);
    }

    #[test]
    fn test_stop_turn_rejects_bust_and_game_over() {
        let mut s = new_game(2).unwrap();
        for c in [3, 9, 4, 8, 7] {
            claim(&mut s, c, 1);
        }
        for c in [2, 6, 12] {
            s.turn.active_runners.insert(c, 1);
        }
        s.turn.last_roll = Some([1, 2, 3, 6]);
        assert!(matches!(
            stop_turn(&mut s),
            Err(CantStopError::IllegalMove(IllegalMove::StopAfterBust { .. }))
        ));

        let mut done = new_game(2).unwrap();
        done.winner = Some(0);
        assert!(matches!(
            stop_turn(&mut done),
            Err(CantStopError::IllegalMove(IllegalMove::GameOver { winner: 0 }))
        ));
    }

    #[test]
    fn test_roll_turn_records_and_refuses_second_roll() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut rng = SmallRng::seed_from_u64(3);
        let mut s = new_game(2).unwrap();
        let report = roll_turn(&mut s, &mut rng).unwrap();
        assert!(!report.busted, "fresh turn cannot bust");
        assert_eq!(s.turn.last_roll, Some(report.roll));
        assert_eq!(report.pairings, legal_pairings(&s, &report.roll));
        assert!(matches!(
            roll_turn(&mut s, &mut rng),
            Err(CantStopError::IllegalMove(IllegalMove::RollPending { .. }))
        ));
    }
}
