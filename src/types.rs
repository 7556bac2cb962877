//! Core game records: per-seat progress, the in-progress turn, and the
//! top-level [`GameState`] aggregate.
//!
//! Column-indexed data uses fixed `[_; COLUMN_SLOTS]` arrays addressed by the
//! column number itself. Claimed columns are additionally kept per player as
//! a bitmask (bit `c` set when column `c` is claimed).
//!
//! Cloning a `GameState` yields a fully independent snapshot; the search
//! relies on that to explore without touching the live game.

use std::collections::BTreeMap;

use crate::constants::*;
use crate::dice_mechanics::Roll;
use crate::error::{CantStopError, Result};

/// One seat's banked progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerState {
    /// Banked step per column (slots 0 and 1 unused). 0 ≤ step ≤ height.
    pub permanent_pos: [u8; COLUMN_SLOTS],
    /// Bitmask of columns this player has won.
    pub claimed: u16,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            permanent_pos: [0; COLUMN_SLOTS],
            claimed: 0,
        }
    }

    #[inline]
    pub fn has_claimed(&self, c: Column) -> bool {
        is_column_in_mask(self.claimed, c)
    }

    #[inline]
    pub fn claim(&mut self, c: Column) {
        self.claimed |= 1 << c;
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.count_ones() as usize
    }

    /// Claimed columns in ascending order.
    pub fn claimed_columns(&self) -> Vec<Column> {
        COLUMNS
            .iter()
            .copied()
            .filter(|&c| self.has_claimed(c))
            .collect()
    }
}

/// Tentative progress of the turn in play. Reset whenever a turn ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnState {
    /// Column → absolute step of the runner placed there this turn.
    pub active_runners: BTreeMap<Column, u8>,
    /// Most recent roll, cleared once it has been played or the turn ends.
    pub last_roll: Option<Roll>,
}

impl TurnState {
    /// Runners not yet placed this turn.
    #[inline]
    pub fn free_runners(&self) -> usize {
        NUM_RUNNERS.saturating_sub(self.active_runners.len())
    }

    pub fn clear(&mut self) {
        self.active_runners.clear();
        self.last_roll = None;
    }
}

/// The whole game: seats, column ownership, whose turn it is, and the turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub players: Vec<PlayerState>,
    /// Owner of each column, `None` while open (slots 0 and 1 unused).
    pub claimed_by: [Option<usize>; COLUMN_SLOTS],
    pub current: usize,
    pub winner: Option<usize>,
    pub turn: TurnState,
}

impl GameState {
    #[inline]
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Banked step of the current player on column `c`.
    #[inline]
    pub fn banked(&self, c: Column) -> u8 {
        self.players[self.current].permanent_pos[c as usize]
    }

    /// Columns nobody has claimed yet, ascending.
    pub fn open_columns(&self) -> Vec<Column> {
        COLUMNS
            .iter()
            .copied()
            .filter(|&c| self.claimed_by[c as usize].is_none())
            .collect()
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }
}

/// Start a fresh game for 2..=4 players. Player 0 moves first.
pub fn new_game(num_players: usize) -> Result<GameState> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
        return Err(CantStopError::InvalidConfiguration { num_players });
    }
    Ok(GameState {
        players: vec![PlayerState::new(); num_players],
        claimed_by: [None; COLUMN_SLOTS],
        current: 0,
        winner: None,
        turn: TurnState::default(),
    })
}

/// List every invariant violation in `state`. Empty means consistent.
///
/// This is a diagnostic sweep; normal play never produces violations.
pub fn validate_game_state(state: &GameState) -> Vec<String> {
    let mut issues = Vec::new();
    let n = state.num_players();

    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
        issues.push(format!("player count {} outside {}..={}", n, MIN_PLAYERS, MAX_PLAYERS));
    }
    if state.current >= n {
        issues.push(format!("current player {} out of range for {} players", state.current, n));
    }
    if let Some(w) = state.winner {
        if w >= n {
            issues.push(format!("winner {} out of range for {} players", w, n));
        }
    }

    for c in COLUMNS {
        let height = column_height(c);
        let owners: Vec<usize> = (0..n).filter(|&p| state.players[p].has_claimed(c)).collect();
        match state.claimed_by[c as usize] {
            Some(owner) => {
                if owners != [owner] {
                    issues.push(format!(
                        "column {} claimed_by={} but claimed sets list {:?}",
                        c, owner, owners
                    ));
                }
            }
            None => {
                if !owners.is_empty() {
                    issues.push(format!(
                        "column {} is open but claimed by players {:?}",
                        c, owners
                    ));
                }
            }
        }
        for (p, player) in state.players.iter().enumerate() {
            if player.permanent_pos[c as usize] > height {
                issues.push(format!(
                    "player {} banked step {} on column {} above height {}",
                    p, player.permanent_pos[c as usize], c, height
                ));
            }
        }
    }

    for (p, player) in state.players.iter().enumerate() {
        let stray = player.claimed & !COLUMNS.iter().fold(0u16, |m, &c| m | (1 << c));
        if stray != 0 {
            issues.push(format!("player {} claims non-columns (mask {:#06x})", p, stray));
        }
    }

    let runners = &state.turn.active_runners;
    if runners.len() > NUM_RUNNERS {
        issues.push(format!("{} active runners exceeds {}", runners.len(), NUM_RUNNERS));
    }
    for (&c, &step) in runners {
        if !is_valid_column(c) {
            issues.push(format!("runner on invalid column {}", c));
            continue;
        }
        if state.claimed_by[c as usize].is_some() {
            issues.push(format!("runner on claimed column {}", c));
        }
        if step > column_height(c) {
            issues.push(format!(
                "runner on column {} at step {} beyond height {}",
                c,
                step,
                column_height(c)
            ));
        }
        if state.current < n && step < state.banked(c) {
            issues.push(format!(
                "runner on column {} at step {} behind banked step {}",
                c,
                step,
                state.banked(c)
            ));
        }
    }

    if let Some(roll) = state.turn.last_roll {
        if !roll.iter().all(|d| (1..=6).contains(d)) {
            issues.push(format!("last roll {:?} has faces outside 1..=6", roll));
        }
    }

    issues
}

/// [`validate_game_state`] as a `Result`.
pub fn check_consistency(state: &GameState) -> Result<()> {
    let issues = validate_game_state(state);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(CantStopError::InconsistentState(issues.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_defaults() {
        let s = new_game(3).unwrap();
        assert_eq!(s.num_players(), 3);
        assert_eq!(s.current, 0);
        assert_eq!(s.winner, None);
        assert_eq!(s.open_columns(), COLUMNS.to_vec());
        assert_eq!(s.turn.free_runners(), NUM_RUNNERS);
        assert!(s.turn.last_roll.is_none());
        for p in &s.players {
            assert!(p.permanent_pos.iter().all(|&x| x == 0));
            assert_eq!(p.claimed_count(), 0);
        }
        assert!(validate_game_state(&s).is_empty());
    }

    #[test]
    fn test_new_game_rejects_bad_counts() {
        for n in [0, 1, 5, 10] {
            match new_game(n) {
                Err(CantStopError::InvalidConfiguration { num_players }) => {
                    assert_eq!(num_players, n)
                }
                other => panic!("expected InvalidConfiguration for {n}, got {other:?}"),
            }
        }
        for n in MIN_PLAYERS..=MAX_PLAYERS {
            assert!(new_game(n).is_ok());
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = new_game(2).unwrap();
        a.turn.active_runners.insert(7, 2);
        let mut b = a.clone();
        b.turn.active_runners.insert(7, 5);
        b.players[0].permanent_pos[7] = 4;
        b.claimed_by[2] = Some(1);
        assert_eq!(a.turn.active_runners[&7], 2);
        assert_eq!(a.players[0].permanent_pos[7], 0);
        assert_eq!(a.claimed_by[2], None);
    }

    #[test]
    fn test_claimed_mask_helpers() {
        let mut p = PlayerState::new();
        p.claim(12);
        p.claim(2);
        assert!(p.has_claimed(2));
        assert!(!p.has_claimed(7));
        assert_eq!(p.claimed_count(), 2);
        assert_eq!(p.claimed_columns(), vec![2, 12]);
    }

    #[test]
    fn test_validator_flags_disagreement() {
        let mut s = new_game(2).unwrap();
        s.claimed_by[4] = Some(1);
        let issues = validate_game_state(&s);
        assert_eq!(issues.len(), 1, "{issues:?}");
        assert!(issues[0].contains("column 4"));
        s.players[1].claim(4);
        assert!(check_consistency(&s).is_ok());
    }

    #[test]
    fn test_validator_flags_runner_on_claimed_and_too_high() {
        let mut s = new_game(2).unwrap();
        s.claimed_by[3] = Some(1);
        s.players[1].claim(3);
        s.turn.active_runners.insert(3, 2);
        s.turn.active_runners.insert(2, 4);
        let issues = validate_game_state(&s);
        assert!(issues.iter().any(|i| i.contains("runner on claimed column 3")));
        assert!(issues.iter().any(|i| i.contains("beyond height 3")));
        assert!(matches!(
            check_consistency(&s),
            Err(CantStopError::InconsistentState(_))
        ));
    }

    #[test]
    fn test_validator_flags_runner_count_and_regression() {
        let mut s = new_game(2).unwrap();
        s.players[0].permanent_pos[6] = 5;
        s.turn.active_runners.insert(6, 3);
        for c in [4, 8, 10] {
            s.turn.active_runners.insert(c, 1);
        }
        let issues = validate_game_state(&s);
        assert!(issues.iter().any(|i| i.contains("exceeds 3")));
        assert!(issues.iter().any(|i| i.contains("behind banked step 5")));
    }
}
