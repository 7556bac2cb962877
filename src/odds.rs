//! Exact odds by exhaustive enumeration of all 1296 four-dice outcomes.
//!
//! Both quantities are rational with denominator 1296; they are counted as
//! integers (in parallel with rayon) and divided once, so results are exact
//! up to the final `f64` division and independent of thread scheduling.
//!
//! ## Bust cache
//!
//! [`bust_prob`] memoizes on [`TurnKey`]. Legality of a pairing only depends
//! on which columns are open, which carry a runner, whether each runner is at
//! its top, and how many runners are free, so states sharing a key share a
//! bust probability. The cache is process-wide and guarded by a mutex; a lost
//! race costs one redundant enumeration, never a wrong answer.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, OnceLock};

use rayon::prelude::*;
use serde::Serialize;

use crate::constants::*;
use crate::dice_mechanics::ALL_ROLLS;
use crate::game_mechanics::{apply_pairing, legal_pairings, turn_key_for_odds, TurnKey};
use crate::types::GameState;

static BUST_CACHE: OnceLock<Mutex<HashMap<TurnKey, f64>>> = OnceLock::new();

fn bust_cache() -> MutexGuard<'static, HashMap<TurnKey, f64>> {
    BUST_CACHE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Both odds for the current turn, as reported to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OddsReport {
    pub p_bust: f64,
    pub adv_by_col: BTreeMap<Column, f64>,
}

/// Probability that the next roll has no legal pairing. Memoized.
pub fn bust_prob(state: &GameState) -> f64 {
    let key = turn_key_for_odds(state);
    if let Some(&p) = bust_cache().get(&key) {
        return p;
    }
    let p = bust_prob_uncached(state);
    tracing::debug!(?key, p, "bust probability computed");
    bust_cache().insert(key, p);
    p
}

/// Probability that the next roll has no legal pairing, always enumerated.
pub fn bust_prob_uncached(state: &GameState) -> f64 {
    let busts = ALL_ROLLS
        .par_iter()
        .filter(|roll| legal_pairings(state, roll).is_empty())
        .count();
    busts as f64 / NUM_ROLLS as f64
}

/// Per column, the fraction of rolls for which some legal pairing would
/// advance that column's runner (or start one above the banked step).
pub fn adv_prob_by_column(state: &GameState) -> BTreeMap<Column, f64> {
    let counts = ALL_ROLLS
        .par_iter()
        .map(|roll| {
            let mut advances = [false; COLUMN_SLOTS];
            for pairing in legal_pairings(state, roll) {
                let mut hypo = state.clone();
                hypo.turn.last_roll = Some(*roll);
                let outcome = apply_pairing(&mut hypo, pairing);
                for (&c, &delta) in &outcome.deltas {
                    if delta > 0 {
                        advances[c as usize] = true;
                    }
                }
            }
            advances.map(|a| a as u32)
        })
        .reduce(
            || [0u32; COLUMN_SLOTS],
            |mut acc, row| {
                for (a, r) in acc.iter_mut().zip(row) {
                    *a += r;
                }
                acc
            },
        );

    COLUMNS
        .iter()
        .map(|&c| (c, counts[c as usize] as f64 / NUM_ROLLS as f64))
        .collect()
}

pub fn odds_report(state: &GameState) -> OddsReport {
    OddsReport {
        p_bust: bust_prob(state),
        adv_by_col: adv_prob_by_column(state),
    }
}

pub fn clear_bust_cache() {
    bust_cache().clear();
}

pub fn bust_cache_len() -> usize {
    bust_cache().len()
}
