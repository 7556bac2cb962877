//! Advisor entry points: press-or-park and pairing choice.
//!
//! Both build a fresh tree over a copy of the caller's state, run the
//! configured number of simulations on the calling thread, and read the
//! root children's mean rewards. The caller's `GameState` is never mutated.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use crate::dice_mechanics::{validate_roll, Pairing, Roll};
use crate::error::Result;
use crate::game_mechanics::legal_pairings;
use crate::odds::bust_prob;
use crate::types::GameState;

use super::config::MctsConfig;
use super::node::{Edge, NodeKind};
use super::tree::MctsTree;
use super::utility::RiskProfile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PressOrPark {
    /// Keep rolling.
    Press,
    /// Stop and bank.
    Park,
}

/// Press-or-park recommendation with the evidence behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PressOrParkAdvice {
    pub action: PressOrPark,
    pub q_stop: f64,
    pub q_press: f64,
    /// Exact bust probability of the next roll, for context only.
    pub p_bust: f64,
    pub stop_visits: u32,
    pub press_visits: u32,
}

/// Mean reward and visits of one candidate pairing at the root.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairingValue {
    pub pairing: Pairing,
    pub q: f64,
    pub visits: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairingAdvice {
    /// The roll has no legal pairing; the turn is a bust.
    NoLegalPairing { roll: Roll, note: String },
    Recommended {
        pairing: Pairing,
        q: f64,
        candidates: Vec<PairingValue>,
    },
}

impl PairingAdvice {
    pub fn pairing(&self) -> Option<Pairing> {
        match self {
            PairingAdvice::NoLegalPairing { .. } => None,
            PairingAdvice::Recommended { pairing, .. } => Some(*pairing),
        }
    }
}

/// Recommend pressing or parking for the current turn.
pub fn recommend_press_or_park(
    state: &GameState,
    iters: usize,
    seed: u64,
    risk: RiskProfile,
) -> PressOrParkAdvice {
    recommend_press_or_park_with_config(state, &MctsConfig::new(iters, seed, risk))
}

pub fn recommend_press_or_park_with_config(
    state: &GameState,
    config: &MctsConfig,
) -> PressOrParkAdvice {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut tree = MctsTree::new(NodeKind::Decision, state.clone());
    tree.expand_decision(0);

    for _ in 0..config.iterations {
        tree.simulate(0, &mut rng, config);
    }

    let root = tree.root();
    let stats = |edge: Edge| {
        root.child(&edge)
            .map(|idx| (tree.nodes[idx].q_value(), tree.nodes[idx].visits))
            .unwrap_or((0.0, 0))
    };
    let (q_stop, stop_visits) = stats(Edge::Stop);
    let (q_press, press_visits) = stats(Edge::Roll);
    let action = if q_press > q_stop {
        PressOrPark::Press
    } else {
        PressOrPark::Park
    };
    let p_bust = bust_prob(state);

    debug!(
        iterations = config.iterations,
        nodes = tree.len(),
        risk = %config.risk,
        q_stop,
        q_press,
        p_bust,
        "press-or-park search complete"
    );

    PressOrParkAdvice {
        action,
        q_stop,
        q_press,
        p_bust,
        stop_visits,
        press_visits,
    }
}

/// Recommend which pairing to play for `roll`.
///
/// Returns [`PairingAdvice::NoLegalPairing`] without searching when the roll
/// busts. Fails only for rolls with faces outside 1..=6.
pub fn recommend_pairing_after_roll(
    state: &GameState,
    roll: Roll,
    iters: usize,
    seed: u64,
    risk: RiskProfile,
) -> Result<PairingAdvice> {
    recommend_pairing_with_config(state, roll, &MctsConfig::new(iters, seed, risk))
}

pub fn recommend_pairing_with_config(
    state: &GameState,
    roll: Roll,
    config: &MctsConfig,
) -> Result<PairingAdvice> {
    validate_roll(&roll)?;
    let mut root_state = state.clone();
    root_state.turn.last_roll = Some(roll);
    if legal_pairings(&root_state, &roll).is_empty() {
        return Ok(PairingAdvice::NoLegalPairing {
            roll,
            note: "No legal pairings; bust.".to_string(),
        });
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut tree = MctsTree::new(NodeKind::Pairing, root_state);
    tree.expand_pairing(0);

    for _ in 0..config.iterations {
        tree.simulate(0, &mut rng, config);
    }

    let candidates: Vec<PairingValue> = tree
        .root()
        .children
        .iter()
        .filter_map(|&(edge, idx)| match edge {
            Edge::Pair(pairing) => Some(PairingValue {
                pairing,
                q: tree.nodes[idx].q_value(),
                visits: tree.nodes[idx].visits,
            }),
            _ => None,
        })
        .collect();

    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.q > best.q {
            best = c;
        }
    }
    let (pairing, q) = (best.pairing, best.q);

    debug!(
        iterations = config.iterations,
        nodes = tree.len(),
        risk = %config.risk,
        ?roll,
        ?pairing,
        q,
        "pairing search complete"
    );

    Ok(PairingAdvice::Recommended {
        pairing,
        q,
        candidates,
    })
}
