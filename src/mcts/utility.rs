//! Terminal reward shaping.
//!
//! The base value of a turn is the steps gained above the banked positions
//! plus a rarity-weighted bonus for each column topped this turn. A
//! [`RiskProfile`] then bends that value once, at the terminal node; ancestors
//! only average the transformed rewards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{finish_bonus, Column};
use crate::game_mechanics::{compute_turn_gain, finished_columns_this_turn};
use crate::types::GameState;

/// Attitude toward variance in the turn's outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    /// Concave: `sqrt(max(0, base))`.
    Averse,
    /// Identity.
    #[default]
    Neutral,
    /// Convex: `base²`.
    Seeking,
}

impl RiskProfile {
    pub fn transform(self, base: f64) -> f64 {
        match self {
            RiskProfile::Averse => base.max(0.0).sqrt(),
            RiskProfile::Neutral => base,
            RiskProfile::Seeking => base * base,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::Averse => "averse",
            RiskProfile::Neutral => "neutral",
            RiskProfile::Seeking => "seeking",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "averse" => Ok(RiskProfile::Averse),
            "neutral" => Ok(RiskProfile::Neutral),
            "seeking" => Ok(RiskProfile::Seeking),
            other => Err(format!(
                "unknown risk profile '{}' (expected averse, neutral or seeking)",
                other
            )),
        }
    }
}

/// Risk-transformed value of banking `gain_steps` and finishing `finished`.
pub fn utility(gain_steps: f64, finished: &[Column], risk: RiskProfile) -> f64 {
    let bonus: f64 = finished.iter().map(|&c| finish_bonus(c)).sum();
    risk.transform(gain_steps + bonus)
}

/// Reward for stopping in `state` right now.
pub fn stop_reward(state: &GameState, risk: RiskProfile) -> f64 {
    let gain = compute_turn_gain(state) as f64;
    utility(gain, &finished_columns_this_turn(state), risk)
}
