//! MCTS configuration parameters.

use crate::constants::{DEFAULT_EXPLORATION, DEFAULT_ITERATIONS, DEFAULT_MAX_DEPTH};

use super::utility::RiskProfile;

/// Search hyperparameters for one recommendation.
#[derive(Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run from the root.
    pub iterations: usize,
    /// Seed for the dice sampled at chance nodes.
    pub seed: u64,
    /// Risk attitude applied when scoring terminal nodes.
    pub risk: RiskProfile,
    /// UCT exploration constant `c`.
    pub exploration: f64,
    /// Transitions allowed per simulation before scoring as a stop.
    pub max_depth: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: 0,
            risk: RiskProfile::Neutral,
            exploration: DEFAULT_EXPLORATION,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MctsConfig {
    /// Default exploration and depth with the given budget, seed and risk.
    pub fn new(iterations: usize, seed: u64, risk: RiskProfile) -> Self {
        Self {
            iterations,
            seed,
            risk,
            ..Self::default()
        }
    }
}
