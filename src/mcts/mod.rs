//! Risk-sensitive Monte Carlo Tree Search over a single Can't Stop turn.
//!
//! - [`config`]: search hyperparameters
//! - [`utility`]: risk profiles and terminal reward shaping
//! - [`node`]: node kinds, edges, per-node statistics
//! - [`tree`]: arena tree with expansion, UCT selection, simulation, backup
//! - [`search`]: the two advisor entry points

pub mod config;
pub mod node;
pub mod search;
pub mod tree;
pub mod utility;

pub use config::MctsConfig;
pub use node::{Edge, MctsNode, NodeKind};
pub use search::{
    recommend_pairing_after_roll, recommend_pairing_with_config, recommend_press_or_park,
    recommend_press_or_park_with_config, PairingAdvice, PairingValue, PressOrPark,
    PressOrParkAdvice,
};
pub use tree::MctsTree;
pub use utility::{utility, RiskProfile};
