//! # Can't Stop: Rules Engine, Exact Odds and Risk-Sensitive Coach
//!
//! Three layers, each usable on its own:
//!
//! | Layer | Rust module | Description |
//! |-------|-------------|-------------|
//! | Rules | [`game_mechanics`] | Legal pairings, runner movement, banking, busts, checked turn drivers |
//! | Odds | [`odds`] | Exact bust and per-column advance probabilities over all 1296 rolls |
//! | Advisor | [`mcts`] | Single-turn MCTS recommending press/park and which pairing to play |
//!
//! ## State representation
//!
//! A game is a [`types::GameState`]: one [`types::PlayerState`] per seat, a
//! column ownership table and the current [`types::TurnState`].
//!
//! - Columns 2..=12 index fixed-size arrays of length 13 directly; slots 0
//!   and 1 are unused.
//! - Claimed columns per player are a bitmask (bit `c` set when column `c` is
//!   claimed), mirrored by `claimed_by` for ownership lookups.
//! - Runners are a `BTreeMap<column, step>` so iteration is in column order.
//!
//! ## Turn flow
//!
//! `roll_turn` records a pending roll (or busts), `play_pairing` consumes it,
//! `stop_turn` banks. The unchecked primitives underneath never fail and are
//! what the search uses on its private copies of the state.
//!
//! ## Advisor
//!
//! The search never mutates the caller's state: every node owns a full copy.
//! Rewards come from [`mcts::utility`], which scores a stop as steps gained
//! plus a bonus per column topped, bent by a [`mcts::RiskProfile`]. A bust
//! scores 0.

#![allow(clippy::needless_range_loop)]

pub mod constants;
pub mod dice_mechanics;
pub mod env_config;
pub mod error;
pub mod game_mechanics;
pub mod mcts;
pub mod odds;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;
pub mod types;

pub use error::{CantStopError, IllegalMove, Result};
