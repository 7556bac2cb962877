//! Plain-record snapshot of a [`GameState`] for persistence between requests.
//!
//! Layout (JSON):
//!
//! ```text
//! {
//!   "players": [{"permanent_pos": {"2": 0, ..., "12": 0}, "claimed": [2, 12]}, ...],
//!   "claimed_by": {"2": 0, "3": null, ...},
//!   "current": 0,
//!   "num_players": 2,
//!   "winner": null,
//!   "turn": {"active_runners": {"7": 3}, "free_runners": 2, "last_roll": [1, 2, 3, 6]}
//! }
//! ```
//!
//! Positions and steps are integers throughout. Restoring a snapshot checks
//! every game invariant before handing back a state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::dice_mechanics::Roll;
use crate::error::{CantStopError, Result};
use crate::types::{check_consistency, GameState, PlayerState, TurnState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub permanent_pos: BTreeMap<Column, u8>,
    pub claimed: Vec<Column>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub active_runners: BTreeMap<Column, u8>,
    pub free_runners: usize,
    pub last_roll: Option<Roll>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub claimed_by: BTreeMap<Column, Option<usize>>,
    pub current: usize,
    pub num_players: usize,
    pub winner: Option<usize>,
    pub turn: TurnSnapshot,
}

impl From<&GameState> for GameSnapshot {
    fn from(state: &GameState) -> Self {
        GameSnapshot {
            players: state
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    permanent_pos: COLUMNS
                        .iter()
                        .map(|&c| (c, p.permanent_pos[c as usize]))
                        .collect(),
                    claimed: p.claimed_columns(),
                })
                .collect(),
            claimed_by: COLUMNS
                .iter()
                .map(|&c| (c, state.claimed_by[c as usize]))
                .collect(),
            current: state.current,
            num_players: state.num_players(),
            winner: state.winner,
            turn: TurnSnapshot {
                active_runners: state.turn.active_runners.clone(),
                free_runners: state.turn.free_runners(),
                last_roll: state.turn.last_roll,
            },
        }
    }
}

fn inconsistent(msg: String) -> CantStopError {
    CantStopError::InconsistentState(msg)
}

fn check_column(c: Column, what: &str) -> Result<()> {
    if is_valid_column(c) {
        Ok(())
    } else {
        Err(inconsistent(format!("{} names invalid column {}", what, c)))
    }
}

impl TryFrom<GameSnapshot> for GameState {
    type Error = CantStopError;

    fn try_from(snap: GameSnapshot) -> Result<Self> {
        let n = snap.players.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
            return Err(CantStopError::InvalidConfiguration { num_players: n });
        }
        if snap.num_players != n {
            return Err(inconsistent(format!(
                "num_players={} but {} player records",
                snap.num_players, n
            )));
        }

        let mut players = Vec::with_capacity(n);
        for (i, p) in snap.players.iter().enumerate() {
            let mut player = PlayerState::new();
            for (&c, &step) in &p.permanent_pos {
                check_column(c, &format!("player {} permanent_pos", i))?;
                player.permanent_pos[c as usize] = step;
            }
            for &c in &p.claimed {
                check_column(c, &format!("player {} claimed", i))?;
                player.claim(c);
            }
            players.push(player);
        }

        let mut claimed_by = [None; COLUMN_SLOTS];
        for (&c, &owner) in &snap.claimed_by {
            check_column(c, "claimed_by")?;
            claimed_by[c as usize] = owner;
        }

        for &c in snap.turn.active_runners.keys() {
            check_column(c, "active_runners")?;
        }
        let turn = TurnState {
            active_runners: snap.turn.active_runners,
            last_roll: snap.turn.last_roll,
        };
        if snap.turn.free_runners != turn.free_runners() {
            return Err(inconsistent(format!(
                "free_runners={} but {} active runners",
                snap.turn.free_runners,
                turn.active_runners.len()
            )));
        }

        let state = GameState {
            players,
            claimed_by,
            current: snap.current,
            winner: snap.winner,
            turn,
        };
        check_consistency(&state)?;
        Ok(state)
    }
}

pub fn to_json(state: &GameState) -> Result<String> {
    Ok(serde_json::to_string(&GameSnapshot::from(state))?)
}

pub fn from_json(json: &str) -> Result<GameState> {
    let snap: GameSnapshot = serde_json::from_str(json)?;
    GameState::try_from(snap)
}
