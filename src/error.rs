//! Error taxonomy for the rules engine and snapshot layer.
//!
//! A bust is not an error: it is a normal end of turn reported through
//! [`crate::game_mechanics::RollReport`] and friends.

use std::fmt;

use crate::dice_mechanics::{Pairing, Roll};

#[derive(thiserror::Error, Debug)]
pub enum CantStopError {
    #[error("invalid configuration: {num_players} players (supported: 2..=4)")]
    InvalidConfiguration { num_players: usize },
    #[error("illegal move: {0}")]
    IllegalMove(IllegalMove),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Why a requested action was rejected. Carries enough context to
/// reconstruct the situation (roll, pairing, legal alternatives, seat).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IllegalMove {
    /// A pairing was submitted but no roll is waiting to be played.
    NoRollPending,
    /// A new roll was requested before the previous one was played.
    RollPending { roll: Roll },
    /// The pairing is not among the legal pairings for the pending roll.
    PairingNotLegal {
        pairing: Pairing,
        roll: Roll,
        legal: Vec<Pairing>,
        player: usize,
    },
    /// The current player has busted and cannot bank.
    StopAfterBust { roll: Option<Roll> },
    /// A die face outside 1..=6.
    InvalidDie { roll: Roll },
    /// The game already has a winner.
    GameOver { winner: usize },
}

impl fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMove::NoRollPending => write!(f, "no roll is pending"),
            IllegalMove::RollPending { roll } => {
                write!(f, "roll {:?} has not been played yet", roll)
            }
            IllegalMove::PairingNotLegal {
                pairing,
                roll,
                legal,
                player,
            } => write!(
                f,
                "pairing {:?} is not legal for player {} with roll {:?} (legal: {:?})",
                pairing, player, roll, legal
            ),
            IllegalMove::StopAfterBust { roll } => match roll {
                Some(r) => write!(f, "cannot stop after busting on roll {:?}", r),
                None => write!(f, "cannot stop after busting: no roll can be played"),
            },
            IllegalMove::InvalidDie { roll } => {
                write!(f, "roll {:?} contains a face outside 1..=6", roll)
            }
            IllegalMove::GameOver { winner } => {
                write!(f, "game is over (player {} won)", winner)
            }
        }
    }
}

impl From<IllegalMove> for CantStopError {
    fn from(m: IllegalMove) -> Self {
        CantStopError::IllegalMove(m)
    }
}

pub type Result<T> = std::result::Result<T, CantStopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_pairing_message_names_everything() {
        let err: CantStopError = IllegalMove::PairingNotLegal {
            pairing: (2, 12),
            roll: [1, 1, 6, 6],
            legal: vec![(7, 7)],
            player: 1,
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("(2, 12)"), "{msg}");
        assert!(msg.contains("[1, 1, 6, 6]"), "{msg}");
        assert!(msg.contains("(7, 7)"), "{msg}");
        assert!(msg.contains("player 1"), "{msg}");
    }

    #[test]
    fn test_configuration_message() {
        let err = CantStopError::InvalidConfiguration { num_players: 5 };
        assert_eq!(
            err.to_string(),
            "invalid configuration: 5 players (supported: 2..=4)"
        );
    }
}
