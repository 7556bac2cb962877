//! MCTS node representation.

use crate::dice_mechanics::{Pairing, Roll};
use crate::types::GameState;

/// What a node represents within the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Choose between stopping and rolling.
    Decision,
    /// Dice are about to be thrown; children are sampled outcomes.
    Chance,
    /// A roll is pending; children are its legal pairings.
    Pairing,
    /// The player banked here.
    TerminalStop,
    /// The sampled roll had no legal pairing.
    TerminalBust,
}

impl NodeKind {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeKind::TerminalStop | NodeKind::TerminalBust)
    }
}

/// Label on the edge from a parent to a child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Stop,
    Roll,
    /// The `seq`-th roll sampled at a chance node, which had legal pairings.
    Outcome { seq: u32, roll: Roll },
    /// The `seq`-th roll sampled at a chance node, which busted.
    Bust { seq: u32, roll: Roll },
    Pair(Pairing),
}

/// A node in the search arena. Owns a full copy of the game state.
#[derive(Clone, Debug)]
pub struct MctsNode {
    pub kind: NodeKind,
    pub state: GameState,
    /// Arena index of the parent; `None` for the root.
    pub parent: Option<usize>,
    /// Children as (edge, arena index), in creation order.
    pub children: Vec<(Edge, usize)>,
    pub visits: u32,
    /// Sum of rewards backed up through this node.
    pub value_sum: f64,
    /// Rolls sampled so far (chance nodes only).
    pub samples: u32,
}

impl MctsNode {
    pub fn new(kind: NodeKind, state: GameState, parent: Option<usize>) -> Self {
        MctsNode {
            kind,
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            value_sum: 0.0,
            samples: 0,
        }
    }

    /// Running mean reward, 0 while unvisited.
    #[inline]
    pub fn q_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }

    /// UCT score as seen from a parent with `parent_visits` visits.
    #[inline]
    pub fn uct(&self, exploration: f64, parent_visits: u32) -> f64 {
        let ln_n = (parent_visits.max(1) as f64).ln();
        self.q_value() + exploration * (ln_n / (1.0 + self.visits as f64)).sqrt()
    }

    pub fn child(&self, edge: &Edge) -> Option<usize> {
        self.children
            .iter()
            .find(|(e, _)| e == edge)
            .map(|&(_, idx)| idx)
    }
}
