//! MCTS tree operations.
//!
//! Nodes live in an arena (`Vec<MctsNode>`) and refer to each other by index:
//! each node stores its parent index and a list of (edge, child index).
//!
//! One simulation walks down from the root:
//! - decision and pairing nodes pick a child by UCT, expanding all children on
//!   first visit;
//! - chance nodes always sample a fresh roll, append it as a new child, and
//!   descend into that newest child;
//! - terminal nodes are scored and the walk ends.
//!
//! A walk that reaches the depth cap is scored as if the player stopped where
//! it ended. The reward is added unchanged to every ancestor's running sum.

use rand::Rng;

use crate::dice_mechanics::roll_dice;
use crate::game_mechanics::{apply_pairing, legal_pairings};
use crate::types::GameState;

use super::config::MctsConfig;
use super::node::{Edge, MctsNode, NodeKind};
use super::utility::stop_reward;

/// Arena-based MCTS tree.
pub struct MctsTree {
    pub nodes: Vec<MctsNode>,
}

impl MctsTree {
    /// Create a tree whose root is a `kind` node over a copy of `state`.
    pub fn new(kind: NodeKind, state: GameState) -> Self {
        MctsTree {
            nodes: vec![MctsNode::new(kind, state, None)],
        }
    }

    #[inline]
    pub fn root(&self) -> &MctsNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_child(&mut self, parent: usize, edge: Edge, kind: NodeKind, state: GameState) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(MctsNode::new(kind, state, Some(parent)));
        self.nodes[parent].children.push((edge, idx));
        idx
    }

    /// Add the STOP and ROLL children of a decision node if missing.
    pub fn expand_decision(&mut self, idx: usize) {
        if self.nodes[idx].child(&Edge::Stop).is_none() {
            let state = self.nodes[idx].state.clone();
            self.push_child(idx, Edge::Stop, NodeKind::TerminalStop, state);
        }
        if self.nodes[idx].child(&Edge::Roll).is_none() {
            let state = self.nodes[idx].state.clone();
            self.push_child(idx, Edge::Roll, NodeKind::Chance, state);
        }
    }

    /// Sample a new roll at a chance node and append the resulting child.
    /// Returns the new child's index.
    pub fn sample_chance<R: Rng + ?Sized>(&mut self, idx: usize, rng: &mut R) -> usize {
        let roll = roll_dice(rng);
        let node = &mut self.nodes[idx];
        let seq = node.samples;
        node.samples += 1;

        let mut state = node.state.clone();
        state.turn.last_roll = Some(roll);
        if legal_pairings(&state, &roll).is_empty() {
            self.push_child(idx, Edge::Bust { seq, roll }, NodeKind::TerminalBust, state)
        } else {
            self.push_child(idx, Edge::Outcome { seq, roll }, NodeKind::Pairing, state)
        }
    }

    /// Create one decision child per legal pairing of the node's pending roll.
    /// Does nothing if the node is already expanded or has no pending roll.
    pub fn expand_pairing(&mut self, idx: usize) {
        if !self.nodes[idx].children.is_empty() {
            return;
        }
        let parent_state = &self.nodes[idx].state;
        let Some(roll) = parent_state.turn.last_roll else {
            return;
        };

        let children: Vec<(Edge, GameState)> = legal_pairings(parent_state, &roll)
            .into_iter()
            .map(|pairing| {
                let mut state = parent_state.clone();
                apply_pairing(&mut state, pairing);
                state.turn.last_roll = None;
                (Edge::Pair(pairing), state)
            })
            .collect();

        for (edge, state) in children {
            self.push_child(idx, edge, NodeKind::Decision, state);
        }
    }

    /// Child maximizing `Q + c·sqrt(ln N / (1 + n))`; ties go to the earliest.
    pub fn select_uct(&self, idx: usize, exploration: f64) -> Option<usize> {
        let node = &self.nodes[idx];
        let mut best: Option<(f64, usize)> = None;
        for &(_, child_idx) in &node.children {
            let score = self.nodes[child_idx].uct(exploration, node.visits);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, child_idx));
            }
        }
        best.map(|(_, child_idx)| child_idx)
    }

    /// Add `reward` to `idx` and every ancestor.
    pub fn backpropagate(&mut self, idx: usize, reward: f64) {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let node = &mut self.nodes[i];
            node.visits += 1;
            node.value_sum += reward;
            cur = node.parent;
        }
    }

    /// Run one simulation from `root`. Returns the reward backed up.
    pub fn simulate<R: Rng + ?Sized>(&mut self, root: usize, rng: &mut R, config: &MctsConfig) -> f64 {
        let mut cur = root;
        for _ in 0..config.max_depth {
            let next = match self.nodes[cur].kind {
                NodeKind::TerminalBust => {
                    self.backpropagate(cur, 0.0);
                    return 0.0;
                }
                NodeKind::TerminalStop => {
                    let reward = stop_reward(&self.nodes[cur].state, config.risk);
                    self.backpropagate(cur, reward);
                    return reward;
                }
                NodeKind::Decision => {
                    if self.nodes[cur].children.is_empty() {
                        self.expand_decision(cur);
                    }
                    self.select_uct(cur, config.exploration)
                }
                NodeKind::Chance => Some(self.sample_chance(cur, rng)),
                NodeKind::Pairing => {
                    self.expand_pairing(cur);
                    self.select_uct(cur, config.exploration)
                }
            };
            match next {
                Some(child) => cur = child,
                None => {
                    // A pairing node without a playable pairing is a bust.
                    self.backpropagate(cur, 0.0);
                    return 0.0;
                }
            }
        }

        let reward = stop_reward(&self.nodes[cur].state, config.risk);
        self.backpropagate(cur, reward);
        reward
    }
}
