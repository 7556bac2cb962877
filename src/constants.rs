//! Game constants and column-indexing helpers.
//!
//! Classic Can't Stop ruleset only: eleven columns (sums 2..12) whose heights
//! form a triangle peaking at 7, three runners per turn, four six-sided dice.
//!
//! Per-column arrays are indexed directly by the column number and carry
//! [`COLUMN_SLOTS`] = 13 entries. Slots 0 and 1 are unused padding so that
//! `heights[c]` reads naturally without an offset.

/// A column identifier, 2..=12 (the sum of two dice).
pub type Column = u8;

/// Smallest column identifier.
pub const MIN_COLUMN: Column = 2;

/// Largest column identifier.
pub const MAX_COLUMN: Column = 12;

/// Number of playable columns.
pub const NUM_COLUMNS: usize = 11;

/// Length of column-indexed arrays (slots 0 and 1 unused).
pub const COLUMN_SLOTS: usize = 13;

/// Steps to the top of each column, indexed by column number.
pub const COLUMN_HEIGHTS: [u8; COLUMN_SLOTS] = [0, 0, 3, 5, 7, 9, 11, 13, 11, 9, 7, 5, 3];

/// All column identifiers in ascending order.
pub const COLUMNS: [Column; NUM_COLUMNS] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Runners available to the current player each turn.
pub const NUM_RUNNERS: usize = 3;

/// Dice rolled per throw.
pub const NUM_DICE: usize = 4;

/// Distinct ordered outcomes of four six-sided dice: 6^4.
pub const NUM_ROLLS: usize = 1296;

/// Columns a player must claim to win.
pub const COLUMNS_TO_WIN: usize = 3;

/// Supported seat counts.
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Default MCTS simulations per recommendation.
pub const DEFAULT_ITERATIONS: usize = 2000;

/// Default UCT exploration constant.
pub const DEFAULT_EXPLORATION: f64 = 1.0;

/// Transitions allowed in one simulation before it is scored as a stop.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Height of column `c`. Panics in debug builds for identifiers outside 2..=12.
#[inline(always)]
pub fn column_height(c: Column) -> u8 {
    debug_assert!(is_valid_column(c), "column {} out of range", c);
    COLUMN_HEIGHTS[c as usize]
}

/// True for the eleven playable column identifiers.
#[inline(always)]
pub fn is_valid_column(c: Column) -> bool {
    (MIN_COLUMN..=MAX_COLUMN).contains(&c)
}

/// Bonus credited for topping out column `c` during a turn.
///
/// Outer columns are shorter but far less likely to be rolled, so finishing
/// one is worth more than its raw step count suggests.
pub fn finish_bonus(c: Column) -> f64 {
    match c {
        2 | 12 => 4.0,
        3 | 11 => 3.0,
        4 | 10 => 2.0,
        5 | 9 => 1.5,
        _ => 1.0,
    }
}

/// Test whether column `c` is set in a claimed-columns bitmask.
#[inline(always)]
pub fn is_column_in_mask(mask: u16, c: Column) -> bool {
    (mask & (1 << c)) != 0
}
