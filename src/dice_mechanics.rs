//! Dice primitives: rolling four dice, grouping them into sum-pairs, and the
//! static table of all 6^4 ordered outcomes used by the odds engine.

use rand::Rng;

use crate::constants::{Column, NUM_DICE, NUM_ROLLS};
use crate::error::{IllegalMove, Result};

/// Four die faces in throw order, each 1..=6.
pub type Roll = [u8; NUM_DICE];

/// Two column sums formed by splitting a roll into two pairs of dice.
pub type Pairing = (Column, Column);

/// Every ordered four-dice outcome, lexicographic from [1,1,1,1] to [6,6,6,6].
pub static ALL_ROLLS: [Roll; NUM_ROLLS] = build_all_rolls();

const fn build_all_rolls() -> [Roll; NUM_ROLLS] {
    let mut rolls = [[0u8; NUM_DICE]; NUM_ROLLS];
    let mut i = 0;
    while i < NUM_ROLLS {
        rolls[i] = [
            (i / 216) as u8 + 1,
            (i / 36 % 6) as u8 + 1,
            (i / 6 % 6) as u8 + 1,
            (i % 6) as u8 + 1,
        ];
        i += 1;
    }
    rolls
}

/// Roll four independent fair dice.
#[inline]
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R) -> Roll {
    let mut dice = [0u8; NUM_DICE];
    for d in &mut dice {
        *d = rng.random_range(1..=6);
    }
    dice
}

/// The three ways to split four dice into two pairs, as sum-pairs.
///
/// Order is fixed: (d1+d2, d3+d4), (d1+d3, d2+d4), (d1+d4, d2+d3).
#[inline]
pub fn pairings_from_roll(roll: &Roll) -> [Pairing; 3] {
    let [d1, d2, d3, d4] = *roll;
    [(d1 + d2, d3 + d4), (d1 + d3, d2 + d4), (d1 + d4, d2 + d3)]
}

/// Reject rolls with faces outside 1..=6.
pub fn validate_roll(roll: &Roll) -> Result<()> {
    if roll.iter().all(|d| (1..=6).contains(d)) {
        Ok(())
    } else {
        Err(IllegalMove::InvalidDie { roll: *roll }.into())
    }
}
