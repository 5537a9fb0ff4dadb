//! Coin magnitudes and amount decomposition.
//!
//! Amounts are integer satoshis. Every coin is worth exactly `2^magnitude`
//! satoshis, so an amount maps to one coin per set bit of its binary form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Total bitcoin supply in satoshis. No claim or send may exceed it.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Exponent of a coin's power-of-two value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Magnitude(u8);

impl Magnitude {
    /// Largest supported magnitude (a 2^30 satoshi coin).
    pub const MAX: u8 = 30;

    /// Number of distinct magnitudes (`0..=MAX`).
    pub const COUNT: usize = Self::MAX as usize + 1;

    pub fn new(exponent: u8) -> Result<Self, TypesError> {
        if exponent > Self::MAX {
            return Err(TypesError::InvalidMagnitude(exponent));
        }
        Ok(Self(exponent))
    }

    pub fn exponent(&self) -> u8 {
        self.0
    }

    /// The amount in satoshis a coin of this magnitude is worth.
    pub fn amount(&self) -> u64 {
        1u64 << self.0
    }

    /// Index into per-magnitude tables (signer keys).
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Magnitude> {
        (0..=Self::MAX).map(Magnitude)
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "2^{}", self.0)
    }
}

/// Split an amount into its canonical coin magnitudes, largest first.
///
/// Bits above `Magnitude::MAX` are expressed as repeated max-magnitude coins.
/// Callers bound `amount` by [`MAX_MONEY`] first.
pub fn decompose(amount: u64) -> Vec<Magnitude> {
    let mut magnitudes = Vec::new();
    let max_count = amount >> Magnitude::MAX;
    for _ in 0..max_count {
        magnitudes.push(Magnitude(Magnitude::MAX));
    }
    for exponent in (0..Magnitude::MAX).rev() {
        if amount & (1u64 << exponent) != 0 {
            magnitudes.push(Magnitude(exponent));
        }
    }
    magnitudes
}
