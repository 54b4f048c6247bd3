//! # Coin Amounts
//!
//! Exact minor-unit arithmetic with display scaling at the edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Minor units per whole coin (display scale is 10^-8).
pub const MINOR_UNITS_PER_COIN: u128 = 100_000_000;

/// An amount of coins held as minor units.
///
/// Sums over the whole chain are carried exactly; `as_coins` performs the
/// 10^-8 scaling used by every public circulation figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoinAmount(u128);

impl CoinAmount {
    pub const ZERO: CoinAmount = CoinAmount(0);

    pub const fn from_minor(minor: u128) -> Self {
        Self(minor)
    }

    pub const fn minor(&self) -> u128 {
        self.0
    }

    /// Display value in whole coins.
    pub fn as_coins(&self) -> f64 {
        let whole = (self.0 / MINOR_UNITS_PER_COIN) as f64;
        let frac = (self.0 % MINOR_UNITS_PER_COIN) as f64 / MINOR_UNITS_PER_COIN as f64;
        whole + frac
    }

    pub fn saturating_add(self, other: CoinAmount) -> CoinAmount {
        CoinAmount(self.0.saturating_add(other.0))
    }

    pub fn checked_sub(self, other: CoinAmount) -> Option<CoinAmount> {
        self.0.checked_sub(other.0).map(CoinAmount)
    }
}

impl From<u64> for CoinAmount {
    fn from(minor: u64) -> Self {
        Self(u128::from(minor))
    }
}

impl Sum for CoinAmount {
    fn sum<I: Iterator<Item = CoinAmount>>(iter: I) -> Self {
        iter.fold(CoinAmount::ZERO, CoinAmount::saturating_add)
    }
}

impl fmt::Display for CoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / MINOR_UNITS_PER_COIN,
            self.0 % MINOR_UNITS_PER_COIN
        )
    }
}
