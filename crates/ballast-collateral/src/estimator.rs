//! Bounded price estimation and time decay.
//!
//! A price here is never a point: it is a closed interval `[low, high]`
//! wide enough to contain the true price given the oracle error of every
//! leg that produced it. Consumers choose the conservative end for their
//! purpose (low when valuing collateral held, high when capping what to
//! pay).
//!
//! ## Decay
//!
//! A successful refresh snapshots the interval. Reads serve the snapshot
//! unchanged while the youngest-possible fresh round could still be
//! pending, then widen it linearly: `low` slides to zero and `high`
//! stretches upward until, exactly one decay horizon later, the interval
//! becomes the unpriced sentinel `(0, MAX)` and stays there. Decay is a
//! pure function of the snapshot and the clock; a failed refresh never
//! touches the snapshot.

use std::fmt;
use std::sync::Arc;

use ballast_math::{Decimal, MathError};
use ballast_oracle::feed::{read_price, PriceFeed};
use ballast_oracle::FeedError;
use serde::{Deserialize, Serialize};

/// A closed price interval in target units per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Inclusive lower bound.
    pub low: Decimal,
    /// Inclusive upper bound.
    pub high: Decimal,
}

impl Price {
    /// The unpriced sentinel: zero to unbounded.
    pub const UNPRICED: Price = Price {
        low: Decimal::ZERO,
        high: Decimal::MAX,
    };

    /// Whether this is the unpriced sentinel.
    pub fn is_unpriced(self) -> bool {
        self.low.is_zero() && self.high == Decimal::MAX
    }
}

/// Snapshot of the last successfully observed price interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrice {
    /// Saved lower bound.
    pub low: Decimal,
    /// Saved upper bound.
    pub high: Decimal,
    /// Unix timestamp of the refresh that saved it.
    pub saved_at: u64,
}

/// One successful multi-leg oracle observation, before saving.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Lower bound after applying the oracle error.
    pub low: Decimal,
    /// Upper bound after applying the oracle error.
    pub high: Decimal,
    /// The raw peg reading `{target/ref}`, for deviation checks.
    pub peg: Decimal,
}

/// Why a price observation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// A leg could not be read. Transient: the asset turns iffy and a later
    /// refresh can recover.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Fixed-point arithmetic failed. Fatal: propagates out of the refresh.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Combine two independent relative errors: `1 - (1 - e1)(1 - e2)`.
///
/// Equal to `e1 + e2 - e1*e2`: just under the plain sum and never below
/// either input.
///
/// # Errors
///
/// - [`MathError::Underflow`] if either input exceeds 1
pub fn combined_error(e1: Decimal, e2: Decimal) -> std::result::Result<Decimal, MathError> {
    let keep1 = Decimal::ONE.try_sub(e1)?;
    let keep2 = Decimal::ONE.try_sub(e2)?;
    Decimal::ONE.try_sub(keep1.try_mul(keep2)?)
}

/// Turns oracle rounds into bounded price intervals and decays them.
///
/// The estimator owns the oracle legs and the saved snapshot but knows
/// nothing about collateral status; [`crate::asset::CollateralAsset`] maps
/// its failures onto the soundness machine.
pub struct PriceEstimator {
    peg_feed: Arc<dyn PriceFeed>,
    peg_timeout: u64,
    target_unit_feed: Option<(Arc<dyn PriceFeed>, u64)>,
    oracle_error: Decimal,
    price_timeout: u64,
    saved: Option<SavedPrice>,
}

impl PriceEstimator {
    /// Estimator over a single `{target/ref}` peg feed.
    pub fn new(
        peg_feed: Arc<dyn PriceFeed>,
        peg_timeout: u64,
        oracle_error: Decimal,
        price_timeout: u64,
    ) -> Self {
        Self {
            peg_feed,
            peg_timeout,
            target_unit_feed: None,
            oracle_error,
            price_timeout,
            saved: None,
        }
    }

    /// Estimator over a peg feed plus a `{quote/target}` target-unit feed,
    /// for targets that are not themselves the quote unit.
    pub fn with_target_unit(
        peg_feed: Arc<dyn PriceFeed>,
        peg_timeout: u64,
        target_unit_feed: Arc<dyn PriceFeed>,
        target_unit_timeout: u64,
        oracle_error: Decimal,
        price_timeout: u64,
    ) -> Self {
        Self {
            peg_feed,
            peg_timeout,
            target_unit_feed: Some((target_unit_feed, target_unit_timeout)),
            oracle_error,
            price_timeout,
            saved: None,
        }
    }

    /// The longest staleness timeout across the configured legs.
    pub fn max_oracle_timeout(&self) -> u64 {
        match &self.target_unit_feed {
            Some((_, timeout)) => self.peg_timeout.max(*timeout),
            None => self.peg_timeout,
        }
    }

    /// The decay horizon in seconds.
    pub fn price_timeout(&self) -> u64 {
        self.price_timeout
    }

    /// The last saved snapshot, if any refresh has succeeded yet.
    pub fn saved_price(&self) -> Option<SavedPrice> {
        self.saved
    }

    /// Read every leg and produce a bounded observation.
    ///
    /// `raw_ratio` is the current `{ref/tok}` rate; the interval is
    /// `mid * (1 - oracle_error)` to `mid * (1 + oracle_error)` around
    /// `peg * target_unit * raw_ratio`. Both bounds truncate, so a price
    /// at the bottom of the representable range can floor to a zero lower
    /// bound; consumers treat that as an unreliable reading.
    ///
    /// # Errors
    ///
    /// - [`PriceError::Feed`] if any leg fails its consumption contract
    /// - [`PriceError::Math`] if interval arithmetic overflows
    pub fn try_price(
        &self,
        raw_ratio: Decimal,
        current_time: u64,
    ) -> std::result::Result<Observation, PriceError> {
        let peg = read_price(self.peg_feed.as_ref(), self.peg_timeout, current_time)?;
        let mut mid = peg;
        if let Some((feed, timeout)) = &self.target_unit_feed {
            let unit = read_price(feed.as_ref(), *timeout, current_time)?;
            mid = mid.try_mul(unit)?;
        }
        mid = mid.try_mul(raw_ratio)?;

        let low = mid.try_mul(Decimal::ONE.try_sub(self.oracle_error)?)?;
        let high = mid.try_mul(Decimal::ONE.try_add(self.oracle_error)?)?;
        Ok(Observation { low, high, peg })
    }

    /// Record a successful observation as the new snapshot.
    pub fn save(&mut self, low: Decimal, high: Decimal, current_time: u64) {
        tracing::debug!(%low, %high, at = current_time, "price snapshot saved");
        self.saved = Some(SavedPrice {
            low,
            high,
            saved_at: current_time,
        });
    }

    /// The price interval as seen at `current_time`, decayed by age.
    ///
    /// Total and pure: with no snapshot, or one past the full horizon, this
    /// is [`Price::UNPRICED`].
    pub fn current_price(&self, current_time: u64) -> Price {
        let Some(saved) = self.saved else {
            return Price::UNPRICED;
        };
        let delta = current_time.saturating_sub(saved.saved_at);
        let hold = self.max_oracle_timeout();
        if delta <= hold {
            return Price {
                low: saved.low,
                high: saved.high,
            };
        }
        let elapsed = delta - hold;
        if elapsed >= self.price_timeout {
            return Price::UNPRICED;
        }
        self.decayed(saved, elapsed).unwrap_or(Price::UNPRICED)
    }

    /// Linear widening of `saved`, `elapsed` seconds into the decay window.
    ///
    /// Caller guarantees `0 < elapsed < price_timeout`, so the progression
    /// is strictly inside `(0, 1)` and `low` stays positive arithmetic-wise.
    fn decayed(&self, saved: SavedPrice, elapsed: u64) -> Option<Price> {
        let progression =
            Decimal::from_ratio(u128::from(elapsed), u128::from(self.price_timeout)).ok()?;
        let keep = Decimal::ONE.try_sub(progression).ok()?;
        let stretch = Decimal::ONE.try_add(progression).ok()?;
        let low = saved.low.try_mul(keep).ok()?;
        // A bound already near the top of the range widens straight to the
        // sentinel rather than overflowing.
        let high = saved.high.try_mul(stretch).unwrap_or(Decimal::MAX);
        Some(Price { low, high })
    }
}

impl fmt::Debug for PriceEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The feed handles are opaque trait objects; show everything else.
        f.debug_struct("PriceEstimator")
            .field("peg_timeout", &self.peg_timeout)
            .field(
                "target_unit_timeout",
                &self.target_unit_feed.as_ref().map(|(_, timeout)| *timeout),
            )
            .field("oracle_error", &self.oracle_error)
            .field("price_timeout", &self.price_timeout)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}
