//! Reference-unit exchange-rate sources.
//!
//! Yield-bearing collateral wraps an underlying protocol position whose
//! redemption rate (`{ref/tok}`) comes from the issuing protocol itself,
//! not from a price oracle. [`RatioSource`] is that boundary. Fiat-style
//! collateral, where one token always redeems one reference unit, uses
//! [`ConstantRatio`].

use ballast_math::Decimal;

use crate::Result;

/// Source of the raw `{ref/tok}` redemption rate for a collateral token.
pub trait RatioSource: Send + Sync {
    /// The current redemption rate.
    ///
    /// # Errors
    ///
    /// Returns a [`FeedError`](crate::FeedError) when the underlying
    /// protocol cannot be queried. Callers treat this as a transient fault,
    /// never as an observed rate of zero.
    fn raw_ratio(&self) -> Result<Decimal>;
}

/// A fixed `{ref/tok}` rate for tokens that redeem at par forever.
#[derive(Debug, Clone)]
pub struct ConstantRatio {
    rate: Decimal,
}

impl ConstantRatio {
    /// A source that always reports `rate`.
    pub const fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

impl Default for ConstantRatio {
    fn default() -> Self {
        Self::new(Decimal::ONE)
    }
}

impl RatioSource for ConstantRatio {
    fn raw_ratio(&self) -> Result<Decimal> {
        Ok(self.rate)
    }
}
