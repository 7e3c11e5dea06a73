//! Revenue hiding for the reference exchange rate.
//!
//! Healthy yield protocols still report redemption rates that wobble by a
//! few wei from rounding in their own accounting. Treating every downtick
//! as a loss would brick sound collateral, so the tracker exposes a rate
//! discounted by `allowed_drop` below the best rate ever seen and ratchets
//! it monotonically upward. Only a raw rate falling below that cushion is
//! reported as a loss, and then the exposed rate becomes the raw rate
//! exactly: a confirmed loss is measured, never estimated.
//!
//! ## Invariants
//!
//! - `exposed <= high_water_mark` always
//! - `exposed` never decreases except on [`RatchetOutcome::ConfirmedLoss`]
//! - after a confirmed loss, `exposed` equals the observed raw rate

use ballast_math::{Decimal, MathError};

/// What an exchange-rate update meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatchetOutcome {
    /// The raw rate set a new high-water mark; the exposed rate rose.
    NewHigh,
    /// The raw rate sagged within the hiding band; nothing visible changed.
    Absorbed,
    /// The raw rate fell below the exposed rate: confirmed backing loss.
    ConfirmedLoss,
}

/// Monotonic `{ref/tok}` tracker with a hiding band.
///
/// A fresh tracker exposes zero; the first [`update`](Self::update) seeds
/// the band from the first observed rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPerTokTracker {
    high_water_mark: Decimal,
    exposed: Decimal,
    allowed_drop: Decimal,
}

impl RefPerTokTracker {
    /// A tracker hiding drops of up to `allowed_drop` (a fraction below 1).
    pub const fn new(allowed_drop: Decimal) -> Self {
        Self {
            high_water_mark: Decimal::ZERO,
            exposed: Decimal::ZERO,
            allowed_drop,
        }
    }

    /// Fold in a raw rate observation.
    ///
    /// # Errors
    ///
    /// Arithmetic failure only; callers treat it as fatal. With
    /// `allowed_drop` validated below 1 this cannot divide by zero.
    pub fn update(&mut self, raw: Decimal) -> Result<RatchetOutcome, MathError> {
        let keep = Decimal::ONE.try_sub(self.allowed_drop)?;
        if raw > self.high_water_mark {
            self.high_water_mark = raw;
            self.exposed = raw.try_mul(keep)?;
            return Ok(RatchetOutcome::NewHigh);
        }
        if raw < self.exposed {
            // Report the measured rate exactly and rebase the band around
            // it, so the same cushion protects the asset going forward.
            self.exposed = raw;
            self.high_water_mark = raw.try_div(keep)?;
            return Ok(RatchetOutcome::ConfirmedLoss);
        }
        Ok(RatchetOutcome::Absorbed)
    }

    /// The externally visible `{ref/tok}` rate.
    pub const fn exposed(&self) -> Decimal {
        self.exposed
    }

    /// The best raw rate ever observed (or implied by a rebase).
    pub const fn high_water_mark(&self) -> Decimal {
        self.high_water_mark
    }

    /// The configured hiding tolerance.
    pub const fn allowed_drop(&self) -> Decimal {
        self.allowed_drop
    }
}
