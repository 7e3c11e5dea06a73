//! # ballast-collateral
//!
//! Collateral pricing and default detection for the Ballast protocol.
//!
//! Each collateral asset owns three cooperating pieces:
//!
//! - a [`estimator::PriceEstimator`] turning oracle rounds into a bounded
//!   price interval that decays as its inputs age,
//! - a [`ratchet::RefPerTokTracker`] hiding routine exchange-rate noise
//!   while catching real backing losses,
//! - a [`monitor::DefaultMonitor`] deriving SOUND/IFFY/DISABLED from a
//!   single projected default time.
//!
//! [`asset::CollateralAsset`] wires the three together behind the
//! [`asset::PricedAsset`] trait; [`asset::PlainAsset`] reuses the pricing
//! half for tokens that are held but never collateralize anything.
//!
//! Transient oracle faults never error out of a refresh: they degrade the
//! asset's status and a later refresh can recover it. Only arithmetic
//! failures and rejected configuration surface as [`CollateralError`].
//!
//! ## Modules
//!
//! - [`config`] — Validated per-asset configuration, TOML-loadable
//! - [`estimator`] — Bounded price estimation and time decay
//! - [`ratchet`] — Revenue hiding for the reference exchange rate
//! - [`monitor`] — The three-state soundness machine
//! - [`asset`] — Asset composition and the [`asset::PricedAsset`] trait

pub mod asset;
pub mod config;
pub mod estimator;
pub mod monitor;
pub mod ratchet;

/// Error types for collateral operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollateralError {
    /// Configuration rejected at construction.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Fixed-point arithmetic failed; the refresh was aborted.
    #[error(transparent)]
    Math(#[from] ballast_math::MathError),
}

/// Convenience result type for collateral operations.
pub type Result<T> = std::result::Result<T, CollateralError>;
