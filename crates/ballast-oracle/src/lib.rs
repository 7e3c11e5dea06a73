//! # ballast-oracle
//!
//! Price-feed boundary for the Ballast collateral engine.
//!
//! Everything the engine knows about the outside world arrives through two
//! narrow traits: [`feed::PriceFeed`] for oracle rounds and
//! [`ratio::RatioSource`] for a yield protocol's redemption rate.
//! [`feed::read_price`] applies the consumption contract every caller must
//! honor: staleness with a grace buffer, timestamp and answer-sign checks,
//! and normalization to 18-decimal fixed point.
//!
//! Every failure here is a typed, transient [`FeedError`]. Deciding what a
//! fault means for collateral soundness is the engine's job, not this
//! crate's.
//!
//! ## Modules
//!
//! - [`feed`] — [`feed::PriceFeed`], raw rounds, and the consumption contract
//! - [`ratio`] — [`ratio::RatioSource`] for `{ref/tok}` redemption rates
//! - [`stub`] — Settable test doubles for both traits

pub mod feed;
pub mod ratio;
pub mod stub;

/// Error types for feed reads.
///
/// Every variant is transient: a later round can succeed after any of
/// these. Consumers degrade collateral status instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The feed could not produce a round at all.
    #[error("feed unavailable: {reason}")]
    Unavailable {
        /// Cause reported by the feed implementation.
        reason: String,
    },

    /// The round is older than the allowed staleness window.
    #[error("stale round: age {age}s exceeds allowed {allowed}s")]
    Stale {
        /// Seconds since the round was reported.
        age: u64,
        /// Staleness window including the grace buffer.
        allowed: u64,
    },

    /// The round carries a zero timestamp, meaning it never completed.
    #[error("round has no valid timestamp")]
    InvalidTimestamp,

    /// The round claims a report time ahead of the caller's clock.
    #[error("round timestamp {updated_at} is ahead of current time {current}")]
    FutureTimestamp {
        /// Reported round timestamp.
        updated_at: u64,
        /// Caller's current time.
        current: u64,
    },

    /// The answer is zero or negative.
    #[error("non-positive answer: {answer}")]
    NonPositiveAnswer {
        /// The offending raw answer.
        answer: i128,
    },

    /// The answer cannot be represented at 18-decimal precision.
    #[error("answer out of range: {answer} at {decimals} decimals")]
    AnswerOutOfRange {
        /// The offending raw answer.
        answer: i128,
        /// The feed's reported precision.
        decimals: u8,
    },
}

/// Convenience result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
