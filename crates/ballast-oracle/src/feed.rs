//! Price feeds and the round consumption contract.
//!
//! A [`PriceFeed`] hands back whatever its latest round says; it performs no
//! validation of its own. [`read_price`] is the single choke point through
//! which the engine consumes rounds, so the staleness, timestamp, and sign
//! rules live here and nowhere else.
//!
//! ## Staleness
//!
//! A round is acceptable while `current_time - updated_at` is at most the
//! caller's `timeout` plus [`ORACLE_TIMEOUT_BUFFER`]. The buffer absorbs the
//! short lag between an oracle network publishing a round and consumers
//! observing it; without it, a round landing seconds before a refresh would
//! flap assets in and out of the degraded state.

use ballast_math::Decimal;

use crate::{FeedError, Result};

/// Grace period in seconds added on top of each feed's staleness timeout.
pub const ORACLE_TIMEOUT_BUFFER: u64 = 300;

/// A single oracle round: the raw integer answer and its report time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    /// Raw answer at the feed's own precision. Signed because broken feeds
    /// do report negative values; [`read_price`] rejects them.
    pub answer: i128,
    /// Unix timestamp (seconds) at which the answer was reported.
    pub updated_at: u64,
}

/// A price oracle reporting rounds at a fixed decimal precision.
///
/// Implementations are shared behind `Arc` so one oracle can serve several
/// assets, hence `Send + Sync`.
pub trait PriceFeed: Send + Sync {
    /// The most recent round.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Unavailable`] when no round can be produced.
    fn latest_round(&self) -> Result<RoundData>;

    /// Number of fractional decimal digits in [`RoundData::answer`].
    fn decimals(&self) -> u8;
}

/// Read a feed and validate the round against the consumption contract.
///
/// On success the raw answer is rescaled to an 18-decimal [`Decimal`].
///
/// # Arguments
///
/// * `feed` - The feed to read
/// * `timeout` - The feed's staleness timeout in seconds
/// * `current_time` - Current Unix timestamp in seconds
///
/// # Errors
///
/// - [`FeedError::InvalidTimestamp`] if the round's timestamp is zero
/// - [`FeedError::FutureTimestamp`] if the round is dated after `current_time`
/// - [`FeedError::Stale`] if the round is older than `timeout` plus
///   [`ORACLE_TIMEOUT_BUFFER`]
/// - [`FeedError::NonPositiveAnswer`] if the answer is zero or negative
/// - [`FeedError::AnswerOutOfRange`] if the answer does not fit at
///   18-decimal precision
pub fn read_price(feed: &dyn PriceFeed, timeout: u64, current_time: u64) -> Result<Decimal> {
    let round = feed.latest_round()?;
    if round.updated_at == 0 {
        return Err(FeedError::InvalidTimestamp);
    }
    let age = match current_time.checked_sub(round.updated_at) {
        Some(age) => age,
        None => {
            return Err(FeedError::FutureTimestamp {
                updated_at: round.updated_at,
                current: current_time,
            })
        }
    };
    let allowed = timeout.saturating_add(ORACLE_TIMEOUT_BUFFER);
    if age > allowed {
        return Err(FeedError::Stale { age, allowed });
    }
    let raw = match u128::try_from(round.answer) {
        Ok(raw) if raw > 0 => raw,
        _ => return Err(FeedError::NonPositiveAnswer { answer: round.answer }),
    };
    let decimals = feed.decimals();
    Decimal::from_scaled(raw, decimals).map_err(|_| FeedError::AnswerOutOfRange {
        answer: round.answer,
        decimals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubFeed;

    const NOW: u64 = 1_700_000_000;
    const TIMEOUT: u64 = 3600;

    #[test]
    fn test_read_price_fresh_round() {
        let feed = StubFeed::new(100_000_000, 8, NOW);
        let price = read_price(&feed, TIMEOUT, NOW).expect("fresh round");
        assert_eq!(price, Decimal::ONE);
    }

    #[test]
    fn test_read_price_normalizes_decimals() {
        let eight = StubFeed::new(99_500_000, 8, NOW);
        let eighteen = StubFeed::new(995_000_000_000_000_000, 18, NOW);
        let a = read_price(&eight, TIMEOUT, NOW).expect("8 decimals");
        let b = read_price(&eighteen, TIMEOUT, NOW).expect("18 decimals");
        assert_eq!(a, b);
        assert_eq!(a, "0.995".parse().expect("decimal literal"));
    }

    #[test]
    fn test_read_price_stale_boundary() {
        let feed = StubFeed::new(100_000_000, 8, NOW);
        // Exactly at timeout + buffer is still acceptable.
        read_price(&feed, TIMEOUT, NOW + TIMEOUT + ORACLE_TIMEOUT_BUFFER).expect("at boundary");

        let err = read_price(&feed, TIMEOUT, NOW + TIMEOUT + ORACLE_TIMEOUT_BUFFER + 1)
            .expect_err("past boundary");
        assert!(matches!(err, FeedError::Stale { .. }));
    }

    #[test]
    fn test_read_price_zero_timestamp() {
        let feed = StubFeed::new(100_000_000, 8, NOW);
        feed.set_invalid_timestamp();
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("zero timestamp");
        assert_eq!(err, FeedError::InvalidTimestamp);
    }

    #[test]
    fn test_read_price_future_timestamp() {
        let feed = StubFeed::new(100_000_000, 8, NOW + 100);
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("future timestamp");
        assert!(matches!(err, FeedError::FutureTimestamp { .. }));
    }

    #[test]
    fn test_read_price_zero_answer() {
        let feed = StubFeed::new(0, 8, NOW);
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("zero answer");
        assert_eq!(err, FeedError::NonPositiveAnswer { answer: 0 });
    }

    #[test]
    fn test_read_price_negative_answer() {
        let feed = StubFeed::new(-1, 8, NOW);
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("negative answer");
        assert_eq!(err, FeedError::NonPositiveAnswer { answer: -1 });
    }

    #[test]
    fn test_read_price_unavailable_feed() {
        let feed = StubFeed::new(100_000_000, 8, NOW);
        feed.set_unavailable(true);
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("unavailable");
        assert!(matches!(err, FeedError::Unavailable { .. }));
    }

    #[test]
    fn test_read_price_answer_out_of_range() {
        let feed = StubFeed::new(i128::MAX, 0, NOW);
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("out of range");
        assert!(matches!(err, FeedError::AnswerOutOfRange { .. }));
    }

    #[test]
    fn test_ordering_of_checks_timestamp_before_answer() {
        // A dead round must surface as a timestamp problem even if the
        // answer is also garbage.
        let feed = StubFeed::new(-5, 8, NOW);
        feed.set_invalid_timestamp();
        let err = read_price(&feed, TIMEOUT, NOW).expect_err("dead round");
        assert_eq!(err, FeedError::InvalidTimestamp);
    }
}
