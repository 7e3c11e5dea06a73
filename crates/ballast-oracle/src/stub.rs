//! Settable price feed and ratio source for tests and local development.
//!
//! [`StubFeed`] mirrors an aggregator under test control: answer, precision,
//! and report timestamp can all be set after construction, including the
//! degenerate values real feeds produce when they break (zero timestamps,
//! negative answers, no answer at all). Interior mutability lets a scenario
//! drive a feed already shared behind an `Arc`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ballast_math::Decimal;

use crate::feed::{PriceFeed, RoundData};
use crate::ratio::RatioSource;
use crate::{FeedError, Result};

#[derive(Debug)]
struct FeedState {
    answer: i128,
    updated_at: u64,
    decimals: u8,
    unavailable: bool,
}

/// A shared, settable [`PriceFeed`].
#[derive(Debug)]
pub struct StubFeed {
    state: Mutex<FeedState>,
}

impl StubFeed {
    /// Create a feed reporting `answer` at `decimals` precision, last
    /// updated at `updated_at`.
    pub fn new(answer: i128, decimals: u8, updated_at: u64) -> Self {
        Self {
            state: Mutex::new(FeedState {
                answer,
                updated_at,
                decimals,
                unavailable: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        // A poisoned stub only means a test thread died mid-update.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a new answer and stamp it with `updated_at`.
    pub fn set_answer(&self, answer: i128, updated_at: u64) {
        tracing::debug!(answer, updated_at, "stub feed: answer changed");
        let mut state = self.state();
        state.answer = answer;
        state.updated_at = updated_at;
    }

    /// Overwrite only the report timestamp.
    pub fn set_updated_at(&self, updated_at: u64) {
        self.state().updated_at = updated_at;
    }

    /// Report rounds with a zero timestamp, as a never-completed round does.
    pub fn set_invalid_timestamp(&self) {
        self.state().updated_at = 0;
    }

    /// Change the reported precision.
    pub fn set_decimals(&self, decimals: u8) {
        self.state().decimals = decimals;
    }

    /// Make [`PriceFeed::latest_round`] fail outright, like a reverting
    /// aggregator.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }
}

impl PriceFeed for StubFeed {
    fn latest_round(&self) -> Result<RoundData> {
        let state = self.state();
        if state.unavailable {
            return Err(FeedError::Unavailable {
                reason: "stub feed set unavailable".to_string(),
            });
        }
        Ok(RoundData {
            answer: state.answer,
            updated_at: state.updated_at,
        })
    }

    fn decimals(&self) -> u8 {
        self.state().decimals
    }
}

#[derive(Debug)]
struct RatioState {
    rate: Decimal,
    unavailable: bool,
}

/// A settable [`RatioSource`] standing in for a yield protocol's
/// redemption-rate query.
#[derive(Debug)]
pub struct StubRatio {
    state: Mutex<RatioState>,
}

impl StubRatio {
    /// Create a source reporting `rate`.
    pub fn new(rate: Decimal) -> Self {
        Self {
            state: Mutex::new(RatioState {
                rate,
                unavailable: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RatioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the reported redemption rate (testing only).
    pub fn set_rate(&self, rate: Decimal) {
        tracing::warn!(new_rate = %rate, "stub ratio: rate changed (test only)");
        self.state().rate = rate;
    }

    /// Make [`RatioSource::raw_ratio`] fail, like an unreachable protocol.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }
}

impl RatioSource for StubRatio {
    fn raw_ratio(&self) -> Result<Decimal> {
        let state = self.state();
        if state.unavailable {
            return Err(FeedError::Unavailable {
                reason: "stub ratio set unavailable".to_string(),
            });
        }
        Ok(state.rate)
    }
}
