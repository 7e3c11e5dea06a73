//! The three-state soundness machine.
//!
//! The only stored state is `when_default`, the Unix time at which the
//! asset is (or will be) in default. Status is derived by comparing it to
//! the caller's clock:
//!
//! - `when_default == NEVER` — **Sound**
//! - `when_default > now` — **Iffy**: a fault is pending and hardens into a
//!   default unless a clean refresh clears it first
//! - `when_default <= now` — **Disabled**, permanently
//!
//! Deriving rather than storing the status means an asset left iffy and
//! never refreshed again still reads as Disabled once its grace runs out,
//! and that Disabled is absorbing without any extra flag: every marking
//! operation refuses to move a `when_default` that has already passed.

use serde::{Deserialize, Serialize};

/// Sentinel `when_default` meaning no default is pending.
pub const NEVER: u64 = u64::MAX;

/// Soundness of a collateral asset at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollateralStatus {
    /// Fully functional.
    Sound,
    /// A fault is pending; the asset defaults unless it clears in time.
    Iffy,
    /// Permanently defaulted.
    Disabled,
}

/// Tracks when an asset defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultMonitor {
    when_default: u64,
    delay_until_default: u64,
}

impl DefaultMonitor {
    /// A sound monitor whose soft defaults harden after
    /// `delay_until_default` seconds.
    pub const fn new(delay_until_default: u64) -> Self {
        Self {
            when_default: NEVER,
            delay_until_default,
        }
    }

    /// Status as of `current_time`.
    pub fn status(&self, current_time: u64) -> CollateralStatus {
        if self.when_default == NEVER {
            CollateralStatus::Sound
        } else if self.when_default > current_time {
            CollateralStatus::Iffy
        } else {
            CollateralStatus::Disabled
        }
    }

    /// The projected default time; [`NEVER`] while sound.
    pub const fn when_default(&self) -> u64 {
        self.when_default
    }

    /// Record a clean observation, clearing any pending soft default.
    ///
    /// No-op once defaulted.
    pub fn mark_sound(&mut self, current_time: u64) {
        if self.is_defaulted(current_time) {
            return;
        }
        self.when_default = NEVER;
    }

    /// Record a transient fault: the asset will default at
    /// `current_time + delay_until_default` unless an earlier projection
    /// already exists. Repeated faults never push the projection later.
    ///
    /// No-op once defaulted.
    pub fn mark_iffy(&mut self, current_time: u64) {
        if self.is_defaulted(current_time) {
            return;
        }
        let projected = current_time.saturating_add(self.delay_until_default);
        self.when_default = self.when_default.min(projected);
    }

    /// Record a hard fault: the asset is in default as of `current_time`.
    ///
    /// No-op once defaulted, preserving the original default time.
    pub fn mark_disabled(&mut self, current_time: u64) {
        if self.is_defaulted(current_time) {
            return;
        }
        self.when_default = current_time;
    }

    fn is_defaulted(&self, current_time: u64) -> bool {
        self.when_default <= current_time
    }
}
