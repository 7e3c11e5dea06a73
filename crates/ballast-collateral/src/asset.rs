//! Asset composition and the [`PricedAsset`] trait.
//!
//! [`CollateralAsset`] is the full engine: ratio source, ratchet, price
//! legs, and monitor behind a single `refresh`. [`PlainAsset`] is the
//! pricing half alone, for tokens the protocol holds but never
//! collateralizes (reward and governance tokens). Both implement
//! [`PricedAsset`], so a registry can drive a heterogeneous set through
//! one trait object.
//!
//! ## Refresh ordering
//!
//! A collateral refresh always advances the ratchet before pricing. The
//! exchange rate both detects hard defaults and scales the price, and a
//! backing loss must disable the asset even on a refresh whose price legs
//! happen to be broken at the same time.

use std::fmt;
use std::sync::Arc;

use ballast_math::Decimal;
use ballast_oracle::feed::PriceFeed;
use ballast_oracle::ratio::RatioSource;

use crate::config::{CollateralConfig, ConfigError};
use crate::estimator::{Observation, Price, PriceError, PriceEstimator, SavedPrice};
use crate::monitor::{CollateralStatus, DefaultMonitor};
use crate::ratchet::{RatchetOutcome, RefPerTokTracker};
use crate::Result;

/// Anything the protocol can refresh and price.
pub trait PricedAsset {
    /// Fold in fresh oracle state as of `current_time`.
    ///
    /// # Errors
    ///
    /// Fatal errors only; transient faults are absorbed into asset state.
    fn refresh(&mut self, current_time: u64) -> Result<()>;

    /// The current bounded price estimate.
    fn price(&self, current_time: u64) -> Price;

    /// Former name of [`price`](Self::price); identical result.
    #[deprecated(note = "use `price`")]
    fn lot_price(&self, current_time: u64) -> Price {
        self.price(current_time)
    }

    /// Identifier of the priced token.
    fn token(&self) -> &str;

    /// Largest trade size downstream layers may assume, in target units.
    fn max_trade_volume(&self) -> Decimal;

    /// The longest staleness timeout across this asset's price legs.
    fn max_oracle_timeout(&self) -> u64;

    /// The decay horizon in seconds.
    fn price_timeout(&self) -> u64;

    /// Whether this asset may collateralize the stablecoin.
    fn is_collateral(&self) -> bool;
}

/// A collateral asset: priced, ratcheted, and default-monitored.
pub struct CollateralAsset {
    config: CollateralConfig,
    peg_bottom: Decimal,
    peg_top: Decimal,
    estimator: PriceEstimator,
    ratchet: RefPerTokTracker,
    monitor: DefaultMonitor,
    ratio_source: Arc<dyn RatioSource>,
}

impl CollateralAsset {
    /// Build a collateral asset over its feeds and ratio source.
    ///
    /// # Arguments
    ///
    /// * `config` - Per-asset tolerances; validated here
    /// * `peg_feed` - The `{target/ref}` oracle
    /// * `target_unit_feed` - Optional `{quote/target}` oracle; requires
    ///   `config.target_unit_oracle_timeout`
    /// * `ratio_source` - The `{ref/tok}` redemption-rate collaborator
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] the configuration fails with.
    pub fn new(
        config: CollateralConfig,
        peg_feed: Arc<dyn PriceFeed>,
        target_unit_feed: Option<Arc<dyn PriceFeed>>,
        ratio_source: Arc<dyn RatioSource>,
    ) -> Result<Self> {
        config.validate()?;
        let estimator = match target_unit_feed {
            Some(feed) => {
                let timeout = config
                    .target_unit_oracle_timeout
                    .ok_or(ConfigError::MissingTargetUnitTimeout)?;
                PriceEstimator::with_target_unit(
                    peg_feed,
                    config.oracle_timeout,
                    feed,
                    timeout,
                    config.oracle_error,
                    config.price_timeout,
                )
            }
            None => PriceEstimator::new(
                peg_feed,
                config.oracle_timeout,
                config.oracle_error,
                config.price_timeout,
            ),
        };
        let peg_bottom = Decimal::ONE.try_sub(config.default_threshold)?;
        let peg_top = Decimal::ONE.try_add(config.default_threshold)?;
        Ok(Self {
            peg_bottom,
            peg_top,
            estimator,
            ratchet: RefPerTokTracker::new(config.allowed_drop),
            monitor: DefaultMonitor::new(config.delay_until_default),
            ratio_source,
            config,
        })
    }

    /// Fold in fresh oracle state as of `current_time`.
    ///
    /// Transient faults degrade status rather than erroring. A refresh only
    /// fails on arithmetic overflow, and then state is left exactly as the
    /// completed steps wrote it.
    pub fn refresh(&mut self, current_time: u64) -> Result<()> {
        let old_status = self.monitor.status(current_time);
        let result = self.refresh_inner(current_time);
        let new_status = self.monitor.status(current_time);
        if old_status != new_status {
            tracing::info!(
                token = %self.config.token,
                from = ?old_status,
                to = ?new_status,
                "collateral status changed"
            );
        }
        result
    }

    fn refresh_inner(&mut self, current_time: u64) -> Result<()> {
        match self.ratio_source.raw_ratio() {
            Ok(raw) => {
                if self.ratchet.update(raw)? == RatchetOutcome::ConfirmedLoss {
                    tracing::warn!(
                        token = %self.config.token,
                        rate = %raw,
                        "confirmed backing loss"
                    );
                    self.monitor.mark_disabled(current_time);
                }
                match self.estimator.try_price(raw, current_time) {
                    Ok(observation) => self.apply_observation(observation, current_time),
                    Err(PriceError::Feed(error)) => {
                        tracing::debug!(token = %self.config.token, %error, "price leg fault");
                        self.monitor.mark_iffy(current_time);
                    }
                    Err(PriceError::Math(error)) => return Err(error.into()),
                }
            }
            Err(error) => {
                // No reading is not a loss; the ratchet stays where it was.
                tracing::debug!(token = %self.config.token, %error, "ratio source fault");
                self.monitor.mark_iffy(current_time);
            }
        }
        Ok(())
    }

    fn apply_observation(&mut self, observation: Observation, current_time: u64) {
        if observation.high == Decimal::MAX {
            // An unbounded upper bound is useless; keep the old snapshot.
            self.monitor.mark_iffy(current_time);
            return;
        }
        self.estimator
            .save(observation.low, observation.high, current_time);
        if self.peg_faulted(&observation) {
            self.monitor.mark_iffy(current_time);
        } else {
            self.monitor.mark_sound(current_time);
        }
    }

    /// Whether an observation says the reference lost its peg.
    fn peg_faulted(&self, observation: &Observation) -> bool {
        if observation.low.is_zero() {
            return true;
        }
        if self.config.default_threshold.is_zero() {
            // Self-referential collateral has no peg to deviate from.
            return false;
        }
        observation.peg < self.peg_bottom || observation.peg > self.peg_top
    }

    /// The current bounded price estimate.
    pub fn price(&self, current_time: u64) -> Price {
        self.estimator.current_price(current_time)
    }

    /// Soundness as of `current_time`.
    pub fn status(&self, current_time: u64) -> CollateralStatus {
        self.monitor.status(current_time)
    }

    /// The projected default time; [`crate::monitor::NEVER`] while sound.
    pub fn when_default(&self) -> u64 {
        self.monitor.when_default()
    }

    /// The exposed `{ref/tok}` rate, discounted by the hiding band.
    pub fn ref_per_tok(&self) -> Decimal {
        self.ratchet.exposed()
    }

    /// Target unit label.
    pub fn target_name(&self) -> &str {
        &self.config.target_name
    }

    /// The last saved price snapshot, if any refresh has succeeded.
    pub fn saved_price(&self) -> Option<SavedPrice> {
        self.estimator.saved_price()
    }
}

impl fmt::Debug for CollateralAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The ratio source is an opaque trait object; show everything else.
        f.debug_struct("CollateralAsset")
            .field("config", &self.config)
            .field("estimator", &self.estimator)
            .field("ratchet", &self.ratchet)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl PricedAsset for CollateralAsset {
    fn refresh(&mut self, current_time: u64) -> Result<()> {
        CollateralAsset::refresh(self, current_time)
    }

    fn price(&self, current_time: u64) -> Price {
        CollateralAsset::price(self, current_time)
    }

    fn token(&self) -> &str {
        &self.config.token
    }

    fn max_trade_volume(&self) -> Decimal {
        self.config.max_trade_volume
    }

    fn max_oracle_timeout(&self) -> u64 {
        self.estimator.max_oracle_timeout()
    }

    fn price_timeout(&self) -> u64 {
        self.estimator.price_timeout()
    }

    fn is_collateral(&self) -> bool {
        true
    }
}

/// A priced, non-collateral asset (reward and governance tokens).
///
/// Shares the estimator and decay machinery with [`CollateralAsset`] but
/// has no reference ratio, no peg, and no soundness status.
#[derive(Debug)]
pub struct PlainAsset {
    token: String,
    max_trade_volume: Decimal,
    estimator: PriceEstimator,
}

impl PlainAsset {
    /// Build a plain asset over a single price feed.
    ///
    /// # Errors
    ///
    /// The same field rejections collateral configuration gets, minus the
    /// collateral-only fields.
    pub fn new(
        token: String,
        max_trade_volume: Decimal,
        feed: Arc<dyn PriceFeed>,
        oracle_timeout: u64,
        oracle_error: Decimal,
        price_timeout: u64,
    ) -> Result<Self> {
        if token.is_empty() {
            return Err(ConfigError::MissingToken.into());
        }
        if max_trade_volume.is_zero() {
            return Err(ConfigError::ZeroMaxTradeVolume.into());
        }
        if oracle_timeout == 0 {
            return Err(ConfigError::ZeroOracleTimeout { leg: "price" }.into());
        }
        if price_timeout == 0 {
            return Err(ConfigError::ZeroPriceTimeout.into());
        }
        if oracle_error >= Decimal::ONE {
            return Err(ConfigError::FractionOutOfRange {
                field: "oracle_error",
                value: oracle_error,
            }
            .into());
        }
        Ok(Self {
            token,
            max_trade_volume,
            estimator: PriceEstimator::new(feed, oracle_timeout, oracle_error, price_timeout),
        })
    }

    /// Re-read the feed and update the snapshot.
    ///
    /// Feed faults are ignored beyond a log line: with no status machine,
    /// the decaying snapshot already is the degraded behavior.
    pub fn refresh(&mut self, current_time: u64) -> Result<()> {
        match self.estimator.try_price(Decimal::ONE, current_time) {
            Ok(observation) => {
                if observation.high < Decimal::MAX {
                    self.estimator
                        .save(observation.low, observation.high, current_time);
                }
            }
            Err(PriceError::Feed(error)) => {
                tracing::debug!(token = %self.token, %error, "price leg fault");
            }
            Err(PriceError::Math(error)) => return Err(error.into()),
        }
        Ok(())
    }

    /// The current bounded price estimate.
    pub fn price(&self, current_time: u64) -> Price {
        self.estimator.current_price(current_time)
    }
}

impl PricedAsset for PlainAsset {
    fn refresh(&mut self, current_time: u64) -> Result<()> {
        PlainAsset::refresh(self, current_time)
    }

    fn price(&self, current_time: u64) -> Price {
        PlainAsset::price(self, current_time)
    }

    fn token(&self) -> &str {
        &self.token
    }

    fn max_trade_volume(&self) -> Decimal {
        self.max_trade_volume
    }

    fn max_oracle_timeout(&self) -> u64 {
        self.estimator.max_oracle_timeout()
    }

    fn price_timeout(&self) -> u64 {
        self.estimator.price_timeout()
    }

    fn is_collateral(&self) -> bool {
        false
    }
}
