//! Per-asset collateral configuration.
//!
//! Every tolerance the engine applies is fixed here, validated once, and
//! immutable afterward. A misconfigured asset must fail at construction;
//! nothing in this module substitutes a "safe" value for a bad one, because
//! the safe-looking substitute is exactly how a worthless token ends up
//! priced at par.
//!
//! Deployments describe their asset set declaratively in TOML
//! (`[[asset]]` tables); [`AssetCatalog::from_toml`] parses and validates
//! the whole file in one step.

use ballast_math::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical decay horizon: one week.
pub const DEFAULT_PRICE_TIMEOUT: u64 = 604_800;

/// Canonical peg-feed staleness timeout: one hour.
pub const DEFAULT_ORACLE_TIMEOUT: u64 = 3600;

/// Canonical grace before a soft default hardens: one day.
pub const DEFAULT_DELAY_UNTIL_DEFAULT: u64 = 86_400;

/// Canonical combined oracle error: 1%.
pub const DEFAULT_ORACLE_ERROR: Decimal = Decimal::from_inner(10_000_000_000_000_000);

/// Canonical peg deviation threshold: 5%.
pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_inner(50_000_000_000_000_000);

/// Canonical per-trade volume cap, in target units.
pub const DEFAULT_MAX_TRADE_VOLUME: Decimal = Decimal::from_int(1_000_000);

/// Immutable configuration of one collateral asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Identifier of the collateral token this asset prices.
    pub token: String,

    /// Target unit label, e.g. `"USD"`.
    #[serde(default = "default_target_name")]
    pub target_name: String,

    /// Largest trade size downstream layers may assume, in target units.
    #[serde(default = "default_max_trade_volume")]
    pub max_trade_volume: Decimal,

    /// Seconds a saved price holds before decay begins, and the length of
    /// the decay itself.
    #[serde(default = "default_price_timeout")]
    pub price_timeout: u64,

    /// Combined relative error of the price legs, in `[0, 1)`.
    #[serde(default = "default_oracle_error")]
    pub oracle_error: Decimal,

    /// Staleness timeout of the peg feed, in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout: u64,

    /// Staleness timeout of the optional target-unit feed, in seconds.
    #[serde(default)]
    pub target_unit_oracle_timeout: Option<u64>,

    /// Peg deviation tolerance in `[0, 1)`; zero disables peg checking for
    /// self-referential collateral.
    #[serde(default = "default_threshold")]
    pub default_threshold: Decimal,

    /// Seconds an asset may stay iffy before the default hardens.
    #[serde(default = "default_delay_until_default")]
    pub delay_until_default: u64,

    /// Revenue-hiding tolerance in `[0, 1)`; zero means any confirmed
    /// exchange-rate decrease defaults the asset immediately.
    #[serde(default)]
    pub allowed_drop: Decimal,
}

fn default_target_name() -> String {
    "USD".to_string()
}

fn default_max_trade_volume() -> Decimal {
    DEFAULT_MAX_TRADE_VOLUME
}

fn default_price_timeout() -> u64 {
    DEFAULT_PRICE_TIMEOUT
}

fn default_oracle_error() -> Decimal {
    DEFAULT_ORACLE_ERROR
}

fn default_oracle_timeout() -> u64 {
    DEFAULT_ORACLE_TIMEOUT
}

fn default_threshold() -> Decimal {
    DEFAULT_THRESHOLD
}

fn default_delay_until_default() -> u64 {
    DEFAULT_DELAY_UNTIL_DEFAULT
}

impl CollateralConfig {
    /// Validate every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// One [`ConfigError`] variant per rejected field; see the enum.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.target_name.is_empty() {
            return Err(ConfigError::MissingTargetName);
        }
        if self.max_trade_volume.is_zero() {
            return Err(ConfigError::ZeroMaxTradeVolume);
        }
        if self.price_timeout == 0 {
            return Err(ConfigError::ZeroPriceTimeout);
        }
        if self.oracle_timeout == 0 {
            return Err(ConfigError::ZeroOracleTimeout { leg: "peg" });
        }
        if self.target_unit_oracle_timeout == Some(0) {
            return Err(ConfigError::ZeroOracleTimeout { leg: "target unit" });
        }
        if self.oracle_error >= Decimal::ONE {
            return Err(ConfigError::FractionOutOfRange {
                field: "oracle_error",
                value: self.oracle_error,
            });
        }
        if self.default_threshold >= Decimal::ONE {
            return Err(ConfigError::FractionOutOfRange {
                field: "default_threshold",
                value: self.default_threshold,
            });
        }
        if self.allowed_drop >= Decimal::ONE {
            return Err(ConfigError::FractionOutOfRange {
                field: "allowed_drop",
                value: self.allowed_drop,
            });
        }
        if !self.default_threshold.is_zero() && self.delay_until_default == 0 {
            return Err(ConfigError::ZeroDelayUntilDefault);
        }
        Ok(())
    }
}

/// Declarative collateral set, as loaded from a TOML file.
///
/// ```toml
/// [[asset]]
/// token = "usdx"
/// oracle_error = "0.005"
///
/// [[asset]]
/// token = "yvusdx"
/// allowed_drop = "0.01"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetCatalog {
    /// One entry per collateral asset.
    #[serde(default, rename = "asset")]
    pub assets: Vec<CollateralConfig>,
}

impl AssetCatalog {
    /// Parse a catalog from TOML text and validate every entry.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] if the TOML is malformed
    /// - any entry's [`CollateralConfig::validate`] error
    pub fn from_toml(text: &str) -> std::result::Result<Self, ConfigError> {
        let catalog: AssetCatalog = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        for asset in &catalog.assets {
            asset.validate()?;
        }
        Ok(catalog)
    }
}

/// Why a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The token identifier is empty.
    #[error("missing token identifier")]
    MissingToken,

    /// The target unit label is empty.
    #[error("missing target name")]
    MissingTargetName,

    /// The trade volume cap is zero.
    #[error("max trade volume must be positive")]
    ZeroMaxTradeVolume,

    /// The decay horizon is zero.
    #[error("price timeout must be positive")]
    ZeroPriceTimeout,

    /// A feed staleness timeout is zero.
    #[error("{leg} oracle timeout must be positive")]
    ZeroOracleTimeout {
        /// Which leg carried the zero timeout.
        leg: &'static str,
    },

    /// A relative tolerance reached or exceeded 100%.
    #[error("{field} must be below 1, got {value}")]
    FractionOutOfRange {
        /// The offending field.
        field: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// A peg threshold was set without a grace delay.
    #[error("delay until default must be positive when a peg threshold is set")]
    ZeroDelayUntilDefault,

    /// A target-unit feed was supplied without a staleness timeout for it.
    #[error("target unit feed configured without a staleness timeout")]
    MissingTargetUnitTimeout,

    /// The TOML catalog could not be parsed.
    #[error("invalid asset catalog: {reason}")]
    Parse {
        /// Parser diagnostics.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CollateralConfig {
        CollateralConfig {
            token: "usdx".to_string(),
            target_name: "USD".to_string(),
            max_trade_volume: DEFAULT_MAX_TRADE_VOLUME,
            price_timeout: DEFAULT_PRICE_TIMEOUT,
            oracle_error: DEFAULT_ORACLE_ERROR,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            target_unit_oracle_timeout: None,
            default_threshold: DEFAULT_THRESHOLD,
            delay_until_default: DEFAULT_DELAY_UNTIL_DEFAULT,
            allowed_drop: Decimal::ZERO,
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        sample().validate().expect("sample config");
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut config = sample();
        config.token = String::new();
        assert_eq!(config.validate().expect_err("empty token"), ConfigError::MissingToken);
    }

    #[test]
    fn test_missing_target_name_rejected() {
        let mut config = sample();
        config.target_name = String::new();
        assert_eq!(
            config.validate().expect_err("empty target name"),
            ConfigError::MissingTargetName
        );
    }

    #[test]
    fn test_zero_max_trade_volume_rejected() {
        let mut config = sample();
        config.max_trade_volume = Decimal::ZERO;
        assert_eq!(
            config.validate().expect_err("zero volume"),
            ConfigError::ZeroMaxTradeVolume
        );
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = sample();
        config.price_timeout = 0;
        assert_eq!(config.validate().expect_err("zero horizon"), ConfigError::ZeroPriceTimeout);

        let mut config = sample();
        config.oracle_timeout = 0;
        assert_eq!(
            config.validate().expect_err("zero peg timeout"),
            ConfigError::ZeroOracleTimeout { leg: "peg" }
        );

        let mut config = sample();
        config.target_unit_oracle_timeout = Some(0);
        assert_eq!(
            config.validate().expect_err("zero unit timeout"),
            ConfigError::ZeroOracleTimeout { leg: "target unit" }
        );
    }

    #[test]
    fn test_fractions_must_stay_below_one() {
        for field in ["oracle_error", "default_threshold", "allowed_drop"] {
            let mut config = sample();
            match field {
                "oracle_error" => config.oracle_error = Decimal::ONE,
                "default_threshold" => config.default_threshold = Decimal::ONE,
                _ => config.allowed_drop = Decimal::ONE,
            }
            let err = config.validate().expect_err("fraction at 1");
            assert!(
                matches!(err, ConfigError::FractionOutOfRange { field: f, .. } if f == field),
                "wrong variant for {field}: {err:?}"
            );
        }
    }

    #[test]
    fn test_high_but_legal_fractions_pass() {
        let mut config = sample();
        config.oracle_error = "0.99".parse().expect("decimal literal");
        config.allowed_drop = "0.5".parse().expect("decimal literal");
        config.validate().expect("sub-1 fractions are legal");
    }

    #[test]
    fn test_zero_delay_requires_zero_threshold() {
        let mut config = sample();
        config.delay_until_default = 0;
        assert_eq!(
            config.validate().expect_err("delay zero with threshold"),
            ConfigError::ZeroDelayUntilDefault
        );

        // Self-referential collateral: no peg check, no delay needed.
        config.default_threshold = Decimal::ZERO;
        config.validate().expect("threshold zero allows zero delay");
    }

    #[test]
    fn test_catalog_minimal_entry_gets_defaults() {
        let catalog = AssetCatalog::from_toml(
            r#"
            [[asset]]
            token = "usdx"
            "#,
        )
        .expect("minimal catalog");

        assert_eq!(catalog.assets.len(), 1);
        let asset = &catalog.assets[0];
        assert_eq!(asset.target_name, "USD");
        assert_eq!(asset.price_timeout, DEFAULT_PRICE_TIMEOUT);
        assert_eq!(asset.oracle_timeout, DEFAULT_ORACLE_TIMEOUT);
        assert_eq!(asset.oracle_error, DEFAULT_ORACLE_ERROR);
        assert_eq!(asset.default_threshold, DEFAULT_THRESHOLD);
        assert_eq!(asset.delay_until_default, DEFAULT_DELAY_UNTIL_DEFAULT);
        assert_eq!(asset.allowed_drop, Decimal::ZERO);
        assert_eq!(asset.target_unit_oracle_timeout, None);
    }

    #[test]
    fn test_catalog_multiple_assets() {
        let catalog = AssetCatalog::from_toml(
            r#"
            [[asset]]
            token = "usdx"
            oracle_error = "0.005"

            [[asset]]
            token = "yvusdx"
            allowed_drop = "0.01"
            target_unit_oracle_timeout = 7200
            "#,
        )
        .expect("two-asset catalog");

        assert_eq!(catalog.assets.len(), 2);
        assert_eq!(catalog.assets[0].oracle_error, "0.005".parse().expect("decimal"));
        assert_eq!(catalog.assets[1].allowed_drop, "0.01".parse().expect("decimal"));
        assert_eq!(catalog.assets[1].target_unit_oracle_timeout, Some(7200));
    }

    #[test]
    fn test_catalog_rejects_invalid_entry() {
        let err = AssetCatalog::from_toml(
            r#"
            [[asset]]
            token = "usdx"
            oracle_timeout = 0
            "#,
        )
        .expect_err("invalid entry");
        assert_eq!(err, ConfigError::ZeroOracleTimeout { leg: "peg" });
    }

    #[test]
    fn test_catalog_rejects_malformed_toml() {
        let err = AssetCatalog::from_toml("[[asset").expect_err("malformed");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = sample();
        let text = toml::to_string(&config).expect("serialize");
        let back: CollateralConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(back, config);
    }
}
