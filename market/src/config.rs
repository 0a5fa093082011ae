//! Configuration for the market module

use std::env;
use std::str::FromStr;

use common::decimal::precision::MAX_PRICE_PRECISION;
use common::error::{Error, Result};
use common::model::coin::Coin;
use serde::{Deserialize, Serialize};

/// Default market creation fee, in whole units of the fee token
pub const DEFAULT_CREATE_MARKET_FEE: i64 = 1_000_000;
/// Default fee token
pub const DEFAULT_FEE_DENOM: &str = "cet";
/// Decimal places of one base unit of the default fee token
pub const DEFAULT_FEE_DENOM_PRECISION: u8 = 8;
/// Default minimum delay, in blocks, between a delist request and its enactment
pub const DEFAULT_MIN_EFFECT_HEIGHT: i64 = 10_000;

/// Module parameters persisted in genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Market creation fee in whole units of `fee_denom`
    pub create_market_fee: i64,
    /// Token the creation fee is paid in
    pub fee_denom: String,
    /// Decimal places of one base unit of `fee_denom`
    pub fee_denom_precision: u8,
    /// Minimum delay, in blocks, before a delist request takes effect
    pub min_effect_height: i64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            create_market_fee: DEFAULT_CREATE_MARKET_FEE,
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            fee_denom_precision: DEFAULT_FEE_DENOM_PRECISION,
            min_effect_height: DEFAULT_MIN_EFFECT_HEIGHT,
        }
    }
}

impl Params {
    /// Check the parameters before they are used to build a configuration
    pub fn validate(&self) -> Result<()> {
        if self.fee_denom.is_empty() {
            return Err(Error::ConfigurationError("fee denom is empty".to_string()));
        }
        if self.create_market_fee <= 0 {
            return Err(Error::ConfigurationError(format!(
                "create market fee must be positive, got {}",
                self.create_market_fee
            )));
        }
        if self.fee_denom_precision > MAX_PRICE_PRECISION {
            return Err(Error::ConfigurationError(format!(
                "fee denom precision {} exceeds {}",
                self.fee_denom_precision, MAX_PRICE_PRECISION
            )));
        }
        if self.min_effect_height <= 0 {
            return Err(Error::ConfigurationError(format!(
                "min effect height must be positive, got {}",
                self.min_effect_height
            )));
        }
        Ok(())
    }

    /// Creation fee in base units of the fee token
    pub fn create_market_fee_coin(&self) -> Result<Coin> {
        let amount = 10i64
            .checked_pow(u32::from(self.fee_denom_precision))
            .and_then(|unit| self.create_market_fee.checked_mul(unit))
            .ok_or_else(|| {
                Error::ConfigurationError(format!(
                    "create market fee {} at precision {} overflows",
                    self.create_market_fee, self.fee_denom_precision
                ))
            })?;
        Ok(Coin::new(self.fee_denom.clone(), amount))
    }
}

/// Runtime configuration carried by the market handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    /// Parameters the configuration was built from
    pub params: Params,
    /// Creation fee in base units, computed once from `params`
    pub create_market_fee: Coin,
}

impl MarketConfig {
    /// Build the configuration from validated parameters
    pub fn from_params(params: Params) -> Result<Self> {
        params.validate()?;
        let create_market_fee = params.create_market_fee_coin()?;
        Ok(Self {
            params,
            create_market_fee,
        })
    }

    /// Create a new configuration using environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Params::default();
        let params = Params {
            create_market_fee: env_or("MARKET_CREATE_FEE", defaults.create_market_fee)?,
            fee_denom: env::var("MARKET_FEE_DENOM").unwrap_or(defaults.fee_denom),
            fee_denom_precision: env_or("MARKET_FEE_DENOM_PRECISION", defaults.fee_denom_precision)?,
            min_effect_height: env_or("MARKET_MIN_EFFECT_HEIGHT", defaults.min_effect_height)?,
        };
        Self::from_params(params)
    }

    /// Minimum delay, in blocks, before a delist request takes effect
    pub fn min_effect_height(&self) -> i64 {
        self.params.min_effect_height
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::ConfigurationError(format!("{}={:?}: {}", name, value, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee() {
        let config = MarketConfig::from_params(Params::default()).unwrap();
        assert_eq!(config.create_market_fee, Coin::new("cet", 100_000_000_000_000));
        assert_eq!(config.min_effect_height(), 10_000);
        assert_eq!(config.params, Params::default());
    }

    #[test]
    fn test_params_validation() {
        let mut params = Params::default();
        params.fee_denom = String::new();
        assert!(matches!(params.validate(), Err(Error::ConfigurationError(_))));

        let mut params = Params::default();
        params.min_effect_height = 0;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.create_market_fee = -5;
        assert!(params.validate().is_err());

        let mut params = Params::default();
        params.fee_denom_precision = 19;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_fee_overflow_is_rejected() {
        let params = Params {
            create_market_fee: i64::MAX / 10,
            ..Params::default()
        };
        assert!(matches!(
            MarketConfig::from_params(params),
            Err(Error::ConfigurationError(_))
        ));
    }
}
