//! Account addresses and coin amounts

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;

/// Account identifier as carried by signed messages
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccAddress(String);

impl AccAddress {
    /// Wrap an address string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Raw bytes used in store keys
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

/// An amount of a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Token symbol (e.g., "cet")
    pub denom: String,
    /// Amount in base units
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
