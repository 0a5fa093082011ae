//! Balance model held by the ledger

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::model::coin::AccAddress;

/// Balance of one token for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Account address
    pub address: AccAddress,
    /// Token symbol (e.g., "cet", "eth")
    pub denom: String,
    /// Spendable amount
    pub available: Amount,
    /// Amount held against open orders
    pub frozen: Amount,
}

impl Balance {
    /// Create a new balance with zero amounts
    pub fn new(address: AccAddress, denom: String) -> Self {
        Self {
            address,
            denom,
            available: 0,
            frozen: 0,
        }
    }

    /// Total owned amount
    pub fn total(&self) -> Amount {
        self.available + self.frozen
    }

    /// Move funds from available to frozen
    pub fn freeze(&mut self, amount: Amount) -> Result<(), String> {
        if amount < 0 {
            return Err(format!("cannot freeze negative amount {}", amount));
        }
        if amount > self.available {
            return Err(format!("Insufficient balance: {} {}", self.available, self.denom));
        }

        self.frozen = self
            .frozen
            .checked_add(amount)
            .ok_or_else(|| format!("frozen {} overflows adding {}", self.denom, amount))?;
        self.available -= amount;
        Ok(())
    }

    /// Move funds from frozen back to available
    pub fn unfreeze(&mut self, amount: Amount) -> Result<(), String> {
        if amount < 0 {
            return Err(format!("cannot unfreeze negative amount {}", amount));
        }
        if amount > self.frozen {
            return Err(format!("Insufficient frozen balance: {} {}", self.frozen, self.denom));
        }

        self.available = self
            .available
            .checked_add(amount)
            .ok_or_else(|| format!("available {} overflows adding {}", self.denom, amount))?;
        self.frozen -= amount;
        Ok(())
    }

    /// Add funds to the balance
    pub fn deposit(&mut self, amount: Amount) -> Result<(), String> {
        if amount < 0 {
            return Err(format!("cannot deposit negative amount {}", amount));
        }
        self.available = self
            .available
            .checked_add(amount)
            .ok_or_else(|| format!("available {} overflows adding {}", self.denom, amount))?;
        Ok(())
    }

    /// Remove funds from the balance
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), String> {
        if amount < 0 {
            return Err(format!("cannot withdraw negative amount {}", amount));
        }
        if amount > self.available {
            return Err(format!("Insufficient available balance: {} {}", self.available, self.denom));
        }

        self.available -= amount;
        Ok(())
    }
}
