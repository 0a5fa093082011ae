//! Bank service implementation

use std::collections::BTreeMap;
use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::gateway::BankKeeper;
use common::model::account::Balance;
use common::model::coin::{AccAddress, Coin};
use tracing::{debug, info};

use crate::repository::{BalanceRepository, InMemoryBalanceRepository};

/// Bank service for managing account balances and frozen funds
pub struct BankService {
    /// Repository for balance data
    repo: Arc<dyn BalanceRepository>,
}

impl BankService {
    /// Create a new bank service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryBalanceRepository::new()),
        }
    }

    /// Create a new bank service with a specific repository
    pub fn with_repository(repo: Arc<dyn BalanceRepository>) -> Self {
        Self { repo }
    }

    /// Get a balance
    pub fn get_balance(&self, address: &AccAddress, denom: &str) -> Result<Option<Balance>> {
        self.repo.get_balance(address, denom)
    }

    /// Get all balances for an account
    pub fn get_balances(&self, address: &AccAddress) -> Result<Vec<Balance>> {
        self.repo.get_balances(address)
    }

    /// Available amount of `denom`, zero if the account never held it
    pub fn available(&self, address: &AccAddress, denom: &str) -> Amount {
        self.repo
            .get_balance(address, denom)
            .ok()
            .flatten()
            .map_or(0, |b| b.available)
    }

    /// Frozen amount of `denom`, zero if the account never held it
    pub fn frozen(&self, address: &AccAddress, denom: &str) -> Amount {
        self.repo
            .get_balance(address, denom)
            .ok()
            .flatten()
            .map_or(0, |b| b.frozen)
    }

    /// Deposit funds into an account
    pub fn deposit(&self, address: &AccAddress, coin: &Coin) -> Result<Balance> {
        if coin.amount < 0 {
            return Err(Error::InvalidOrder(format!("cannot deposit negative amount {}", coin)));
        }
        info!("Depositing {} to account {}", coin, address);

        let mut balance = self
            .repo
            .ensure_balance(address, &coin.denom)
            .with_context(|| format!("Failed to ensure balance for {} {}", address, coin.denom))?;
        balance
            .deposit(coin.amount)
            .map_err(|e| Error::InvalidOrder(format!("Cannot deposit {}: {}", coin, e)))?;

        self.repo
            .update_balance(balance)
            .with_context(|| format!("Failed to update balance after deposit for {}", address))
    }

    /// Withdraw funds from an account
    pub fn withdraw(&self, address: &AccAddress, coin: &Coin) -> Result<Balance> {
        info!("Withdrawing {} from account {}", coin, address);

        let mut balance = self
            .repo
            .get_balance(address, &coin.denom)?
            .ok_or_else(|| {
                Error::InsufficientBalance(format!("No {} balance found for {}", coin.denom, address))
            })?;

        balance
            .withdraw(coin.amount)
            .map_err(|e| Error::InsufficientBalance(format!("Cannot withdraw {}: {}", coin, e)))?;

        self.repo.update_balance(balance)
    }

    /// Sum requested coins per denom so duplicates are checked together
    fn totals(coins: &[Coin]) -> Result<BTreeMap<&str, Amount>> {
        let mut totals: BTreeMap<&str, Amount> = BTreeMap::new();
        for coin in coins {
            if coin.amount < 0 {
                return Err(Error::InvalidOrder(format!("negative coin amount {}", coin)));
            }
            let entry = totals.entry(coin.denom.as_str()).or_default();
            *entry = entry
                .checked_add(coin.amount)
                .ok_or_else(|| Error::InvalidOrder(format!("coin total overflows at {}", coin)))?;
        }
        Ok(totals)
    }
}

impl Default for BankService {
    fn default() -> Self {
        Self::new()
    }
}

impl BankKeeper for BankService {
    fn has_coins(&self, address: &AccAddress, coins: &[Coin]) -> bool {
        match Self::totals(coins) {
            Ok(totals) => totals
                .into_iter()
                .all(|(denom, amount)| self.available(address, denom) >= amount),
            Err(_) => false,
        }
    }

    fn subtract_coins(&self, address: &AccAddress, coins: &[Coin]) -> Result<()> {
        let totals = Self::totals(coins)?;

        // Check every denom before touching any balance
        for (denom, amount) in &totals {
            let available = self.available(address, denom);
            if available < *amount {
                return Err(Error::InsufficientBalance(format!(
                    "{} holds {}{}, needs {}{}",
                    address, available, denom, amount, denom
                )));
            }
        }

        for (denom, amount) in totals {
            let mut balance = self.repo.ensure_balance(address, denom)?;
            balance
                .withdraw(amount)
                .map_err(Error::InsufficientBalance)?;
            self.repo.update_balance(balance)?;
        }
        debug!("Subtracted {:?} from {}", coins, address);
        Ok(())
    }

    fn freeze_coins(&self, address: &AccAddress, coin: &Coin) -> Result<()> {
        debug!("Freezing {} for {}", coin, address);

        let mut balance = self
            .repo
            .get_balance(address, &coin.denom)?
            .ok_or_else(|| {
                Error::InsufficientBalance(format!("No {} balance found for {}", coin.denom, address))
            })?;
        balance.freeze(coin.amount).map_err(Error::InsufficientBalance)?;

        self.repo.update_balance(balance)?;
        Ok(())
    }

    fn unfreeze_coins(&self, address: &AccAddress, coin: &Coin) -> Result<()> {
        debug!("Unfreezing {} for {}", coin, address);

        let mut balance = self
            .repo
            .get_balance(address, &coin.denom)?
            .ok_or_else(|| {
                Error::InsufficientBalance(format!("No frozen {} found for {}", coin.denom, address))
            })?;
        balance.unfreeze(coin.amount).map_err(Error::InsufficientBalance)?;

        self.repo.update_balance(balance)?;
        Ok(())
    }
}
