//! Repository for balance data

use common::error::Result;
use common::model::account::Balance;
use common::model::coin::AccAddress;
use dashmap::DashMap;

/// Balance repository trait defining the interface for balance storage
pub trait BalanceRepository: Send + Sync {
    /// Get a balance
    fn get_balance(&self, address: &AccAddress, denom: &str) -> Result<Option<Balance>>;

    /// Get all balances for an account, ordered by denom
    fn get_balances(&self, address: &AccAddress) -> Result<Vec<Balance>>;

    /// Create or update a balance
    fn update_balance(&self, balance: Balance) -> Result<Balance>;

    /// Get a balance, creating a zero one if necessary
    fn ensure_balance(&self, address: &AccAddress, denom: &str) -> Result<Balance> {
        match self.get_balance(address, denom)? {
            Some(balance) => Ok(balance),
            None => Ok(Balance::new(address.clone(), denom.to_string())),
        }
    }
}

/// In-memory repository for balance data
pub struct InMemoryBalanceRepository {
    /// Balances by address and denom
    pub balances: DashMap<(AccAddress, String), Balance>,
}

impl InMemoryBalanceRepository {
    /// Create a new in-memory balance repository
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }
}

impl Default for InMemoryBalanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceRepository for InMemoryBalanceRepository {
    fn get_balance(&self, address: &AccAddress, denom: &str) -> Result<Option<Balance>> {
        Ok(self
            .balances
            .get(&(address.clone(), denom.to_string()))
            .map(|b| b.clone()))
    }

    fn get_balances(&self, address: &AccAddress) -> Result<Vec<Balance>> {
        let mut balances: Vec<Balance> = self
            .balances
            .iter()
            .filter_map(|entry| {
                let ((owner, _), balance) = entry.pair();
                if owner == address {
                    Some(balance.clone())
                } else {
                    None
                }
            })
            .collect();

        // DashMap iteration order is arbitrary
        balances.sort_by(|a, b| a.denom.cmp(&b.denom));
        Ok(balances)
    }

    fn update_balance(&self, balance: Balance) -> Result<Balance> {
        let key = (balance.address.clone(), balance.denom.clone());
        self.balances.insert(key, balance.clone());
        Ok(balance)
    }
}
