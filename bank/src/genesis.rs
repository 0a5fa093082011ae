//! Initial ledger contents

use common::error::Result;
use common::model::coin::{AccAddress, Coin};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::asset::{AssetRegistry, Token};
use crate::service::BankService;

/// Coins held by one account at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub address: AccAddress,
    pub coins: Vec<Coin>,
}

/// Tokens and balances the ledger starts from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerGenesis {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
}

impl LedgerGenesis {
    /// Load tokens into the registry and credit balances
    pub fn apply(&self, bank: &BankService, assets: &AssetRegistry) -> Result<()> {
        for token in &self.tokens {
            assets.issue_token(token.clone())?;
        }
        for entry in &self.balances {
            for coin in &entry.coins {
                bank.deposit(&entry.address, coin)?;
            }
        }
        info!(
            "Loaded ledger genesis with {} tokens and {} accounts",
            self.tokens.len(),
            self.balances.len()
        );
        Ok(())
    }
}
