//! Token registry: existence, issuer identity and freeze flags

use common::error::{Error, Result};
use common::gateway::AssetKeeper;
use common::model::coin::AccAddress;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token symbol (e.g., "eth")
    pub symbol: String,
    /// Issuing account
    pub owner: AccAddress,
    /// Whether the issuer froze transfers of the token
    #[serde(default)]
    pub is_frozen: bool,
}

impl Token {
    pub fn new(symbol: impl Into<String>, owner: AccAddress) -> Self {
        Self {
            symbol: symbol.into(),
            owner,
            is_frozen: false,
        }
    }
}

/// In-memory asset registry
pub struct AssetRegistry {
    /// Tokens by symbol
    pub tokens: DashMap<String, Token>,
}

impl AssetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }

    /// Register a token; symbols are unique
    pub fn issue_token(&self, token: Token) -> Result<()> {
        if token.symbol.is_empty() {
            return Err(Error::InvalidSymbol("token symbol is empty".to_string()));
        }
        if self.tokens.contains_key(&token.symbol) {
            return Err(Error::DuplicateSymbol(format!("token {} already issued", token.symbol)));
        }
        info!("Issuing token {} owned by {}", token.symbol, token.owner);
        self.tokens.insert(token.symbol.clone(), token);
        Ok(())
    }

    /// Set or clear the issuer freeze flag
    pub fn set_frozen(&self, symbol: &str, frozen: bool) -> Result<()> {
        let mut token = self
            .tokens
            .get_mut(symbol)
            .ok_or_else(|| Error::TokenNotFound(symbol.to_string()))?;
        token.is_frozen = frozen;
        Ok(())
    }

    pub fn get_token(&self, symbol: &str) -> Option<Token> {
        self.tokens.get(symbol).map(|t| t.clone())
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetKeeper for AssetRegistry {
    fn is_token_exists(&self, symbol: &str) -> bool {
        self.tokens.contains_key(symbol)
    }

    fn is_token_issuer(&self, symbol: &str, address: &AccAddress) -> bool {
        self.tokens
            .get(symbol)
            .map_or(false, |token| &token.owner == address)
    }

    fn is_token_frozen(&self, symbol: &str) -> bool {
        self.tokens.get(symbol).map_or(false, |token| token.is_frozen)
    }
}
