//! Error types for the market state machine
//!
//! This module provides the unified error type returned by every keeper and
//! handler. Each precondition of a market message maps to exactly one variant,
//! and every variant maps to a stable result code so the block-execution
//! framework can record a rejected message without inspecting its text.

use std::fmt::Display;
use thiserror::Error;

/// Codespace under which market result codes are reported
pub const CODESPACE_MARKET: &str = "market";

/// Market engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// The trading pair is already registered
    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    /// The trading pair is not registered
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A token named by the message does not exist in the asset registry
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// The requester issued neither side of the trading pair
    #[error("Invalid token issuer: {0}")]
    InvalidTokenIssuer(String),

    /// Price precision is out of bounds or finer than the market allows
    #[error("Invalid price precision: {0}")]
    InvalidPricePrecision(String),

    /// The account cannot cover the required amount
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// The issuer has frozen the token
    #[error("Token frozen by issuer: {0}")]
    TokenFrozenByIssuer(String),

    /// Error when an order cannot be found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// An order with the same identifier already exists
    #[error("Duplicate order: {0}")]
    DuplicateOrder(String),

    /// The requester is not the owner of the order or market
    #[error("Sender mismatch: {0}")]
    SenderMismatch(String),

    /// The delist height does not respect the minimum delay
    #[error("Invalid effective height: {0}")]
    InvalidEffectiveHeight(String),

    /// The store backing the module is not mounted
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed account address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed trading-pair symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Error related to order validation
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable result code; zero is reserved for success
    pub fn code(&self) -> u32 {
        match self {
            Error::Internal(_) => 1,
            Error::Serialization(_) => 2,
            Error::DecimalError(_) => 3,
            Error::ConfigurationError(_) => 4,
            Error::StorageUnavailable(_) => 5,
            Error::InvalidAddress(_) => 6,
            Error::InvalidSymbol(_) => 601,
            Error::DuplicateSymbol(_) => 602,
            Error::SymbolNotFound(_) => 603,
            Error::TokenNotFound(_) => 604,
            Error::InvalidTokenIssuer(_) => 605,
            Error::InvalidPricePrecision(_) => 606,
            Error::InsufficientBalance(_) => 607,
            Error::TokenFrozenByIssuer(_) => 608,
            Error::InvalidOrder(_) => 609,
            Error::OrderNotFound(_) => 610,
            Error::DuplicateOrder(_) => 611,
            Error::SenderMismatch(_) => 612,
            Error::InvalidEffectiveHeight(_) => 613,
        }
    }

    /// Codespace the result code belongs to
    pub fn codespace(&self) -> &'static str {
        CODESPACE_MARKET
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error, keeping its kind
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            let wrap = |msg: String| format!("{}: {}", context, msg);
            match e {
                Error::DuplicateSymbol(msg) => Error::DuplicateSymbol(wrap(msg)),
                Error::SymbolNotFound(msg) => Error::SymbolNotFound(wrap(msg)),
                Error::TokenNotFound(msg) => Error::TokenNotFound(wrap(msg)),
                Error::InvalidTokenIssuer(msg) => Error::InvalidTokenIssuer(wrap(msg)),
                Error::InvalidPricePrecision(msg) => Error::InvalidPricePrecision(wrap(msg)),
                Error::InsufficientBalance(msg) => Error::InsufficientBalance(wrap(msg)),
                Error::TokenFrozenByIssuer(msg) => Error::TokenFrozenByIssuer(wrap(msg)),
                Error::OrderNotFound(msg) => Error::OrderNotFound(wrap(msg)),
                Error::DuplicateOrder(msg) => Error::DuplicateOrder(wrap(msg)),
                Error::SenderMismatch(msg) => Error::SenderMismatch(wrap(msg)),
                Error::InvalidEffectiveHeight(msg) => Error::InvalidEffectiveHeight(wrap(msg)),
                Error::StorageUnavailable(msg) => Error::StorageUnavailable(wrap(msg)),
                Error::InvalidAddress(msg) => Error::InvalidAddress(wrap(msg)),
                Error::InvalidSymbol(msg) => Error::InvalidSymbol(wrap(msg)),
                Error::InvalidOrder(msg) => Error::InvalidOrder(wrap(msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(wrap(msg)),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(wrap(msg)),
                Error::Internal(msg) => Error::Internal(wrap(msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
