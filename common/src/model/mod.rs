//! Domain models for the market state machine

pub mod coin;
pub mod order;
pub mod market;
pub mod account;
pub mod event;
