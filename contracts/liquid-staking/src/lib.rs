//! Liquid Staking Contract
//!
//! Accepts deposits of a chain's staking asset, mints a liquid derivative at
//! the current exchange rate and keeps the pooled stake delegated across a
//! weighted allow-list of validators.
//!
//! # Ledgers
//! - Native: the contract delegates through this chain's staking module
//! - Interchain: delegation happens on a host chain through interchain
//!   accounts; outbound instructions resolve through transport callbacks
//!
//! # Exchange Rate
//! The rate is net value over derivative supply, where net value counts
//! recorded delegations, rewards net of the restake fee, pending deposits
//! and host-side idle balance. It only moves down on a reported slash.
//!
//! # Flows
//! 1. `LiquidStake` mints against a pending deposit
//! 2. The end-block cycle delegates pending deposits and rebalances
//! 3. `Redeem` pays out of pending deposits immediately
//! 4. `LiquidUnstake` undelegates and `Claim` pays once the record matures

pub mod contract;
pub mod denom;
pub mod error;
pub mod exchange_rate;
mod execute;
pub mod fees;
pub mod governance;
pub mod ica;
pub mod ledger;
pub mod msg;
pub mod params;
mod query;
pub mod rebalance;
pub mod state;

pub use crate::error::ContractError;
pub use crate::exchange_rate::{ExchangeRate, NetAmountState};
pub use crate::fees::{split_fee, FeeParams};
