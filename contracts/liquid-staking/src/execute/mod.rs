//! Execute handlers for the liquid staking contract.
//!
//! - `stake` - LiquidStake
//! - `unstake` - Redeem, LiquidUnstake and Claim
//! - `admin` - JumpStart, RecreateIca, ChangeModuleState and ReportSlashing
//! - `token` - the derivative's cw20 surface
//! - `cycle` - end-block delegation and rebalancing

mod admin;
pub(crate) mod cycle;
mod stake;
mod token;
mod unstake;

pub use admin::*;
pub use cycle::{execute_end_block, handle_ledger_reply, rebalance_now};
pub use stake::*;
pub(crate) use token::{burn_derivative, mint_derivative, transfer_derivative};
pub use token::{
    execute_token_decrease_allowance, execute_token_increase_allowance, execute_token_send,
    execute_token_send_from, execute_token_transfer, execute_token_transfer_from,
};
pub use unstake::*;
