//! Fee schedule
//!
//! Every fee is a fraction of the derivative involved in the operation and is
//! paid to the fee address in the derivative token.
//!
//! | Fee        | Charged on                      | Ceiling |
//! |------------|---------------------------------|---------|
//! | deposit    | derivative minted by a deposit  | 50%     |
//! | restake    | rewards moved back into stake   | 20%     |
//! | unstake    | derivative unbonded             | 50%     |
//! | redemption | derivative redeemed instantly   | 20%     |
//!
//! A fee must be strictly below its ceiling.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Uint128};

use crate::error::ContractError;

// ============================================================================
// Constants
// ============================================================================

pub const MAX_DEPOSIT_FEE: Decimal = Decimal::percent(50);
pub const MAX_RESTAKE_FEE: Decimal = Decimal::percent(20);
pub const MAX_UNSTAKE_FEE: Decimal = Decimal::percent(50);
pub const MAX_REDEMPTION_FEE: Decimal = Decimal::percent(20);

// ============================================================================
// Data Structures
// ============================================================================

/// Fee rates and the address collecting them
#[cw_serde]
pub struct FeeParams {
    pub deposit_fee: Decimal,
    pub restake_fee: Decimal,
    pub unstake_fee: Decimal,
    pub redemption_fee: Decimal,
    /// Receives every fee, in the derivative token
    pub fee_address: Addr,
}

impl FeeParams {
    /// Check every rate against its ceiling.
    pub fn validate(&self) -> Result<(), ContractError> {
        validate_rates(
            self.deposit_fee,
            self.restake_fee,
            self.unstake_fee,
            self.redemption_fee,
        )
    }
}

/// Fee portion and remainder of an amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee: Uint128,
    pub net: Uint128,
}

// ============================================================================
// Calculation
// ============================================================================

pub fn validate_rates(
    deposit_fee: Decimal,
    restake_fee: Decimal,
    unstake_fee: Decimal,
    redemption_fee: Decimal,
) -> Result<(), ContractError> {
    check_rate("deposit", deposit_fee, MAX_DEPOSIT_FEE)?;
    check_rate("restake", restake_fee, MAX_RESTAKE_FEE)?;
    check_rate("unstake", unstake_fee, MAX_UNSTAKE_FEE)?;
    check_rate("redemption", redemption_fee, MAX_REDEMPTION_FEE)?;
    Ok(())
}

fn check_rate(kind: &str, value: Decimal, max: Decimal) -> Result<(), ContractError> {
    if value >= max {
        return Err(ContractError::InvalidFee {
            kind: kind.to_string(),
            value,
            max,
        });
    }
    Ok(())
}

/// Split `amount` into a floored fee and the remainder.
pub fn split_fee(amount: Uint128, rate: Decimal) -> FeeSplit {
    let fee = amount * rate;
    FeeSplit {
        fee,
        net: amount - fee,
    }
}
