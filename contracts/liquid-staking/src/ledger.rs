//! Staking ledger operations
//!
//! `HostMsg` is the ledger-neutral form of every operation the module asks a
//! staking ledger to perform. On the native ledger it becomes a
//! `StakingMsg`/`DistributionMsg`; on the interchain ledger it is carried in an
//! outbound instruction and executed by the host account.
//!
//! `record` and `unrecord` apply and reverse the module's view of an
//! operation. The view is updated when the operation is emitted and reversed
//! if the ledger rejects it.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    coin, CosmosMsg, DistributionMsg, StakingMsg, StdError, StdResult, Storage, Uint128,
};

use crate::state::{load_amount, DELEGATIONS, HOST_IDLE, PENDING_DEPOSITS};

#[cw_serde]
pub enum HostMsg {
    Delegate {
        validator: String,
        amount: Uint128,
    },
    Undelegate {
        validator: String,
        amount: Uint128,
    },
    BeginRedelegate {
        src_validator: String,
        dst_validator: String,
        amount: Uint128,
    },
    WithdrawRewards {
        validator: String,
    },
    SetWithdrawAddress {
        address: String,
    },
    /// Move base from the rewards account to the delegator account
    SendToDelegator {
        amount: Uint128,
    },
    /// Transfer base from the delegator account back to this chain
    TransferToController {
        amount: Uint128,
    },
}

/// Where a delegation is funded from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Funding {
    /// Escrowed deposits held by this contract
    Pending,
    /// Base already sitting on the host delegator account
    HostIdle,
}

impl HostMsg {
    /// Native staking message for this operation.
    pub fn to_native(&self, bonded_denom: &str) -> StdResult<CosmosMsg> {
        let msg = match self {
            HostMsg::Delegate { validator, amount } => CosmosMsg::Staking(StakingMsg::Delegate {
                validator: validator.clone(),
                amount: coin(amount.u128(), bonded_denom),
            }),
            HostMsg::Undelegate { validator, amount } => {
                CosmosMsg::Staking(StakingMsg::Undelegate {
                    validator: validator.clone(),
                    amount: coin(amount.u128(), bonded_denom),
                })
            }
            HostMsg::BeginRedelegate {
                src_validator,
                dst_validator,
                amount,
            } => CosmosMsg::Staking(StakingMsg::Redelegate {
                src_validator: src_validator.clone(),
                dst_validator: dst_validator.clone(),
                amount: coin(amount.u128(), bonded_denom),
            }),
            HostMsg::WithdrawRewards { validator } => {
                CosmosMsg::Distribution(DistributionMsg::WithdrawDelegatorReward {
                    validator: validator.clone(),
                })
            }
            HostMsg::SetWithdrawAddress { address } => {
                CosmosMsg::Distribution(DistributionMsg::SetWithdrawAddress {
                    address: address.clone(),
                })
            }
            HostMsg::SendToDelegator { .. } | HostMsg::TransferToController { .. } => {
                return Err(StdError::generic_err(
                    "account transfers have no native staking equivalent",
                ))
            }
        };
        Ok(msg)
    }

    pub fn action(&self) -> &'static str {
        match self {
            HostMsg::Delegate { .. } => "delegate",
            HostMsg::Undelegate { .. } => "undelegate",
            HostMsg::BeginRedelegate { .. } => "redelegate",
            HostMsg::WithdrawRewards { .. } => "withdraw_rewards",
            HostMsg::SetWithdrawAddress { .. } => "set_withdraw_address",
            HostMsg::SendToDelegator { .. } => "send_to_delegator",
            HostMsg::TransferToController { .. } => "transfer_to_controller",
        }
    }
}

// ============================================================================
// Recorded Effects
// ============================================================================

pub fn add_delegation(storage: &mut dyn Storage, validator: &str, amount: Uint128) -> StdResult<()> {
    DELEGATIONS.update(storage, validator, |current| -> StdResult<_> {
        Ok(current.unwrap_or_default().checked_add(amount)?)
    })?;
    Ok(())
}

pub fn sub_delegation(storage: &mut dyn Storage, validator: &str, amount: Uint128) -> StdResult<()> {
    let current = DELEGATIONS.may_load(storage, validator)?.unwrap_or_default();
    let remaining = current.checked_sub(amount)?;
    if remaining.is_zero() {
        DELEGATIONS.remove(storage, validator);
    } else {
        DELEGATIONS.save(storage, validator, &remaining)?;
    }
    Ok(())
}

fn add_funding(storage: &mut dyn Storage, funding: Funding, amount: Uint128) -> StdResult<()> {
    let item = match funding {
        Funding::Pending => &PENDING_DEPOSITS,
        Funding::HostIdle => &HOST_IDLE,
    };
    let current = load_amount(storage, item)?;
    item.save(storage, &current.checked_add(amount)?)
}

fn sub_funding(storage: &mut dyn Storage, funding: Funding, amount: Uint128) -> StdResult<()> {
    let item = match funding {
        Funding::Pending => &PENDING_DEPOSITS,
        Funding::HostIdle => &HOST_IDLE,
    };
    let current = load_amount(storage, item)?;
    item.save(storage, &current.checked_sub(amount)?)
}

/// Apply the recorded effect of a delegation-changing operation.
///
/// Delegations draw from `funding`. Undelegations only reduce the recorded
/// delegation: the unbonding amount is tracked by its record.
pub fn record(storage: &mut dyn Storage, msg: &HostMsg, funding: Funding) -> StdResult<()> {
    match msg {
        HostMsg::Delegate { validator, amount } => {
            sub_funding(storage, funding, *amount)?;
            add_delegation(storage, validator, *amount)
        }
        HostMsg::Undelegate { validator, amount } => sub_delegation(storage, validator, *amount),
        HostMsg::BeginRedelegate {
            src_validator,
            dst_validator,
            amount,
        } => {
            sub_delegation(storage, src_validator, *amount)?;
            add_delegation(storage, dst_validator, *amount)
        }
        _ => Ok(()),
    }
}

/// Reverse `record`.
pub fn unrecord(storage: &mut dyn Storage, msg: &HostMsg, funding: Funding) -> StdResult<()> {
    match msg {
        HostMsg::Delegate { validator, amount } => {
            sub_delegation(storage, validator, *amount)?;
            add_funding(storage, funding, *amount)
        }
        HostMsg::Undelegate { validator, amount } => add_delegation(storage, validator, *amount),
        HostMsg::BeginRedelegate {
            src_validator,
            dst_validator,
            amount,
        } => {
            sub_delegation(storage, dst_validator, *amount)?;
            add_delegation(storage, src_validator, *amount)
        }
        _ => Ok(()),
    }
}
