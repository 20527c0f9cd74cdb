//! Redemption handlers.
//!
//! - `Redeem` pays base immediately out of the pending deposit reserve
//! - `LiquidUnstake` undelegates and records a claim maturing after the
//!   unbonding period
//! - `Claim` pays every matured record of the caller

use cosmwasm_std::{
    coin, BankMsg, DepsMut, Env, MessageInfo, Order, Response, StdError, StdResult, Uint128,
};

use crate::denom::deposit_denom;
use crate::error::ContractError;
use crate::exchange_rate::current_rate;
use crate::execute::cycle::harvest_native;
use crate::execute::{burn_derivative, transfer_derivative};
use crate::fees::split_fee;
use crate::ica::queue_instruction;
use crate::ledger::{record, Funding, HostMsg};
use crate::rebalance::split_undelegation;
use crate::state::{
    ensure_enabled, ensure_operational, load_amount, load_delegations, load_registered_params,
    next_id, BatchStatus, InstructionKind, LedgerKind, UnbondingBatch, UnbondingRecord,
    CLAIM_RESERVE, CONFIG, HOST_ACCOUNTS, NEXT_RECORD_ID, PENDING_DEPOSITS, UNBONDING_BATCHES,
    UNBONDING_RECORDS,
};

// ============================================================================
// Instant Redemption
// ============================================================================

/// Burn derivative and pay base out of the pending deposit reserve.
pub fn execute_redeem(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let params = ensure_operational(deps.storage)?;
    let config = CONFIG.load(deps.storage)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount);
    }

    let rate = current_rate(deps.as_ref(), &env)?;
    let split = split_fee(amount, params.fees.redemption_fee);
    let payout = rate.base_amount(split.net);
    if payout.is_zero() {
        return Err(ContractError::AmountTooSmall { amount });
    }

    let reserve = load_amount(deps.storage, &PENDING_DEPOSITS)?;
    if payout > reserve {
        return Err(ContractError::InsufficientLiquidReserve {
            requested: payout,
            available: reserve,
        });
    }

    transfer_derivative(
        deps.branch(),
        &env,
        &info.sender,
        &params.fees.fee_address,
        split.fee,
    )?;
    burn_derivative(deps.branch(), &env, &info.sender, split.net)?;
    PENDING_DEPOSITS.save(deps.storage, &(reserve - payout))?;

    Ok(Response::new()
        .add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: vec![coin(payout.u128(), deposit_denom(config.ledger, &params))],
        })
        .add_attribute("action", "redeem")
        .add_attribute("redeemer", info.sender)
        .add_attribute("burned", split.net)
        .add_attribute("fee", split.fee)
        .add_attribute("payout", payout))
}

// ============================================================================
// Unbonding
// ============================================================================

/// Burn derivative, undelegate the equivalent base across validators and
/// record a claim maturing after the unbonding period.
pub fn execute_liquid_unstake(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let params = ensure_operational(deps.storage)?;
    let config = CONFIG.load(deps.storage)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount);
    }

    let rate = current_rate(deps.as_ref(), &env)?;
    let split = split_fee(amount, params.fees.unstake_fee);
    let unbond = rate.base_amount(split.net);
    if unbond.is_zero() {
        return Err(ContractError::AmountTooSmall { amount });
    }

    let delegations = load_delegations(deps.storage)?;
    let delegated = delegations
        .iter()
        .fold(Uint128::zero(), |acc, (_, a)| acc + a);
    if unbond > delegated {
        return Err(ContractError::InsufficientDelegations {
            requested: unbond,
            delegated,
        });
    }
    let undelegations: Vec<HostMsg> = split_undelegation(unbond, &delegations)?
        .into_iter()
        .map(|(validator, amount)| HostMsg::Undelegate { validator, amount })
        .collect();

    // undelegating pays out rewards; harvest them first so they stay counted
    let withdrawals = match config.ledger {
        LedgerKind::Native => {
            let validators = undelegated_validators(&undelegations);
            harvest_native(deps.branch(), &env, &params, &rate, Some(&validators))?.0
        }
        LedgerKind::Interchain => vec![],
    };

    transfer_derivative(
        deps.branch(),
        &env,
        &info.sender,
        &params.fees.fee_address,
        split.fee,
    )?;
    burn_derivative(deps.branch(), &env, &info.sender, split.net)?;
    for msg in &undelegations {
        record(deps.storage, msg, Funding::Pending)?;
    }

    let record_id = next_id(deps.storage, &NEXT_RECORD_ID)?;
    let maturity = env.block.time.plus_seconds(config.unbonding_period);
    UNBONDING_RECORDS.save(
        deps.storage,
        (&info.sender, record_id),
        &UnbondingRecord {
            owner: info.sender.clone(),
            amount: unbond,
            maturity,
        },
    )?;

    let mut response = Response::new()
        .add_attribute("action", "liquid_unstake")
        .add_attribute("delegator", info.sender.as_str())
        .add_attribute("burned", split.net)
        .add_attribute("fee", split.fee)
        .add_attribute("unbonding", unbond)
        .add_attribute("record_id", record_id.to_string())
        .add_attribute("maturity", maturity.seconds().to_string());

    match config.ledger {
        LedgerKind::Native => {
            response = response.add_messages(withdrawals);
            for msg in &undelegations {
                response = response.add_message(msg.to_native(&params.base_denom)?);
            }
        }
        LedgerKind::Interchain => {
            UNBONDING_BATCHES.update(deps.storage, maturity.seconds(), |batch| -> StdResult<_> {
                let mut batch = batch.unwrap_or(UnbondingBatch {
                    amount: Uint128::zero(),
                    status: BatchStatus::Unbonding,
                });
                batch.amount += unbond;
                Ok(batch)
            })?;

            let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;
            let event = queue_instruction(
                deps.storage,
                &env,
                &config,
                &params,
                &mut accounts.delegator,
                undelegations,
                InstructionKind::Unstake {
                    owner: info.sender.clone(),
                    record_id,
                    burned: split.net,
                },
            )?;
            HOST_ACCOUNTS.save(deps.storage, &accounts)?;
            response = response.add_event(event);
        }
    }
    Ok(response)
}

fn undelegated_validators(msgs: &[HostMsg]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match m {
            HostMsg::Undelegate { validator, .. } => Some(validator.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Claim
// ============================================================================

/// Pay and remove every claimable record of the caller. Nothing claimable
/// is a successful no-op.
pub fn execute_claim(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    ensure_enabled(deps.storage)?;
    let params = load_registered_params(deps.storage)?;
    let config = CONFIG.load(deps.storage)?;

    let records: Vec<(u64, UnbondingRecord)> = UNBONDING_RECORDS
        .prefix(&info.sender)
        .range(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<_>>()?;

    let mut claimed = Uint128::zero();
    let mut count = 0u32;
    for (id, record) in records {
        if record.maturity > env.block.time {
            continue;
        }
        if config.ledger == LedgerKind::Interchain {
            let returned = UNBONDING_BATCHES
                .may_load(deps.storage, record.maturity.seconds())?
                .map_or(false, |b| b.status == BatchStatus::Returned);
            if !returned {
                continue;
            }
        }
        UNBONDING_RECORDS.remove(deps.storage, (&info.sender, id));
        claimed += record.amount;
        count += 1;
    }

    let mut response = Response::new()
        .add_attribute("action", "claim")
        .add_attribute("claimer", info.sender.as_str())
        .add_attribute("claimed", claimed)
        .add_attribute("records", count.to_string());
    if claimed.is_zero() {
        return Ok(response);
    }

    if config.ledger == LedgerKind::Interchain {
        let reserve = load_amount(deps.storage, &CLAIM_RESERVE)?;
        let remaining = reserve.checked_sub(claimed).map_err(StdError::from)?;
        CLAIM_RESERVE.save(deps.storage, &remaining)?;
    }
    response = response.add_message(BankMsg::Send {
        to_address: info.sender.to_string(),
        amount: vec![coin(claimed.u128(), deposit_denom(config.ledger, &params))],
    });
    Ok(response)
}
