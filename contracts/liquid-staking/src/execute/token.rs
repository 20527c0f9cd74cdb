//! Derivative token handlers.
//!
//! The derivative is a cw20 ledger embedded in this contract. Holders use the
//! usual cw20 surface; minting is reserved to the contract itself.

use cosmwasm_std::{Addr, Binary, DepsMut, Env, MessageInfo, Response, Uint128};
use cw20::Expiration;
use cw20_base::allowances::{
    execute_decrease_allowance, execute_increase_allowance, execute_send_from,
    execute_transfer_from,
};
use cw20_base::contract::{execute_burn, execute_mint, execute_send, execute_transfer};

use crate::error::ContractError;

// ============================================================================
// Internal Ledger Operations
// ============================================================================

fn as_sender(sender: &Addr) -> MessageInfo {
    MessageInfo {
        sender: sender.clone(),
        funds: vec![],
    }
}

/// Mint derivative with the contract as minter. Zero is a no-op.
pub(crate) fn mint_derivative(
    deps: DepsMut,
    env: &Env,
    recipient: &Addr,
    amount: Uint128,
) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Ok(());
    }
    let info = as_sender(&env.contract.address);
    execute_mint(deps, env.clone(), info, recipient.to_string(), amount)?;
    Ok(())
}

/// Burn derivative held by `owner`. Zero is a no-op.
pub(crate) fn burn_derivative(
    deps: DepsMut,
    env: &Env,
    owner: &Addr,
    amount: Uint128,
) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Ok(());
    }
    execute_burn(deps, env.clone(), as_sender(owner), amount)?;
    Ok(())
}

/// Move derivative between holders. Zero is a no-op.
pub(crate) fn transfer_derivative(
    deps: DepsMut,
    env: &Env,
    from: &Addr,
    to: &Addr,
    amount: Uint128,
) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Ok(());
    }
    execute_transfer(deps, env.clone(), as_sender(from), to.to_string(), amount)?;
    Ok(())
}

// ============================================================================
// cw20 Surface
// ============================================================================

pub fn execute_token_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    Ok(execute_transfer(deps, env, info, recipient, amount)?)
}

pub fn execute_token_send(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    contract: String,
    amount: Uint128,
    msg: Binary,
) -> Result<Response, ContractError> {
    Ok(execute_send(deps, env, info, contract, amount, msg)?)
}

pub fn execute_token_increase_allowance(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    spender: String,
    amount: Uint128,
    expires: Option<Expiration>,
) -> Result<Response, ContractError> {
    Ok(execute_increase_allowance(
        deps, env, info, spender, amount, expires,
    )?)
}

pub fn execute_token_decrease_allowance(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    spender: String,
    amount: Uint128,
    expires: Option<Expiration>,
) -> Result<Response, ContractError> {
    Ok(execute_decrease_allowance(
        deps, env, info, spender, amount, expires,
    )?)
}

pub fn execute_token_transfer_from(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    owner: String,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    Ok(execute_transfer_from(
        deps, env, info, owner, recipient, amount,
    )?)
}

pub fn execute_token_send_from(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    owner: String,
    contract: String,
    amount: Uint128,
    msg: Binary,
) -> Result<Response, ContractError> {
    Ok(execute_send_from(
        deps, env, info, owner, contract, amount, msg,
    )?)
}
