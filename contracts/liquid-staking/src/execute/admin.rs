//! Admin operations handlers.
//!
//! This module handles:
//! - Host chain registration (JumpStart)
//! - Interchain account recreation
//! - Module enable/disable
//! - Slashing reports

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response, Uint128};

use crate::error::ContractError;
use crate::fees::FeeParams;
use crate::ica::start_handshake;
use crate::msg::JumpStartMsg;
use crate::params::{validate_allow_list, validate_host_chain_params, validate_owner_ids};
use crate::state::{
    AccountStatus, Config, HostAccounts, HostChainParams, LedgerKind, ALLOW_LISTED_VALIDATORS,
    CONFIG, DELEGATIONS, HOST_ACCOUNTS, HOST_CHAIN_PARAMS, MODULE_ENABLED, OBSERVED_DELEGATIONS,
};

fn ensure_admin(config: &Config, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

// ============================================================================
// Registration
// ============================================================================

/// Register the host chain, its fees and validator set, and (interchain)
/// open the host accounts.
pub fn execute_jump_start(
    deps: DepsMut,
    info: MessageInfo,
    msg: JumpStartMsg,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info)?;

    if let Some(existing) = HOST_CHAIN_PARAMS.may_load(deps.storage)? {
        if !existing.is_empty() {
            return Err(ContractError::AlreadyRegistered);
        }
    }

    let params = HostChainParams {
        chain_id: msg.chain_id,
        connection_id: msg.connection_id,
        transfer_channel: msg.transfer_channel,
        transfer_port: msg.transfer_port,
        base_denom: msg.base_denom,
        mint_denom: msg.mint_denom,
        min_deposit: msg.min_deposit,
        fees: FeeParams {
            deposit_fee: msg.deposit_fee,
            restake_fee: msg.restake_fee,
            unstake_fee: msg.unstake_fee,
            redemption_fee: msg.redemption_fee,
            fee_address: deps.api.addr_validate(&msg.fee_address)?,
        },
    };
    validate_host_chain_params(&params)?;
    validate_owner_ids(&msg.delegator_owner_id, &msg.rewards_owner_id)?;
    validate_allow_list(&msg.allow_listed_validators)?;

    HOST_CHAIN_PARAMS.save(deps.storage, &params)?;
    ALLOW_LISTED_VALIDATORS.save(deps.storage, &msg.allow_listed_validators)?;
    MODULE_ENABLED.save(deps.storage, &true)?;

    cw20_base::state::TOKEN_INFO.update(deps.storage, |mut token| -> Result<_, ContractError> {
        token.name = params.mint_denom.clone();
        token.symbol = params.mint_denom.clone();
        Ok(token)
    })?;

    let mut response = Response::new()
        .add_attribute("action", "jump_start")
        .add_attribute("chain_id", &params.chain_id)
        .add_attribute("base_denom", &params.base_denom)
        .add_attribute("mint_denom", &params.mint_denom)
        .add_attribute("validators", msg.allow_listed_validators.len().to_string());

    if config.ledger == LedgerKind::Interchain {
        let mut accounts = HostAccounts::new(&msg.delegator_owner_id, &msg.rewards_owner_id);
        response = response
            .add_event(start_handshake(&mut accounts.delegator, &params.connection_id)?)
            .add_event(start_handshake(&mut accounts.rewards, &params.connection_id)?);
        HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    }
    Ok(response)
}

/// Restart the handshake of every suspended host account.
pub fn execute_recreate_ica(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info)?;
    if config.ledger != LedgerKind::Interchain {
        return Err(ContractError::WrongLedger {
            required: LedgerKind::Interchain.as_str().to_string(),
        });
    }
    let params = HOST_CHAIN_PARAMS
        .may_load(deps.storage)?
        .ok_or(ContractError::HostChainNotRegistered)?;
    let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;

    let mut response = Response::new().add_attribute("action", "recreate_ica");
    let mut recreated = 0u32;
    for account in [&mut accounts.delegator, &mut accounts.rewards] {
        if account.status == AccountStatus::Suspended {
            response = response.add_event(start_handshake(account, &params.connection_id)?);
            recreated += 1;
        }
    }
    if recreated == 0 {
        return Err(ContractError::NoSuspendedAccounts);
    }
    HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    Ok(response.add_attribute("recreated", recreated.to_string()))
}

// ============================================================================
// Module State
// ============================================================================

pub fn execute_change_module_state(
    deps: DepsMut,
    info: MessageInfo,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info)?;
    MODULE_ENABLED.save(deps.storage, &enabled)?;

    Ok(Response::new()
        .add_attribute("action", "change_module_state")
        .add_attribute("enabled", enabled.to_string()))
}

/// Overwrite a validator's recorded delegation with what the ledger reports,
/// so a slash is reflected in the exchange rate immediately.
///
/// On the interchain ledger the report waits until the delegator has no
/// outstanding instruction: compensating that instruction reverses amounts
/// recorded against the pre-report delegation.
pub fn execute_report_slashing(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    validator: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info)?;

    let recorded = DELEGATIONS
        .may_load(deps.storage, &validator)?
        .ok_or_else(|| ContractError::NoRecordedDelegation {
            validator: validator.clone(),
        })?;

    let observed = match config.ledger {
        LedgerKind::Native => deps
            .querier
            .query_delegation(&env.contract.address, &validator)?
            .map(|d| d.amount.amount)
            .unwrap_or_default(),
        LedgerKind::Interchain => {
            let delegator = HOST_ACCOUNTS.load(deps.storage)?.delegator;
            if let Some(sequence) = delegator.pending {
                return Err(ContractError::AccountBusy {
                    owner_id: delegator.owner_id,
                    sequence,
                });
            }
            OBSERVED_DELEGATIONS
                .may_load(deps.storage, &validator)?
                .ok_or_else(|| ContractError::NoObservation {
                    validator: validator.clone(),
                })?
        }
    };

    if observed == Uint128::zero() {
        DELEGATIONS.remove(deps.storage, &validator);
    } else {
        DELEGATIONS.save(deps.storage, &validator, &observed)?;
    }

    Ok(Response::new()
        .add_attribute("action", "report_slashing")
        .add_attribute("validator", validator)
        .add_attribute("recorded", recorded)
        .add_attribute("observed", observed))
}
