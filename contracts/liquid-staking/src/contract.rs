//! Liquid Staking Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers and the end-block cycle
//! - `ica` - interchain account lifecycle and transport callbacks
//! - `governance` - proposal validation and application
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response,
    StdResult, Uint128,
};
use cw2::set_contract_version;
use cw20_base::state::{MinterData, TokenInfo, TOKEN_INFO};

use crate::error::ContractError;
use crate::exchange_rate::net_amount_state;
use crate::execute::{
    execute_change_module_state, execute_claim, execute_end_block, execute_jump_start,
    execute_liquid_stake, execute_liquid_unstake, execute_recreate_ica, execute_redeem,
    execute_report_slashing, execute_token_decrease_allowance, execute_token_increase_allowance,
    execute_token_send, execute_token_send_from, execute_token_transfer,
    execute_token_transfer_from, handle_ledger_reply,
};
use crate::governance::apply_proposal;
use crate::ica::{handle_channel_closed, handle_observation, handle_open_ack, handle_packet_result};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, SudoMsg};
use crate::query::{
    query_allow_listed_validators, query_c_value, query_claimable, query_config,
    query_deposit_denom, query_host_accounts, query_host_chain_params, query_liquid_validators,
    query_module_state, query_outbound_instruction, query_unbonding_records,
    query_validate_proposal,
};
use crate::state::{
    Config, LedgerKind, CONFIG, CONTRACT_NAME, CONTRACT_VERSION, DEFAULT_MAX_REDELEGATIONS,
    DEFAULT_PACKET_TIMEOUT, DEFAULT_TOKEN_DECIMALS, MODULE_ENABLED, PENDING_DEPOSITS,
};

/// Derivative name until JumpStart renames it after the mint denom
const UNREGISTERED_TOKEN_NAME: &str = "liquid staking derivative";

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let admin = deps.api.addr_validate(&msg.admin)?;
    let transport = msg
        .transport
        .map(|t| deps.api.addr_validate(&t))
        .transpose()?;
    if msg.ledger == LedgerKind::Interchain && transport.is_none() {
        return Err(ContractError::MissingTransport);
    }
    if msg.unbonding_period == 0 {
        return Err(ContractError::ZeroUnbondingPeriod);
    }

    let config = Config {
        admin,
        ledger: msg.ledger,
        unbonding_period: msg.unbonding_period,
        max_redelegations: msg.max_redelegations.unwrap_or(DEFAULT_MAX_REDELEGATIONS),
        transport,
        packet_timeout: msg.packet_timeout.unwrap_or(DEFAULT_PACKET_TIMEOUT),
    };
    CONFIG.save(deps.storage, &config)?;
    MODULE_ENABLED.save(deps.storage, &true)?;
    PENDING_DEPOSITS.save(deps.storage, &Uint128::zero())?;

    // The contract is the derivative's only minter
    TOKEN_INFO.save(
        deps.storage,
        &TokenInfo {
            name: UNREGISTERED_TOKEN_NAME.to_string(),
            symbol: "stk".to_string(),
            decimals: msg.token_decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
            total_supply: Uint128::zero(),
            mint: Some(MinterData {
                minter: env.contract.address,
                cap: None,
            }),
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", config.admin)
        .add_attribute("ledger", config.ledger.as_str())
        .add_attribute("unbonding_period", config.unbonding_period.to_string())
        .add_attribute("max_redelegations", config.max_redelegations.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Staking
        ExecuteMsg::LiquidStake {} => execute_liquid_stake(deps, env, info),
        ExecuteMsg::LiquidUnstake { amount } => execute_liquid_unstake(deps, env, info, amount),
        ExecuteMsg::Redeem { amount } => execute_redeem(deps, env, info, amount),
        ExecuteMsg::Claim {} => execute_claim(deps, env, info),

        // Admin
        ExecuteMsg::JumpStart(msg) => execute_jump_start(deps, info, msg),
        ExecuteMsg::RecreateIca {} => execute_recreate_ica(deps, info),
        ExecuteMsg::ChangeModuleState { enabled } => {
            execute_change_module_state(deps, info, enabled)
        }
        ExecuteMsg::ReportSlashing { validator } => {
            execute_report_slashing(deps, env, info, validator)
        }

        // Derivative token
        ExecuteMsg::Transfer { recipient, amount } => {
            execute_token_transfer(deps, env, info, recipient, amount)
        }
        ExecuteMsg::Send {
            contract,
            amount,
            msg,
        } => execute_token_send(deps, env, info, contract, amount, msg),
        ExecuteMsg::IncreaseAllowance {
            spender,
            amount,
            expires,
        } => execute_token_increase_allowance(deps, env, info, spender, amount, expires),
        ExecuteMsg::DecreaseAllowance {
            spender,
            amount,
            expires,
        } => execute_token_decrease_allowance(deps, env, info, spender, amount, expires),
        ExecuteMsg::TransferFrom {
            owner,
            recipient,
            amount,
        } => execute_token_transfer_from(deps, env, info, owner, recipient, amount),
        ExecuteMsg::SendFrom {
            owner,
            contract,
            amount,
            msg,
        } => execute_token_send_from(deps, env, info, owner, contract, amount, msg),
    }
}

// ============================================================================
// Sudo
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::EndBlock {} => execute_end_block(deps, env),
        SudoMsg::ApplyProposal { proposal } => apply_proposal(deps, env, proposal),
        SudoMsg::IcaOpenAck { owner_id, address } => {
            handle_open_ack(deps, env, owner_id, address)
        }
        SudoMsg::IcaChannelClosed { owner_id } => handle_channel_closed(deps, env, owner_id),
        SudoMsg::IcaPacketResult {
            owner_id,
            sequence,
            outcome,
        } => handle_packet_result(deps, env, owner_id, sequence, outcome),
        SudoMsg::HostObservation { observation } => handle_observation(deps, observation),
    }
}

// ============================================================================
// Reply
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    handle_ledger_reply(deps, env, msg)
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        // Parameters
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::HostChainParams {} => to_json_binary(&query_host_chain_params(deps)?),
        QueryMsg::AllowListedValidators {} => {
            to_json_binary(&query_allow_listed_validators(deps)?)
        }
        QueryMsg::HostAccounts {} => to_json_binary(&query_host_accounts(deps)?),
        QueryMsg::ModuleState {} => to_json_binary(&query_module_state(deps)?),
        QueryMsg::DepositDenom {} => to_json_binary(&query_deposit_denom(deps)?),

        // Accounting
        QueryMsg::NetAmountState {} => to_json_binary(&net_amount_state(deps, &env)?),
        QueryMsg::CValue {} => to_json_binary(&query_c_value(deps, env)?),
        QueryMsg::LiquidValidators {} => to_json_binary(&query_liquid_validators(deps)?),

        // Unbonding
        QueryMsg::UnbondingRecords { owner } => {
            to_json_binary(&query_unbonding_records(deps, owner)?)
        }
        QueryMsg::Claimable { owner } => to_json_binary(&query_claimable(deps, env, owner)?),

        // Interchain and governance
        QueryMsg::OutboundInstruction { owner_id, sequence } => {
            to_json_binary(&query_outbound_instruction(deps, owner_id, sequence)?)
        }
        QueryMsg::ValidateProposal { proposal } => {
            to_json_binary(&query_validate_proposal(deps, proposal)?)
        }

        // Derivative token
        QueryMsg::Balance { address } => {
            to_json_binary(&cw20_base::contract::query_balance(deps, address)?)
        }
        QueryMsg::TokenInfo {} => to_json_binary(&cw20_base::contract::query_token_info(deps)?),
        QueryMsg::Allowance { owner, spender } => to_json_binary(
            &cw20_base::allowances::query_allowance(deps, owner, spender)?,
        ),
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if MODULE_ENABLED.may_load(deps.storage)?.is_none() {
        MODULE_ENABLED.save(deps.storage, &true)?;
    }

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
