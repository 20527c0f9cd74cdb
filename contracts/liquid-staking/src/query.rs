//! Query handlers for the liquid staking contract.

use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Deps, Env, Order, StdError, StdResult, Uint128};

use crate::denom::deposit_denom;
use crate::exchange_rate::current_rate;
use crate::governance::validate_proposal;
use crate::msg::{
    CValueResponse, ClaimableResponse, DepositDenomResponse, LiquidValidator,
    LiquidValidatorsResponse, ModuleStateResponse, Proposal, UnbondingRecordEntry,
    UnbondingRecordsResponse, ValidateProposalResponse, ValidatorStatus,
};
use crate::state::{
    load_delegations, AllowListedValidator, BatchStatus, Config, HostAccounts, HostChainParams,
    LedgerKind, OutboundInstruction, UnbondingRecord, ALLOW_LISTED_VALIDATORS, CONFIG,
    HOST_ACCOUNTS, HOST_CHAIN_PARAMS, MODULE_ENABLED, OUTBOUND, UNBONDING_BATCHES,
    UNBONDING_RECORDS,
};

// ============================================================================
// Parameters
// ============================================================================

pub fn query_config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn query_host_chain_params(deps: Deps) -> StdResult<HostChainParams> {
    HOST_CHAIN_PARAMS
        .may_load(deps.storage)?
        .filter(|p| !p.is_empty())
        .ok_or_else(|| StdError::not_found("HostChainParams"))
}

pub fn query_allow_listed_validators(deps: Deps) -> StdResult<Vec<AllowListedValidator>> {
    Ok(ALLOW_LISTED_VALIDATORS
        .may_load(deps.storage)?
        .unwrap_or_default())
}

pub fn query_host_accounts(deps: Deps) -> StdResult<Option<HostAccounts>> {
    HOST_ACCOUNTS.may_load(deps.storage)
}

pub fn query_module_state(deps: Deps) -> StdResult<ModuleStateResponse> {
    Ok(ModuleStateResponse {
        enabled: MODULE_ENABLED.may_load(deps.storage)?.unwrap_or(true),
    })
}

pub fn query_deposit_denom(deps: Deps) -> StdResult<DepositDenomResponse> {
    let config = CONFIG.load(deps.storage)?;
    let params = query_host_chain_params(deps)?;
    Ok(DepositDenomResponse {
        denom: deposit_denom(config.ledger, &params),
    })
}

// ============================================================================
// Accounting
// ============================================================================

pub fn query_c_value(deps: Deps, env: Env) -> StdResult<CValueResponse> {
    let rate = current_rate(deps, &env)?;
    Ok(CValueResponse {
        c_value: rate.c_value()?,
        exchange_rate: rate.exchange_rate()?,
    })
}

/// Allow-listed validators plus any validator still holding a delegation.
pub fn query_liquid_validators(deps: Deps) -> StdResult<LiquidValidatorsResponse> {
    let config = CONFIG.load(deps.storage)?;
    let allow_list = query_allow_listed_validators(deps)?;

    let mut merged: BTreeMap<String, (Uint128, Option<AllowListedValidator>)> = BTreeMap::new();
    for (validator, amount) in load_delegations(deps.storage)? {
        merged.entry(validator).or_default().0 = amount;
    }
    for entry in allow_list {
        let address = entry.validator_address.clone();
        merged.entry(address).or_default().1 = Some(entry);
    }

    let mut validators = Vec::with_capacity(merged.len());
    for (validator_address, (delegated_amount, listed)) in merged {
        let active = match (&listed, config.ledger) {
            (None, _) => false,
            (Some(_), LedgerKind::Interchain) => true,
            (Some(_), LedgerKind::Native) => deps
                .querier
                .query_validator(&validator_address)?
                .is_some(),
        };
        validators.push(LiquidValidator {
            target_weight: listed.map(|l| l.target_weight).unwrap_or_default(),
            validator_address,
            delegated_amount,
            status: if active {
                ValidatorStatus::Active
            } else {
                ValidatorStatus::Inactive
            },
        });
    }
    Ok(LiquidValidatorsResponse { validators })
}

// ============================================================================
// Unbonding
// ============================================================================

fn owner_records(deps: Deps, owner: &str) -> StdResult<(Addr, Vec<(u64, UnbondingRecord)>)> {
    let owner = deps.api.addr_validate(owner)?;
    let records = UNBONDING_RECORDS
        .prefix(&owner)
        .range(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    Ok((owner, records))
}

pub fn query_unbonding_records(deps: Deps, owner: String) -> StdResult<UnbondingRecordsResponse> {
    let (owner, records) = owner_records(deps, &owner)?;
    Ok(UnbondingRecordsResponse {
        owner,
        records: records
            .into_iter()
            .map(|(id, record)| UnbondingRecordEntry {
                id,
                amount: record.amount,
                maturity: record.maturity,
            })
            .collect(),
    })
}

/// Amount `Claim` would pay `owner` right now.
pub fn query_claimable(deps: Deps, env: Env, owner: String) -> StdResult<ClaimableResponse> {
    let config = CONFIG.load(deps.storage)?;
    let (_, records) = owner_records(deps, &owner)?;

    let mut amount = Uint128::zero();
    for (_, record) in records {
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
        amount += record.amount;
    }
    Ok(ClaimableResponse { amount })
}

// ============================================================================
// Interchain
// ============================================================================

pub fn query_outbound_instruction(
    deps: Deps,
    owner_id: String,
    sequence: u64,
) -> StdResult<Option<OutboundInstruction>> {
    OUTBOUND.may_load(deps.storage, (&owner_id, sequence))
}

pub fn query_validate_proposal(
    deps: Deps,
    proposal: Proposal,
) -> StdResult<ValidateProposalResponse> {
    Ok(match validate_proposal(deps, &proposal) {
        Ok(()) => ValidateProposalResponse {
            valid: true,
            error: None,
        },
        Err(e) => ValidateProposalResponse {
            valid: false,
            error: Some(e.to_string()),
        },
    })
}
