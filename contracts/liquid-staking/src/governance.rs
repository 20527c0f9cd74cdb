//! Governance proposals
//!
//! Proposals are a closed set, validated before the vote (through the
//! `ValidateProposal` query) and again when applied.

use cosmwasm_std::{Addr, Deps, DepsMut, Env, Response, Uint128};

use crate::error::ContractError;
use crate::execute::rebalance_now;
use crate::fees::{validate_rates, FeeParams};
use crate::msg::{Proposal, ProposalContent};
use crate::params::validate_allow_list;
use crate::state::{ensure_operational, HostChainParams, ALLOW_LISTED_VALIDATORS, HOST_CHAIN_PARAMS};

pub const MAX_TITLE_LENGTH: usize = 140;
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

fn invalid(reason: impl Into<String>) -> ContractError {
    ContractError::InvalidProposal {
        reason: reason.into(),
    }
}

/// Stateless checks on a proposal.
pub fn validate_proposal(deps: Deps, proposal: &Proposal) -> Result<(), ContractError> {
    if proposal.title.trim().is_empty() {
        return Err(invalid("title cannot be blank"));
    }
    if proposal.title.len() > MAX_TITLE_LENGTH {
        return Err(invalid(format!(
            "title is longer than {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    if proposal.description.trim().is_empty() {
        return Err(invalid("description cannot be blank"));
    }
    if proposal.description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(invalid(format!(
            "description is longer than {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }

    match &proposal.content {
        ProposalContent::MinDepositAndFeeChange {
            min_deposit,
            deposit_fee,
            restake_fee,
            unstake_fee,
            redemption_fee,
        } => {
            if min_deposit.is_zero() {
                return Err(invalid("min deposit must be positive"));
            }
            validate_rates(*deposit_fee, *restake_fee, *unstake_fee, *redemption_fee)
        }
        ProposalContent::FeeAddressChange { fee_address } => {
            deps.api.addr_validate(fee_address)?;
            Ok(())
        }
        ProposalContent::AllowListedValidatorSetChange { validators } => {
            validate_allow_list(validators)
        }
    }
}

/// Apply a passed proposal.
pub fn apply_proposal(
    deps: DepsMut,
    env: Env,
    proposal: Proposal,
) -> Result<Response, ContractError> {
    validate_proposal(deps.as_ref(), &proposal)?;

    let response = Response::new()
        .add_attribute("action", "apply_proposal")
        .add_attribute("title", &proposal.title);

    match proposal.content {
        ProposalContent::MinDepositAndFeeChange {
            min_deposit,
            deposit_fee,
            restake_fee,
            unstake_fee,
            redemption_fee,
        } => {
            let mut params = ensure_operational(deps.storage)?;
            params.min_deposit = min_deposit;
            params.fees.deposit_fee = deposit_fee;
            params.fees.restake_fee = restake_fee;
            params.fees.unstake_fee = unstake_fee;
            params.fees.redemption_fee = redemption_fee;
            HOST_CHAIN_PARAMS.save(deps.storage, &params)?;
            Ok(response
                .add_attribute("proposal", "min_deposit_and_fee_change")
                .add_attribute("min_deposit", min_deposit))
        }
        ProposalContent::FeeAddressChange { fee_address } => {
            // no guard: the fee address can be set before registration
            let fee_address = deps.api.addr_validate(&fee_address)?;
            let mut params = HOST_CHAIN_PARAMS
                .may_load(deps.storage)?
                .unwrap_or_else(|| unregistered_params(fee_address.clone()));
            params.fees.fee_address = fee_address.clone();
            HOST_CHAIN_PARAMS.save(deps.storage, &params)?;
            Ok(response
                .add_attribute("proposal", "fee_address_change")
                .add_attribute("fee_address", fee_address))
        }
        ProposalContent::AllowListedValidatorSetChange { validators } => {
            ensure_operational(deps.storage)?;
            ALLOW_LISTED_VALIDATORS.save(deps.storage, &validators)?;
            let rebalance = rebalance_now(deps, env)?;
            Ok(response
                .add_attribute("proposal", "allow_listed_validator_set_change")
                .add_attribute("validators", validators.len().to_string())
                .add_attributes(rebalance.attributes)
                .add_submessages(rebalance.messages)
                .add_events(rebalance.events))
        }
    }
}

/// Placeholder registration carrying only a fee address.
fn unregistered_params(fee_address: Addr) -> HostChainParams {
    HostChainParams {
        chain_id: String::new(),
        connection_id: String::new(),
        transfer_channel: String::new(),
        transfer_port: String::new(),
        base_denom: String::new(),
        mint_denom: String::new(),
        min_deposit: Uint128::zero(),
        fees: FeeParams {
            deposit_fee: Default::default(),
            restake_fee: Default::default(),
            unstake_fee: Default::default(),
            redemption_fee: Default::default(),
            fee_address,
        },
    }
}
