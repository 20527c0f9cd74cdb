//! End-block cycle.
//!
//! Runs once per block after user transactions:
//! 1. restake harvested rewards
//! 2. delegate pending deposits
//! 3. redelegate toward the target weights
//!
//! On the native ledger every delegation-changing operation is a submessage
//! whose reply reverses the recorded effect if the staking module rejects it.
//! On the interchain ledger the delegator's work for the block is folded into
//! a single outbound instruction, which also returns matured unbondings.

use std::collections::HashSet;

use cosmwasm_std::{
    coin, BankMsg, CosmosMsg, Deps, DepsMut, Env, Event, Order, Reply, Response, StdResult,
    SubMsg, SubMsgResult, Uint128,
};

use crate::denom::deposit_denom;
use crate::error::ContractError;
use crate::exchange_rate::{current_rate, native_rewards, ExchangeRate};
use crate::execute::mint_derivative;
use crate::fees::split_fee;
use crate::ica::{queue_instruction, queue_setup_if_ready};
use crate::ledger::{record, unrecord, Funding, HostMsg};
use crate::rebalance::{allocate_delegations, plan_redelegations, RebalancePlan};
use crate::state::{
    ensure_enabled, load_amount, load_delegations, next_id, AllowListedValidator, BatchStatus,
    Config, HostChainParams, InstructionKind, LedgerKind, ALLOW_LISTED_VALIDATORS, CONFIG,
    HOST_ACCOUNTS, HOST_CHAIN_PARAMS, HOST_IDLE, HOST_REWARDS, NEXT_REPLY_ID, PENDING_DEPOSITS,
    REDELEGATION_COOLDOWNS, REPLY_CONTEXTS, UNBONDING_BATCHES,
};

// ============================================================================
// Entry Points
// ============================================================================

/// Per-block cycle. Skipped while the module is disabled or unregistered.
pub fn execute_end_block(deps: DepsMut, env: Env) -> Result<Response, ContractError> {
    let Some(params) = operational_params(deps.as_ref())? else {
        return Ok(Response::new()
            .add_attribute("action", "end_block")
            .add_attribute("skipped", "inactive"));
    };
    let config = CONFIG.load(deps.storage)?;
    match config.ledger {
        LedgerKind::Native => native_cycle(deps, env, config, params),
        LedgerKind::Interchain => interchain_cycle(deps, env, config, params),
    }
}

/// Redelegation pass only, run right after the allow-list changes.
pub fn rebalance_now(mut deps: DepsMut, env: Env) -> Result<Response, ContractError> {
    let Some(params) = operational_params(deps.as_ref())? else {
        return Ok(Response::new());
    };
    let config = CONFIG.load(deps.storage)?;
    match config.ledger {
        LedgerKind::Native => {
            let targets = native_targets(deps.as_ref())?;
            let plan = plan(deps.as_ref(), &env, &config, &targets)?;
            let events = skipped_events(deps.as_ref(), &plan);

            // a redelegation pays out the rewards of both validators
            let touched: Vec<String> = plan
                .redelegations
                .iter()
                .flat_map(|r| [r.src.clone(), r.dst.clone()])
                .collect();
            let (withdrawals, harvested) = if touched.is_empty() {
                (vec![], Uint128::zero())
            } else {
                let rate = current_rate(deps.as_ref(), &env)?;
                harvest_native(deps.branch(), &env, &params, &rate, Some(&touched))?
            };
            let submsgs = native_redelegations(deps, &params, plan)?;
            Ok(Response::new()
                .add_attribute("restaked", harvested)
                .add_attribute("redelegations", submsgs.len().to_string())
                .add_messages(withdrawals)
                .add_submessages(submsgs)
                .add_events(events))
        }
        LedgerKind::Interchain => {
            let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;
            let mut response = Response::new();
            if !accounts.delegator.is_ready() {
                return Ok(response.add_attribute("deferred", "delegator_busy"));
            }
            let targets = ALLOW_LISTED_VALIDATORS.load(deps.storage)?;
            let (msgs, events) = interchain_redelegations(deps.branch(), &env, &config, &targets)?;
            response = response.add_events(events);
            if !msgs.is_empty() {
                let event = queue_instruction(
                    deps.storage,
                    &env,
                    &config,
                    &params,
                    &mut accounts.delegator,
                    msgs,
                    InstructionKind::Cycle {
                        shipped: Uint128::zero(),
                        returning: vec![],
                    },
                )?;
                HOST_ACCOUNTS.save(deps.storage, &accounts)?;
                response = response.add_event(event);
            }
            Ok(response)
        }
    }
}

fn operational_params(deps: Deps) -> Result<Option<HostChainParams>, ContractError> {
    if ensure_enabled(deps.storage).is_err() {
        return Ok(None);
    }
    Ok(HOST_CHAIN_PARAMS
        .may_load(deps.storage)?
        .filter(|p| !p.is_empty()))
}

fn cooldowns(deps: Deps, env: &Env) -> StdResult<HashSet<String>> {
    REDELEGATION_COOLDOWNS
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((validator, until)) if until > env.block.time => Some(Ok(validator)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

fn plan(
    deps: Deps,
    env: &Env,
    config: &Config,
    targets: &[AllowListedValidator],
) -> StdResult<RebalancePlan> {
    let current = load_delegations(deps.storage)?;
    let cooling = cooldowns(deps, env)?;
    plan_redelegations(
        &current,
        targets,
        |v| cooling.contains(v),
        config.max_redelegations as usize,
    )
}

fn skipped_events(deps: Deps, plan: &RebalancePlan) -> Vec<Event> {
    plan.skipped
        .iter()
        .map(|validator| {
            deps.api.debug(&format!(
                "redelegation from {} deferred: still receiving a redelegation",
                validator
            ));
            Event::new("redelegation_skipped").add_attribute("validator", validator)
        })
        .collect()
}

// ============================================================================
// Native Ledger
// ============================================================================

/// Allow-listed validators currently in the chain's validator set.
fn native_targets(deps: Deps) -> StdResult<Vec<AllowListedValidator>> {
    let mut active = vec![];
    for validator in ALLOW_LISTED_VALIDATORS.load(deps.storage)? {
        if deps
            .querier
            .query_validator(&validator.validator_address)?
            .is_some()
        {
            active.push(validator);
        }
    }
    Ok(active)
}

/// Withdraw unclaimed rewards into the pending reserve and mint the restake
/// fee at `rate`. `only` limits the harvest to the given validators.
pub(crate) fn harvest_native(
    mut deps: DepsMut,
    env: &Env,
    params: &HostChainParams,
    rate: &ExchangeRate,
    only: Option<&[String]>,
) -> Result<(Vec<CosmosMsg>, Uint128), ContractError> {
    let mut msgs = vec![];
    let mut harvested = Uint128::zero();
    for (validator, amount) in native_rewards(deps.as_ref(), env, &params.base_denom)? {
        if only.map_or(false, |set| !set.contains(&validator)) {
            continue;
        }
        msgs.push(HostMsg::WithdrawRewards { validator }.to_native(&params.base_denom)?);
        harvested += amount;
    }
    if harvested.is_zero() {
        return Ok((msgs, harvested));
    }

    let pending = load_amount(deps.storage, &PENDING_DEPOSITS)?;
    PENDING_DEPOSITS.save(deps.storage, &(pending + harvested))?;
    let fee = split_fee(harvested, params.fees.restake_fee).fee;
    mint_derivative(
        deps.branch(),
        env,
        &params.fees.fee_address,
        rate.mint_amount(fee),
    )?;
    Ok((msgs, harvested))
}

fn ledger_submsg(
    deps: &mut DepsMut,
    params: &HostChainParams,
    msg: HostMsg,
) -> Result<SubMsg, ContractError> {
    let id = next_id(deps.storage, &NEXT_REPLY_ID)?;
    let native = msg.to_native(&params.base_denom)?;
    REPLY_CONTEXTS.save(deps.storage, id, &msg)?;
    Ok(SubMsg::reply_always(native, id))
}

/// Record the planned redelegations. The destination's cooldown starts once
/// the staking module accepts the move.
fn native_redelegations(
    mut deps: DepsMut,
    params: &HostChainParams,
    plan: RebalancePlan,
) -> Result<Vec<SubMsg>, ContractError> {
    let mut submsgs = vec![];
    for r in plan.redelegations {
        let msg = HostMsg::BeginRedelegate {
            src_validator: r.src,
            dst_validator: r.dst,
            amount: r.amount,
        };
        record(deps.storage, &msg, Funding::Pending)?;
        submsgs.push(ledger_submsg(&mut deps, params, msg)?);
    }
    Ok(submsgs)
}

fn native_cycle(
    mut deps: DepsMut,
    env: Env,
    config: Config,
    params: HostChainParams,
) -> Result<Response, ContractError> {
    let rate = current_rate(deps.as_ref(), &env)?;
    let (withdrawals, harvested) = harvest_native(deps.branch(), &env, &params, &rate, None)?;
    let targets = native_targets(deps.as_ref())?;

    let mut delegations = vec![];
    let pending = load_amount(deps.storage, &PENDING_DEPOSITS)?;
    let mut delegated = Uint128::zero();
    if !pending.is_zero() && !targets.is_empty() {
        let current = load_delegations(deps.storage)?;
        for (validator, amount) in allocate_delegations(pending, &current, &targets)? {
            let msg = HostMsg::Delegate { validator, amount };
            record(deps.storage, &msg, Funding::Pending)?;
            delegations.push(ledger_submsg(&mut deps, &params, msg)?);
            delegated += amount;
        }
    }

    let plan = plan(deps.as_ref(), &env, &config, &targets)?;
    let events = skipped_events(deps.as_ref(), &plan);
    let redelegations = native_redelegations(deps.branch(), &params, plan)?;

    Ok(Response::new()
        .add_attribute("action", "end_block")
        .add_attribute("restaked", harvested)
        .add_attribute("delegated", delegated)
        .add_attribute("redelegations", redelegations.len().to_string())
        .add_messages(withdrawals)
        .add_submessages(delegations)
        .add_submessages(redelegations)
        .add_events(events))
}

/// Settle a native ledger operation: an accepted redelegation starts the
/// destination's cooldown, a rejected operation has its recorded effect
/// reversed.
pub fn handle_ledger_reply(
    deps: DepsMut,
    env: Env,
    reply: Reply,
) -> Result<Response, ContractError> {
    let Some(msg) = REPLY_CONTEXTS.may_load(deps.storage, reply.id)? else {
        return Err(ContractError::UnknownReply { id: reply.id });
    };
    REPLY_CONTEXTS.remove(deps.storage, reply.id);

    match reply.result {
        SubMsgResult::Ok(_) => {
            if let HostMsg::BeginRedelegate { dst_validator, .. } = &msg {
                let config = CONFIG.load(deps.storage)?;
                let until = env.block.time.plus_seconds(config.unbonding_period);
                REDELEGATION_COOLDOWNS.save(deps.storage, dst_validator, &until)?;
            }
            Ok(Response::new())
        }
        SubMsgResult::Err(error) => {
            unrecord(deps.storage, &msg, Funding::Pending)?;
            deps.api.debug(&format!(
                "{} rejected by the staking module, deferred to the next cycle: {}",
                msg.action(),
                error
            ));
            Ok(Response::new().add_event(
                Event::new("ledger_rejection")
                    .add_attribute("operation", msg.action())
                    .add_attribute("error", error),
            ))
        }
    }
}

// ============================================================================
// Interchain Ledger
// ============================================================================

fn interchain_redelegations(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    targets: &[AllowListedValidator],
) -> Result<(Vec<HostMsg>, Vec<Event>), ContractError> {
    let plan = plan(deps.as_ref(), env, config, targets)?;
    let events = skipped_events(deps.as_ref(), &plan);

    // cooldowns start when the host confirms the instruction
    let mut msgs = vec![];
    for r in plan.redelegations {
        let msg = HostMsg::BeginRedelegate {
            src_validator: r.src,
            dst_validator: r.dst,
            amount: r.amount,
        };
        record(deps.storage, &msg, Funding::HostIdle)?;
        msgs.push(msg);
    }
    Ok((msgs, events))
}

fn interchain_cycle(
    mut deps: DepsMut,
    env: Env,
    config: Config,
    params: HostChainParams,
) -> Result<Response, ContractError> {
    let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;
    let mut response = Response::new().add_attribute("action", "end_block");

    // rewards account: move harvested rewards to the delegator
    let rewards = load_amount(deps.storage, &HOST_REWARDS)?;
    if accounts.rewards.is_ready() && !rewards.is_zero() {
        let event = queue_instruction(
            deps.storage,
            &env,
            &config,
            &params,
            &mut accounts.rewards,
            vec![HostMsg::SendToDelegator { amount: rewards }],
            InstructionKind::Restake { amount: rewards },
        )?;
        response = response.add_event(event);
    }

    // delegator account: finish setup first
    if let Some(event) =
        queue_setup_if_ready(deps.storage, &env, &config, &params, &mut accounts)?
    {
        HOST_ACCOUNTS.save(deps.storage, &accounts)?;
        return Ok(response.add_event(event));
    }
    if !accounts.delegator.is_ready() {
        HOST_ACCOUNTS.save(deps.storage, &accounts)?;
        return Ok(response);
    }

    // matured unbondings travel back to this chain
    let matured: Vec<(u64, Uint128)> = UNBONDING_BATCHES
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((maturity, batch))
                if maturity <= env.block.time.seconds()
                    && batch.status == BatchStatus::Unbonding =>
            {
                Some(Ok((maturity, batch.amount)))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<_>>()?;
    let mut returning = vec![];
    let mut returned = Uint128::zero();
    for (maturity, amount) in matured {
        let mut batch = UNBONDING_BATCHES.load(deps.storage, maturity)?;
        batch.status = BatchStatus::Returning;
        UNBONDING_BATCHES.save(deps.storage, maturity, &batch)?;
        returning.push(maturity);
        returned += amount;
    }

    // escrowed deposits ship to the host and join the idle balance
    let shipped = load_amount(deps.storage, &PENDING_DEPOSITS)?;
    if !shipped.is_zero() {
        PENDING_DEPOSITS.save(deps.storage, &Uint128::zero())?;
        let idle = load_amount(deps.storage, &HOST_IDLE)?;
        HOST_IDLE.save(deps.storage, &(idle + shipped))?;
    }

    let current = load_delegations(deps.storage)?;
    let targets = ALLOW_LISTED_VALIDATORS.load(deps.storage)?;
    let idle = load_amount(deps.storage, &HOST_IDLE)?;
    let mut delegations = vec![];
    if !idle.is_zero() {
        for (validator, amount) in allocate_delegations(idle, &current, &targets)? {
            let msg = HostMsg::Delegate { validator, amount };
            record(deps.storage, &msg, Funding::HostIdle)?;
            delegations.push(msg);
        }
    }

    let (redelegations, events) =
        interchain_redelegations(deps.branch(), &env, &config, &targets)?;
    response = response.add_events(events);

    // reward withdrawals alone do not warrant a packet
    if returned.is_zero() && delegations.is_empty() && redelegations.is_empty() {
        HOST_ACCOUNTS.save(deps.storage, &accounts)?;
        return Ok(response);
    }

    let mut msgs = vec![];
    if !returned.is_zero() {
        msgs.push(HostMsg::TransferToController { amount: returned });
    }
    msgs.extend(current.into_iter().map(|(validator, _)| HostMsg::WithdrawRewards { validator }));
    msgs.extend(delegations);
    msgs.extend(redelegations);

    let event = queue_instruction(
        deps.storage,
        &env,
        &config,
        &params,
        &mut accounts.delegator,
        msgs,
        InstructionKind::Cycle {
            shipped,
            returning,
        },
    )?;
    response = response.add_event(event);
    if !shipped.is_zero() {
        let transport = config.transport.clone().ok_or(ContractError::MissingTransport)?;
        response = response.add_message(BankMsg::Send {
            to_address: transport.to_string(),
            amount: vec![coin(shipped.u128(), deposit_denom(config.ledger, &params))],
        });
    }
    HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    Ok(response.add_attribute("shipped", shipped))
}
