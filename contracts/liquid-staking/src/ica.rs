//! Interchain account lifecycle
//!
//! The protocol owns two accounts on the host: the delegator, which holds and
//! stakes the base asset, and the rewards account, which receives staking
//! rewards. Each account moves through
//!
//! ```text
//! Uninitialized -> HandshakeStarted -> Registered -> Active
//!                        ^                  |          |
//!                        |                  v          v
//!                        +------------- Suspended <----+
//! ```
//!
//! Operations on an account are outbound instructions. At most one is
//! outstanding per account; its result arrives later through `sudo` and either
//! confirms or compensates the effect recorded when it was sent.

use cosmwasm_std::{
    to_json_string, DepsMut, Env, Event, Response, StdError, Storage, Uint128,
};

use crate::error::ContractError;
use crate::exchange_rate::current_rate;
use crate::execute::mint_derivative;
use crate::fees::split_fee;
use crate::ledger::{unrecord, Funding, HostMsg};
use crate::msg::{HostObservation, PacketOutcome};
use crate::state::{
    load_amount, load_registered_params, AccountStatus, BatchStatus, Config, HostAccount,
    HostAccounts, HostChainParams, InstructionKind, LedgerKind, OutboundInstruction,
    CLAIM_RESERVE, CONFIG, HOST_ACCOUNTS, HOST_IDLE, HOST_REWARDS, OBSERVED_DELEGATIONS, OUTBOUND,
    PENDING_DEPOSITS, REDELEGATION_COOLDOWNS, UNBONDING_BATCHES, UNBONDING_RECORDS,
};

fn status_str(status: &AccountStatus) -> &'static str {
    match status {
        AccountStatus::Uninitialized => "uninitialized",
        AccountStatus::HandshakeStarted => "handshake_started",
        AccountStatus::Registered => "registered",
        AccountStatus::Active => "active",
        AccountStatus::Suspended => "suspended",
    }
}

impl HostAccount {
    fn new(owner_id: String) -> Self {
        Self {
            owner_id,
            address: None,
            status: AccountStatus::Uninitialized,
            next_sequence: 1,
            pending: None,
        }
    }

    fn invalid(&self, action: &str) -> ContractError {
        ContractError::InvalidAccountTransition {
            owner_id: self.owner_id.clone(),
            action: action.to_string(),
            status: status_str(&self.status).to_string(),
        }
    }

    /// Active with no outstanding instruction.
    pub fn is_ready(&self) -> bool {
        self.status == AccountStatus::Active && self.pending.is_none()
    }

    fn ensure_can_send(&self, kind: &InstructionKind) -> Result<(), ContractError> {
        if let Some(sequence) = self.pending {
            return Err(ContractError::AccountBusy {
                owner_id: self.owner_id.clone(),
                sequence,
            });
        }
        let allowed = match kind {
            InstructionKind::Setup => matches!(
                self.status,
                AccountStatus::Registered | AccountStatus::Active
            ),
            _ => self.status == AccountStatus::Active,
        };
        if !allowed {
            return Err(ContractError::AccountNotActive {
                owner_id: self.owner_id.clone(),
            });
        }
        Ok(())
    }
}

impl HostAccounts {
    pub fn new(delegator_owner_id: &str, rewards_owner_id: &str) -> Self {
        Self {
            delegator: HostAccount::new(delegator_owner_id.to_string()),
            rewards: HostAccount::new(rewards_owner_id.to_string()),
        }
    }

    pub fn get_mut(&mut self, owner_id: &str) -> Result<&mut HostAccount, ContractError> {
        if self.delegator.owner_id == owner_id {
            Ok(&mut self.delegator)
        } else if self.rewards.owner_id == owner_id {
            Ok(&mut self.rewards)
        } else {
            Err(ContractError::UnknownHostAccount {
                owner_id: owner_id.to_string(),
            })
        }
    }
}

fn ensure_interchain(config: &Config) -> Result<(), ContractError> {
    if config.ledger != LedgerKind::Interchain {
        return Err(ContractError::WrongLedger {
            required: LedgerKind::Interchain.as_str().to_string(),
        });
    }
    Ok(())
}

/// Open (or reopen) the channel for an account.
pub fn start_handshake(
    account: &mut HostAccount,
    connection_id: &str,
) -> Result<Event, ContractError> {
    match account.status {
        AccountStatus::Uninitialized | AccountStatus::Suspended => {}
        _ => return Err(account.invalid("start handshake")),
    }
    account.status = AccountStatus::HandshakeStarted;
    Ok(Event::new("register_interchain_account")
        .add_attribute("owner_id", &account.owner_id)
        .add_attribute("connection_id", connection_id))
}

/// Queue an instruction on `account` and describe it for the transport.
pub fn queue_instruction(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    params: &HostChainParams,
    account: &mut HostAccount,
    msgs: Vec<HostMsg>,
    kind: InstructionKind,
) -> Result<Event, ContractError> {
    account.ensure_can_send(&kind)?;

    let sequence = account.next_sequence;
    account.next_sequence += 1;
    account.pending = Some(sequence);

    let instruction = OutboundInstruction {
        owner_id: account.owner_id.clone(),
        sequence,
        msgs,
        kind,
        sent_at: env.block.time,
    };
    OUTBOUND.save(storage, (&account.owner_id, sequence), &instruction)?;

    Ok(Event::new("outbound_instruction")
        .add_attribute("owner_id", &account.owner_id)
        .add_attribute("sequence", sequence.to_string())
        .add_attribute("connection_id", &params.connection_id)
        .add_attribute("host_address", account.address.clone().unwrap_or_default())
        .add_attribute(
            "timeout",
            env.block
                .time
                .plus_seconds(config.packet_timeout)
                .seconds()
                .to_string(),
        )
        .add_attribute("msgs", to_json_string(&instruction.msgs)?))
}

/// Point the delegator's rewards at the rewards account once both
/// addresses are known.
pub fn queue_setup_if_ready(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    params: &HostChainParams,
    accounts: &mut HostAccounts,
) -> Result<Option<Event>, ContractError> {
    let Some(rewards_address) = accounts.rewards.address.clone() else {
        return Ok(None);
    };
    if accounts.delegator.status != AccountStatus::Registered || accounts.delegator.pending.is_some()
    {
        return Ok(None);
    }
    let event = queue_instruction(
        storage,
        env,
        config,
        params,
        &mut accounts.delegator,
        vec![HostMsg::SetWithdrawAddress {
            address: rewards_address,
        }],
        InstructionKind::Setup,
    )?;
    Ok(Some(event))
}

// ============================================================================
// Transport Callbacks
// ============================================================================

/// Channel opened; the host account address is now known.
pub fn handle_open_ack(
    deps: DepsMut,
    env: Env,
    owner_id: String,
    address: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_interchain(&config)?;
    let params = load_registered_params(deps.storage)?;
    let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;

    let is_rewards = accounts.rewards.owner_id == owner_id;
    let account = accounts.get_mut(&owner_id)?;
    if account.status != AccountStatus::HandshakeStarted {
        return Err(account.invalid("acknowledge channel open"));
    }
    account.address = Some(address.clone());
    account.status = if is_rewards {
        AccountStatus::Active
    } else {
        AccountStatus::Registered
    };

    let mut response = Response::new()
        .add_attribute("action", "ica_open_ack")
        .add_attribute("owner_id", &owner_id)
        .add_attribute("address", address);
    if let Some(event) =
        queue_setup_if_ready(deps.storage, &env, &config, &params, &mut accounts)?
    {
        response = response.add_event(event);
    }
    HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    Ok(response)
}

/// Channel closed; any outstanding instruction is treated as timed out.
pub fn handle_channel_closed(
    mut deps: DepsMut,
    env: Env,
    owner_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_interchain(&config)?;
    let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;

    let account = accounts.get_mut(&owner_id)?;
    account.status = AccountStatus::Suspended;
    let pending = account.pending.take();

    let mut response = Response::new()
        .add_attribute("action", "ica_channel_closed")
        .add_attribute("owner_id", &owner_id);
    if let Some(sequence) = pending {
        let instruction = OUTBOUND.load(deps.storage, (&owner_id, sequence))?;
        OUTBOUND.remove(deps.storage, (&owner_id, sequence));
        compensate(deps.branch(), &env, &instruction)?;
        response = response.add_event(result_event(&instruction, "timeout"));
    }
    HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    Ok(response)
}

/// Result of an outbound instruction.
pub fn handle_packet_result(
    mut deps: DepsMut,
    env: Env,
    owner_id: String,
    sequence: u64,
    outcome: PacketOutcome,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_interchain(&config)?;
    let mut accounts = HOST_ACCOUNTS.load(deps.storage)?;

    let account = accounts.get_mut(&owner_id)?;
    if account.pending != Some(sequence) {
        return Err(ContractError::UnexpectedSequence {
            owner_id,
            expected: account.pending,
            got: sequence,
        });
    }
    account.pending = None;
    let instruction = OUTBOUND.load(deps.storage, (&owner_id, sequence))?;
    OUTBOUND.remove(deps.storage, (&owner_id, sequence));

    let mut response = Response::new()
        .add_attribute("action", "ica_packet_result")
        .add_attribute("owner_id", &owner_id)
        .add_attribute("sequence", sequence.to_string());
    match outcome {
        PacketOutcome::Success => {
            if instruction.kind == InstructionKind::Setup {
                accounts.delegator.status = AccountStatus::Active;
            }
            confirm(deps.branch(), &env, &instruction)?;
            response = response.add_event(result_event(&instruction, "success"));
        }
        PacketOutcome::Failure { error } => {
            compensate(deps.branch(), &env, &instruction)?;
            response = response
                .add_event(result_event(&instruction, "failure").add_attribute("error", error));
        }
        PacketOutcome::Timeout => {
            compensate(deps.branch(), &env, &instruction)?;
            response = response.add_event(result_event(&instruction, "timeout"));
        }
    }
    HOST_ACCOUNTS.save(deps.storage, &accounts)?;
    Ok(response)
}

/// Host-side reading delivered by the transport.
pub fn handle_observation(
    deps: DepsMut,
    observation: HostObservation,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_interchain(&config)?;

    let response = Response::new().add_attribute("action", "host_observation");
    match observation {
        HostObservation::Delegation { validator, amount } => {
            OBSERVED_DELEGATIONS.save(deps.storage, &validator, &amount)?;
            Ok(response
                .add_attribute("validator", validator)
                .add_attribute("delegation", amount))
        }
        HostObservation::Rewards { amount } => {
            HOST_REWARDS.save(deps.storage, &amount)?;
            Ok(response.add_attribute("rewards", amount))
        }
    }
}

fn result_event(instruction: &OutboundInstruction, outcome: &str) -> Event {
    Event::new("instruction_result")
        .add_attribute("owner_id", &instruction.owner_id)
        .add_attribute("sequence", instruction.sequence.to_string())
        .add_attribute("outcome", outcome)
}

// ============================================================================
// Confirmation and Compensation
// ============================================================================

fn confirm(
    mut deps: DepsMut,
    env: &Env,
    instruction: &OutboundInstruction,
) -> Result<(), ContractError> {
    match &instruction.kind {
        InstructionKind::Setup | InstructionKind::Unstake { .. } => {}
        InstructionKind::Restake { amount } => {
            let params = load_registered_params(deps.storage)?;
            let rate = current_rate(deps.as_ref(), env)?;
            let fee = split_fee(*amount, params.fees.restake_fee).fee;
            mint_derivative(
                deps.branch(),
                env,
                &params.fees.fee_address,
                rate.mint_amount(fee),
            )?;

            let rewards = load_amount(deps.storage, &HOST_REWARDS)?;
            HOST_REWARDS.save(deps.storage, &rewards.saturating_sub(*amount))?;
            let idle = load_amount(deps.storage, &HOST_IDLE)?;
            HOST_IDLE.save(deps.storage, &(idle + *amount))?;
        }
        InstructionKind::Cycle { returning, .. } => {
            let mut returned = Uint128::zero();
            for maturity in returning {
                let mut batch = UNBONDING_BATCHES.load(deps.storage, *maturity)?;
                batch.status = BatchStatus::Returned;
                returned += batch.amount;
                UNBONDING_BATCHES.save(deps.storage, *maturity, &batch)?;
            }
            let reserve = load_amount(deps.storage, &CLAIM_RESERVE)?;
            CLAIM_RESERVE.save(deps.storage, &(reserve + returned))?;

            let unbonding_period = CONFIG.load(deps.storage)?.unbonding_period;
            let until = instruction.sent_at.plus_seconds(unbonding_period);
            for msg in &instruction.msgs {
                if let HostMsg::BeginRedelegate { dst_validator, .. } = msg {
                    REDELEGATION_COOLDOWNS.save(deps.storage, dst_validator, &until)?;
                }
            }
        }
    }
    Ok(())
}

fn compensate(
    mut deps: DepsMut,
    env: &Env,
    instruction: &OutboundInstruction,
) -> Result<(), ContractError> {
    match &instruction.kind {
        InstructionKind::Setup | InstructionKind::Restake { .. } => {}
        InstructionKind::Cycle { shipped, returning } => {
            for msg in &instruction.msgs {
                unrecord(deps.storage, msg, Funding::HostIdle)?;
            }
            // the transport refunds shipped deposits to this contract
            let idle = load_amount(deps.storage, &HOST_IDLE)?;
            HOST_IDLE.save(deps.storage, &idle.checked_sub(*shipped).map_err(StdError::from)?)?;
            let pending = load_amount(deps.storage, &PENDING_DEPOSITS)?;
            PENDING_DEPOSITS.save(deps.storage, &(pending + *shipped))?;

            for maturity in returning {
                let mut batch = UNBONDING_BATCHES.load(deps.storage, *maturity)?;
                batch.status = BatchStatus::Unbonding;
                UNBONDING_BATCHES.save(deps.storage, *maturity, &batch)?;
            }
        }
        InstructionKind::Unstake {
            owner,
            record_id,
            burned,
        } => {
            for msg in &instruction.msgs {
                unrecord(deps.storage, msg, Funding::HostIdle)?;
            }
            if let Some(record) = UNBONDING_RECORDS.may_load(deps.storage, (owner, *record_id))? {
                UNBONDING_RECORDS.remove(deps.storage, (owner, *record_id));
                let maturity = record.maturity.seconds();
                if let Some(mut batch) = UNBONDING_BATCHES.may_load(deps.storage, maturity)? {
                    batch.amount = batch.amount.saturating_sub(record.amount);
                    if batch.amount.is_zero() {
                        UNBONDING_BATCHES.remove(deps.storage, maturity);
                    } else {
                        UNBONDING_BATCHES.save(deps.storage, maturity, &batch)?;
                    }
                }
            }
            mint_derivative(deps.branch(), env, owner, *burned)?;
        }
    }
    Ok(())
}
