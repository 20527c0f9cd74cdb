//! State definitions for the liquid staking contract
//!
//! Singletons are `Item`s loaded at each entry point. The recorded ledger view
//! (delegations, reserves, observations) is the module's own bookkeeping and
//! only changes through the module's ledger operations and slashing reports.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Order, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::error::ContractError;
use crate::fees::FeeParams;
use crate::ledger::HostMsg;

// ============================================================================
// Constants
// ============================================================================

pub const CONTRACT_NAME: &str = "crates.io:liquid-staking";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Redelegation slots per cycle, the staking module's max entries
pub const DEFAULT_MAX_REDELEGATIONS: u32 = 7;

/// Seconds an outbound instruction may stay unacknowledged on the host
pub const DEFAULT_PACKET_TIMEOUT: u64 = 600;

pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

// ============================================================================
// Core Configuration
// ============================================================================

/// Where the base asset is staked
#[cw_serde]
#[derive(Copy)]
pub enum LedgerKind {
    /// This chain's own staking module; the contract is the delegator
    Native,
    /// A remote host chain driven through interchain accounts
    Interchain,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Native => "native",
            LedgerKind::Interchain => "interchain",
        }
    }
}

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Admin address for privileged operations
    pub admin: Addr,
    pub ledger: LedgerKind,
    /// Unbonding period of the staking ledger, in seconds
    pub unbonding_period: u64,
    /// Maximum redelegation instructions per rebalancing cycle
    pub max_redelegations: u32,
    /// Gateway that ships escrowed deposits to the host (interchain only)
    pub transport: Option<Addr>,
    /// Timeout carried on outbound instructions, in seconds
    pub packet_timeout: u64,
}

/// Host chain registration. Written once by JumpStart, then changed only by
/// governance proposals.
#[cw_serde]
pub struct HostChainParams {
    pub chain_id: String,
    pub connection_id: String,
    pub transfer_channel: String,
    pub transfer_port: String,
    pub base_denom: String,
    pub mint_denom: String,
    pub min_deposit: Uint128,
    pub fees: FeeParams,
}

impl HostChainParams {
    /// True when any identifying field is unset.
    pub fn is_empty(&self) -> bool {
        self.chain_id.is_empty()
            || self.connection_id.is_empty()
            || self.transfer_channel.is_empty()
            || self.transfer_port.is_empty()
            || self.base_denom.is_empty()
            || self.mint_denom.is_empty()
            || self.fees.fee_address.as_str().is_empty()
    }
}

/// Validator in the governance-set portfolio
#[cw_serde]
pub struct AllowListedValidator {
    /// Bech32 operator address (`...valoper1...`)
    pub validator_address: String,
    pub target_weight: Decimal,
}

// ============================================================================
// Unbonding
// ============================================================================

/// Base owed to a user once the unbonding period has elapsed
#[cw_serde]
pub struct UnbondingRecord {
    pub owner: Addr,
    pub amount: Uint128,
    pub maturity: Timestamp,
}

#[cw_serde]
pub enum BatchStatus {
    /// Still unbonding on the host
    Unbonding,
    /// Matured; transfer back to this chain in flight
    Returning,
    /// Funds are in the claim reserve
    Returned,
}

/// All interchain unbondings maturing at the same second
#[cw_serde]
pub struct UnbondingBatch {
    pub amount: Uint128,
    pub status: BatchStatus,
}

// ============================================================================
// Interchain Accounts
// ============================================================================

#[cw_serde]
pub enum AccountStatus {
    Uninitialized,
    HandshakeStarted,
    Registered,
    Active,
    Suspended,
}

#[cw_serde]
pub struct HostAccount {
    pub owner_id: String,
    /// Address on the host, known after the channel opens
    pub address: Option<String>,
    pub status: AccountStatus,
    pub next_sequence: u64,
    /// Sequence of the instruction awaiting its result
    pub pending: Option<u64>,
}

#[cw_serde]
pub struct HostAccounts {
    pub delegator: HostAccount,
    pub rewards: HostAccount,
}

/// What an outbound instruction did optimistically, so a failure can undo it
#[cw_serde]
pub enum InstructionKind {
    /// Points the delegator's rewards at the rewards account
    Setup,
    /// Moves harvested rewards to the delegator account
    Restake { amount: Uint128 },
    /// Per-block delegator work: return matured funds, delegate, rebalance
    Cycle {
        /// Escrowed deposits handed to the transport with this instruction
        shipped: Uint128,
        /// Maturities of the batches being transferred back
        returning: Vec<u64>,
    },
    /// A user's undelegation
    Unstake {
        owner: Addr,
        record_id: u64,
        burned: Uint128,
    },
}

#[cw_serde]
pub struct OutboundInstruction {
    pub owner_id: String,
    pub sequence: u64,
    pub msgs: Vec<HostMsg>,
    pub kind: InstructionKind,
    pub sent_at: Timestamp,
}

// ============================================================================
// Storage
// ============================================================================

pub const CONFIG: Item<Config> = Item::new("config");

pub const MODULE_ENABLED: Item<bool> = Item::new("module_enabled");

pub const HOST_CHAIN_PARAMS: Item<HostChainParams> = Item::new("host_chain_params");

pub const ALLOW_LISTED_VALIDATORS: Item<Vec<AllowListedValidator>> =
    Item::new("allow_listed_validators");

/// Recorded delegation per validator
pub const DELEGATIONS: Map<&str, Uint128> = Map::new("delegations");

/// Escrowed deposits not yet delegated, also the instant redemption reserve
pub const PENDING_DEPOSITS: Item<Uint128> = Item::new("pending_deposits");

/// Last reported rewards balance of the host rewards account
pub const HOST_REWARDS: Item<Uint128> = Item::new("host_rewards");

/// Base sitting undelegated on the host delegator account
pub const HOST_IDLE: Item<Uint128> = Item::new("host_idle");

/// Returned funds awaiting claims (interchain)
pub const CLAIM_RESERVE: Item<Uint128> = Item::new("claim_reserve");

/// Delegations observed on the host, used by slashing reports
pub const OBSERVED_DELEGATIONS: Map<&str, Uint128> = Map::new("observed_delegations");

/// Completion time of the newest redelegation a validator received
pub const REDELEGATION_COOLDOWNS: Map<&str, Timestamp> = Map::new("redelegation_cooldowns");

/// Unbonding records by (owner, record id)
pub const UNBONDING_RECORDS: Map<(&Addr, u64), UnbondingRecord> = Map::new("unbonding_records");

pub const NEXT_RECORD_ID: Item<u64> = Item::new("next_record_id");

/// Interchain unbonding batches by maturity (seconds)
pub const UNBONDING_BATCHES: Map<u64, UnbondingBatch> = Map::new("unbonding_batches");

pub const HOST_ACCOUNTS: Item<HostAccounts> = Item::new("host_accounts");

/// Outbound instructions by (owner id, sequence)
pub const OUTBOUND: Map<(&str, u64), OutboundInstruction> = Map::new("outbound");

/// Native ledger operation awaiting its reply
pub const REPLY_CONTEXTS: Map<u64, HostMsg> = Map::new("reply_contexts");

pub const NEXT_REPLY_ID: Item<u64> = Item::new("next_reply_id");

// ============================================================================
// Helpers
// ============================================================================

/// Fail unless the module is enabled.
pub fn ensure_enabled(storage: &dyn Storage) -> Result<(), ContractError> {
    if !MODULE_ENABLED.may_load(storage)?.unwrap_or(true) {
        return Err(ContractError::ModuleDisabled);
    }
    Ok(())
}

/// Load the host chain params, failing when unregistered.
pub fn load_registered_params(storage: &dyn Storage) -> Result<HostChainParams, ContractError> {
    match HOST_CHAIN_PARAMS.may_load(storage)? {
        Some(params) if !params.is_empty() => Ok(params),
        _ => Err(ContractError::HostChainNotRegistered),
    }
}

/// Module enabled and host chain registered.
pub fn ensure_operational(storage: &dyn Storage) -> Result<HostChainParams, ContractError> {
    ensure_enabled(storage)?;
    load_registered_params(storage)
}

/// Recorded delegations in ascending validator order.
pub fn load_delegations(storage: &dyn Storage) -> StdResult<Vec<(String, Uint128)>> {
    DELEGATIONS
        .range(storage, None, None, Order::Ascending)
        .collect()
}

pub fn total_delegated(storage: &dyn Storage) -> StdResult<Uint128> {
    DELEGATIONS
        .range(storage, None, None, Order::Ascending)
        .try_fold(Uint128::zero(), |acc, item| {
            let (_, amount) = item?;
            Ok(acc + amount)
        })
}

pub fn load_amount(storage: &dyn Storage, item: &Item<Uint128>) -> StdResult<Uint128> {
    Ok(item.may_load(storage)?.unwrap_or_default())
}

pub fn next_id(storage: &mut dyn Storage, counter: &Item<u64>) -> StdResult<u64> {
    let id = counter.may_load(storage)?.unwrap_or_default() + 1;
    counter.save(storage, &id)?;
    Ok(id)
}
