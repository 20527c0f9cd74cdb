//! Error types for the liquid staking contract

use cosmwasm_std::{Decimal, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Token(#[from] cw20_base::ContractError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Host chain is not registered")]
    HostChainNotRegistered,

    #[error("Host chain is already registered")]
    AlreadyRegistered,

    #[error("Invalid host chain params: {reason}")]
    InvalidHostChainParams { reason: String },

    #[error("Invalid mint denom: expected {expected}, got {got}")]
    InvalidMintDenom { expected: String, got: String },

    #[error("Interchain ledger requires a transport address")]
    MissingTransport,

    #[error("Unbonding period must be positive")]
    ZeroUnbondingPeriod,

    // ========================================================================
    // Guard Errors
    // ========================================================================

    #[error("Module is disabled")]
    ModuleDisabled,

    #[error("Unauthorized: only admin can perform this action")]
    Unauthorized,

    // ========================================================================
    // Validation Errors
    // ========================================================================

    #[error("Wrong denom: expected {expected}, got {got}")]
    WrongDenom { expected: String, got: String },

    #[error("Deposit {amount} is below the minimum deposit {min_deposit}")]
    BelowMinimumDeposit {
        amount: Uint128,
        min_deposit: Uint128,
    },

    #[error("No funds sent")]
    NoFunds,

    #[error("Send exactly one coin, got {count}")]
    MultipleDenoms { count: usize },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Invalid validator address {address}: {reason}")]
    InvalidValidatorAddress { address: String, reason: String },

    #[error("Invalid allow listed validator set: {reason}")]
    InvalidAllowList { reason: String },

    #[error("Invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    #[error("Invalid {kind} fee {value}: must be below {max}")]
    InvalidFee {
        kind: String,
        value: Decimal,
        max: Decimal,
    },

    // ========================================================================
    // Economic Errors
    // ========================================================================

    #[error("Insufficient liquid reserve: requested {requested}, available {available}")]
    InsufficientLiquidReserve {
        requested: Uint128,
        available: Uint128,
    },

    #[error("Insufficient delegations: requested {requested}, delegated {delegated}")]
    InsufficientDelegations {
        requested: Uint128,
        delegated: Uint128,
    },

    #[error("Amount {amount} converts to zero")]
    AmountTooSmall { amount: Uint128 },

    #[error("No recorded delegation to {validator}")]
    NoRecordedDelegation { validator: String },

    // ========================================================================
    // Interchain Account Errors
    // ========================================================================

    #[error("Unknown host account: {owner_id}")]
    UnknownHostAccount { owner_id: String },

    #[error("Host account {owner_id} is not active")]
    AccountNotActive { owner_id: String },

    #[error("Host account {owner_id} has an outstanding instruction {sequence}")]
    AccountBusy { owner_id: String, sequence: u64 },

    #[error("Unexpected sequence for {owner_id}: expected {expected:?}, got {got}")]
    UnexpectedSequence {
        owner_id: String,
        expected: Option<u64>,
        got: u64,
    },

    #[error("Host account {owner_id} cannot {action} while {status}")]
    InvalidAccountTransition {
        owner_id: String,
        action: String,
        status: String,
    },

    #[error("No suspended host accounts to recreate")]
    NoSuspendedAccounts,

    #[error("No host observation for {validator}")]
    NoObservation { validator: String },

    #[error("Operation requires the {required} ledger")]
    WrongLedger { required: String },

    #[error("Unknown reply id: {id}")]
    UnknownReply { id: u64 },
}
