//! Message types for the liquid staking contract

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Decimal, Timestamp, Uint128};
use cw20::{AllowanceResponse, BalanceResponse, Expiration, TokenInfoResponse};

use crate::exchange_rate::NetAmountState;
use crate::state::{
    AllowListedValidator, Config, HostAccounts, HostChainParams, LedgerKind, OutboundInstruction,
};

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Admin address for privileged operations
    pub admin: String,
    pub ledger: LedgerKind,
    /// Unbonding period of the staking ledger, in seconds
    pub unbonding_period: u64,
    /// Redelegation instructions per cycle (default 7)
    pub max_redelegations: Option<u32>,
    /// Gateway shipping escrowed deposits to the host; required for the
    /// interchain ledger
    pub transport: Option<String>,
    /// Outbound instruction timeout in seconds (default 600)
    pub packet_timeout: Option<u64>,
    /// Derivative token decimals (default 6)
    pub token_decimals: Option<u8>,
}

/// Host chain registration
#[cw_serde]
pub struct JumpStartMsg {
    pub chain_id: String,
    pub connection_id: String,
    pub transfer_channel: String,
    pub transfer_port: String,
    pub base_denom: String,
    /// Must be `stk/<base_denom>`
    pub mint_denom: String,
    pub min_deposit: Uint128,
    pub allow_listed_validators: Vec<AllowListedValidator>,
    pub deposit_fee: Decimal,
    pub restake_fee: Decimal,
    pub unstake_fee: Decimal,
    pub redemption_fee: Decimal,
    pub fee_address: String,
    /// Owner id of the host account that holds delegations
    pub delegator_owner_id: String,
    /// Owner id of the host account that collects rewards
    pub rewards_owner_id: String,
}

/// Execute messages
#[cw_serde]
pub enum ExecuteMsg {
    /// Deposit base asset and receive the derivative
    ///
    /// Authorization: Anyone. Send exactly one coin of the deposit denom.
    LiquidStake {},

    /// Burn derivative and unbond the equivalent base
    ///
    /// Authorization: Anyone
    ///
    /// Creates an unbonding record claimable after the unbonding period.
    LiquidUnstake { amount: Uint128 },

    /// Burn derivative for base paid immediately from undelegated deposits
    ///
    /// Authorization: Anyone
    Redeem { amount: Uint128 },

    /// Collect every matured unbonding record of the sender
    ///
    /// Authorization: Anyone
    Claim {},

    /// Register the host chain
    ///
    /// Authorization: Admin only. Once.
    JumpStart(JumpStartMsg),

    /// Reopen suspended host accounts
    ///
    /// Authorization: Admin only
    RecreateIca {},

    /// Enable or disable staking operations
    ///
    /// Authorization: Admin only
    ChangeModuleState { enabled: bool },

    /// Overwrite a validator's recorded delegation with the ledger's value
    ///
    /// Authorization: Admin only
    ReportSlashing { validator: String },

    // ========================================================================
    // Derivative token (cw20)
    // ========================================================================
    Transfer {
        recipient: String,
        amount: Uint128,
    },
    Send {
        contract: String,
        amount: Uint128,
        msg: Binary,
    },
    IncreaseAllowance {
        spender: String,
        amount: Uint128,
        expires: Option<Expiration>,
    },
    DecreaseAllowance {
        spender: String,
        amount: Uint128,
        expires: Option<Expiration>,
    },
    TransferFrom {
        owner: String,
        recipient: String,
        amount: Uint128,
    },
    SendFrom {
        owner: String,
        contract: String,
        amount: Uint128,
        msg: Binary,
    },
}

/// Governance proposal
#[cw_serde]
pub struct Proposal {
    pub title: String,
    pub description: String,
    pub content: ProposalContent,
}

#[cw_serde]
pub enum ProposalContent {
    MinDepositAndFeeChange {
        min_deposit: Uint128,
        deposit_fee: Decimal,
        restake_fee: Decimal,
        unstake_fee: Decimal,
        redemption_fee: Decimal,
    },
    FeeAddressChange {
        fee_address: String,
    },
    AllowListedValidatorSetChange {
        validators: Vec<AllowListedValidator>,
    },
}

#[cw_serde]
pub enum PacketOutcome {
    Success,
    Failure { error: String },
    Timeout,
}

#[cw_serde]
pub enum HostObservation {
    /// Current delegation of the delegator account to `validator`
    Delegation { validator: String, amount: Uint128 },
    /// Current balance of the rewards account
    Rewards { amount: Uint128 },
}

/// Privileged messages from the chain: governance, the end-block hook and
/// the interchain transport.
#[cw_serde]
pub enum SudoMsg {
    /// Per-block delegation and rebalancing cycle
    EndBlock {},
    /// Apply a passed governance proposal
    ApplyProposal { proposal: Proposal },
    IcaOpenAck {
        owner_id: String,
        address: String,
    },
    IcaChannelClosed {
        owner_id: String,
    },
    IcaPacketResult {
        owner_id: String,
        sequence: u64,
        outcome: PacketOutcome,
    },
    HostObservation { observation: HostObservation },
}

/// Query messages
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},

    /// Fails when the host chain is not registered
    #[returns(HostChainParams)]
    HostChainParams {},

    #[returns(Vec<AllowListedValidator>)]
    AllowListedValidators {},

    #[returns(Option<HostAccounts>)]
    HostAccounts {},

    #[returns(ModuleStateResponse)]
    ModuleState {},

    #[returns(NetAmountState)]
    NetAmountState {},

    #[returns(CValueResponse)]
    CValue {},

    #[returns(LiquidValidatorsResponse)]
    LiquidValidators {},

    #[returns(UnbondingRecordsResponse)]
    UnbondingRecords { owner: String },

    #[returns(ClaimableResponse)]
    Claimable { owner: String },

    #[returns(Option<OutboundInstruction>)]
    OutboundInstruction { owner_id: String, sequence: u64 },

    /// Pre-vote check of a governance proposal
    #[returns(ValidateProposalResponse)]
    ValidateProposal { proposal: Proposal },

    #[returns(DepositDenomResponse)]
    DepositDenom {},

    #[returns(BalanceResponse)]
    Balance { address: String },

    #[returns(TokenInfoResponse)]
    TokenInfo {},

    #[returns(AllowanceResponse)]
    Allowance { owner: String, spender: String },
}

// ============================================================================
// Responses
// ============================================================================

#[cw_serde]
pub struct ModuleStateResponse {
    pub enabled: bool,
}

#[cw_serde]
pub struct CValueResponse {
    /// Derivative per base
    pub c_value: Decimal,
    /// Base per derivative
    pub exchange_rate: Decimal,
}

#[cw_serde]
pub enum ValidatorStatus {
    Active,
    Inactive,
}

#[cw_serde]
pub struct LiquidValidator {
    pub validator_address: String,
    pub delegated_amount: Uint128,
    pub target_weight: Decimal,
    pub status: ValidatorStatus,
}

#[cw_serde]
pub struct LiquidValidatorsResponse {
    pub validators: Vec<LiquidValidator>,
}

#[cw_serde]
pub struct UnbondingRecordEntry {
    pub id: u64,
    pub amount: Uint128,
    pub maturity: Timestamp,
}

#[cw_serde]
pub struct UnbondingRecordsResponse {
    pub owner: Addr,
    pub records: Vec<UnbondingRecordEntry>,
}

#[cw_serde]
pub struct ClaimableResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct ValidateProposalResponse {
    pub valid: bool,
    pub error: Option<String>,
}

#[cw_serde]
pub struct DepositDenomResponse {
    pub denom: String,
}
