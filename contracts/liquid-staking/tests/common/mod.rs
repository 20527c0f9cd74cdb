//! Shared cw-multi-test harness for the liquid staking integration tests.

#![allow(dead_code)]

use cosmwasm_std::testing::mock_env;
use cosmwasm_std::{coin, coins, Addr, Decimal, Empty, Uint128, Validator};
use cw_multi_test::{
    App, AppBuilder, AppResponse, Contract, ContractWrapper, Executor, StakingInfo, StakingSudo,
    SudoMsg as ChainSudo,
};

use liquid_staking::denom::ibc_denom;
use liquid_staking::exchange_rate::NetAmountState;
use liquid_staking::msg::{
    CValueResponse, ExecuteMsg, InstantiateMsg, JumpStartMsg, Proposal, ProposalContent, QueryMsg,
    SudoMsg,
};
use liquid_staking::state::{AllowListedValidator, LedgerKind};

pub const BASE: &str = "uatom";
pub const CHAIN_ID: &str = "gaia-1";
pub const DELEGATION_OWNER: &str = "gaia-1.delegation";
pub const REWARDS_OWNER: &str = "gaia-1.rewards";
pub const UNBONDING: u64 = 21 * 24 * 60 * 60;
pub const MIN_DEPOSIT: u128 = 10;

pub const VAL1: &str = "cosmosvaloper1qyqszqgpqyqszqgpqyqszqgpqyqszqgph84tp0";
pub const VAL2: &str = "cosmosvaloper1qgpqyqszqgpqyqszqgpqyqszqgpqyqszxrnw2e";
pub const VAL3: &str = "cosmosvaloper1qvpsxqcrqvpsxqcrqvpsxqcrqvpsxqcr8nj0qc";

pub fn voucher() -> String {
    ibc_denom("transfer", "channel-0", BASE)
}

fn contract_liquid_staking() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        liquid_staking::contract::execute,
        liquid_staking::contract::instantiate,
        liquid_staking::contract::query,
    )
    .with_sudo(liquid_staking::contract::sudo)
    .with_reply(liquid_staking::contract::reply);
    Box::new(contract)
}

pub fn weights(list: &[(&str, u64)]) -> Vec<AllowListedValidator> {
    list.iter()
        .map(|(validator, percent)| AllowListedValidator {
            validator_address: validator.to_string(),
            target_weight: Decimal::percent(*percent),
        })
        .collect()
}

pub fn proposal(content: ProposalContent) -> Proposal {
    Proposal {
        title: "Liquid staking parameters".to_string(),
        description: "Adjust the liquid staking module".to_string(),
        content,
    }
}

/// Value of the first attribute named `key` across all events.
pub fn attr(res: &AppResponse, key: &str) -> Option<String> {
    res.events
        .iter()
        .flat_map(|e| &e.attributes)
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
}

pub fn count_events(res: &AppResponse, ty: &str) -> usize {
    let ty = format!("wasm-{}", ty);
    res.events.iter().filter(|e| e.ty == ty).count()
}

pub struct Suite {
    pub app: App,
    pub contract: Addr,
    pub admin: Addr,
    pub user: Addr,
    pub fee_collector: Addr,
    pub transport: Addr,
    pub ledger: LedgerKind,
}

pub struct SuiteBuilder {
    ledger: LedgerKind,
    apr: Decimal,
    validators: Vec<&'static str>,
}

impl SuiteBuilder {
    pub fn native() -> Self {
        Self {
            ledger: LedgerKind::Native,
            apr: Decimal::zero(),
            validators: vec![VAL1, VAL2],
        }
    }

    pub fn interchain() -> Self {
        Self {
            ledger: LedgerKind::Interchain,
            apr: Decimal::zero(),
            validators: vec![],
        }
    }

    pub fn apr(mut self, apr: Decimal) -> Self {
        self.apr = apr;
        self
    }

    /// Validators in this chain's active set.
    pub fn validators(mut self, validators: &[&'static str]) -> Self {
        self.validators = validators.to_vec();
        self
    }

    pub fn build(self) -> Suite {
        let admin = Addr::unchecked("admin");
        let user = Addr::unchecked("user");
        let fee_collector = Addr::unchecked("feecollector");
        let transport = Addr::unchecked("transport");

        let mut app = AppBuilder::new().build(|router, api, storage| {
            router
                .staking
                .setup(
                    storage,
                    StakingInfo {
                        bonded_denom: BASE.to_string(),
                        unbonding_time: UNBONDING,
                        apr: self.apr,
                    },
                )
                .unwrap();
            for validator in &self.validators {
                router
                    .staking
                    .add_validator(
                        api,
                        storage,
                        &mock_env().block,
                        Validator {
                            address: validator.to_string(),
                            commission: Decimal::zero(),
                            max_commission: Decimal::one(),
                            max_change_rate: Decimal::one(),
                        },
                    )
                    .unwrap();
            }
            // interchain depositors hold the voucher
            router
                .bank
                .init_balance(
                    storage,
                    &user,
                    vec![coin(1_000_000, BASE), coin(1_000_000, voucher())],
                )
                .unwrap();
            router
                .bank
                .init_balance(storage, &transport, coins(1_000_000, voucher()))
                .unwrap();
            router
                .bank
                .init_balance(
                    storage,
                    &Addr::unchecked("holder"),
                    vec![coin(1_000_000, BASE), coin(1_000_000, voucher())],
                )
                .unwrap();
        });

        let code_id = app.store_code(contract_liquid_staking());
        let contract = app
            .instantiate_contract(
                code_id,
                admin.clone(),
                &InstantiateMsg {
                    admin: admin.to_string(),
                    ledger: self.ledger,
                    unbonding_period: UNBONDING,
                    max_redelegations: None,
                    transport: Some(transport.to_string()),
                    packet_timeout: None,
                    token_decimals: None,
                },
                &[],
                "liquid-staking",
                Some(admin.to_string()),
            )
            .unwrap();

        Suite {
            app,
            contract,
            admin,
            user,
            fee_collector,
            transport,
            ledger: self.ledger,
        }
    }
}

impl Suite {
    pub fn deposit_denom(&self) -> String {
        match self.ledger {
            LedgerKind::Native => BASE.to_string(),
            LedgerKind::Interchain => voucher(),
        }
    }

    pub fn jump_start_msg(&self, validators: Vec<AllowListedValidator>) -> JumpStartMsg {
        JumpStartMsg {
            chain_id: CHAIN_ID.to_string(),
            connection_id: "connection-0".to_string(),
            transfer_channel: "channel-0".to_string(),
            transfer_port: "transfer".to_string(),
            base_denom: BASE.to_string(),
            mint_denom: format!("stk/{}", BASE),
            min_deposit: Uint128::new(MIN_DEPOSIT),
            allow_listed_validators: validators,
            deposit_fee: Decimal::zero(),
            restake_fee: Decimal::zero(),
            unstake_fee: Decimal::zero(),
            redemption_fee: Decimal::zero(),
            fee_address: self.fee_collector.to_string(),
            delegator_owner_id: DELEGATION_OWNER.to_string(),
            rewards_owner_id: REWARDS_OWNER.to_string(),
        }
    }

    pub fn jump_start_with(&mut self, msg: JumpStartMsg) -> anyhow::Result<AppResponse> {
        self.app.execute_contract(
            self.admin.clone(),
            self.contract.clone(),
            &ExecuteMsg::JumpStart(msg),
            &[],
        )
    }

    pub fn jump_start(&mut self, validators: Vec<AllowListedValidator>) -> AppResponse {
        let msg = self.jump_start_msg(validators);
        self.jump_start_with(msg).unwrap()
    }

    pub fn execute(&mut self, sender: &Addr, msg: &ExecuteMsg) -> anyhow::Result<AppResponse> {
        self.app
            .execute_contract(sender.clone(), self.contract.clone(), msg, &[])
    }

    pub fn stake(&mut self, amount: u128) -> anyhow::Result<AppResponse> {
        let denom = self.deposit_denom();
        let user = self.user.clone();
        self.app.execute_contract(
            user,
            self.contract.clone(),
            &ExecuteMsg::LiquidStake {},
            &coins(amount, denom),
        )
    }

    pub fn unstake(&mut self, amount: u128) -> anyhow::Result<AppResponse> {
        let user = self.user.clone();
        self.execute(
            &user,
            &ExecuteMsg::LiquidUnstake {
                amount: Uint128::new(amount),
            },
        )
    }

    pub fn claim(&mut self) -> anyhow::Result<AppResponse> {
        let user = self.user.clone();
        self.execute(&user, &ExecuteMsg::Claim {})
    }

    pub fn sudo(&mut self, msg: &SudoMsg) -> anyhow::Result<AppResponse> {
        self.app.wasm_sudo(self.contract.clone(), msg)
    }

    pub fn end_block(&mut self) -> AppResponse {
        self.sudo(&SudoMsg::EndBlock {}).unwrap()
    }

    pub fn apply(&mut self, content: ProposalContent) -> anyhow::Result<AppResponse> {
        self.sudo(&SudoMsg::ApplyProposal {
            proposal: proposal(content),
        })
    }

    pub fn advance(&mut self, seconds: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
            block.height += seconds / 5;
        });
    }

    /// Release matured native unbondings.
    #[allow(deprecated)]
    pub fn process_unbonding_queue(&mut self) {
        self.app
            .sudo(ChainSudo::Staking(StakingSudo::ProcessQueue {}))
            .unwrap();
    }

    pub fn slash(&mut self, validator: &str, percentage: Decimal) {
        self.app
            .sudo(ChainSudo::Staking(StakingSudo::Slash {
                validator: validator.to_string(),
                percentage,
            }))
            .unwrap();
    }

    pub fn query<T: serde::de::DeserializeOwned>(&self, msg: &QueryMsg) -> T {
        self.app
            .wrap()
            .query_wasm_smart(&self.contract, msg)
            .unwrap()
    }

    pub fn derivative_balance(&self, address: &Addr) -> Uint128 {
        let res: cw20::BalanceResponse = self.query(&QueryMsg::Balance {
            address: address.to_string(),
        });
        res.balance
    }

    pub fn bank_balance(&self, address: &Addr, denom: &str) -> Uint128 {
        self.app
            .wrap()
            .query_balance(address, denom)
            .unwrap()
            .amount
    }

    pub fn native_delegation(&self, validator: &str) -> Uint128 {
        self.app
            .wrap()
            .query_delegation(&self.contract, validator)
            .unwrap()
            .map(|d| d.amount.amount)
            .unwrap_or_default()
    }

    pub fn net_amount_state(&self) -> NetAmountState {
        self.query(&QueryMsg::NetAmountState {})
    }

    pub fn exchange_rate(&self) -> Decimal {
        let res: CValueResponse = self.query(&QueryMsg::CValue {});
        res.exchange_rate
    }
}
