//! Integration tests for validator set changes and redelegation on the native
//! ledger.

mod common;

use cosmwasm_std::{Decimal, Uint128};

use common::{attr, count_events, weights, SuiteBuilder, VAL1, VAL2, VAL3};
use liquid_staking::msg::{LiquidValidatorsResponse, ProposalContent, QueryMsg, ValidatorStatus};
use liquid_staking::state::AllowListedValidator;

fn allow_list_change(validators: Vec<AllowListedValidator>) -> ProposalContent {
    ProposalContent::AllowListedValidatorSetChange { validators }
}

#[test]
fn test_weight_change_redelegates_half() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();
    suite.end_block();
    assert_eq!(suite.native_delegation(VAL1), Uint128::new(1_000));

    let res = suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL2, 50)])))
        .unwrap();
    assert_eq!(attr(&res, "validators").unwrap(), "2");

    assert_eq!(suite.native_delegation(VAL1), Uint128::new(500));
    assert_eq!(suite.native_delegation(VAL2), Uint128::new(500));

    // balanced: the next cycle plans nothing
    let res = suite.end_block();
    assert_eq!(attr(&res, "redelegations").unwrap(), "0");
    assert_eq!(count_events(&res, "redelegation_skipped"), 0);

    // redelegation moves stake without changing value
    assert_eq!(suite.exchange_rate(), Decimal::one());
    let state = suite.net_amount_state();
    assert_eq!(state.total_delegated, Uint128::new(1_000));
}

#[test]
fn test_dropped_validator_is_drained() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 50), (VAL2, 50)]));
    suite.stake(1_000).unwrap();
    suite.end_block();

    suite
        .apply(allow_list_change(weights(&[(VAL2, 100)])))
        .unwrap();
    assert_eq!(suite.native_delegation(VAL1), Uint128::zero());
    assert_eq!(suite.native_delegation(VAL2), Uint128::new(1_000));

    let res: LiquidValidatorsResponse = suite.query(&QueryMsg::LiquidValidators {});
    assert_eq!(res.validators.len(), 1);
    assert_eq!(res.validators[0].validator_address, VAL2);
    assert_eq!(res.validators[0].status, ValidatorStatus::Active);
}

#[test]
fn test_recent_destination_is_not_a_source() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();
    suite.end_block();

    // VAL2 receives a redelegation and enters its cooldown
    suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL2, 50)])))
        .unwrap();

    // flipping the weights would move stake out of VAL2: deferred
    let res = suite
        .apply(allow_list_change(weights(&[(VAL1, 100)])))
        .unwrap();
    assert_eq!(count_events(&res, "redelegation_skipped"), 1);
    assert_eq!(suite.native_delegation(VAL2), Uint128::new(500));

    // after the cooldown the source is free to drain
    suite.advance(common::UNBONDING + 1);
    suite.process_unbonding_queue();
    let res = suite.end_block();
    assert_eq!(attr(&res, "redelegations").unwrap(), "1");
    assert_eq!(suite.native_delegation(VAL1), Uint128::new(1_000));
    assert_eq!(suite.native_delegation(VAL2), Uint128::zero());
}

#[test]
fn test_rebalance_harvests_moved_validators_first() {
    let mut suite = SuiteBuilder::native().apr(Decimal::percent(10)).build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(500_000).unwrap();
    suite.end_block();

    suite.advance(365 * 24 * 60 * 60);
    let accrued = suite.exchange_rate();
    assert!(!suite.net_amount_state().total_rewards.is_zero());

    let res = suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL2, 50)])))
        .unwrap();
    let restaked = attr(&res, "restaked").unwrap();
    assert_ne!(restaked, "0");
    assert_eq!(attr(&res, "redelegations").unwrap(), "1");

    let state = suite.net_amount_state();
    assert_eq!(state.total_rewards, Uint128::zero());
    assert_eq!(state.total_pending_deposits.to_string(), restaked);
    assert!(state.exchange_rate >= accrued);
    assert_eq!(suite.native_delegation(VAL2), Uint128::new(250_000));
}

#[test]
fn test_invalid_allow_list_is_rejected() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));

    // weights must sum to one
    let err = suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL2, 40)])))
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("allow listed"));

    // duplicates
    let err = suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL1, 50)])))
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("allow listed"));

    // not an operator address
    let err = suite
        .apply(allow_list_change(weights(&[(
            "cosmos1qyqszqgpqyqszqgpqyqszqgpqyqszqgpjnp7du",
            100,
        )])))
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Invalid validator address"));

    // unchanged
    let list: Vec<AllowListedValidator> = suite.query(&QueryMsg::AllowListedValidators {});
    assert_eq!(list, weights(&[(VAL1, 100)]));
}

#[test]
fn test_inactive_target_is_skipped_by_rebalance() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();
    suite.end_block();

    // VAL3 is not in this chain's validator set
    suite
        .apply(allow_list_change(weights(&[(VAL1, 50), (VAL3, 50)])))
        .unwrap();
    assert_eq!(suite.native_delegation(VAL1), Uint128::new(1_000));
    assert_eq!(suite.exchange_rate(), Decimal::one());
}
