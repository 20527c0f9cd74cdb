//! Integration tests for instant redemption, unbonding and claims on the
//! native ledger.

mod common;

use cosmwasm_std::{Decimal, Uint128};

use common::{attr, weights, SuiteBuilder, BASE, UNBONDING, VAL1, VAL2};
use liquid_staking::msg::{ClaimableResponse, ExecuteMsg, QueryMsg, UnbondingRecordsResponse};

// ============================================================================
// Redeem
// ============================================================================

#[test]
fn test_redeem_pays_from_pending_deposits() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();

    let user = suite.user.clone();
    let before = suite.bank_balance(&user, BASE);
    let res = suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::new(300),
            },
        )
        .unwrap();
    assert_eq!(attr(&res, "payout").unwrap(), "300");

    assert_eq!(suite.bank_balance(&user, BASE), before + Uint128::new(300));
    assert_eq!(suite.derivative_balance(&user), Uint128::new(700));

    let state = suite.net_amount_state();
    assert_eq!(state.total_pending_deposits, Uint128::new(700));
    assert_eq!(state.total_derivative_supply, Uint128::new(700));
    assert_eq!(state.exchange_rate, Decimal::one());
}

#[test]
fn test_redeem_beyond_reserve_fails() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();
    suite.end_block();
    suite.stake(200).unwrap();

    let user = suite.user.clone();
    let err = suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::new(500),
            },
        )
        .unwrap_err();
    assert!(
        err.root_cause()
            .to_string()
            .contains("Insufficient liquid reserve"),
        "unexpected error: {}",
        err.root_cause()
    );

    // within the reserve
    suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::new(200),
            },
        )
        .unwrap();
}

#[test]
fn test_redemption_fee_goes_to_fee_address() {
    let mut suite = SuiteBuilder::native().build();
    let mut msg = suite.jump_start_msg(weights(&[(VAL1, 100)]));
    msg.redemption_fee = Decimal::percent(10);
    suite.jump_start_with(msg).unwrap();
    suite.stake(1_000).unwrap();

    let user = suite.user.clone();
    let res = suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::new(500),
            },
        )
        .unwrap();
    assert_eq!(attr(&res, "payout").unwrap(), "450");

    let fee_collector = suite.fee_collector.clone();
    assert_eq!(suite.derivative_balance(&fee_collector), Uint128::new(50));
    assert_eq!(suite.derivative_balance(&user), Uint128::new(500));
}

#[test]
fn test_redeem_zero_fails() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    let user = suite.user.clone();
    let err = suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::zero(),
            },
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("greater than zero"));
}

// ============================================================================
// Unbonding and Claims
// ============================================================================

#[test]
fn test_unstake_then_claim_after_maturity() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 50), (VAL2, 50)]));
    suite.stake(1_000).unwrap();
    suite.end_block();

    let res = suite.unstake(400).unwrap();
    assert_eq!(attr(&res, "unbonding").unwrap(), "400");

    let user = suite.user.clone();
    assert_eq!(suite.derivative_balance(&user), Uint128::new(600));
    // split evenly over the two delegations
    assert_eq!(suite.native_delegation(VAL1), Uint128::new(300));
    assert_eq!(suite.native_delegation(VAL2), Uint128::new(300));

    let records: UnbondingRecordsResponse = suite.query(&QueryMsg::UnbondingRecords {
        owner: user.to_string(),
    });
    assert_eq!(records.records.len(), 1);
    assert_eq!(records.records[0].amount, Uint128::new(400));

    // unbonded base is not part of the net value
    let state = suite.net_amount_state();
    assert_eq!(state.net_value, Uint128::new(600));
    assert_eq!(state.total_unbonding, Uint128::new(400));
    assert_eq!(state.exchange_rate, Decimal::one());

    // claiming early is a no-op
    let before = suite.bank_balance(&user, BASE);
    let res = suite.claim().unwrap();
    assert_eq!(attr(&res, "claimed").unwrap(), "0");
    assert_eq!(suite.bank_balance(&user, BASE), before);

    suite.advance(UNBONDING);
    suite.process_unbonding_queue();

    let claimable: ClaimableResponse = suite.query(&QueryMsg::Claimable {
        owner: user.to_string(),
    });
    assert_eq!(claimable.amount, Uint128::new(400));

    let res = suite.claim().unwrap();
    assert_eq!(attr(&res, "claimed").unwrap(), "400");
    assert_eq!(suite.bank_balance(&user, BASE), before + Uint128::new(400));

    let records: UnbondingRecordsResponse = suite.query(&QueryMsg::UnbondingRecords {
        owner: user.to_string(),
    });
    assert!(records.records.is_empty());

    // a second claim finds nothing
    let res = suite.claim().unwrap();
    assert_eq!(attr(&res, "claimed").unwrap(), "0");
}

#[test]
fn test_unstake_more_than_delegated_fails() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    suite.stake(1_000).unwrap();

    // nothing delegated yet
    let err = suite.unstake(100).unwrap_err();
    assert!(err
        .root_cause()
        .to_string()
        .contains("Insufficient delegations"));
}

#[test]
fn test_unstake_fee_and_derivative_balance() {
    let mut suite = SuiteBuilder::native().build();
    let mut msg = suite.jump_start_msg(weights(&[(VAL1, 100)]));
    msg.unstake_fee = Decimal::percent(5);
    suite.jump_start_with(msg).unwrap();
    suite.stake(1_000).unwrap();
    suite.end_block();

    let res = suite.unstake(200).unwrap();
    assert_eq!(attr(&res, "fee").unwrap(), "10");
    assert_eq!(attr(&res, "unbonding").unwrap(), "190");

    let fee_collector = suite.fee_collector.clone();
    let user = suite.user.clone();
    assert_eq!(suite.derivative_balance(&fee_collector), Uint128::new(10));
    assert_eq!(suite.derivative_balance(&user), Uint128::new(800));

    // 1000 less the fee converts to more than the 810 still delegated
    let err = suite.unstake(1_000).unwrap_err();
    assert!(err
        .root_cause()
        .to_string()
        .contains("Insufficient delegations"));
}
