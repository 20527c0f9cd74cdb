//! Integration tests for the exchange rate under rewards and slashing.

mod common;

use cosmwasm_std::{Decimal, Uint128};

use common::{attr, weights, SuiteBuilder, VAL1, VAL2};
use liquid_staking::msg::ExecuteMsg;

const YEAR: u64 = 365 * 24 * 60 * 60;

#[test]
fn test_slash_is_reflected_only_after_report() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 50), (VAL2, 50)]));
    suite.stake(1_000).unwrap();
    suite.end_block();

    suite.slash(VAL1, Decimal::percent(10));
    assert_eq!(suite.native_delegation(VAL1), Uint128::new(450));

    // the recorded view is unchanged until reported
    assert_eq!(suite.exchange_rate(), Decimal::one());

    let user = suite.user.clone();
    let err = suite
        .execute(
            &user,
            &ExecuteMsg::ReportSlashing {
                validator: VAL1.to_string(),
            },
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("Unauthorized"));

    let admin = suite.admin.clone();
    let res = suite
        .execute(
            &admin,
            &ExecuteMsg::ReportSlashing {
                validator: VAL1.to_string(),
            },
        )
        .unwrap();
    assert_eq!(attr(&res, "recorded").unwrap(), "500");
    assert_eq!(attr(&res, "observed").unwrap(), "450");

    let state = suite.net_amount_state();
    assert_eq!(state.total_delegated, Uint128::new(950));
    assert_eq!(state.exchange_rate, Decimal::permille(950));

    // redemptions now pay at the reduced rate
    let res = suite.unstake(100).unwrap();
    assert_eq!(attr(&res, "unbonding").unwrap(), "95");
}

#[test]
fn test_report_for_unknown_validator_fails() {
    let mut suite = SuiteBuilder::native().build();
    suite.jump_start(weights(&[(VAL1, 100)]));
    let admin = suite.admin.clone();
    let err = suite
        .execute(
            &admin,
            &ExecuteMsg::ReportSlashing {
                validator: VAL2.to_string(),
            },
        )
        .unwrap_err();
    assert!(err.root_cause().to_string().contains("No recorded delegation"));
}

#[test]
fn test_rewards_raise_the_rate_monotonically() {
    let mut suite = SuiteBuilder::native().apr(Decimal::percent(10)).build();
    let mut msg = suite.jump_start_msg(weights(&[(VAL1, 100)]));
    msg.restake_fee = Decimal::percent(10);
    suite.jump_start_with(msg).unwrap();
    suite.stake(500_000).unwrap();
    suite.end_block();

    let start = suite.exchange_rate();
    assert_eq!(start, Decimal::one());

    suite.advance(YEAR);
    let accrued = suite.exchange_rate();
    assert!(accrued > start, "{} should exceed {}", accrued, start);
    let state = suite.net_amount_state();
    assert!(!state.total_rewards.is_zero());

    // harvesting moves rewards into pending deposits and mints the restake
    // fee without lowering the rate
    let res = suite.end_block();
    assert_ne!(attr(&res, "restaked").unwrap(), "0");
    let restaked = suite.exchange_rate();
    assert!(restaked >= accrued, "{} dropped below {}", restaked, accrued);

    let fee_collector = suite.fee_collector.clone();
    assert!(!suite.derivative_balance(&fee_collector).is_zero());

    // deposits and redemptions do not move the rate down
    suite.stake(12_345).unwrap();
    assert!(suite.exchange_rate() >= restaked);
    let user = suite.user.clone();
    suite
        .execute(
            &user,
            &ExecuteMsg::Redeem {
                amount: Uint128::new(1_000),
            },
        )
        .unwrap();
    assert!(suite.exchange_rate() >= restaked);
}
