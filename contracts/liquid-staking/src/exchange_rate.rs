//! Exchange rate engine
//!
//! The protocol's net value is
//!
//! ```text
//! value = delegated + rewards * (1 - restake_fee) + pending_deposits + host_idle
//! ```
//!
//! Base owed to unbonding records is excluded: its derivative was burned when
//! the record was created. `c_value = supply / value` is the derivative minted
//! per unit of base; its inverse, the exchange rate, never decreases except
//! through a slashing report. Both are 1 while either side is zero.
//!
//! Nothing here is cached; every call reads storage and the querier.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Deps, Env, Order, StdError, StdResult, Uint128};

use crate::fees::split_fee;
use crate::state::{
    load_amount, load_delegations, total_delegated, LedgerKind, CONFIG, HOST_CHAIN_PARAMS,
    HOST_IDLE, HOST_REWARDS, PENDING_DEPOSITS, UNBONDING_RECORDS,
};

/// Net value and derivative supply at one instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeRate {
    pub value: Uint128,
    pub supply: Uint128,
}

impl ExchangeRate {
    fn bootstrapping(&self) -> bool {
        self.value.is_zero() || self.supply.is_zero()
    }

    /// Derivative minted for `base`, `floor(base * c_value)`.
    pub fn mint_amount(&self, base: Uint128) -> Uint128 {
        if self.bootstrapping() {
            return base;
        }
        base.multiply_ratio(self.supply, self.value)
    }

    /// Base redeemable for `derivative`, `floor(derivative / c_value)`.
    pub fn base_amount(&self, derivative: Uint128) -> Uint128 {
        if self.bootstrapping() {
            return derivative;
        }
        derivative.multiply_ratio(self.value, self.supply)
    }

    /// Derivative per base.
    pub fn c_value(&self) -> StdResult<Decimal> {
        if self.bootstrapping() {
            return Ok(Decimal::one());
        }
        Decimal::checked_from_ratio(self.supply, self.value)
            .map_err(|e| StdError::generic_err(e.to_string()))
    }

    /// Base per derivative.
    pub fn exchange_rate(&self) -> StdResult<Decimal> {
        if self.bootstrapping() {
            return Ok(Decimal::one());
        }
        Decimal::checked_from_ratio(self.value, self.supply)
            .map_err(|e| StdError::generic_err(e.to_string()))
    }
}

/// Projection of the protocol's accounting
#[cw_serde]
pub struct NetAmountState {
    pub total_delegated: Uint128,
    /// Unclaimed staking rewards before the restake fee
    pub total_rewards: Uint128,
    pub total_pending_deposits: Uint128,
    pub total_host_idle: Uint128,
    pub total_derivative_supply: Uint128,
    /// Owed to records that have not matured
    pub total_unbonding: Uint128,
    /// Owed to matured records
    pub total_claimable: Uint128,
    pub net_value: Uint128,
    pub c_value: Decimal,
    pub exchange_rate: Decimal,
}

/// Unclaimed rewards per delegated validator on the native ledger.
pub fn native_rewards(deps: Deps, env: &Env, denom: &str) -> StdResult<Vec<(String, Uint128)>> {
    let mut rewards = vec![];
    for (validator, _) in load_delegations(deps.storage)? {
        let Some(delegation) = deps
            .querier
            .query_delegation(&env.contract.address, &validator)?
        else {
            continue;
        };
        let amount = delegation
            .accumulated_rewards
            .iter()
            .filter(|c| c.denom == denom)
            .fold(Uint128::zero(), |acc, c| acc + c.amount);
        if !amount.is_zero() {
            rewards.push((validator, amount));
        }
    }
    Ok(rewards)
}

/// Gross unclaimed rewards on whichever ledger is configured.
pub fn total_rewards(deps: Deps, env: &Env) -> StdResult<Uint128> {
    let config = CONFIG.load(deps.storage)?;
    match config.ledger {
        LedgerKind::Native => {
            let Some(params) = HOST_CHAIN_PARAMS.may_load(deps.storage)? else {
                return Ok(Uint128::zero());
            };
            Ok(native_rewards(deps, env, &params.base_denom)?
                .into_iter()
                .fold(Uint128::zero(), |acc, (_, amount)| acc + amount))
        }
        LedgerKind::Interchain => load_amount(deps.storage, &HOST_REWARDS),
    }
}

pub fn derivative_supply(deps: Deps) -> StdResult<Uint128> {
    Ok(cw20_base::state::TOKEN_INFO
        .may_load(deps.storage)?
        .map(|info| info.total_supply)
        .unwrap_or_default())
}

/// Current exchange rate.
pub fn current_rate(deps: Deps, env: &Env) -> StdResult<ExchangeRate> {
    let rewards = total_rewards(deps, env)?;
    rate_with_rewards(deps, rewards)
}

/// Exchange rate given already-known gross rewards.
pub fn rate_with_rewards(deps: Deps, rewards: Uint128) -> StdResult<ExchangeRate> {
    let restake_fee = HOST_CHAIN_PARAMS
        .may_load(deps.storage)?
        .map(|p| p.fees.restake_fee)
        .unwrap_or_default();
    let value = total_delegated(deps.storage)?
        + split_fee(rewards, restake_fee).net
        + load_amount(deps.storage, &PENDING_DEPOSITS)?
        + load_amount(deps.storage, &HOST_IDLE)?;
    Ok(ExchangeRate {
        value,
        supply: derivative_supply(deps)?,
    })
}

pub fn net_amount_state(deps: Deps, env: &Env) -> StdResult<NetAmountState> {
    let rewards = total_rewards(deps, env)?;
    let rate = rate_with_rewards(deps, rewards)?;

    let mut total_unbonding = Uint128::zero();
    let mut total_claimable = Uint128::zero();
    for item in UNBONDING_RECORDS.range(deps.storage, None, None, Order::Ascending) {
        let (_, record) = item?;
        if record.maturity > env.block.time {
            total_unbonding += record.amount;
        } else {
            total_claimable += record.amount;
        }
    }

    Ok(NetAmountState {
        total_delegated: total_delegated(deps.storage)?,
        total_rewards: rewards,
        total_pending_deposits: load_amount(deps.storage, &PENDING_DEPOSITS)?,
        total_host_idle: load_amount(deps.storage, &HOST_IDLE)?,
        total_derivative_supply: rate.supply,
        total_unbonding,
        total_claimable,
        net_value: rate.value,
        c_value: rate.c_value()?,
        exchange_rate: rate.exchange_rate()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_rate_is_one() {
        let rate = ExchangeRate {
            value: Uint128::zero(),
            supply: Uint128::zero(),
        };
        assert_eq!(rate.mint_amount(Uint128::new(77)), Uint128::new(77));
        assert_eq!(rate.c_value().unwrap(), Decimal::one());
        assert_eq!(rate.exchange_rate().unwrap(), Decimal::one());
    }

    #[test]
    fn test_mint_is_floor_of_c_value() {
        // value 1100 backs supply 1000: c_value = 10/11
        let rate = ExchangeRate {
            value: Uint128::new(1100),
            supply: Uint128::new(1000),
        };
        assert_eq!(rate.mint_amount(Uint128::new(100)), Uint128::new(90));
        assert_eq!(rate.mint_amount(Uint128::new(200)), Uint128::new(181));
        assert_eq!(rate.mint_amount(Uint128::new(10)), Uint128::new(9));
    }

    #[test]
    fn test_round_trip_never_gains() {
        let rate = ExchangeRate {
            value: Uint128::new(1_000_003),
            supply: Uint128::new(999_999),
        };
        for d in [1u128, 7, 1000, 123_457] {
            let minted = rate.mint_amount(Uint128::new(d));
            assert!(rate.base_amount(minted) <= Uint128::new(d));
        }
    }
}
