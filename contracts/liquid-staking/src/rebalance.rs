//! Validator set rebalancer
//!
//! Pure planning over recorded delegations and target weights. Nothing here
//! touches storage; callers record and emit the planned operations.
//!
//! All splits use largest-remainder rounding: each share gets the floor of its
//! exact portion, and the leftover units go one each to the largest
//! remainders (ties broken by ascending address). Splits always sum exactly to
//! the amount being split.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use cosmwasm_std::{StdResult, Uint128, Uint256};

use crate::state::AllowListedValidator;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redelegation {
    pub src: String,
    pub dst: String,
    pub amount: Uint128,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebalancePlan {
    pub redelegations: Vec<Redelegation>,
    /// Sources passed over because they are still receiving a redelegation
    pub skipped: Vec<String>,
}

/// Split `total` proportionally to integer `shares`.
pub fn apportion(total: Uint128, shares: &[(String, Uint128)]) -> StdResult<Vec<(String, Uint128)>> {
    let sum = shares
        .iter()
        .fold(Uint256::zero(), |acc, (_, s)| acc + Uint256::from(*s));
    if sum.is_zero() {
        return Ok(vec![]);
    }

    let mut parts = Vec::with_capacity(shares.len());
    let mut assigned = Uint128::zero();
    for (key, share) in shares {
        let product = total.full_mul(*share);
        let floor = Uint128::try_from(product / sum)?;
        assigned += floor;
        parts.push((key.clone(), floor, product % sum));
    }

    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|&a, &b| match parts[b].2.cmp(&parts[a].2) {
        Ordering::Equal => parts[a].0.cmp(&parts[b].0),
        other => other,
    });

    let leftover = (total - assigned).u128() as usize;
    for &i in order.iter().take(leftover) {
        parts[i].1 += Uint128::one();
    }

    Ok(parts.into_iter().map(|(key, amount, _)| (key, amount)).collect())
}

fn weight_shares(targets: &[AllowListedValidator]) -> Vec<(String, Uint128)> {
    targets
        .iter()
        .map(|v| (v.validator_address.clone(), v.target_weight.atomics()))
        .collect()
}

/// Target amount per allow-listed validator for a portfolio of `total`.
pub fn desired_amounts(
    total: Uint128,
    targets: &[AllowListedValidator],
) -> StdResult<BTreeMap<String, Uint128>> {
    Ok(apportion(total, &weight_shares(targets))?
        .into_iter()
        .collect())
}

/// Plan redelegations moving `current` toward the target weights.
///
/// Destinations are under-weight validators in ascending address order.
/// Sources are over-weight validators, those no longer allow-listed first,
/// then ascending by address. Each pair moves `min(surplus, deficit)` until
/// deficits are resolved or `max_entries` instructions are planned.
pub fn plan_redelegations(
    current: &[(String, Uint128)],
    targets: &[AllowListedValidator],
    in_cooldown: impl Fn(&str) -> bool,
    max_entries: usize,
) -> StdResult<RebalancePlan> {
    let total = current
        .iter()
        .fold(Uint128::zero(), |acc, (_, amount)| acc + amount);
    let desired = desired_amounts(total, targets)?;
    let held: BTreeMap<&str, Uint128> = current
        .iter()
        .map(|(v, amount)| (v.as_str(), *amount))
        .collect();

    let mut deficits: Vec<(String, Uint128)> = desired
        .iter()
        .filter_map(|(v, want)| {
            let have = held.get(v.as_str()).copied().unwrap_or_default();
            (*want > have).then(|| (v.clone(), *want - have))
        })
        .collect();

    let mut sources: Vec<(bool, String, Uint128)> = held
        .iter()
        .filter_map(|(v, have)| {
            let want = desired.get(*v).copied();
            let surplus = have.saturating_sub(want.unwrap_or_default());
            (!surplus.is_zero()).then(|| (want.is_some(), v.to_string(), surplus))
        })
        .collect();
    // dropped validators (not allow-listed) drain first
    sources.sort();

    let mut plan = RebalancePlan::default();
    let mut dst_idx = 0;
    for (_, src, mut surplus) in sources {
        if dst_idx >= deficits.len() || plan.redelegations.len() >= max_entries {
            break;
        }
        if in_cooldown(&src) {
            plan.skipped.push(src);
            continue;
        }
        while !surplus.is_zero()
            && dst_idx < deficits.len()
            && plan.redelegations.len() < max_entries
        {
            let (dst, deficit) = &mut deficits[dst_idx];
            let amount = surplus.min(*deficit);
            plan.redelegations.push(Redelegation {
                src: src.clone(),
                dst: dst.clone(),
                amount,
            });
            surplus -= amount;
            *deficit -= amount;
            if deficit.is_zero() {
                dst_idx += 1;
            }
        }
    }
    Ok(plan)
}

/// Split a deposit of `amount` across `targets`, filling deficits first.
///
/// Shares are each validator's shortfall against the targets for the
/// portfolio including the deposit; with no shortfall the weights are used.
pub fn allocate_delegations(
    amount: Uint128,
    current: &[(String, Uint128)],
    targets: &[AllowListedValidator],
) -> StdResult<Vec<(String, Uint128)>> {
    let total = current
        .iter()
        .fold(Uint128::zero(), |acc, (_, a)| acc + a);
    let desired = desired_amounts(total + amount, targets)?;
    let held: BTreeMap<&str, Uint128> = current
        .iter()
        .map(|(v, a)| (v.as_str(), *a))
        .collect();

    let deficits: Vec<(String, Uint128)> = desired
        .into_iter()
        .map(|(v, want)| {
            let have = held.get(v.as_str()).copied().unwrap_or_default();
            (v, want.saturating_sub(have))
        })
        .filter(|(_, d)| !d.is_zero())
        .collect();

    let parts = if deficits.is_empty() {
        apportion(amount, &weight_shares(targets))?
    } else {
        apportion(amount, &deficits)?
    };
    Ok(parts.into_iter().filter(|(_, a)| !a.is_zero()).collect())
}

/// Split an undelegation of `amount` proportionally to current delegations.
pub fn split_undelegation(
    amount: Uint128,
    current: &[(String, Uint128)],
) -> StdResult<Vec<(String, Uint128)>> {
    Ok(apportion(amount, current)?
        .into_iter()
        .filter(|(_, a)| !a.is_zero())
        .collect())
}
