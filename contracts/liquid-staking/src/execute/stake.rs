//! Deposit handler: base asset in, derivative out.

use cosmwasm_std::{Coin, DepsMut, Env, MessageInfo, Response};

use crate::denom::deposit_denom;
use crate::error::ContractError;
use crate::exchange_rate::current_rate;
use crate::execute::mint_derivative;
use crate::fees::split_fee;
use crate::state::{ensure_operational, load_amount, CONFIG, PENDING_DEPOSITS};

/// The single coin attached to a message.
pub(crate) fn one_coin(info: &MessageInfo) -> Result<Coin, ContractError> {
    match info.funds.as_slice() {
        [] => Err(ContractError::NoFunds),
        [coin] => Ok(coin.clone()),
        funds => Err(ContractError::MultipleDenoms { count: funds.len() }),
    }
}

/// Lock base asset and mint `floor(amount * c_value)` derivative, less the
/// deposit fee. The coin stays in escrow until the next cycle delegates it.
pub fn execute_liquid_stake(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let params = ensure_operational(deps.storage)?;
    let config = CONFIG.load(deps.storage)?;

    let deposit = one_coin(&info)?;
    let expected = deposit_denom(config.ledger, &params);
    if deposit.denom != expected {
        return Err(ContractError::WrongDenom {
            expected,
            got: deposit.denom,
        });
    }
    if deposit.amount < params.min_deposit {
        return Err(ContractError::BelowMinimumDeposit {
            amount: deposit.amount,
            min_deposit: params.min_deposit,
        });
    }

    // rate is read before the deposit joins the reserve
    let rate = current_rate(deps.as_ref(), &env)?;
    let minted = rate.mint_amount(deposit.amount);
    if minted.is_zero() {
        return Err(ContractError::AmountTooSmall {
            amount: deposit.amount,
        });
    }
    let split = split_fee(minted, params.fees.deposit_fee);

    mint_derivative(deps.branch(), &env, &info.sender, split.net)?;
    mint_derivative(deps.branch(), &env, &params.fees.fee_address, split.fee)?;

    let pending = load_amount(deps.storage, &PENDING_DEPOSITS)?;
    PENDING_DEPOSITS.save(deps.storage, &(pending + deposit.amount))?;

    Ok(Response::new()
        .add_attribute("action", "liquid_stake")
        .add_attribute("delegator", info.sender)
        .add_attribute("amount", deposit.amount)
        .add_attribute("minted", split.net)
        .add_attribute("fee", split.fee)
        .add_attribute("mint_denom", params.mint_denom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::mock_info;

    #[test]
    fn test_one_coin() {
        assert_eq!(
            one_coin(&mock_info("user", &[])).unwrap_err(),
            ContractError::NoFunds
        );
        assert_eq!(
            one_coin(&mock_info("user", &[coin(1, "a"), coin(1, "b")])).unwrap_err(),
            ContractError::MultipleDenoms { count: 2 }
        );
        assert_eq!(
            one_coin(&mock_info("user", &[coin(5, "a")])).unwrap(),
            coin(5, "a")
        );
    }
}
