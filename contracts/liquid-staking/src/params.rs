//! Parameter validation
//!
//! Host chain registration, validator operator addresses and the allow-listed
//! validator set.

use std::collections::HashSet;

use bech32::Variant;
use cosmwasm_std::Decimal;

use crate::denom::mint_denom_for;
use crate::error::ContractError;
use crate::state::{AllowListedValidator, HostChainParams};

/// Operator addresses use a human-readable part ending in this suffix.
pub const VALOPER_SUFFIX: &str = "valoper";

/// Check that `address` is a bech32 validator operator address.
pub fn validate_valoper(address: &str) -> Result<(), ContractError> {
    let invalid = |reason: &str| ContractError::InvalidValidatorAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| invalid(&e.to_string()))?;
    if !hrp.ends_with(VALOPER_SUFFIX) {
        return Err(invalid("prefix is not a validator operator prefix"));
    }
    if variant != Variant::Bech32 {
        return Err(invalid("bech32m encoding is not accepted"));
    }
    if data.is_empty() {
        return Err(invalid("empty address payload"));
    }
    Ok(())
}

/// Check an allow-listed validator set.
///
/// The set must be non-empty, contain no duplicates, use valid operator
/// addresses and have weights summing to exactly one.
pub fn validate_allow_list(validators: &[AllowListedValidator]) -> Result<(), ContractError> {
    if validators.is_empty() {
        return Err(ContractError::InvalidAllowList {
            reason: "validator set is empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut total = Decimal::zero();
    for validator in validators {
        validate_valoper(&validator.validator_address)?;
        if !seen.insert(validator.validator_address.as_str()) {
            return Err(ContractError::InvalidAllowList {
                reason: format!("duplicate validator {}", validator.validator_address),
            });
        }
        total = total.checked_add(validator.target_weight).map_err(|_| {
            ContractError::InvalidAllowList {
                reason: "weights overflow".to_string(),
            }
        })?;
    }

    if total != Decimal::one() {
        return Err(ContractError::InvalidAllowList {
            reason: format!("weights sum to {}, expected 1", total),
        });
    }
    Ok(())
}

/// Check a host chain registration before it is stored.
pub fn validate_host_chain_params(params: &HostChainParams) -> Result<(), ContractError> {
    if params.is_empty() {
        return Err(ContractError::InvalidHostChainParams {
            reason: "all identifying fields must be set".to_string(),
        });
    }
    let expected = mint_denom_for(&params.base_denom);
    if params.mint_denom != expected {
        return Err(ContractError::InvalidMintDenom {
            expected,
            got: params.mint_denom.clone(),
        });
    }
    if params.min_deposit.is_zero() {
        return Err(ContractError::InvalidHostChainParams {
            reason: "min deposit must be positive".to_string(),
        });
    }
    params.fees.validate()
}

/// Host account owner ids must be set and tell the two accounts apart.
pub fn validate_owner_ids(delegator: &str, rewards: &str) -> Result<(), ContractError> {
    if delegator.trim().is_empty() || rewards.trim().is_empty() {
        return Err(ContractError::InvalidHostChainParams {
            reason: "host account owner ids must be set".to_string(),
        });
    }
    if delegator == rewards {
        return Err(ContractError::InvalidHostChainParams {
            reason: "host account owner ids must be distinct".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const VAL_A: &str = "cosmosvaloper1qyqszqgpqyqszqgpqyqszqgpqyqszqgph84tp0";
    const VAL_B: &str = "cosmosvaloper1qgpqyqszqgpqyqszqgpqyqszqgpqyqszxrnw2e";
    const VAL_C: &str = "cosmosvaloper1qvpsxqcrqvpsxqcrqvpsxqcrqvpsxqcr8nj0qc";

    fn entry(address: &str, weight: &str) -> AllowListedValidator {
        AllowListedValidator {
            validator_address: address.to_string(),
            target_weight: Decimal::from_str(weight).unwrap(),
        }
    }

    #[test]
    fn test_valoper_validation() {
        assert!(validate_valoper(VAL_A).is_ok());
        assert!(validate_valoper("cosmos1qyqszqgpqyqszqgpqyqszqgpqyqszqgpjnp7du").is_err());
        assert!(validate_valoper("not-an-address").is_err());
    }

    #[test]
    fn test_allow_list_weights_sum_to_one() {
        let valid = vec![
            entry(VAL_A, "0.33"),
            entry(VAL_B, "0.33"),
            entry(VAL_C, "0.34"),
        ];
        assert!(validate_allow_list(&valid).is_ok());

        let short = vec![entry(VAL_A, "0.5"), entry(VAL_B, "0.4")];
        assert!(matches!(
            validate_allow_list(&short),
            Err(ContractError::InvalidAllowList { .. })
        ));

        let zero = vec![entry(VAL_A, "0")];
        assert!(validate_allow_list(&zero).is_err());
    }

    #[test]
    fn test_allow_list_rejects_empty_and_duplicates() {
        assert!(validate_allow_list(&[]).is_err());

        let dup = vec![entry(VAL_A, "0.5"), entry(VAL_A, "0.5")];
        assert_eq!(
            validate_allow_list(&dup).unwrap_err(),
            ContractError::InvalidAllowList {
                reason: format!("duplicate validator {}", VAL_A),
            }
        );
    }

    #[test]
    fn test_owner_ids_must_be_set_and_distinct() {
        assert!(validate_owner_ids("gaia-1.delegation", "gaia-1.rewards").is_ok());
        assert!(matches!(
            validate_owner_ids("gaia-1.delegation", " "),
            Err(ContractError::InvalidHostChainParams { .. })
        ));
        let err = validate_owner_ids("gaia-1.pool", "gaia-1.pool").unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }
}
