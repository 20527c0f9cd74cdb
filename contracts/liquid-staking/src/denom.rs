//! Denom derivation
//!
//! The derivative's denom is `stk/<base>`. On the interchain ledger the base
//! asset arrives here as an ICS-20 voucher, `ibc/<HASH>` where `HASH` is the
//! uppercase hex SHA-256 of `<port>/<channel>/<base>`.

use sha2::{Digest, Sha256};

use crate::state::{HostChainParams, LedgerKind};

pub const MINT_DENOM_PREFIX: &str = "stk/";

/// Derivative denom for a base denom.
pub fn mint_denom_for(base_denom: &str) -> String {
    format!("{}{}", MINT_DENOM_PREFIX, base_denom)
}

/// ICS-20 voucher denom of `base_denom` received over `port/channel`.
pub fn ibc_denom(port: &str, channel: &str, base_denom: &str) -> String {
    let trace = format!("{}/{}/{}", port, channel, base_denom);
    let hash = Sha256::digest(trace.as_bytes());
    format!("ibc/{}", hex::encode_upper(hash))
}

/// Denom accepted by deposits and paid out by redemptions and claims.
pub fn deposit_denom(ledger: LedgerKind, params: &HostChainParams) -> String {
    match ledger {
        LedgerKind::Native => params.base_denom.clone(),
        LedgerKind::Interchain => ibc_denom(
            &params.transfer_port,
            &params.transfer_channel,
            &params.base_denom,
        ),
    }
}
