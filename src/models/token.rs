use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::utilities::amounts::format_units;

/// The vault a dialog operates on: the vault contract plus its underlying
/// ERC-20 token. Supplied by the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultDescriptor {
    pub name: String,
    pub address: String,
    pub token_address: String,
}

/// Read-only snapshot of the token as seen by one account: metadata plus
/// balance and vault allowance, in raw smallest units and in human form.
///
/// The formatted fields are always derived from the paired raw value and
/// `decimals`; `new` is the only way to build a record, so they cannot
/// drift apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRecord {
    pub symbol: String,
    pub decimals: u8,
    pub balance: U256,
    pub allowance: U256,
    pub balance_formatted: String,
    pub allowance_formatted: String,
}

impl TokenRecord {
    pub fn new(symbol: String, decimals: u8, balance: U256, allowance: U256) -> Self {
        let balance_formatted = format_units(balance, decimals);
        let allowance_formatted = format_units(allowance, decimals);
        Self {
            symbol,
            decimals,
            balance,
            allowance,
            balance_formatted,
            allowance_formatted,
        }
    }
}
