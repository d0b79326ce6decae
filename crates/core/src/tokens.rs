//! Token definitions and quote-token detection
//!
//! Newly created pairs almost always pair a fresh token against a well-known
//! quote asset. The fresh token is the one worth assessing.

use serde::{Deserialize, Serialize};

use crate::serde_utils;

/// Token information as attached to a pair version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(
        default,
        deserialize_with = "serde_utils::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_supply: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_utils::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub eth_balance: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_utils::opt_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_verified: Option<bool>,
}

impl TokenRecord {
    pub fn new(address: &str, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            total_supply: None,
            eth_balance: None,
            is_verified: None,
        }
    }

    pub fn is_quote(&self) -> bool {
        is_quote_symbol(&self.symbol)
    }
}

/// Symbols treated as the quote side of a pair
pub const QUOTE_SYMBOLS: &[&str] = &["WETH", "ETH", "USDC", "USDT", "DAI", "WBTC"];

/// Check if a symbol is a quote asset
pub fn is_quote_symbol(symbol: &str) -> bool {
    let upper = symbol.trim().to_uppercase();
    QUOTE_SYMBOLS.iter().any(|q| *q == upper)
}
