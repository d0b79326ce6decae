//! Core type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::serde_utils;
use crate::tokens::TokenRecord;

/// Pair address in canonical (lowercase) form, used as the collection key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairAddress(String);

impl PairAddress {
    /// Normalize a raw address. Blank input has no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Security assessment for one token.
///
/// Every scalar is optional: `None` means the upstream checker did not report
/// it, which is not the same as a reported `false` or `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAssessment {
    #[serde(default, deserialize_with = "serde_utils::opt_bool")]
    pub is_honeypot: Option<bool>,
    #[serde(default)]
    pub honeypot_reason: Option<String>,
    #[serde(
        rename = "buyTax",
        alias = "buyTaxPercent",
        default,
        deserialize_with = "serde_utils::opt_f64"
    )]
    pub buy_tax_percent: Option<f64>,
    #[serde(
        rename = "sellTax",
        alias = "sellTaxPercent",
        default,
        deserialize_with = "serde_utils::opt_f64"
    )]
    pub sell_tax_percent: Option<f64>,
    #[serde(
        rename = "transferTax",
        alias = "transferTaxPercent",
        default,
        deserialize_with = "serde_utils::opt_f64"
    )]
    pub transfer_tax_percent: Option<f64>,
    #[serde(default, deserialize_with = "serde_utils::opt_bool")]
    pub is_open_source: Option<bool>,
    #[serde(default, deserialize_with = "serde_utils::opt_bool")]
    pub is_proxy: Option<bool>,
    #[serde(default, deserialize_with = "serde_utils::opt_bool")]
    pub can_take_ownership: Option<bool>,
    #[serde(default, deserialize_with = "serde_utils::opt_bool")]
    pub is_mintable: Option<bool>,
    #[serde(default, deserialize_with = "serde_utils::opt_u64")]
    pub holder_count: Option<u64>,
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub creator_address: Option<String>,
    #[serde(default, deserialize_with = "serde_utils::string_list")]
    pub potential_risks: Vec<String>,
    #[serde(default, deserialize_with = "serde_utils::string_list")]
    pub api_errors: Vec<String>,
    #[serde(default, deserialize_with = "serde_utils::opt_timestamp")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl SecurityAssessment {
    pub fn is_confirmed_honeypot(&self) -> bool {
        self.is_honeypot == Some(true)
    }

    /// Buy or sell tax above `threshold` percent; unknown taxes count as 0.
    pub fn has_tax_above(&self, threshold: f64) -> bool {
        self.buy_tax_percent.unwrap_or(0.0) > threshold
            || self.sell_tax_percent.unwrap_or(0.0) > threshold
    }
}

/// A trading pair version. Updates replace it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PairWire", into = "PairWire")]
pub struct PairRecord {
    pub address: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub created_at: DateTime<Utc>,
    pub token0: TokenRecord,
    pub token1: TokenRecord,
    pub security0: Option<SecurityAssessment>,
    pub security1: Option<SecurityAssessment>,
}

impl PairRecord {
    /// Canonical key, `None` when the address is blank
    pub fn key(&self) -> Option<PairAddress> {
        PairAddress::parse(&self.address)
    }

    /// `TOKEN0/TOKEN1`
    pub fn symbols(&self) -> String {
        format!("{}/{}", self.token0.symbol, self.token1.symbol)
    }

    /// The non-quote token and its assessment. Falls back to token0 when
    /// both or neither side is a quote asset.
    pub fn subject(&self) -> (&TokenRecord, Option<&SecurityAssessment>) {
        if self.token0.is_quote() && !self.token1.is_quote() {
            (&self.token1, self.security1.as_ref())
        } else {
            (&self.token0, self.security0.as_ref())
        }
    }

    pub fn assessments(&self) -> impl Iterator<Item = &SecurityAssessment> {
        self.security0.iter().chain(self.security1.iter())
    }
}

impl AsRef<PairRecord> for PairRecord {
    fn as_ref(&self) -> &PairRecord {
        self
    }
}

/// Per-slot security block as it appears on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SecurityChecks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token0: Option<SecurityAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token1: Option<SecurityAssessment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairWire {
    address: String,
    #[serde(default)]
    block_number: u64,
    #[serde(default)]
    transaction_hash: String,
    #[serde(alias = "timestamp", with = "serde_utils::timestamp")]
    created_at: DateTime<Utc>,
    token0: TokenRecord,
    token1: TokenRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security_checks: Option<SecurityChecks>,
}

impl From<PairWire> for PairRecord {
    fn from(wire: PairWire) -> Self {
        let checks = wire.security_checks.unwrap_or_default();
        Self {
            address: wire.address,
            block_number: wire.block_number,
            transaction_hash: wire.transaction_hash,
            created_at: wire.created_at,
            token0: wire.token0,
            token1: wire.token1,
            security0: checks.token0,
            security1: checks.token1,
        }
    }
}

impl From<PairRecord> for PairWire {
    fn from(pair: PairRecord) -> Self {
        let security_checks = if pair.security0.is_some() || pair.security1.is_some() {
            Some(SecurityChecks {
                token0: pair.security0,
                token1: pair.security1,
            })
        } else {
            None
        };

        Self {
            address: pair.address,
            block_number: pair.block_number,
            transaction_hash: pair.transaction_hash,
            created_at: pair.created_at,
            token0: pair.token0,
            token1: pair.token1,
            security_checks,
        }
    }
}
