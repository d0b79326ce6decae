//! Risk classification over partially-known security assessments

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{PairRecord, SecurityAssessment};

/// Buy/sell tax percentage above which a token is flagged
pub const HIGH_TAX_PERCENT: f64 = 10.0;

/// Known holder counts below this are flagged
pub const MIN_HOLDER_COUNT: u64 = 10;

/// Discrete risk level for one token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Caution,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Caution => "caution",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Caution => "CAUTION",
            RiskLevel::High => "HIGH RISK",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a token's assessment.
///
/// Rules apply in order: no assessment is `Unknown`, a confirmed honeypot is
/// `High`, then closed source / high tax / few holders is `Caution`. A field
/// the checker did not report never escalates on its own.
pub fn classify(security: Option<&SecurityAssessment>) -> RiskLevel {
    let Some(security) = security else {
        return RiskLevel::Unknown;
    };

    if security.is_confirmed_honeypot() {
        return RiskLevel::High;
    }

    let closed_source = security.is_open_source == Some(false);
    let high_tax = security.buy_tax_percent.is_some_and(|t| t > HIGH_TAX_PERCENT)
        || security.sell_tax_percent.is_some_and(|t| t > HIGH_TAX_PERCENT);
    let few_holders = security.holder_count.is_some_and(|h| h < MIN_HOLDER_COUNT);

    if closed_source || high_tax || few_holders {
        RiskLevel::Caution
    } else {
        RiskLevel::Safe
    }
}

/// Classify a pair by its subject (non-quote) token
pub fn classify_pair(pair: &PairRecord) -> RiskLevel {
    classify(pair.subject().1)
}

/// Aggregate counts over a feed view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub total_count: usize,
    /// Pairs where either token is a confirmed honeypot
    pub honeypot_count: usize,
    /// Pairs where either token's buy or sell tax exceeds the threshold
    pub high_tax_count: usize,
    pub safe_count: usize,
    pub caution_count: usize,
    pub high_count: usize,
    pub unknown_count: usize,
}

/// Recompute the summary from scratch over the given pairs.
pub fn summarize<I>(pairs: I) -> FeedSummary
where
    I: IntoIterator,
    I::Item: AsRef<PairRecord>,
{
    let mut summary = FeedSummary::default();

    for item in pairs {
        let pair = item.as_ref();
        summary.total_count += 1;

        if pair.assessments().any(SecurityAssessment::is_confirmed_honeypot) {
            summary.honeypot_count += 1;
        }
        if pair.assessments().any(|s| s.has_tax_above(HIGH_TAX_PERCENT)) {
            summary.high_tax_count += 1;
        }

        match classify_pair(pair) {
            RiskLevel::Safe => summary.safe_count += 1,
            RiskLevel::Caution => summary.caution_count += 1,
            RiskLevel::High => summary.high_count += 1,
            RiskLevel::Unknown => summary.unknown_count += 1,
        }
    }

    summary
}
