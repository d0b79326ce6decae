use chrono::Utc;
use pairwatch_core::{PairRecord, SecurityAssessment, TokenRecord};

pub fn pair(address: &str, symbol0: &str, symbol1: &str) -> PairRecord {
    PairRecord {
        address: address.to_string(),
        block_number: 19_000_000,
        transaction_hash: format!("0xtx{address}"),
        created_at: Utc::now(),
        token0: TokenRecord::new("0x0000000000000000000000000000000000000001", symbol0, symbol0, 18),
        token1: TokenRecord::new("0x0000000000000000000000000000000000000002", symbol1, symbol1, 18),
        security0: None,
        security1: None,
    }
}

pub fn honeypot() -> SecurityAssessment {
    SecurityAssessment {
        is_honeypot: Some(true),
        honeypot_reason: Some("sell reverts".to_string()),
        buy_tax_percent: Some(0.0),
        sell_tax_percent: Some(0.0),
        ..Default::default()
    }
}

pub fn taxed(buy: f64) -> SecurityAssessment {
    SecurityAssessment {
        is_honeypot: Some(false),
        buy_tax_percent: Some(buy),
        sell_tax_percent: Some(0.0),
        is_open_source: Some(true),
        holder_count: Some(100),
        ..Default::default()
    }
}
