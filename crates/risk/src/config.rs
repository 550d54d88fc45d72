//! Risk configuration
//!
//! Tier boundaries and penalty durations are data, not code, so they can be
//! tuned from the bank config file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum score for a credit limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTier {
    pub min_score: i32,
    pub limit: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Card limits by score, checked from the highest `min_score` down.
    /// Scores below every tier are auto-denied.
    #[serde(default = "default_credit_tiers")]
    pub credit_tiers: Vec<CreditTier>,

    /// Credit Overuse T2: credit freeze length
    #[serde(default = "default_credit_freeze_days")]
    pub credit_freeze_days: i64,

    /// Credit Overuse T3: card suspension length
    #[serde(default = "default_card_suspension_days")]
    pub card_suspension_days: i64,

    /// Missed Payment T2: surcharge added to new loan rates
    #[serde(default = "default_missed_payment_surcharge")]
    pub missed_payment_surcharge: Decimal,

    /// Missed Payment T3: new-loan block length
    #[serde(default = "default_new_loan_block_days")]
    pub new_loan_block_days: i64,

    /// Loan Default T2: new-credit freeze length
    #[serde(default = "default_loan_default_freeze_days")]
    pub loan_default_freeze_days: i64,

    /// Suspicious Activity T3: score is forced to at most this value
    #[serde(default = "default_suspicious_score_ceiling")]
    pub suspicious_score_ceiling: i32,
}

fn default_credit_tiers() -> Vec<CreditTier> {
    vec![
        CreditTier {
            min_score: 750,
            limit: Decimal::new(20_000, 0),
        },
        CreditTier {
            min_score: 600,
            limit: Decimal::new(15_000, 0),
        },
        CreditTier {
            min_score: 500,
            limit: Decimal::new(5_000, 0),
        },
    ]
}

fn default_credit_freeze_days() -> i64 {
    5
}

fn default_card_suspension_days() -> i64 {
    30
}

fn default_missed_payment_surcharge() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

fn default_new_loan_block_days() -> i64 {
    7
}

fn default_loan_default_freeze_days() -> i64 {
    90
}

fn default_suspicious_score_ceiling() -> i32 {
    399
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            credit_tiers: default_credit_tiers(),
            credit_freeze_days: default_credit_freeze_days(),
            card_suspension_days: default_card_suspension_days(),
            missed_payment_surcharge: default_missed_payment_surcharge(),
            new_loan_block_days: default_new_loan_block_days(),
            loan_default_freeze_days: default_loan_default_freeze_days(),
            suspicious_score_ceiling: default_suspicious_score_ceiling(),
        }
    }
}
