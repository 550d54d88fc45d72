//! Penalty catalog
//!
//! Every (category, tier) pair maps to a fixed effect on the score and risk
//! flags. Durations come from [`RiskConfig`].

use crate::config::RiskConfig;
use crate::error::RiskError;
use chrono::{DateTime, Duration, Utc};
use rpbank_ledger::{FlagUpdate, ScoreChange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum PenaltyCategory {
    CreditOveruse,
    MissedPayment,
    LoanDefault,
    SuspiciousActivity,
}

impl PenaltyCategory {
    pub fn title(&self) -> &'static str {
        match self {
            PenaltyCategory::CreditOveruse => "Credit Overuse",
            PenaltyCategory::MissedPayment => "Missed Payment",
            PenaltyCategory::LoanDefault => "Loan Default",
            PenaltyCategory::SuspiciousActivity => "Suspicious Activity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PenaltyTier {
    Tier1,
    Tier2,
    Tier3,
}

impl PenaltyTier {
    pub fn level(&self) -> u8 {
        match self {
            PenaltyTier::Tier1 => 1,
            PenaltyTier::Tier2 => 2,
            PenaltyTier::Tier3 => 3,
        }
    }
}

impl FromStr for PenaltyTier {
    type Err = RiskError;

    /// Accepts `2`, `t2`, `tier2` and `tier-2`, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("tier")
            .or_else(|| lower.strip_prefix('t'))
            .unwrap_or(&lower)
            .trim_start_matches(&['-', ' '][..]);

        match digits {
            "1" => Ok(PenaltyTier::Tier1),
            "2" => Ok(PenaltyTier::Tier2),
            "3" => Ok(PenaltyTier::Tier3),
            _ => Err(RiskError::UnknownPenalty(format!("tier '{}'", s))),
        }
    }
}

impl fmt::Display for PenaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {}", self.level())
    }
}

/// A penalty from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub category: PenaltyCategory,
    pub tier: PenaltyTier,
}

/// What a penalty does to a ledger
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PenaltyEffect {
    pub score: Option<ScoreChange>,
    pub flags: Vec<FlagUpdate>,
}

impl Penalty {
    pub fn new(category: PenaltyCategory, tier: PenaltyTier) -> Self {
        Self { category, tier }
    }

    /// Parse a category and tier given as text, e.g. `credit-overuse` and `t2`
    pub fn parse(category: &str, tier: &str) -> Result<Self, RiskError> {
        let category = PenaltyCategory::from_str(category.trim())
            .map_err(|_| RiskError::UnknownPenalty(format!("category '{}'", category)))?;
        Ok(Self::new(category, tier.parse()?))
    }

    /// Human label, e.g. "Credit Overuse: Tier 2"
    pub fn label(&self) -> String {
        format!("{}: {}", self.category.title(), self.tier)
    }

    pub fn effect(&self, config: &RiskConfig, now: DateTime<Utc>) -> PenaltyEffect {
        use PenaltyCategory::*;
        use PenaltyTier::*;

        let days = |n: i64| now + Duration::days(n);

        let (score, flags) = match (self.category, self.tier) {
            (CreditOveruse, Tier1) => (Some(ScoreChange::Adjust(-15)), vec![]),
            (CreditOveruse, Tier2) => (
                Some(ScoreChange::Adjust(-40)),
                vec![FlagUpdate::CreditFrozenUntil(days(config.credit_freeze_days))],
            ),
            (CreditOveruse, Tier3) => (
                Some(ScoreChange::Adjust(-80)),
                vec![FlagUpdate::CreditCardSuspendedUntil(days(config.card_suspension_days))],
            ),

            (MissedPayment, Tier1) => (Some(ScoreChange::Adjust(-20)), vec![]),
            (MissedPayment, Tier2) => (
                Some(ScoreChange::Adjust(-50)),
                vec![FlagUpdate::LoanInterestSurcharge(config.missed_payment_surcharge)],
            ),
            (MissedPayment, Tier3) => (
                Some(ScoreChange::Adjust(-100)),
                vec![FlagUpdate::NewLoanBlockedUntil(days(config.new_loan_block_days))],
            ),

            (LoanDefault, Tier1) => (Some(ScoreChange::Adjust(-75)), vec![]),
            (LoanDefault, Tier2) => (
                None,
                vec![FlagUpdate::CreditFrozenUntil(days(config.loan_default_freeze_days))],
            ),
            (LoanDefault, Tier3) => (
                None,
                vec![FlagUpdate::LoanBlacklisted(true), FlagUpdate::Frozen(true)],
            ),

            (SuspiciousActivity, Tier1) => (
                Some(ScoreChange::Adjust(-30)),
                vec![FlagUpdate::Suspicious(true)],
            ),
            (SuspiciousActivity, Tier2) => (
                None,
                vec![FlagUpdate::Frozen(true), FlagUpdate::Suspicious(true)],
            ),
            (SuspiciousActivity, Tier3) => (
                Some(ScoreChange::CapAt(config.suspicious_score_ceiling)),
                vec![FlagUpdate::InternalAffairs(true)],
            ),
        };

        PenaltyEffect { score, flags }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
