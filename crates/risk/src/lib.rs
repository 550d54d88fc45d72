//! RPBank Risk Engine
//!
//! Creditworthiness rules:
//! - credit-limit tiers for card approval
//! - amortized monthly payments for loans
//! - the tiered penalty catalog and its time-bound restrictions

pub mod config;
pub mod credit;
pub mod engine;
pub mod error;
pub mod penalty;

pub use config::{CreditTier, RiskConfig};
pub use credit::{credit_limit_for, monthly_payment, LoanQuote};
pub use engine::RiskEngine;
pub use error::RiskError;
pub use penalty::{Penalty, PenaltyCategory, PenaltyEffect, PenaltyTier};
