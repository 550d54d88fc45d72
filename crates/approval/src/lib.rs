//! RPBank Approval Engine
//!
//! Staff decisions on customer requests. Each request is decided exactly
//! once: a claim lease guards processing, the ledger changes through a
//! single versioned delta, and the terminal status is a compare-and-swap
//! that only the claim holder can perform.

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod rules;

pub use config::BankConfig;
pub use decision::{ApprovalStats, Decision, DenialReason, Outcome};
pub use engine::ApprovalEngine;
pub use error::ApprovalError;
