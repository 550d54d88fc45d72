//! RPBank Core - Domain types
//!
//! This crate contains the fundamental types shared by every RPBank crate:
//! - `Amount`: Non-negative decimal wrapper for balances
//! - `AccountType`: The sub-account tags a user can hold
//! - `CreditScore`: Score clamped to the 300..=850 band
//! - `UserId` / `UserRef`: Bank identity and explicit lookup keys

pub mod account;
pub mod amount;
pub mod identity;
pub mod score;

pub use account::AccountType;
pub use amount::{Amount, AmountError};
pub use identity::{IdentityError, UserId, UserRef};
pub use score::CreditScore;
