//! Ledger errors

use rpbank_core::AccountType;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already registered: {0}")]
    DuplicateUser(String),

    #[error("Version conflict for {id}: expected {expected}, found {actual}")]
    VersionConflict { id: String, expected: u64, actual: u64 },

    #[error("Insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: AccountType,
        available: Decimal,
        required: Decimal,
    },

    #[error("Balance invariant violated: overall {overall} != sum of accounts {sum}")]
    BalanceInvariant { overall: Decimal, sum: Decimal },

    #[error("Arithmetic overflow while applying delta")]
    Overflow,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}
