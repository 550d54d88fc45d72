//! RPBank Ledger - the per-user record of balances, transactions and risk state
//!
//! A `UserLedger` is only ever changed through `LedgerStore::apply_delta`,
//! which applies a `LedgerDelta` atomically against an expected version.

pub mod delta;
pub mod error;
pub mod flags;
pub mod memory;
pub mod model;
pub mod sqlite;
pub mod store;

pub use delta::{BalanceChange, FlagUpdate, LedgerDelta, ScoreChange, TransactionDraft};
pub use error::LedgerError;
pub use flags::{RiskFlags, TimedFlag};
pub use memory::InMemoryLedgerStore;
pub use model::{
    DebitCard, LoanEntry, LoanStatus, PenaltyRecord, Transaction, TransactionStatus, UserLedger,
    PERSONAL_LOAN,
};
pub use sqlite::SqliteLedgerStore;
pub use store::{update_with_retry, LedgerStore, RetryError};
