//! Risk engine errors

use rpbank_ledger::{LedgerError, RetryError};
use std::convert::Infallible;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid loan terms: {0}")]
    InvalidLoanTerms(String),

    #[error("Unknown penalty: {0}")]
    UnknownPenalty(String),

    #[error("Ledger still contended after {attempts} attempts")]
    Contention { attempts: u32 },

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for RiskError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserNotFound(id) => RiskError::UserNotFound(id),
            other => RiskError::Ledger(other),
        }
    }
}

impl From<RetryError<Infallible>> for RiskError {
    fn from(e: RetryError<Infallible>) -> Self {
        match e {
            RetryError::Rejected(never) => match never {},
            RetryError::Ledger(e) => e.into(),
            RetryError::Contention { attempts } => RiskError::Contention { attempts },
        }
    }
}
