//! Journal errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request {0} is not decided yet")]
    NotDecided(String),

    #[error("Journal lock poisoned")]
    Poisoned,
}
