//! Change events and subscription topics

use rpbank_core::UserId;
use rpbank_ledger::UserLedger;
use rpbank_requests::{Request, RequestKind};
use serde::{Deserialize, Serialize};

/// State change published after a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    RequestChanged(Request),
    LedgerChanged(UserLedger),
}

impl ChangeEvent {
    pub fn matches(&self, topic: &Topic) -> bool {
        match (topic, self) {
            (Topic::All, _) => true,
            (Topic::Requests(kind), ChangeEvent::RequestChanged(request)) => request.kind() == *kind,
            (Topic::Ledger(user), ChangeEvent::LedgerChanged(ledger)) => &ledger.id == user,
            _ => false,
        }
    }
}

/// What a subscriber wants to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    All,
    Requests(RequestKind),
    Ledger(UserId),
}
