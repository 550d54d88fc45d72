//! Bus subscriber that journals decided requests

use crate::error::JournalError;
use crate::reader::JournalReader;
use crate::record::JournalRecord;
use crate::store::JournalStore;
use async_trait::async_trait;
use rpbank_bus::{BusError, ChangeEvent, EventSubscriber};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

struct JournalState {
    store: JournalStore,
    recorded: HashSet<String>,
}

/// Appends one record per decided request.
///
/// Redelivered events are dropped by request id, including decisions
/// journaled by an earlier process.
pub struct JournalSubscriber {
    state: Mutex<JournalState>,
}

impl JournalSubscriber {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let recorded = JournalReader::from_directory(path)?
            .read_all()?
            .into_iter()
            .map(|record| record.request_id)
            .collect();

        Ok(Self {
            state: Mutex::new(JournalState {
                store: JournalStore::new(path)?,
                recorded,
            }),
        })
    }

    /// Journal `event` if it is a newly decided request; returns whether a
    /// record was written
    pub fn record(&self, event: &ChangeEvent) -> Result<bool, JournalError> {
        let ChangeEvent::RequestChanged(request) = event else {
            return Ok(false);
        };
        if !request.status.is_terminal() {
            return Ok(false);
        }

        let mut state = self.state.lock().map_err(|_| JournalError::Poisoned)?;
        if state.recorded.contains(&request.id) {
            debug!(request = %request.id, "decision already journaled");
            return Ok(false);
        }

        let record = JournalRecord::from_request(request)?;
        state.store.append(&record)?;
        state.recorded.insert(record.request_id);
        Ok(true)
    }
}

#[async_trait]
impl EventSubscriber for JournalSubscriber {
    fn name(&self) -> &str {
        "journal"
    }

    async fn handle(&self, event: &ChangeEvent) -> Result<(), BusError> {
        self.record(event)
            .map(|_| ())
            .map_err(|e| BusError::SubscriberFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }
}
