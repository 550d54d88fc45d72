//! Application context - wires everything together

use rpbank_approval::{ApprovalEngine, BankConfig};
use rpbank_bus::{spawn_subscriber, NotificationBus, Topic};
use rpbank_journal::JournalSubscriber;
use rpbank_ledger::SqliteLedgerStore;
use rpbank_requests::SqliteRequestStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Environment variable naming a JSON `BankConfig` file
pub const CONFIG_ENV: &str = "RPBANK_CONFIG";

pub struct AppContext {
    pub approval: ApprovalEngine,
    pub bus: NotificationBus,
    data_path: PathBuf,
    journal_path: PathBuf,
    journal_task: JoinHandle<()>,
}

impl AppContext {
    /// Open the data directory with the config named by `RPBANK_CONFIG`,
    /// or the defaults
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        Self::with_config(data_path, load_config()?).await
    }

    pub async fn with_config(
        data_path: impl AsRef<Path>,
        config: BankConfig,
    ) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        let journal_path = data_path.join("journal");
        let db_path = data_path.join("bank.db");

        std::fs::create_dir_all(&journal_path)?;

        let ledgers = Arc::new(SqliteLedgerStore::new(&db_path)?);
        let requests = Arc::new(SqliteRequestStore::new(&db_path)?);
        let bus = NotificationBus::default();

        let journal = Arc::new(JournalSubscriber::open(&journal_path)?);
        let journal_task = spawn_subscriber(&bus, Topic::All, journal);

        let approval = ApprovalEngine::new(requests, ledgers, bus.clone(), config);

        info!(data = %data_path.display(), "bank opened");

        Ok(Self {
            approval,
            bus,
            data_path,
            journal_path,
            journal_task,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Close the bus and wait until the journal has written every decision
    /// published so far
    pub async fn shutdown(self) -> Result<(), anyhow::Error> {
        let Self {
            approval,
            bus,
            journal_task,
            ..
        } = self;

        drop(approval);
        drop(bus);
        journal_task.await?;
        Ok(())
    }
}

fn load_config() -> Result<BankConfig, anyhow::Error> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let config = BankConfig::from_file(Path::new(&path))?;
            info!(path = %Path::new(&path).display(), "config loaded");
            Ok(config)
        }
        None => Ok(BankConfig::default()),
    }
}
