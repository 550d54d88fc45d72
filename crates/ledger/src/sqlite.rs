//! SQLite ledger store
//!
//! Each ledger is stored as a JSON document next to its version column.
//! `apply_delta` is a compare-and-swap on that column, so two processes
//! sharing one database file cannot lose each other's updates.

use crate::delta::LedgerDelta;
use crate::error::LedgerError;
use crate::model::UserLedger;
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use rpbank_core::{UserId, UserRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Open (or create) a store at the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, LedgerError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_ledgers (
                id TEXT PRIMARY KEY,
                discord_handle TEXT UNIQUE,
                version INTEGER NOT NULL,
                ledger_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Storage("connection lock poisoned".to_string()))
    }

    fn load_with(conn: &Connection, id: &UserId) -> Result<UserLedger, LedgerError> {
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT version, ledger_json FROM user_ledgers WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (version, json) = row.ok_or_else(|| LedgerError::UserNotFound(id.to_string()))?;
        let mut ledger: UserLedger = serde_json::from_str(&json)?;
        ledger.version = version as u64;
        Ok(ledger)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn create(&self, ledger: &UserLedger) -> Result<(), LedgerError> {
        let json = serde_json::to_string(ledger)?;
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO user_ledgers (id, discord_handle, version, ledger_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                ledger.id.as_str(),
                ledger.discord_handle,
                ledger.version as i64,
                json,
                ledger.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::DuplicateUser(ledger.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, id: &UserId) -> Result<UserLedger, LedgerError> {
        let conn = self.conn()?;
        Self::load_with(&conn, id)
    }

    fn resolve(&self, user: &UserRef) -> Result<UserId, LedgerError> {
        let (sql, key) = match user {
            UserRef::BankId(id) => ("SELECT id FROM user_ledgers WHERE id = ?1", id.as_str()),
            UserRef::DiscordHandle(handle) => (
                "SELECT id FROM user_ledgers WHERE discord_handle = ?1",
                handle.as_str(),
            ),
        };

        let conn = self.conn()?;
        let id: Option<String> = conn
            .query_row(sql, params![key], |row| row.get(0))
            .optional()?;

        let id = id.ok_or_else(|| LedgerError::UserNotFound(user.to_string()))?;
        UserId::new(id).map_err(|e| LedgerError::Storage(e.to_string()))
    }

    fn list_users(&self) -> Result<Vec<UserId>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM user_ledgers ORDER BY id")?;
        let ids: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        ids.into_iter()
            .map(|id| UserId::new(id).map_err(|e| LedgerError::Storage(e.to_string())))
            .collect()
    }

    fn apply_delta_at(
        &self,
        id: &UserId,
        delta: &LedgerDelta,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> Result<UserLedger, LedgerError> {
        let conn = self.conn()?;
        let current = Self::load_with(&conn, id)?;

        if current.version != expected_version {
            return Err(LedgerError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        let next = delta.apply(&current, now)?;
        let json = serde_json::to_string(&next)?;

        let rows = conn.execute(
            "UPDATE user_ledgers SET version = ?1, ledger_json = ?2, updated_at = ?3
             WHERE id = ?4 AND version = ?5",
            params![
                next.version as i64,
                json,
                now.to_rfc3339(),
                id.as_str(),
                expected_version as i64,
            ],
        )?;

        if rows == 0 {
            // Another connection to the same file won the race
            let actual = Self::load_with(&conn, id)?.version;
            return Err(LedgerError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual,
            });
        }

        Ok(next)
    }
}
