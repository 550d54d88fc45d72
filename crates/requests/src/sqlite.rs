//! SQLite storage for requests

use crate::request::{Claim, Request, RequestKind, RequestPayload, RequestStatus};
use crate::store::{RequestStore, RequestStoreError, TerminalUpdate};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rpbank_core::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const COLUMNS: &str = "id, user_id, user_name, status, payload_json, created_at,
     claim_token, claimed_at, decided_at, decided_by, denial_reason";

pub struct SqliteRequestStore {
    conn: Mutex<Connection>,
}

impl SqliteRequestStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RequestStoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, RequestStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, RequestStoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS requests (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                kind TEXT NOT NULL,
                user_id TEXT NOT NULL,
                user_name TEXT NOT NULL,
                status TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                claim_token TEXT,
                claimed_at INTEGER,
                decided_at TEXT,
                decided_by TEXT,
                denial_reason TEXT
            )",
            [],
        )?;

        // Index for pending-queue queries
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_requests_status_kind
             ON requests(status, kind)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RequestStoreError> {
        self.conn
            .lock()
            .map_err(|_| RequestStoreError::Storage("connection lock poisoned".to_string()))
    }

    fn get_with(conn: &Connection, id: &str) -> Result<Request, RequestStoreError> {
        let sql = format!("SELECT {} FROM requests WHERE id = ?1", COLUMNS);
        let row = conn
            .query_row(&sql, params![id], RequestRow::from_row)
            .optional()?
            .ok_or_else(|| RequestStoreError::NotFound(id.to_string()))?;
        row.into_request()
    }

    fn conflict(conn: &Connection, id: &str) -> RequestStoreError {
        match Self::get_with(conn, id) {
            Ok(request) => RequestStoreError::Conflict {
                id: id.to_string(),
                status: request.status,
            },
            Err(e) => e,
        }
    }
}

/// Raw column values of one `requests` row
struct RequestRow {
    id: String,
    user_id: String,
    user_name: String,
    status: String,
    payload_json: String,
    created_at: String,
    claim_token: Option<String>,
    claimed_at: Option<i64>,
    decided_at: Option<String>,
    decided_by: Option<String>,
    denial_reason: Option<String>,
}

impl RequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            user_name: row.get(2)?,
            status: row.get(3)?,
            payload_json: row.get(4)?,
            created_at: row.get(5)?,
            claim_token: row.get(6)?,
            claimed_at: row.get(7)?,
            decided_at: row.get(8)?,
            decided_by: row.get(9)?,
            denial_reason: row.get(10)?,
        })
    }

    fn into_request(self) -> Result<Request, RequestStoreError> {
        let payload: RequestPayload = serde_json::from_str(&self.payload_json)?;
        let status = RequestStatus::from_str(&self.status)
            .ok_or_else(|| RequestStoreError::Storage(format!("invalid status: {}", self.status)))?;
        let user_id =
            UserId::new(self.user_id).map_err(|e| RequestStoreError::Storage(e.to_string()))?;

        let claim = match (self.claim_token, self.claimed_at) {
            (Some(token), Some(millis)) => {
                let claimed_at = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                    RequestStoreError::Storage(format!("invalid claim time: {}", millis))
                })?;
                Some(Claim { token, claimed_at })
            }
            _ => None,
        };

        Ok(Request {
            id: self.id,
            user_id,
            user_name: self.user_name,
            status,
            created_at: parse_time(&self.created_at)?,
            payload,
            claim,
            decided_at: self.decided_at.as_deref().map(parse_time).transpose()?,
            decided_by: self.decided_by,
            denial_reason: self.denial_reason,
        })
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, RequestStoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| RequestStoreError::Storage(format!("invalid date: {}", value)))
}

impl RequestStore for SqliteRequestStore {
    fn submit(&self, request: &Request) -> Result<String, RequestStoreError> {
        let payload_json = serde_json::to_string(&request.payload)?;
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO requests (id, kind, user_id, user_name, status, payload_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.id,
                request.kind().to_string(),
                request.user_id.as_str(),
                request.user_name,
                request.status.as_str(),
                payload_json,
                request.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(request.id.clone()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RequestStoreError::Duplicate(request.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, id: &str) -> Result<Request, RequestStoreError> {
        let conn = self.conn()?;
        Self::get_with(&conn, id)
    }

    fn list_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<Vec<Request>, RequestStoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM requests
             WHERE status = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY seq",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(
                params![status.as_str(), kind.map(|k| k.to_string())],
                RequestRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RequestRow::into_request).collect()
    }

    fn count_by_status(
        &self,
        kind: Option<RequestKind>,
        status: RequestStatus,
    ) -> Result<usize, RequestStoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM requests WHERE status = ?1 AND (?2 IS NULL OR kind = ?2)",
            params![status.as_str(), kind.map(|k| k.to_string())],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn claim(&self, id: &str, now: DateTime<Utc>, ttl: Duration) -> Result<Claim, RequestStoreError> {
        let claim = Claim::new(now);
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE requests SET claim_token = ?1, claimed_at = ?2
             WHERE id = ?3 AND status = 'pending'
               AND (claim_token IS NULL OR claimed_at <= ?4)",
            params![
                claim.token,
                now.timestamp_millis(),
                id,
                (now - ttl).timestamp_millis(),
            ],
        )?;

        if rows == 0 {
            return Err(Self::conflict(&conn, id));
        }
        Ok(claim)
    }

    fn release(&self, id: &str, token: &str) -> Result<(), RequestStoreError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE requests SET claim_token = NULL, claimed_at = NULL
             WHERE id = ?1 AND claim_token = ?2",
            params![id, token],
        )?;

        if rows == 0 {
            // Surface NotFound; a lost lease is not an error
            Self::get_with(&conn, id)?;
        }
        Ok(())
    }

    fn transition(
        &self,
        id: &str,
        token: &str,
        update: &TerminalUpdate,
        now: DateTime<Utc>,
    ) -> Result<Request, RequestStoreError> {
        if !update.status.is_terminal() {
            return Err(RequestStoreError::InvalidTransition(update.status));
        }

        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE requests
             SET status = ?1, decided_at = ?2, decided_by = ?3, denial_reason = ?4,
                 claim_token = NULL, claimed_at = NULL
             WHERE id = ?5 AND status = 'pending' AND claim_token = ?6",
            params![
                update.status.as_str(),
                now.to_rfc3339(),
                update.decided_by,
                update.reason,
                id,
                token,
            ],
        )?;

        if rows == 0 {
            return Err(Self::conflict(&conn, id));
        }
        Self::get_with(&conn, id)
    }
}
