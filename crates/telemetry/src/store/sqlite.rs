//! Embedded SQLite store: reading log plus livestock registry.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::directory::{Caller, DirectoryError, HerdDirectory, LivestockTarget};
use crate::store::{ReadingStore, StoreError};
use crate::types::{LivestockId, Reading, ReadingId, StoredReading, VitalsSample};

type StoreJob = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StoreCommand {
    Run(StoreJob),
    Shutdown,
}

/// One registry row: an animal plus its owner routing data.
///
/// Also the shape of the gateway's config seed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivestockRecord {
    pub livestock_id: LivestockId,
    pub name: String,
    pub owner_ref: String,
    pub contact: String,
    /// Bearer token the animal's device presents on ingest.
    pub submit_key: String,
}

struct StoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if self.sender.send(StoreCommand::Shutdown).is_err() {
                // Worker already exited on its own.
                return;
            }
            if let Err(join_err) = handle.join() {
                error!("failed to join store worker: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed reading log and livestock registry.
///
/// All statements run on one dedicated worker thread; async callers get
/// replies over oneshot channels, so the tokio runtime never blocks on
/// disk. WAL keeps durability without stalling appends behind readers.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<StoreInner>,
    db_path: Arc<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and start the worker.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path: PathBuf = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| StoreError::Backend {
                    reason: format!(
                        "failed to create database directory {}: {err}",
                        parent.display()
                    ),
                })?;
            }
        }

        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("herdpulse-store".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(StoreError::from(err)));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("failed to enable foreign keys: {err}");
                }

                let init = init_schema(&conn).map_err(StoreError::from);
                if ready_tx.send(init).is_err() {
                    error!("store opener dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Run(job) => job(&mut conn),
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("store worker shutting down");
            })
            .map_err(|err| StoreError::Backend {
                reason: format!("failed to spawn store worker: {err}"),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => return Err(StoreError::WorkerGone),
        }

        info!(path = %db_path.display(), "reading store initialized");

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run one job on the worker thread and await its reply.
    async fn call<F, T>(&self, job: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = StoreCommand::Run(Box::new(move |conn| {
            let result = job(conn);
            if reply_tx.send(result).is_err() {
                error!("store caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|_| StoreError::WorkerGone)?;

        reply_rx.await.map_err(|_| StoreError::WorkerGone)?
    }

    /// Insert or update one registry row.
    pub async fn register_livestock(&self, record: LivestockRecord) -> Result<(), StoreError> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO livestock (id, name, owner_ref, contact, submit_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     owner_ref = excluded.owner_ref,
                     contact = excluded.contact,
                     submit_key = excluded.submit_key",
                params![
                    record.livestock_id.0,
                    record.name,
                    record.owner_ref,
                    record.contact,
                    record.submit_key,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Number of registered animals.
    pub async fn livestock_count(&self) -> Result<u64, StoreError> {
        self.call(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM livestock", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn append(
        &self,
        livestock_id: LivestockId,
        sample: VitalsSample,
        recorded_at: DateTime<Utc>,
    ) -> Result<ReadingId, StoreError> {
        self.call(move |conn| {
            if !is_registered(conn, livestock_id)? {
                return Err(StoreError::UnknownLivestock(livestock_id));
            }
            conn.execute(
                "INSERT INTO health_readings (livestock_id, temperature, pulse, recorded_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    livestock_id.0,
                    sample.temperature,
                    sample.pulse,
                    recorded_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn latest_for(
        &self,
        livestock_id: LivestockId,
    ) -> Result<Option<StoredReading>, StoreError> {
        self.call(move |conn| {
            if !is_registered(conn, livestock_id)? {
                return Err(StoreError::UnknownLivestock(livestock_id));
            }
            conn.query_row(
                "SELECT id, temperature, pulse, recorded_at FROM health_readings
                 WHERE livestock_id = ?1
                 ORDER BY id DESC
                 LIMIT 1",
                params![livestock_id.0],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?
            .map(|(id, temperature, pulse, recorded_at)| -> Result<StoredReading, StoreError> {
                Ok(StoredReading {
                    id,
                    reading: Reading {
                        livestock_id,
                        temperature,
                        pulse,
                        recorded_at: parse_timestamp(&recorded_at)?,
                    },
                })
            })
            .transpose()
        })
        .await
    }
}

#[async_trait]
impl HerdDirectory for SqliteStore {
    async fn resolve(
        &self,
        livestock_id: LivestockId,
    ) -> Result<Option<LivestockTarget>, DirectoryError> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT name, owner_ref, contact FROM livestock WHERE id = ?1",
                params![livestock_id.0],
                |row| {
                    Ok(LivestockTarget {
                        livestock_id,
                        name: row.get(0)?,
                        owner_ref: row.get(1)?,
                        contact: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
        .map_err(directory_error)
    }

    async fn authorize(
        &self,
        caller: &Caller,
        livestock_id: LivestockId,
    ) -> Result<bool, DirectoryError> {
        let Some(token) = caller.token().map(ToString::to_string) else {
            return Ok(false);
        };

        self.call(move |conn| {
            let key: Option<String> = conn
                .query_row(
                    "SELECT submit_key FROM livestock WHERE id = ?1",
                    params![livestock_id.0],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(key.is_some_and(|k| k == token))
        })
        .await
        .map_err(directory_error)
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS livestock (
             id          INTEGER PRIMARY KEY,
             name        TEXT NOT NULL,
             owner_ref   TEXT NOT NULL,
             contact     TEXT NOT NULL,
             submit_key  TEXT NOT NULL,
             created_at  TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS health_readings (
             id           INTEGER PRIMARY KEY AUTOINCREMENT,
             livestock_id INTEGER NOT NULL REFERENCES livestock(id),
             temperature  REAL NOT NULL,
             pulse        INTEGER NOT NULL,
             recorded_at  TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_health_readings_livestock
             ON health_readings (livestock_id, id);",
    )
}

fn is_registered(conn: &Connection, livestock_id: LivestockId) -> Result<bool, StoreError> {
    let row = conn
        .query_row(
            "SELECT 1 FROM livestock WHERE id = ?1",
            params![livestock_id.0],
            |_| Ok(()),
        )
        .optional()?;
    Ok(row.is_some())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::Backend {
            reason: format!("invalid timestamp '{value}' in store: {err}"),
        })
}

fn directory_error(err: StoreError) -> DirectoryError {
    DirectoryError::Backend {
        reason: err.to_string(),
    }
}
