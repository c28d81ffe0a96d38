use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;

mod migrations;

use migrations::run_migrations;

use crate::error::PetError;
use crate::session::{DaySummary, Session};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| anyhow!("invalid date '{value}': {err}"))
}

/// Handle to the snapshot store. All SQLite access happens on one dedicated
/// worker thread; async callers ship closures over and await the reply.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("dinopet-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Persist the full session aggregate. Always the whole value: partial
    /// field writes cannot corrupt a snapshot on resume.
    pub async fn save_snapshot(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_string(session)
            .context("failed to serialize session snapshot")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO snapshot (id, payload, saved_at)
                 VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET payload = ?1, saved_at = ?2",
                params![payload, Utc::now().to_rfc3339()],
            )
            .with_context(|| "failed to write session snapshot")?;
            Ok(())
        })
        .await
    }

    /// Load the persisted session, if any. A snapshot that no longer decodes
    /// surfaces as `PersistenceReadCorrupt` so callers can fall back to a
    /// default session instead of crashing.
    pub async fn load_snapshot(&self) -> Result<Option<Session>> {
        let payload: Option<String> = self
            .execute(|conn| {
                conn.query_row("SELECT payload FROM snapshot WHERE id = 1", [], |row| {
                    row.get(0)
                })
                .optional()
                .with_context(|| "failed to read session snapshot")
            })
            .await?;

        match payload {
            Some(raw) => {
                let session = serde_json::from_str(&raw).map_err(|err| {
                    anyhow::Error::new(PetError::PersistenceReadCorrupt(err.to_string()))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Append a finished day's digest at rollover.
    pub async fn insert_day_summary(&self, summary: &DaySummary) -> Result<()> {
        let record = summary.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO day_summaries
                 (date, session_earned, productive_secs, top_domain, top_domain_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.date.format("%Y-%m-%d").to_string(),
                    record.session_earned,
                    record.productive_secs,
                    record.top_domain,
                    record.top_domain_secs,
                ],
            )
            .with_context(|| "failed to insert day summary")?;
            Ok(())
        })
        .await
    }

    pub async fn recent_day_summaries(&self, limit: usize) -> Result<Vec<DaySummary>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date, session_earned, productive_secs, top_domain, top_domain_secs
                 FROM day_summaries
                 ORDER BY date DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit as i64])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                summaries.push(DaySummary {
                    date: parse_date(&row.get::<_, String>(0)?)?,
                    session_earned: row.get(1)?,
                    productive_secs: row.get(2)?,
                    top_domain: row.get(3)?,
                    top_domain_secs: row.get(4)?,
                });
            }

            Ok(summaries)
        })
        .await
    }
}
