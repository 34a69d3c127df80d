use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// The worker thread and the queue feeding it.
struct Worker {
    tasks: Option<mpsc::Sender<DbTask>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the queue lets the thread drain what is left and exit.
        self.tasks.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Database worker panicked");
            }
        }
    }
}

/// Open the file, turn on WAL and foreign keys, and bring the schema up to
/// date.
fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL mode unavailable, keeping the default journal: {err}");
    }
    // Frequency rows rely on ON DELETE CASCADE.
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

/// Handle to the SQLite database.
///
/// Every statement runs on a single dedicated worker thread that owns the
/// connection, so tasks submitted through [`Database::execute`] are applied
/// one at a time in submission order. Cloning the handle is cheap; the worker
/// shuts down once the last clone is dropped.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (task_tx, task_rx) = mpsc::channel::<DbTask>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let path_for_thread = db_path.clone();

        let thread = thread::Builder::new()
            .name("wordlens-db".into())
            .spawn(move || {
                let mut conn = match open_connection(&path_for_thread) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }

                for task in task_rx {
                    task(&mut conn);
                }
                info!("Database worker stopped");
            })
            .context("failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database ready at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                tasks: Some(task_tx),
                thread: Some(thread),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the worker thread and wait for its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tasks = self
            .worker
            .tasks
            .as_ref()
            .ok_or_else(|| anyhow!("database worker is shut down"))?;
        let (reply_tx, reply_rx) = oneshot::channel();

        tasks
            .send(Box::new(move |conn| {
                // The caller may have been cancelled; nothing to report then.
                let _ = reply_tx.send(task(conn));
            }))
            .map_err(|_| anyhow!("database worker is no longer running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database worker dropped the task"))?
    }
}
