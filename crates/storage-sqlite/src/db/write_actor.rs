//! Dedicated writer for SQLite.
//!
//! SQLite supports one writer at a time; funneling every mutation through a
//! single thread serializes them without busy-retry loops and keeps each
//! closure's statements atomic with respect to other writers.

use diesel::r2d2::ConnectionManager;
use diesel::SqliteConnection;
use r2d2::Pool;
use tokio::sync::{mpsc, oneshot};

use crate::errors::StorageError;
use ledgerdesk_core::Result;

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Cloneable handle submitting write closures to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::UnboundedSender<WriteJob>,
}

/// Spawn the writer thread. It runs until every handle is dropped.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<WriteJob>();

    std::thread::spawn(move || {
        while let Some(job) = rx.blocking_recv() {
            match pool.get() {
                Ok(mut conn) => job(&mut conn),
                Err(err) => {
                    // Dropping the job drops its result channel, so the
                    // caller observes WriterUnavailable.
                    log::error!("[Storage] writer could not acquire a connection: {}", err);
                }
            }
        }
    });

    WriteHandle { tx }
}

impl WriteHandle {
    /// Run a write closure on the writer thread and await its result.
    pub async fn exec<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: WriteJob = Box::new(move |conn| {
            let _ = done_tx.send(f(conn));
        });

        self.tx
            .send(job)
            .map_err(|_| StorageError::WriterUnavailable)?;
        done_rx
            .await
            .map_err(|_| StorageError::WriterUnavailable)?
    }
}
