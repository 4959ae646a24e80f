//! Embedded key-value store lifecycle for a single shard.
//!
//! Each shard owns exactly one redb database file. This module manages the
//! open/init/close lifecycle of that file and the logical `values` table
//! that holds point records. All mutations run inside redb write
//! transactions, which are serializable and crash-atomic: after a process
//! restart the file reflects the last committed transaction and nothing
//! partial.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use redb::{Database, DatabaseError, StorageError, TableDefinition};
use tracing::debug;

use crate::error::{Error, Result};

/// Table holding point records, keyed by the time-ordered point key.
pub(crate) const VALUES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("values");

/// Bounded wait for the database file lock during open.
const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between lock acquisition attempts.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Owns the embedded database handle of one shard.
///
/// The handle is held exclusively between [`ShardStore::open`] and
/// [`ShardStore::close`]; the engine's file lock prevents a second handle
/// to the same file, in this process or another.
#[derive(Default)]
pub struct ShardStore {
    db: Option<Database>,
}

impl std::fmt::Debug for ShardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardStore")
            .field("open", &self.db.is_some())
            .finish()
    }
}

impl ShardStore {
    /// Creates a store with no backing file open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a database handle is currently held.
    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Opens or creates the database file at `path`.
    ///
    /// Waits up to one second for the engine's file lock, retrying while
    /// another handle holds it, and fails with `LockTimeout` past the
    /// deadline. Fails with `AlreadyOpen` if this instance already holds a
    /// handle, or `Io` for other engine failures.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        if self.db.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let deadline = Instant::now() + LOCK_WAIT_TIMEOUT;
        let db = loop {
            match Database::create(path) {
                Ok(db) => break db,
                Err(err) if is_lock_contention(&err) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => return Err(Error::Io(format!("open {}: {}", path.display(), err))),
            }
        };

        debug!(path = %path.display(), "shard store opened");
        self.db = Some(db);
        Ok(())
    }

    /// Idempotently creates the tables the shard requires.
    ///
    /// Safe to call on every open; an existing `values` table is left
    /// untouched along with its data.
    pub fn init(&self) -> Result<()> {
        let db = self.db()?;

        let txn = db
            .begin_write()
            .map_err(|err| Error::Io(format!("init transaction: {}", err)))?;
        txn.open_table(VALUES)
            .map_err(|err| Error::Io(format!("create values table: {}", err)))?;
        txn.commit()
            .map_err(|err| Error::Io(format!("commit init: {}", err)))?;

        Ok(())
    }

    /// Releases the database handle and its file lock.
    ///
    /// Fails with `NotOpen` when no handle is held; the store stays usable
    /// and a subsequent [`ShardStore::open`] must succeed either way.
    pub fn close(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => {
                drop(db);
                debug!("shard store closed");
                Ok(())
            }
            None => Err(Error::NotOpen),
        }
    }

    /// Returns the open database handle, or `NotOpen`.
    pub(crate) fn db(&self) -> Result<&Database> {
        self.db.as_ref().ok_or(Error::NotOpen)
    }
}

/// Whether an open failure means another handle holds the file lock.
fn is_lock_contention(err: &DatabaseError) -> bool {
    match err {
        DatabaseError::DatabaseAlreadyOpen => true,
        DatabaseError::Storage(StorageError::Io(io)) => {
            io.kind() == std::io::ErrorKind::WouldBlock
        }
        _ => false,
    }
}
