//! File-backed persistence for the counter and the client registry.
//!
//! Each store is a small JSON document. Every read-modify-write runs under a
//! per-store mutex and lands through an atomic rename, so concurrent requests
//! in one process never interleave their updates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{
    domain::{
        client::{Client, NewClient},
        types::ReceiptNumber,
    },
    models::config::StorageConfig,
    repository::errors::{RepositoryError, RepositoryResult},
};

pub mod client;
pub mod counter;
pub mod errors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub trait ClientReader {
    fn list_clients(&self) -> RepositoryResult<Vec<Client>>;
}

pub trait ClientWriter {
    /// Appends the client unless one with the same name (ignoring case)
    /// exists. Returns whether a record was written.
    fn create_client_if_absent(&self, new_client: &NewClient) -> RepositoryResult<bool>;
}

pub trait ReceiptCounter {
    /// Issues the next receipt number and persists its successor.
    fn next_receipt_number(&self) -> RepositoryResult<ReceiptNumber>;
}

/// JSON-file repository shared by all handlers.
#[derive(Clone)]
pub struct JsonRepository {
    clients_file: PathBuf,
    counter_file: PathBuf,
    reset_counter_on_corrupt: bool,
    clients_gate: Arc<Mutex<()>>,
    counter_gate: Arc<Mutex<()>>,
}

impl JsonRepository {
    pub fn new(
        clients_file: impl Into<PathBuf>,
        counter_file: impl Into<PathBuf>,
        reset_counter_on_corrupt: bool,
    ) -> Self {
        Self {
            clients_file: clients_file.into(),
            counter_file: counter_file.into(),
            reset_counter_on_corrupt,
            clients_gate: Arc::new(Mutex::new(())),
            counter_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(
            storage.clients_file.clone(),
            storage.counter_file.clone(),
            storage.reset_counter_on_corrupt,
        )
    }
}

fn lock(gate: &Mutex<()>) -> RepositoryResult<MutexGuard<'_, ()>> {
    gate.lock()
        .map_err(|e| RepositoryError::Unexpected(format!("store lock poisoned: {e}")))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Serializes `value` next to `path` and renames it into place.
fn replace_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RepositoryResult<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
