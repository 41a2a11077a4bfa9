//! Local record of which catalog entries, at which version, have been archived.
//!
//! The ledger is a JSON document `{"items": [...]}` loaded once and rewritten
//! wholesale after every mutation, so a crash loses at most the entry being
//! processed.

mod error;
mod record;
mod transaction;

pub use error::{LedgerError, Result};
pub use record::LedgerRecord;
pub use transaction::WriteTransaction;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use modvault_catalog::{CatalogEntry, Identifier};
use modvault_fs::{AtomicWriteOptions, atomic_read, atomic_write, ensure_dir};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How a catalog entry relates to what the ledger already holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerStatus<'a> {
    Absent,
    /// Archived at the reported latest version.
    Current(&'a LedgerRecord),
    /// Archived at an older version.
    Stale(&'a LedgerRecord),
    /// Archived at the reported version, but some files never arrived.
    Incomplete(&'a LedgerRecord),
}

#[derive(Serialize)]
struct LedgerFileRef<'a> {
    items: &'a [LedgerRecord],
}

#[derive(Deserialize)]
struct LedgerFile {
    #[serde(default)]
    items: Vec<LedgerRecord>,
}

#[derive(Debug)]
pub struct Ledger {
    path:      Option<PathBuf>,
    records:   Vec<LedgerRecord>,
    index:     HashMap<Identifier, usize>,
    in_flight: AtomicBool,
}

impl Ledger {
    /// Load the ledger at `path`, creating an empty one if it does not exist.
    /// Every later mutation is written back to `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut ledger = Self::in_memory();
        ledger.path = Some(path.to_path_buf());

        if path.exists() {
            ledger.read_from(path)?;
        } else {
            info!("no ledger at {}, starting a new one", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            ledger.persist()?;
        }
        Ok(ledger)
    }

    /// Load the ledger at `path` if present, without ever writing it back.
    pub fn load_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut ledger = Self::in_memory();
        if path.exists() {
            ledger.read_from(path)?;
        } else {
            debug!("no ledger at {}, using an empty one", path.display());
        }
        Ok(ledger)
    }

    /// Ledger that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path:      None,
            records:   Vec::new(),
            index:     HashMap::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    fn read_from(&mut self, path: &Path) -> Result<()> {
        let bytes = atomic_read(path)?;
        let file: LedgerFile = serde_json::from_slice(&bytes).map_err(|source| LedgerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        for mut record in file.items {
            if self.index.contains_key(record.id()) {
                warn!("ledger {} lists entry {} twice; keeping the first", path.display(), record.id());
                continue;
            }
            record.derive_latest_version();
            self.index.insert(record.id().clone(), self.records.len());
            self.records.push(record);
        }
        debug!("loaded {} ledger records from {}", self.records.len(), path.display());
        Ok(())
    }

    /// Detach from the backing file; later mutations stay in memory.
    pub fn into_read_only(mut self) -> Self {
        self.path = None;
        self
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn is_persistent(&self) -> bool { self.path.is_some() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> impl Iterator<Item = &LedgerRecord> { self.records.iter() }

    pub fn get(&self, id: &Identifier) -> Option<&LedgerRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn status(&self, id: &Identifier, latest_version: &Identifier) -> LedgerStatus<'_> {
        match self.get(id) {
            None => LedgerStatus::Absent,
            Some(record) if record.latest_version_id() != Some(latest_version) => LedgerStatus::Stale(record),
            Some(record) if !record.is_complete() => LedgerStatus::Incomplete(record),
            Some(record) => LedgerStatus::Current(record),
        }
    }

    /// Record a newly archived entry.
    pub fn append(&mut self, entry: CatalogEntry, missing_files: Vec<String>) -> Result<()> {
        if self.index.contains_key(&entry.id) {
            return Err(LedgerError::Duplicate { id: entry.id });
        }
        let record = LedgerRecord::new(entry, missing_files);
        self.index.insert(record.id().clone(), self.records.len());
        self.records.push(record);
        self.persist()
    }

    /// Replace the payload and cached version of an archived entry.
    pub fn update(&mut self, entry: CatalogEntry, missing_files: Vec<String>) -> Result<()> {
        let Some(&slot) = self.index.get(&entry.id) else {
            return Err(LedgerError::UnknownEntry { id: entry.id });
        };
        self.records[slot] = LedgerRecord::new(entry, missing_files);
        self.persist()
    }

    /// Rewrite the ledger file. A no-op for ledgers without a backing file.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _tx = WriteTransaction::begin(&self.in_flight)?;
        let bytes = serde_json::to_vec_pretty(&LedgerFileRef { items: &self.records })
            .map_err(LedgerError::Serialize)?;
        atomic_write(path, &bytes, AtomicWriteOptions::new().sync(true))?;
        debug!("ledger written ({} records)", self.records.len());
        Ok(())
    }
}
