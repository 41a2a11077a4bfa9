//! Per-entry decision: skip, download, or update.

use modvault_catalog::{CatalogEntry, FileDescriptor, Identifier, Version, select_files};
use modvault_ledger::{Ledger, LedgerStatus};

use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcilePolicy {
    /// Revisit entries the ledger already considers current.
    pub force_recheck: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action<'a> {
    Skip,
    /// Not archived yet.
    Download(Vec<&'a FileDescriptor>),
    /// Archived before; `previous` is the version the ledger held.
    Update {
        previous: Option<Identifier>,
        files:    Vec<&'a FileDescriptor>,
    },
}

impl<'a> Action<'a> {
    pub fn files(&self) -> &[&'a FileDescriptor] {
        match self {
            Action::Skip => &[],
            Action::Download(files) | Action::Update { files, .. } => files,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision<'a> {
    pub latest: &'a Version,
    pub action: Action<'a>,
}

pub fn reconcile<'a>(entry: &'a CatalogEntry, ledger: &Ledger, policy: &ReconcilePolicy) -> Result<Decision<'a>> {
    let latest = entry.latest_version().ok_or_else(|| ArchiveError::NoVersions {
        id:   entry.id.clone(),
        name: entry.name.clone(),
    })?;

    let selected = || select_files(&latest.files, &entry.model_type);
    let update = |previous: Option<&Identifier>| Action::Update {
        previous: previous.cloned(),
        files:    selected(),
    };

    let action = match ledger.status(&entry.id, &latest.id) {
        LedgerStatus::Absent => Action::Download(selected()),
        LedgerStatus::Current(record) if policy.force_recheck => update(record.latest_version_id()),
        LedgerStatus::Current(_) => Action::Skip,
        LedgerStatus::Stale(record) | LedgerStatus::Incomplete(record) => update(record.latest_version_id()),
    };
    Ok(Decision { latest, action })
}
