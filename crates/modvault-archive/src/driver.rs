use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use modvault_catalog::{CatalogEntry, FileDescriptor, Identifier, declared_kb};
use modvault_fetch::{FetchStatus, Fetcher, HttpClient};
use modvault_fs::sanitize_component;
use modvault_ledger::Ledger;
use tracing::{debug, info, warn};

use crate::error::{ArchiveError, Result};
use crate::reconcile::{Action, ReconcilePolicy, reconcile};
use crate::stats::RunStats;

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Directory the `<category>/<entry>/<file>` tree is created under.
    pub root:          PathBuf,
    /// Only sum declared sizes; never fetch and never write the ledger.
    pub size_only:     bool,
    pub force_recheck: bool,
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Skipped,
    Downloaded { missing: Vec<String> },
    Updated { missing: Vec<String> },
    Unprocessable,
}

/// Where a file of `entry` is stored below `root`.
pub fn destination(root: &Path, entry: &CatalogEntry, file: &FileDescriptor) -> PathBuf {
    root.join(sanitize_component(entry.model_type.as_str()))
        .join(sanitize_component(&entry.name))
        .join(sanitize_component(&file.name))
}

pub struct Archiver<C: HttpClient> {
    fetcher: Fetcher<C>,
    ledger:  Ledger,
    options: ArchiveOptions,
    stats:   RunStats,
}

impl<C: HttpClient> Archiver<C> {
    pub fn new(fetcher: Fetcher<C>, ledger: Ledger, options: ArchiveOptions) -> Self {
        let ledger = if options.size_only { ledger.into_read_only() } else { ledger };
        Self {
            fetcher,
            ledger,
            options,
            stats: RunStats::default(),
        }
    }

    pub fn ledger(&self) -> &Ledger { &self.ledger }

    pub fn stats(&self) -> &RunStats { &self.stats }

    pub fn into_ledger(self) -> Ledger { self.ledger }

    /// Process entries in order. Only ledger failures stop the run.
    pub fn run(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) -> Result<RunStats> {
        for entry in entries {
            self.process(entry)?;
        }
        info!("{}", self.stats);
        Ok(self.stats)
    }

    pub fn process(&mut self, entry: CatalogEntry) -> Result<EntryOutcome> {
        self.stats.entries_seen += 1;
        let policy = ReconcilePolicy {
            force_recheck: self.options.force_recheck,
        };

        let decision = match reconcile(&entry, &self.ledger, &policy) {
            Ok(decision) => decision,
            Err(e @ ArchiveError::NoVersions { .. }) => {
                warn!("{e}; skipping");
                self.stats.unprocessable += 1;
                return Ok(EntryOutcome::Unprocessable);
            }
            Err(e) => return Err(e),
        };

        let files = decision.action.files();
        self.stats.declared_kb += declared_kb(files.iter().copied());

        let is_update = match &decision.action {
            Action::Skip => {
                debug!(id = %entry.id, "{} is up to date", entry.name);
                self.stats.skipped += 1;
                return Ok(EntryOutcome::Skipped);
            }
            Action::Download(_) => {
                info!(id = %entry.id, version = %decision.latest.id, "archiving {} ({} files)", entry.name, files.len());
                false
            }
            Action::Update { previous, .. } => {
                info!(
                    id = %entry.id,
                    version = %decision.latest.id,
                    "updating {} ({} files)",
                    entry.name,
                    files.len()
                );
                self.log_superseded(&entry, previous.as_ref(), &decision.latest.id, files);
                true
            }
        };

        let missing = if self.options.size_only { Vec::new() } else { self.fetch_all(&entry, files) };

        if is_update {
            self.stats.updated += 1;
            self.ledger.update(entry, missing.clone())?;
            Ok(EntryOutcome::Updated { missing })
        } else {
            self.stats.downloaded += 1;
            self.ledger.append(entry, missing.clone())?;
            Ok(EntryOutcome::Downloaded { missing })
        }
    }

    /// Fetch every selected file; returns the names that could not be obtained.
    fn fetch_all(&mut self, entry: &CatalogEntry, files: &[&FileDescriptor]) -> Vec<String> {
        let mut missing = Vec::new();
        for file in files {
            let path = destination(&self.options.root, entry, file);
            let report = self.fetcher.fetch(&file.download_url, &path, file.sha256());
            match report.status {
                FetchStatus::Downloaded => {
                    self.stats.files_fetched += 1;
                    self.stats.bytes_transferred += report.bytes_transferred;
                }
                FetchStatus::AlreadyPresent => self.stats.files_reused += 1,
                FetchStatus::Failed => {
                    warn!(id = %entry.id, "could not fetch {}; it will be retried next run", file.name);
                    self.stats.files_failed += 1;
                    missing.push(file.name.clone());
                }
            }
        }
        missing
    }

    /// Old files stay on disk; name the ones the new version no longer selects.
    fn log_superseded(
        &self,
        entry: &CatalogEntry,
        previous: Option<&Identifier>,
        latest: &Identifier,
        files: &[&FileDescriptor],
    ) {
        let Some(record) = self.ledger.get(&entry.id) else {
            return;
        };
        for stale in superseded(record.entry(), previous, latest, files) {
            debug!(id = %entry.id, "{stale} is superseded and left in place");
        }
    }
}

/// Files of the `previous` version of `recorded` that `files` no longer
/// covers. Empty when the version did not change.
fn superseded<'r>(
    recorded: &'r CatalogEntry,
    previous: Option<&Identifier>,
    latest: &Identifier,
    files: &[&FileDescriptor],
) -> Vec<&'r str> {
    let Some(previous) = previous.filter(|&p| p != latest) else {
        return Vec::new();
    };
    let Some(old) = recorded.versions.iter().find(|v| &v.id == previous) else {
        return Vec::new();
    };
    let kept: BTreeSet<&str> = files.iter().map(|f| f.name.as_str()).collect();
    old.files
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| !kept.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn recorded() -> CatalogEntry {
        CatalogEntry::from_value(json!({
            "id": 7, "name": "Vista", "type": "Checkpoint",
            "modelVersions": [
                {"id": "v2", "createdAt": "2023-06-01T00:00:00Z", "files": [
                    {"name": "vista-v2.safetensors", "downloadUrl": "https://files.example/v2", "sizeKB": 1.0}
                ]},
                {"id": "v1", "createdAt": "2023-01-01T00:00:00Z", "files": [
                    {"name": "vista-v1.safetensors", "downloadUrl": "https://files.example/v1", "sizeKB": 1.0},
                    {"name": "shared.yaml", "downloadUrl": "https://files.example/yaml", "sizeKB": 1.0}
                ]}
            ]
        }))
        .unwrap()
    }

    fn files_of<'e>(entry: &'e CatalogEntry, version: &str) -> Vec<&'e FileDescriptor> {
        let version = Identifier::from(version);
        entry
            .versions
            .iter()
            .find(|v| v.id == version)
            .map(|v| v.files.iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn version_change_names_dropped_files() {
        let entry = recorded();
        let mut files = files_of(&entry, "v2");
        let shared = files_of(&entry, "v1").into_iter().find(|f| f.name == "shared.yaml").unwrap();
        files.push(shared);

        let stale = superseded(&entry, Some(&Identifier::from("v1")), &Identifier::from("v2"), &files);
        assert_eq!(stale, vec!["vista-v1.safetensors"]);
    }

    #[test]
    fn recheck_of_the_same_version_supersedes_nothing() {
        let entry = recorded();
        let latest = Identifier::from("v1");
        let stale = superseded(&entry, Some(&latest), &latest, &[]);
        assert!(stale.is_empty());
    }

    #[test]
    fn unknown_previous_version_supersedes_nothing() {
        let entry = recorded();
        let files = files_of(&entry, "v2");
        assert!(superseded(&entry, None, &Identifier::from("v2"), &files).is_empty());
        assert!(superseded(&entry, Some(&Identifier::from("v0")), &Identifier::from("v2"), &files).is_empty());
    }
}
