use modvault_catalog::{CatalogEntry, Identifier};
use serde::{Deserialize, Serialize};

/// One archived entry: the payload as it was last archived, plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latest_version_id: Option<Identifier>,
    /// Selected files that were not obtained by the run that wrote this record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    missing_files:     Vec<String>,
    #[serde(flatten)]
    entry:             CatalogEntry,
}

impl LedgerRecord {
    pub fn new(entry: CatalogEntry, missing_files: Vec<String>) -> Self {
        let mut record = Self {
            latest_version_id: None,
            missing_files,
            entry,
        };
        record.derive_latest_version();
        record
    }

    pub fn id(&self) -> &Identifier { &self.entry.id }

    pub fn entry(&self) -> &CatalogEntry { &self.entry }

    pub fn latest_version_id(&self) -> Option<&Identifier> { self.latest_version_id.as_ref() }

    pub fn missing_files(&self) -> &[String] { &self.missing_files }

    pub fn is_complete(&self) -> bool { self.missing_files.is_empty() }

    /// Fill in the cached version from the payload when the stored record lacks it.
    pub(crate) fn derive_latest_version(&mut self) {
        if self.latest_version_id.is_none() {
            self.latest_version_id = self.entry.latest_version().map(|v| v.id.clone());
        }
    }
}
