use modvault_catalog::Identifier;
use modvault_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The entry lists no versions, so there is nothing to archive.
    #[error("entry {id} ({name}) has no versions")]
    NoVersions { id: Identifier, name: String },

    /// Ledger I/O failed; the run cannot continue.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ArchiveError {
    pub fn is_fatal(&self) -> bool { matches!(self, ArchiveError::Ledger(_)) }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
