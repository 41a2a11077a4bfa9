use std::path::PathBuf;

use modvault_catalog::Identifier;
use modvault_fs::FsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("ledger {path} is not valid: {source}")]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize ledger: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("entry {id} is already recorded")]
    Duplicate { id: Identifier },

    #[error("entry {id} is not recorded")]
    UnknownEntry { id: Identifier },

    #[error("another ledger write is still in progress")]
    WriteInProgress,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
