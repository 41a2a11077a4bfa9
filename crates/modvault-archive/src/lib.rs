//! Reconciles catalog entries against the ledger and archives what changed.
//!
//! - [`reconcile`] decides per entry: skip, download, or update
//! - [`Archiver`] carries the decision out: fetches files, then records the
//!   entry in the ledger

mod driver;
mod error;
mod reconcile;
mod stats;

pub use driver::{ArchiveOptions, Archiver, EntryOutcome, destination};
pub use error::{ArchiveError, Result};
pub use reconcile::{Action, Decision, ReconcilePolicy, reconcile};
pub use stats::RunStats;
