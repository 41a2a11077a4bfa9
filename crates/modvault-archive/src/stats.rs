use std::fmt;

/// Counters for one archive run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub entries_seen:      u64,
    pub skipped:           u64,
    pub downloaded:        u64,
    pub updated:           u64,
    pub unprocessable:     u64,
    pub files_fetched:     u64,
    pub files_reused:      u64,
    pub files_failed:      u64,
    pub bytes_transferred: u64,
    /// Sum of the declared sizes of every selected file, in kilobytes.
    pub declared_kb:       f64,
}

impl RunStats {
    pub fn declared_bytes(&self) -> u64 { (self.declared_kb * 1024.0).round() as u64 }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries ({} new, {} updated, {} unchanged, {} unprocessable); \
             {} files fetched, {} reused, {} failed",
            self.entries_seen,
            self.downloaded,
            self.updated,
            self.skipped,
            self.unprocessable,
            self.files_fetched,
            self.files_reused,
            self.files_failed,
        )
    }
}
