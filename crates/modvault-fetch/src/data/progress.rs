use crate::data::options::FetchPhase;

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes written to the staging file during the current attempt.
    pub bytes_downloaded: u64,

    /// `content-length` of the current response, when the server sent one.
    pub total_bytes: Option<u64>,

    /// 1-based attempt number.
    pub attempt: u32,
}

impl Progress {
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some(self.bytes_downloaded as f64 / total as f64 * 100.0),
        }
    }

    pub fn is_completed(&self) -> bool { self.phase == FetchPhase::Completed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(bytes: u64, total: Option<u64>) -> Progress {
        Progress {
            phase: FetchPhase::Downloading,
            bytes_downloaded: bytes,
            total_bytes: total,
            attempt: 1,
        }
    }

    #[test]
    fn percentage_with_known_total() {
        assert_eq!(progress(250, Some(1000)).percentage(), Some(25.0));
    }

    #[test]
    fn percentage_without_total() {
        assert_eq!(progress(250, None).percentage(), None);
        assert_eq!(progress(250, Some(0)).percentage(), None);
    }
}
