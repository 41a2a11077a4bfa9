use std::time::Duration;

use crate::error::{FetchError, Result};

/// Aborts large transfers whose average rate falls under a floor.
///
/// Transfers whose announced size is at or below `exempt_up_to` are never
/// aborted, nor is any transfer whose size is unknown (announced as 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateMonitor {
    min_bytes_per_sec: u64,
    exempt_up_to:      u64,
    expected_total:    u64,
}

impl RateMonitor {
    pub fn new(min_bytes_per_sec: u64, exempt_up_to: u64, expected_total: u64) -> Self {
        Self {
            min_bytes_per_sec,
            exempt_up_to,
            expected_total,
        }
    }

    pub fn applies(&self) -> bool { self.expected_total > self.exempt_up_to }

    /// Average rate in bytes per second, `None` before any time has passed.
    pub fn average_rate(transferred: u64, elapsed: Duration) -> Option<f64> {
        let secs = elapsed.as_secs_f64();
        (secs > 0.0).then(|| transferred as f64 / secs)
    }

    pub fn check(&self, transferred: u64, elapsed: Duration) -> Result<()> {
        if !self.applies() {
            return Ok(());
        }
        match Self::average_rate(transferred, elapsed) {
            Some(rate) if rate < self.min_bytes_per_sec as f64 => Err(FetchError::Stalled {
                rate:    rate as u64,
                minimum: self.min_bytes_per_sec,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn small_files_are_exempt() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 50 * MIB);
        assert!(!monitor.applies());
        assert!(monitor.check(1, Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn unknown_size_is_exempt() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 0);
        assert!(monitor.check(1, Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn exactly_at_exemption_bound_is_exempt() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 100 * MIB);
        assert!(monitor.check(1, Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn slow_large_transfer_is_aborted() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 2048 * MIB);
        let err = monitor.check(20 * MIB, Duration::from_secs(10)).unwrap_err();
        match err {
            FetchError::Stalled { rate, minimum } => {
                assert_eq!(rate, 2 * MIB);
                assert_eq!(minimum, 5 * MIB);
            }
            other => panic!("expected Stalled, got {other:?}"),
        }
    }

    #[test]
    fn fast_large_transfer_passes() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 2048 * MIB);
        assert!(monitor.check(20 * MIB, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn no_elapsed_time_never_aborts() {
        let monitor = RateMonitor::new(5 * MIB, 100 * MIB, 2048 * MIB);
        assert!(monitor.check(0, Duration::ZERO).is_ok());
    }
}
