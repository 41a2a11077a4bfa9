use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// Bounded retry with a fixed pause between attempts.
///
/// `attempts` counts every try including the first one, so `attempts = 4`
/// means one initial request and three retries. No pause follows the final
/// failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay:    Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::fixed(4, Duration::from_secs(5)) }
}

impl RetryPolicy {
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// when every attempt fails.
    pub fn run<T, E, F>(&self, label: &str, op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_with_delay(label, op, |_| self.delay)
    }

    /// Like [`RetryPolicy::run`], with the pause chosen per error.
    pub fn run_with_delay<T, E, F, D>(&self, label: &str, mut op: F, delay_for: D) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
        D: Fn(&E) -> Duration,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts => return Err(err),
                Err(err) => {
                    let pause = delay_for(&err);
                    warn!(
                        target: "modvault::retry",
                        "{label}: attempt {attempt}/{} failed: {err}; retrying in {:?}",
                        self.attempts,
                        pause
                    );
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_failures() {
        let policy = RetryPolicy::fixed(4, Duration::ZERO);
        let mut calls = 0;
        let result: Result<u32, String> = policy.run("test", |attempt| {
            calls += 1;
            if attempt < 3 { Err(format!("boom {attempt}")) } else { Ok(attempt) }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_bound() {
        let policy = RetryPolicy::fixed(4, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), String> = policy.run("test", |attempt| {
            calls += 1;
            Err(format!("boom {attempt}"))
        });
        assert_eq!(result, Err("boom 4".to_string()));
        assert_eq!(calls, 4);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::fixed(0, Duration::ZERO);
        let mut calls = 0;
        let _: Result<(), &str> = policy.run("test", |_| {
            calls += 1;
            Err("no")
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn delay_chosen_per_error() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(3600));
        let mut seen = Vec::new();
        let result: Result<(), &str> = policy.run_with_delay(
            "test",
            |attempt| {
                seen.push(attempt);
                Err("fast")
            },
            |_| Duration::ZERO,
        );
        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn default_matches_listing_bound() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 4);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }
}
