use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

const MIB: u64 = 1024 * 1024;

/// Tries per file, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
/// Pause after an HTTP 429 before the next attempt.
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);
/// Bytes read from the response per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 20 * MIB as usize;
/// Average rate below which a large transfer is abandoned.
pub const DEFAULT_MIN_RATE: u64 = 5 * MIB;
/// Files announced at or under this size are never abandoned for slowness.
pub const DEFAULT_STALL_EXEMPT_UP_TO: u64 = 100 * MIB;
/// Longest wait for response headers or for any single body read.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Phases of a download attempt.
///
/// Connecting → Downloading → Verifying → Committing → Completed.
/// A retry returns to Connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Connecting,
    Downloading,
    Verifying,
    Committing,
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Verifying => write!(f, "Verifying"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Configuration for file fetching.
///
/// # Examples
///
/// ```
/// use modvault_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(2)
///     .rate_limit_wait(Duration::ZERO)
///     .header("Authorization", "Bearer token");
/// assert_eq!(options.max_attempts, 2);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Total tries per file. Default: 4
    pub max_attempts: u32,

    /// Pause after a 429 response. Default: 30s
    pub rate_limit_wait: Duration,

    /// Chunk size for reading the response body. Default: 20 MiB
    pub chunk_size: usize,

    /// Minimum average rate in bytes per second. Default: 5 MiB/s
    pub min_rate: u64,

    /// Announced sizes up to this many bytes skip the rate check. Default: 100 MiB
    pub stall_exempt_up_to: u64,

    /// Headers sent with every request.
    pub headers: Arc<[(String, String)]>,

    /// Invoked on phase transitions and after every chunk.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_attempts", &self.max_attempts)
            .field("rate_limit_wait", &self.rate_limit_wait)
            .field("chunk_size", &self.chunk_size)
            .field("min_rate", &self.min_rate)
            .field("stall_exempt_up_to", &self.stall_exempt_up_to)
            .field("headers", &self.headers.len())
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts:       DEFAULT_MAX_ATTEMPTS,
            rate_limit_wait:    DEFAULT_RATE_LIMIT_WAIT,
            chunk_size:         DEFAULT_CHUNK_SIZE,
            min_rate:           DEFAULT_MIN_RATE,
            stall_exempt_up_to: DEFAULT_STALL_EXEMPT_UP_TO,
            headers:            Arc::new([]),
            on_progress:        None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn rate_limit_wait(mut self, wait: Duration) -> Self {
        self.rate_limit_wait = wait;
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the stall floor and the size up to which it is not enforced.
    #[must_use]
    pub fn stall_guard(mut self, min_rate: u64, exempt_up_to: u64) -> Self {
        self.min_rate = min_rate;
        self.stall_exempt_up_to = exempt_up_to;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
