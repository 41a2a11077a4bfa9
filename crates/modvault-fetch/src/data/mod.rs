//! Immutable data types for fetching operations.

pub mod options;
pub mod progress;

pub use options::{
    DEFAULT_CHUNK_SIZE, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_RATE, DEFAULT_RATE_LIMIT_WAIT,
    DEFAULT_STALL_EXEMPT_UP_TO, FetchOptions, FetchPhase,
};
pub use progress::Progress;
