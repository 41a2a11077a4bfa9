//! Blocking HTTP downloading with stall detection, retry and streaming
//! verification.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and progress types
//! - [`core`] - Pure transformations (retry bookkeeping, rate monitoring)
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! Everything is synchronous: one request, one file, one chunk at a time.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{RateMonitor, RetryPolicy};
pub use data::{
    DEFAULT_CHUNK_SIZE, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_RATE, DEFAULT_RATE_LIMIT_WAIT,
    DEFAULT_STALL_EXEMPT_UP_TO, FetchOptions, FetchPhase, Progress,
};
pub use effects::{
    FetchReport, FetchStatus, Fetcher, HttpClient, HttpRequest, HttpResponse, MockHttpClient,
    MockResponse, RecordedRequest,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};
