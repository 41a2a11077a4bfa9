//! Pure transformations for HTTP fetching.
//!
//! Nothing in here performs I/O except the sleeps the retry policy schedules.

mod rate;
mod retry;

pub use rate::RateMonitor;
pub use retry::RetryPolicy;
