use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use modvault_fs::{commit_staged, ensure_dir, staging_path};
use modvault_verify::{Sha256Hasher, VerifiedReader, file_matches};
use tracing::{debug, error, warn};

use crate::core::{RateMonitor, RetryPolicy};
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::effects::http::{HttpClient, HttpRequest, HttpResponse};
use crate::error::{FetchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Transferred and placed at the destination.
    Downloaded,
    /// The destination already held a file with the expected hash.
    AlreadyPresent,
    /// Every attempt failed.
    Failed,
}

/// Outcome of one [`Fetcher::fetch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Bytes received by the successful attempt; 0 when reused or failed.
    pub bytes_transferred: u64,
    pub status:            FetchStatus,
}

impl FetchReport {
    pub fn failed(&self) -> bool { self.status == FetchStatus::Failed }

    fn failure() -> Self {
        Self {
            bytes_transferred: 0,
            status:            FetchStatus::Failed,
        }
    }
}

/// Downloads single files with retry, stall detection and verification.
pub struct Fetcher<C: HttpClient> {
    client:  C,
    options: FetchOptions,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, options: FetchOptions) -> Self { Self { client, options } }

    pub fn options(&self) -> &FetchOptions { &self.options }

    /// Fetch `url` into `destination`.
    ///
    /// Never returns an error: failures are logged per attempt and, once the
    /// attempts are exhausted, reported as [`FetchStatus::Failed`] so the
    /// caller can move on to the next file.
    pub fn fetch(&self, url: &str, destination: &Path, expected_sha256: Option<&str>) -> FetchReport {
        if let Some(expected) = expected_sha256 {
            match file_matches(destination, expected) {
                Ok(true) => {
                    debug!(path = %destination.display(), "hash matches, skipping download");
                    return FetchReport {
                        bytes_transferred: 0,
                        status:            FetchStatus::AlreadyPresent,
                    };
                }
                Ok(false) => {}
                Err(e) => warn!(path = %destination.display(), "cannot hash existing file: {e}"),
            }
        }

        let policy = RetryPolicy::fixed(self.options.max_attempts, self.options.rate_limit_wait);
        let label = destination.display().to_string();
        let result = policy.run_with_delay(
            &label,
            |attempt| self.attempt(url, destination, expected_sha256, attempt),
            |err| match err {
                FetchError::RateLimited { .. } => self.options.rate_limit_wait,
                _ => std::time::Duration::ZERO,
            },
        );

        match result {
            Ok(bytes) => FetchReport {
                bytes_transferred: bytes,
                status:            FetchStatus::Downloaded,
            },
            Err(e) => {
                error!(
                    url,
                    path = %destination.display(),
                    "giving up after {} attempts: {e}",
                    self.options.max_attempts
                );
                FetchReport::failure()
            }
        }
    }

    fn attempt(&self, url: &str, destination: &Path, expected: Option<&str>, attempt: u32) -> Result<u64> {
        self.report(FetchPhase::Connecting, 0, None, attempt);

        let request = HttpRequest::get(url).headers(&self.options.headers);
        let response = self.client.get(&request)?;
        if response.is_rate_limited() {
            return Err(FetchError::RateLimited { url: url.to_string() });
        }
        if !response.is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status,
                url:    url.to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            ensure_dir(parent)?;
        }
        let staging = staging_path(destination)?;

        match self.stream_to_staging(response, &staging, expected, attempt) {
            Ok(bytes) => {
                self.report(FetchPhase::Committing, bytes, Some(bytes), attempt);
                commit_staged(&staging, destination)?;
                self.report(FetchPhase::Completed, bytes, Some(bytes), attempt);
                Ok(bytes)
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn stream_to_staging(
        &self,
        response: HttpResponse,
        staging: &Path,
        expected: Option<&str>,
        attempt: u32,
    ) -> Result<u64> {
        let total = response.content_length;
        let monitor = RateMonitor::new(
            self.options.min_rate,
            self.options.stall_exempt_up_to,
            total.unwrap_or(0),
        );

        let mut file = File::create(staging)?;
        let mut reader = VerifiedReader::new(response.body, Sha256Hasher::new());
        let mut chunk = Vec::with_capacity(self.options.chunk_size);
        let mut transferred = 0u64;
        let started = Instant::now();

        self.report(FetchPhase::Downloading, 0, total, attempt);
        loop {
            chunk.clear();
            let n = (&mut reader)
                .take(self.options.chunk_size as u64)
                .read_to_end(&mut chunk)
                .map_err(|e| FetchError::Network(e.to_string()))?;
            if n == 0 {
                break;
            }
            file.write_all(&chunk)?;
            transferred += n as u64;

            self.report(FetchPhase::Downloading, transferred, total, attempt);
            monitor.check(transferred, started.elapsed())?;
        }
        file.sync_all()?;

        self.report(FetchPhase::Verifying, transferred, total, attempt);
        if let Some(total) = total
            && total != 0
            && total != transferred
        {
            return Err(FetchError::LengthMismatch {
                expected: total,
                actual:   transferred,
            });
        }
        if let Some(expected) = expected {
            reader.finish(expected)?;
        }

        Ok(transferred)
    }

    fn report(&self, phase: FetchPhase, bytes: u64, total: Option<u64>, attempt: u32) {
        if let Some(ref callback) = self.options.on_progress {
            callback(&Progress {
                phase,
                bytes_downloaded: bytes,
                total_bytes: total,
                attempt,
            });
        }
    }
}
