use std::time::Duration;

use crate::error::SnapshotError;

/// Source of webcam snapshot images attached to notifications.
///
/// Fetches are best-effort: the dispatcher treats any error as "send the
/// notification without an image".
pub trait SnapshotSource {
    /// Fetch one snapshot, returning the raw image bytes.
    fn fetch(&self) -> Result<Vec<u8>, SnapshotError>;
}

/// Snapshot fetcher for HTTP webcam endpoints.
///
/// Performs a single blocking GET per fetch with a request timeout, so a
/// stalled camera cannot hang the event-delivery thread. There is no retry:
/// a notification waits for at most one fetch attempt.
pub struct SnapshotFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl SnapshotFetcher {
    /// Create a new SnapshotFetcher for the given snapshot URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: String, timeout: Duration) -> Result<Self, SnapshotError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SnapshotError::RequestFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { url, client })
    }

    /// Get the configured snapshot URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for SnapshotFetcher {
    fn fetch(&self) -> Result<Vec<u8>, SnapshotError> {
        let response =
            self.client
                .get(&self.url)
                .send()
                .map_err(|e| SnapshotError::RequestFailed {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(SnapshotError::BadStatus {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let data = response.bytes().map_err(|e| SnapshotError::RequestFailed {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(data.to_vec())
    }
}
