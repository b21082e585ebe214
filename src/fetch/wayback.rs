use tracing::{debug, warn};

use super::client::HttpClient;
use crate::config::{ArchiveConfig, DEFAULT_ARCHIVE_BASE};
use crate::dates::CaptureToken;
use crate::error::{Error, Result};

/// Retrieves archived captures of one page from a Wayback-style service.
pub struct Wayback<C> {
    client: C,
    archive_base: String,
    target_url: String,
}

impl<C: HttpClient> Wayback<C> {
    pub fn new(client: C, target_url: &str) -> Self {
        Self {
            client,
            archive_base: DEFAULT_ARCHIVE_BASE.to_string(),
            target_url: target_url.to_string(),
        }
    }

    /// Fetcher on the archive endpoint named by `config.base_url`.
    pub fn from_config(client: C, config: &ArchiveConfig, target_url: &str) -> Self {
        Self::new(client, target_url).with_base(&config.base_url)
    }

    /// Points the fetcher at another archive endpoint, e.g. `http://localhost:8080/web`.
    pub fn with_base(mut self, archive_base: &str) -> Self {
        self.archive_base = archive_base.trim_end_matches('/').to_string();
        self
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// `<archive-base>/<token>/<url>`
    pub fn snapshot_url(&self, token: &CaptureToken) -> String {
        format!("{}/{}/{}", self.archive_base, token, self.target_url)
    }

    /// Fetches the capture for `token` once. No retries.
    #[tracing::instrument(skip(self, token), fields(token = %token, url = %self.target_url))]
    pub fn fetch(&self, token: &CaptureToken) -> Result<String> {
        let request_url = self.snapshot_url(token);
        let fail = |reason: String| Error::Fetch {
            token: token.to_string(),
            url: self.target_url.clone(),
            reason,
        };

        let resp = self
            .client
            .get(&request_url)
            .map_err(|e| fail(format!("request to {request_url} failed: {e}")))?;

        if !resp.is_success() {
            warn!(status = resp.status, "Archive returned error status");
            return Err(fail(format!("status {} from {request_url}", resp.status)));
        }

        debug!(bytes = resp.body.len(), "Snapshot received");
        Ok(resp.body)
    }
}
