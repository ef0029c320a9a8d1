// Error types for cinfo
//
// Lookup failures are typed so the pipeline can log and count them per address;
// the binary wraps everything else in anyhow.

use thiserror::Error;

/// Failure of a single lookup against the enrichment service.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or body read failure
    #[error("request for {ip} failed: {source}")]
    Request {
        ip: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("lookup of {ip} returned HTTP {status}")]
    Status { ip: String, status: u16 },
}

impl LookupError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LookupError::Request { source, .. } if source.is_timeout())
    }
}
