use crate::error::LookupError;
use crate::types::LookupSettings;
use async_trait::async_trait;
use tracing::debug;

/// Fetches the raw intelligence payload for one address.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Perform exactly one request for `ip`. Failures are not retried.
    async fn lookup(&self, ip: &str) -> Result<Vec<u8>, LookupError>;
}

/// Lookup client speaking to the HTTP enrichment endpoint (`GET {endpoint}/{ip}`).
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpLookup {
    /// Build a client from settings. With `verify_tls` off, self-signed and
    /// otherwise invalid certificates are accepted.
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .user_agent(concat!("cinfo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(LookupError::Client)?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, ip: &str) -> String {
        format!("{}/{}", self.endpoint, ip)
    }
}

#[async_trait]
impl Lookup for HttpLookup {
    async fn lookup(&self, ip: &str) -> Result<Vec<u8>, LookupError> {
        let url = self.url_for(ip);
        debug!(%url, "GET");

        let request_err = |source| LookupError::Request {
            ip: ip.to_string(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                ip: ip.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_err)?;
        Ok(body.to_vec())
    }
}
