use std::time::Duration;
use shared::types::RawDocument;
use url::Url;
use crate::error::{FetchError, RegistryError, Result};

/// Where the authoritative registry document comes from.
///
/// One call is one attempt; retrying is the caller's business.
pub trait RegistrySource {
    fn fetch(&self, url: &Url) -> std::result::Result<RawDocument, FetchError>;
}

/// Blocking HTTP(S) source.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RegistryError::HttpClient)?;
        Ok(Self { client })
    }
}

impl RegistrySource for HttpFetcher {
    fn fetch(&self, url: &Url) -> std::result::Result<RawDocument, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            source: Box::new(e),
        };

        tracing::debug!("Fetching registry from {}", url);
        let response = self.client.get(url.clone()).send().map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(network)?;
        RawDocument::parse(body.to_vec()).map_err(|e| FetchError::MalformedPayload {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}
