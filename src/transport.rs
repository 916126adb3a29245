//! The HTTP boundary. Workers block on a call until the service answers;
//! no request timeout is set, so the client default applies.

use crate::config::ServiceConfig;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid header '{0}'")]
    Header(String),
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Send { url: String, source: reqwest::Error },
}

/// Status and raw body of a response. The body is decoded by the caller,
/// outside the timed region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one pre-serialised JSON body to a path under the service root.
pub trait Transport: Send + Sync {
    fn post_json(&self, path: &str, body: Vec<u8>) -> Result<Reply, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    config: ServiceConfig,
}

impl HttpTransport {
    pub fn new(config: ServiceConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::Header(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| TransportError::Header(name.to_string()))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .no_proxy()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, path: &str, body: Vec<u8>) -> Result<Reply, TransportError> {
        let url = self.config.url(path);
        let send_err = |source| TransportError::Send {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(send_err)?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(send_err)?.to_vec();
        Ok(Reply { status, body })
    }
}
