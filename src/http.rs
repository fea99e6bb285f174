//! Blocking HTTP transport used for description fetches and SOAP calls

use crate::config::UpnpSettings;
use crate::Result;
use std::time::Duration;
use tracing::debug;

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is an HTTP error (4xx or 5xx)
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single blocking HTTP round trip
///
/// Implementations must be reentrant: a [`Gateway`](crate::Gateway) may be
/// shared between threads and calls its transport concurrently.
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request
    fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Issue a POST request with the given headers and body
    fn post(&self, url: &str, headers: &[(&str, String)], body: Vec<u8>) -> Result<HttpResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }

    fn post(&self, url: &str, headers: &[(&str, String)], body: Vec<u8>) -> Result<HttpResponse> {
        (**self).post(url, headers, body)
    }
}

/// [`HttpTransport`] backed by a blocking reqwest client
///
/// Must not be created or dropped on an async runtime thread; use
/// `tokio::task::spawn_blocking` (see [`crate::mapping`]).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout
    ///
    /// Proxy settings from the environment are ignored: the gateway is
    /// always on the local network.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Create a transport from settings
    pub fn from_settings(settings: &UpnpSettings) -> Result<Self> {
        Self::new(settings.http_timeout())
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }

    fn post(&self, url: &str, headers: &[(&str, String)], body: Vec<u8>) -> Result<HttpResponse> {
        debug!("POST {} ({} bytes)", url, body.len());
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}
