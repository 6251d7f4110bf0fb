//! Outbound request seam.
//!
//! The executor only needs "GET this URL, give me status and body". The
//! default implementation is a blocking reqwest client (no Tokio runtime
//! required); tests plug in scripted transports.

use std::time::Duration;

/// Status code and fully read body of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A synchronous request/response call.
pub trait Transport: Send + Sync {
    /// Fails only when the request cannot be sent or the body cannot be read.
    fn get(&self, url: &str) -> Result<RawResponse, String>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> Result<RawResponse, String> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("palo-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| format!("cannot build HTTP client: {}", e))?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse, String> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| format!("request error: {}", e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| format!("body read error: {}", e))?;
        Ok(RawResponse { status, body: body.to_vec() })
    }
}
