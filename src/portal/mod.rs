pub mod http;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

/// Which header profile a GET should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Browser-style navigation (login page, redirect hops, key exchange).
    Page,
    /// XHR-style JSON query against the academic-affairs backend.
    Data,
}

/// The parts of a portal response the login handshake and record queries inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl PortalResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("request to {url} failed: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// One cycle's authenticated channel to the portal.
///
/// Implementations never follow redirects on their own and keep a cookie jar for
/// the lifetime of the value; dropping it discards the session.
#[async_trait]
pub trait PortalTransport: Send + Sync {
    async fn get(&self, url: &str, kind: RequestKind) -> Result<PortalResponse, TransportError>;

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<PortalResponse, TransportError>;

    /// True when the jar holds a cookie called `name`, optionally scoped to `path`.
    fn has_cookie(&self, name: &str, path: Option<&str>) -> bool;
}
