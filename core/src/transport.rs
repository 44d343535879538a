//! The transport boundary.
//!
//! # Design
//! `Client` never reaches for a process-wide HTTP client. The caller owns a
//! `Transport` and hands it to the client at construction, which keeps
//! connection pooling, proxies and timeouts out of the core and lets tests
//! substitute a closure.
//!
//! `UreqTransport` is the blocking implementation. It disables ureq's
//! status-as-error behaviour so 4xx/5xx responses come back as data for the
//! classifier to interpret, and reads the whole body into memory. The
//! response body is dropped on every exit path.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and returns the complete response.
///
/// Transport-level failures (DNS, refused connections, timeouts, oversized
/// bodies) are returned as `Err`. A response with any status code is `Ok`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, BoxError> + Send + Sync,
{
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        self(request)
    }
}

/// Default cap on a response body held in memory.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Blocking transport backed by a `ureq::Agent`.
///
/// Cloning is cheap and clones share the agent's connection pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body_size: u64,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>, max_body_size: u64) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body_size,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout, config.max_body_size)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_BODY_SIZE)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = ::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = match &request.body {
            Some(body) => self.agent.run(builder.body(body.clone())?)?,
            None => self.agent.run(builder.body(())?)?,
        };

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()?;
        debug!(status, bytes = body.len(), "read response body");

        Ok(HttpResponse { status, body })
    }
}
