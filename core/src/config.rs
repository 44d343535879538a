//! Client configuration and the endpoint/authorization collaborators.
//!
//! # Design
//! The client needs two answers per request: which base URL serves a path,
//! and what goes in its `Authorization` header. Both are traits so callers
//! can plug in their own rules; `ClientConfig` answers them from an API key,
//! a default base URL, and an optional list of path-prefix routes.

use std::time::Duration;

use crate::error::ApiError;
use crate::transport::DEFAULT_MAX_BODY_SIZE;

/// Base URL of the service-invoice API.
pub const SERVICE_URL: &str = "https://api.nfe.io/v1/";
/// Base URL of the product-invoice API.
pub const PRODUCT_URL: &str = "https://api.nfse.io/v2/";
/// Base URL of the address lookup API.
pub const ADDRESS_URL: &str = "https://address.api.nfe.io/v2/";

/// Resolves the base URL for a request path. The full URL is
/// `endpoint(path) + path`.
pub trait EndpointResolver {
    fn endpoint(&self, path: &str) -> String;
}

/// Produces the `Authorization` header value for a request path.
pub trait Authorizer {
    fn authorization(&self, path: &str) -> String;
}

impl<F: Fn(&str) -> String> EndpointResolver for F {
    fn endpoint(&self, path: &str) -> String {
        self(path)
    }
}

/// Wraps a closure as an `Authorizer`. Closures already implement
/// `EndpointResolver`, so the two contracts need distinct adapters.
pub struct AuthorizerFn<F>(pub F);

impl<F: Fn(&str) -> String> Authorizer for AuthorizerFn<F> {
    fn authorization(&self, path: &str) -> String {
        (self.0)(path)
    }
}

/// Sends every path starting with `prefix` to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRoute {
    pub prefix: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub routes: Vec<EndpointRoute>,
    pub timeout: Option<Duration>,
    pub max_body_size: u64,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: SERVICE_URL.to_string(),
            routes: Vec::new(),
            timeout: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Read `NFE_API_KEY` (required), `NFE_BASE_URL` and `NFE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup("NFE_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::ConfigError("NFE_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("NFE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup("NFE_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ApiError::ConfigError(format!("NFE_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_route(mut self, prefix: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.routes.push(EndpointRoute {
            prefix: prefix.into(),
            base_url: base_url.into(),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

impl EndpointResolver for ClientConfig {
    /// Longest matching route prefix wins; unrouted paths use `base_url`.
    fn endpoint(&self, path: &str) -> String {
        self.routes
            .iter()
            .filter(|route| path.starts_with(route.prefix.as_str()))
            .max_by_key(|route| route.prefix.len())
            .map_or_else(|| self.base_url.clone(), |route| route.base_url.clone())
    }
}

impl Authorizer for ClientConfig {
    fn authorization(&self, _path: &str) -> String {
        self.api_key.clone()
    }
}
