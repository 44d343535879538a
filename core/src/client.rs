//! Request execution for the NFe API.
//!
//! # Design
//! `Client` holds a caller-owned transport and the two collaborators that
//! resolve endpoints and credentials; it keeps no state between calls. A
//! call is split the same way on every verb:
//!
//! - `build_request` serializes the parameters and assembles headers,
//! - the transport performs the round-trip,
//! - `parse_response` classifies the response and writes the caller's slot.
//!
//! Both halves are public so callers that perform their own I/O can use them
//! directly.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{classify, Outcome};
use crate::config::{Authorizer, ClientConfig, EndpointResolver};
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, Params};
use crate::slot::ResponseSlot;
use crate::transport::{Transport, UreqTransport};

/// Pass as `params` when a request has no body.
pub const NO_PARAMS: Option<&Params> = None;

/// Synchronous client for the NFe REST API.
pub struct Client<T = UreqTransport> {
    transport: T,
    endpoints: Arc<dyn EndpointResolver + Send + Sync>,
    authorizer: Arc<dyn Authorizer + Send + Sync>,
}

impl Client<UreqTransport> {
    /// Build a client with a `UreqTransport` configured from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let config = Arc::new(config);
        Self {
            transport,
            endpoints: config.clone(),
            authorizer: config,
        }
    }

    pub fn from_parts<E, A>(transport: T, endpoints: E, authorizer: A) -> Self
    where
        E: EndpointResolver + Send + Sync + 'static,
        A: Authorizer + Send + Sync + 'static,
    {
        Self {
            transport,
            endpoints: Arc::new(endpoints),
            authorizer: Arc::new(authorizer),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Assemble the request for `method` and `path`.
    ///
    /// `params`, when present, is serialized to JSON and becomes the body.
    /// The default headers are `Authorization`, `accept` and `content-type`;
    /// entries in `headers` replace defaults with the same name
    /// (case-insensitively) and are otherwise appended.
    pub fn build_request<P>(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&P>,
        headers: &Headers,
    ) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = params
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ApiError::SerializationError)?;

        let mut request_headers = vec![
            ("Authorization".to_string(), self.authorizer.authorization(path)),
            ("accept".to_string(), "application/json".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        for (name, value) in headers {
            match request_headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(entry) => entry.1 = value.clone(),
                None => request_headers.push((name.clone(), value.clone())),
            }
        }

        Ok(HttpRequest {
            method,
            url: format!("{}{}", self.endpoints.endpoint(path), path),
            headers: request_headers,
            body,
        })
    }

    /// Classify `response` and write any document into `slot`.
    ///
    /// An empty success response leaves `slot` untouched.
    pub fn parse_response<S>(&self, response: &HttpResponse, slot: &mut S) -> Result<(), ApiError>
    where
        S: ResponseSlot + ?Sized,
    {
        match classify(&response.body, response.status)? {
            Outcome::Empty => Ok(()),
            Outcome::Document(document) => slot.fill(document),
        }
    }

    /// Build, send and parse one request.
    pub fn execute<P, S>(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&P>,
        headers: &Headers,
        slot: &mut S,
    ) -> Result<(), ApiError>
    where
        P: Serialize + ?Sized,
        S: ResponseSlot + ?Sized,
    {
        let request = self.build_request(method, path, params, headers)?;
        debug!(%method, url = %request.url, "sending request");

        let response = self.transport.send(&request).map_err(|err| {
            warn!(%method, url = %request.url, error = %err, "transport failed");
            ApiError::TransportError(err)
        })?;
        debug!(%method, url = %request.url, status = response.status, "received response");

        self.parse_response(&response, slot)
    }

    pub fn get<P, S>(&self, path: &str, params: Option<&P>, headers: &Headers, slot: &mut S) -> Result<(), ApiError>
    where
        P: Serialize + ?Sized,
        S: ResponseSlot + ?Sized,
    {
        self.execute(HttpMethod::Get, path, params, headers, slot)
    }

    pub fn post<P, S>(&self, path: &str, params: Option<&P>, headers: &Headers, slot: &mut S) -> Result<(), ApiError>
    where
        P: Serialize + ?Sized,
        S: ResponseSlot + ?Sized,
    {
        self.execute(HttpMethod::Post, path, params, headers, slot)
    }

    pub fn put<P, S>(&self, path: &str, params: Option<&P>, headers: &Headers, slot: &mut S) -> Result<(), ApiError>
    where
        P: Serialize + ?Sized,
        S: ResponseSlot + ?Sized,
    {
        self.execute(HttpMethod::Put, path, params, headers, slot)
    }

    pub fn delete<P, S>(&self, path: &str, params: Option<&P>, headers: &Headers, slot: &mut S) -> Result<(), ApiError>
    where
        P: Serialize + ?Sized,
        S: ResponseSlot + ?Sized,
    {
        self.execute(HttpMethod::Delete, path, params, headers, slot)
    }
}
