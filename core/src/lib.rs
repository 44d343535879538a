//! Synchronous request pipeline for the NFe REST API.
//!
//! # Overview
//! `Client` turns a method, a path and optional JSON parameters into an
//! HTTP request, sends it over a caller-owned `Transport`, and decodes the
//! response into a caller-owned output slot. Responses come in several
//! shapes: structured errors, empty bodies, PDF documents, `<Nfse>` XML
//! documents, and JSON resources.
//!
//! # Design
//! - `Client` keeps no state between calls; the transport owns any pooling.
//! - Each call is split into `build_request` and `parse_response`, with the
//!   transport in between, so the decode logic is testable without I/O.
//! - `classify` is a pure function from `(body, status)` to one outcome.
//! - Output slots are typed (`Vec<u8>`, `String`, `Option<T>`, `()`), so a
//!   document can only land in a slot that expects it.
//!
//! ```no_run
//! use nfe_core::{Client, ClientConfig, Headers, NO_PARAMS};
//!
//! # fn main() -> Result<(), nfe_core::ApiError> {
//! let client = Client::new(ClientConfig::from_env()?);
//! let mut pdf: Vec<u8> = Vec::new();
//! client.get("companies/1/serviceinvoices/2/pdf", NO_PARAMS, &Headers::new(), &mut pdf)?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod slot;
pub mod transport;

pub use classify::{classify, status_text, Document, Outcome, SUCCESS_STATUSES};
pub use client::{Client, NO_PARAMS};
pub use config::{
    Authorizer, AuthorizerFn, ClientConfig, EndpointResolver, EndpointRoute, ADDRESS_URL, PRODUCT_URL, SERVICE_URL,
};
pub use error::{ApiError, BoxError, ErrorCollection, ErrorEntry, ErrorMessage, StructuredError};
pub use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse, Params};
pub use slot::ResponseSlot;
pub use transport::{Transport, UreqTransport, DEFAULT_MAX_BODY_SIZE};
