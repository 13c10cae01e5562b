//! # Transport Contract
//!
//! The capability the repository engine needs from its embedder: send one
//! HTTP request to the storage server, get back a status code and body.
//!
//! - **Request-Response**: one request, one response, no retry state held
//!   here. Retrying is the caller's decision per call.
//! - **Status-Agnostic**: a non-2xx status is *not* an error at this layer.
//!   Status interpretation belongs to the repository engine; only transport
//!   failures (unreachable host, rejected fetch, timeout) surface as `Err`.

use std::fmt;

use crate::marker::MaybeSend;
use crate::marker::MaybeSync;

/// Errors that occur at the transport layer.
#[derive(Debug, Clone)]
pub enum Error {
    /// The host fetch primitive rejected the request (network failure,
    /// CORS, malformed URL, ...).
    Fetch(String),
    /// No response or error arrived within the request timeout.
    Timeout,
    /// Internal transport failure.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(msg) => write!(f, "fetch failed: {}", msg),
            Self::Timeout => write!(f, "request timed out"),
            Self::Io(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// One outgoing HTTP request. Transient, one per round trip.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    /// `None` means no body at all, which some hosts treat differently from
    /// an empty one for verbs like GET.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>, body: Option<Vec<u8>>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body,
        }
    }
}

/// The response to one request.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A mechanism to perform one HTTP round trip.
///
/// Synchronous from the calling task's viewpoint: the future resolves only
/// once the full response body is available. Designed to be object-safe
/// (`Arc<dyn Transport>`).
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait Transport: MaybeSend + MaybeSync + 'static {
    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse>;
}
