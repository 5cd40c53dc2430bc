//! The seam between request construction and the network.
//!
//! # Design
//! `VoucherifyClient` never opens a socket itself. It hands a finished
//! `HttpRequest` to a `Transport` and interprets whatever `HttpResponse`
//! comes back. Error statuses are *responses*, not transport failures: a
//! transport must return 4xx/5xx replies as `Ok` so the client can map them.
//!
//! Any `Fn(&HttpRequest) -> Result<HttpResponse, TransportError>` closure is
//! a transport, which keeps tests free of sockets. `UreqTransport` (feature
//! `ureq`, on by default) is the blocking implementation used in production.

use thiserror::Error;

use crate::http::{HttpRequest, HttpResponse};

/// The exchange could not be completed; no response is available.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{description}")]
pub struct TransportError {
    description: String,
}

impl TransportError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Executes one HTTP round-trip.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use std::time::Duration;

    use tracing::trace;

    use super::{Transport, TransportError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    ///
    /// The agent is configured with `http_status_as_error(false)` so error
    /// statuses come back as data and are mapped by the client.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            Self::build(None)
        }

        /// A transport whose every call fails after `timeout` in total.
        pub fn with_timeout(timeout: Duration) -> Self {
            Self::build(Some(timeout))
        }

        /// Wrap an agent configured by the caller. The agent must be built
        /// with `http_status_as_error(false)`, or error statuses surface as
        /// transport failures instead of `ApiError::HttpError`.
        pub fn from_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }

        fn build(timeout: Option<Duration>) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = request.url.as_str();
            let headers = request.headers.as_slice();
            let body = request.body.as_deref();

            let result = match (request.method, body) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
                (HttpMethod::Delete, None) => with_headers(self.agent.delete(url), headers).call(),
                (HttpMethod::Delete, Some(body)) => with_headers(self.agent.delete(url), headers)
                    .force_send_body()
                    .send(body.as_bytes()),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(url), headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            };

            let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;
            let status = response.status().as_u16();
            let response_headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError::new(e.to_string()))?;

            trace!(status, bytes = body.len(), "response received");
            Ok(HttpResponse {
                status,
                headers: response_headers,
                body,
            })
        }
    }
}
