//! Request construction, dispatch and response interpretation for the
//! Voucherify API.
//!
//! # Design
//! Every operation is split in two. A `build_*` method produces an
//! `HttpRequest` without touching the network, and `parse_response` turns
//! an `HttpResponse` into a JSON value or an `ApiError`. The blocking
//! operation methods (`get`, `create`, `redeem`, ...) chain the two through
//! the client's `Transport`. Callers that run their own I/O can use the
//! `build_*` / `parse_response` halves directly.
//!
//! All requests go through `build_request`, which owns the rules for when a
//! query string or body is attached, path encoding, and headers.

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{RedeemTarget, Voucher};

/// Blocking client for the Voucherify API.
///
/// Holds credentials and a transport; nothing else is kept between calls.
/// Credential setters take `&mut self`, so they cannot race an in-flight
/// request on a shared client.
#[derive(Debug, Clone)]
pub struct VoucherifyClient<T> {
    config: ClientConfig,
    transport: T,
}

impl<T> VoucherifyClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_app_id(&mut self, app_id: impl Into<String>) {
        self.config.credentials.app_id = app_id.into();
    }

    pub fn set_app_token(&mut self, app_token: impl Into<String>) {
        self.config.credentials.app_token = SecretString::from(app_token.into());
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get(&self, code: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, &["vouchers", code], None, None)
    }

    /// `POST /vouchers/{code}` when the voucher names its code, otherwise
    /// `POST /vouchers/` and the service generates one. The voucher is sent
    /// in full either way.
    pub fn build_create(&self, voucher: &Voucher) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_value(voucher)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let code = voucher.code.as_deref().unwrap_or("");
        self.build_request(HttpMethod::Post, &["vouchers", code], None, Some(&body))
    }

    pub fn build_enable(&self, code: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, &["vouchers", code, "enable"], None, None)
    }

    pub fn build_disable(&self, code: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, &["vouchers", code, "disable"], None, None)
    }

    pub fn build_redemption(&self, code: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, &["vouchers", code, "redemption", ""], None, None)
    }

    pub fn build_redeem(
        &self,
        target: &RedeemTarget,
        tracking_id: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let query = Filter::new().optional_param("tracking_id", tracking_id);
        let body = target.body();
        self.build_request(
            HttpMethod::Post,
            &["vouchers", target.code(), "redemption", ""],
            Some(&query),
            body.as_ref(),
        )
    }

    pub fn build_rollback(
        &self,
        redemption_id: &str,
        tracking_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let query = Filter::new()
            .optional_param("tracking_id", tracking_id)
            .optional_param("reason", reason);
        self.build_request(
            HttpMethod::Post,
            &["redemptions", redemption_id, "rollback", ""],
            Some(&query),
            None,
        )
    }

    pub fn build_vouchers(&self, filter: &Filter) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, &["vouchers", ""], Some(filter), None)
    }

    pub fn build_redemptions(&self, filter: &Filter) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, &["redemptions", ""], Some(filter), None)
    }

    /// Assemble a request against the configured base URL.
    ///
    /// `segments` are percent-encoded one by one; an empty final segment
    /// yields a trailing slash. A `.` or `..` segment is rejected with
    /// `ApiError::InvalidPathSegment`. The query is attached only to GET
    /// and POST and only when at least one non-null pair remains. The body
    /// is attached only to POST, PUT and DELETE.
    pub fn build_request(
        &self,
        method: HttpMethod,
        segments: &[&str],
        query: Option<&Filter>,
        body: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        // URL normalization drops dot segments, even percent-encoded ones.
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidPathSegment(dot.to_string()));
        }

        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if method.carries_query() {
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in query.pairs() {
                    pairs.append_pair(key, value);
                }
            }
        }

        let body = match body {
            Some(value) if method.carries_body() => Some(
                serde_json::to_string(value)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?,
            ),
            _ => None,
        };

        let credentials = &self.config.credentials;
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-App-Id".to_string(), credentials.app_id.clone()),
            ("X-App-Token".to_string(), credentials.token().to_string()),
            ("X-Voucherify-Channel".to_string(), self.config.channel.clone()),
        ];

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    // -----------------------------------------------------------------------
    // Response parsing
    // -----------------------------------------------------------------------

    /// Map error statuses to `ApiError::HttpError` and decode anything else
    /// as JSON. An empty success body decodes to `Value::Null`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if response.status >= 400 {
            warn!(status = response.status, "voucherify returned an error status");
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

impl<T: Transport> VoucherifyClient<T> {
    /// Send a built request through the transport and parse the reply.
    pub fn execute(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(&request).map_err(|e| {
            warn!(method = %request.method, url = %request.url, error = %e, "transport failure");
            ApiError::Transport(e)
        })?;
        self.parse_response(response)
    }

    /// The canonical request routine: build, send, parse.
    pub fn request(
        &self,
        method: HttpMethod,
        segments: &[&str],
        query: Option<&Filter>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.execute(self.build_request(method, segments, query, body)?)
    }

    /// Fetch a voucher by code.
    pub fn get(&self, code: &str) -> Result<Value, ApiError> {
        self.execute(self.build_get(code)?)
    }

    pub fn create(&self, voucher: &Voucher) -> Result<Value, ApiError> {
        self.execute(self.build_create(voucher)?)
    }

    pub fn enable(&self, code: &str) -> Result<Value, ApiError> {
        self.execute(self.build_enable(code)?)
    }

    pub fn disable(&self, code: &str) -> Result<Value, ApiError> {
        self.execute(self.build_disable(code)?)
    }

    /// Redemption summary and history of a voucher.
    pub fn redemption(&self, code: &str) -> Result<Value, ApiError> {
        self.execute(self.build_redemption(code)?)
    }

    /// Redeem a voucher. `target` is a bare code or a `RedemptionContext`
    /// whose extra fields (customer, order, ...) become the request body.
    pub fn redeem(
        &self,
        target: impl Into<RedeemTarget>,
        tracking_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.execute(self.build_redeem(&target.into(), tracking_id)?)
    }

    /// Roll back a redemption: adds a rollback entry to the voucher's
    /// redemption history and returns one redemption to the pool.
    pub fn rollback(
        &self,
        redemption_id: &str,
        tracking_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.execute(self.build_rollback(redemption_id, tracking_id, reason)?)
    }

    pub fn vouchers(&self, filter: impl Into<Filter>) -> Result<Value, ApiError> {
        self.execute(self.build_vouchers(&filter.into())?)
    }

    pub fn redemptions(&self, filter: impl Into<Filter>) -> Result<Value, ApiError> {
        self.execute(self.build_redemptions(&filter.into())?)
    }
}

#[cfg(feature = "ureq")]
impl VoucherifyClient<crate::transport::UreqTransport> {
    pub fn with_default_transport(config: ClientConfig) -> Self {
        Self::new(config, crate::transport::UreqTransport::new())
    }
}
