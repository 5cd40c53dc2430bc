//! Error types for the Voucherify client.
//!
//! # Design
//! Transport failures and error statuses are separate variants so callers
//! can match on them, but both render the same text the service's other
//! SDKs produce (`Unexpected status code: 404 - Details: ...`), which keeps
//! message-based handling working. No variant per status code: 404 and 409
//! both land in `HttpError` with the raw body.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors returned by `VoucherifyClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the exchange (connection refused,
    /// DNS failure, timeout). Carries the transport's own description.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a status code of 400 or above.
    #[error("Unexpected status code: {status} - Details: {body}")]
    HttpError { status: u16, body: String },

    /// A success response body was not valid JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A structured redeem value did not name the voucher to redeem.
    #[error("invalid redemption context: {0}")]
    InvalidRedeemContext(String),

    /// An identifier would be read as a `.` or `..` path segment and
    /// address a different resource.
    #[error("identifier cannot be used as a path segment: {0:?}")]
    InvalidPathSegment(String),

    /// The configured base URL cannot have path segments appended.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The HTTP status code, when the service answered with an error status.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
