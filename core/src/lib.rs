//! Blocking client for the Voucherify voucher and promotion API.
//!
//! # Overview
//! - [`VoucherBuilder`] assembles a [`Voucher`] from individual setters.
//! - [`VoucherifyClient`] creates, fetches, enables/disables, redeems and
//!   rolls back vouchers, and lists vouchers and redemptions with filters.
//!
//! # Design
//! - Requests and responses are plain data ([`HttpRequest`],
//!   [`HttpResponse`]). The client builds one, hands it to a [`Transport`],
//!   and parses what comes back; the `build_*` / `parse_response` halves are
//!   public for callers that run the I/O themselves.
//! - One error type, [`ApiError`], separates transport failures from error
//!   statuses while keeping the `Unexpected status code: N - Details: ...`
//!   message text.
//! - [`UreqTransport`] (feature `ureq`, enabled by default) is the blocking
//!   transport used by [`VoucherifyClient::with_default_transport`].
//!
//! ```no_run
//! use voucherify_core::{ClientConfig, VoucherBuilder, VoucherifyClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = VoucherifyClient::with_default_transport(ClientConfig::from_env()?);
//! let voucher = VoucherBuilder::new()
//!     .set_code("WELCOME-10")
//!     .set_percent_discount(10.0)
//!     .set_redemption_limit(100)
//!     .build();
//! client.create(&voucher)?;
//! client.redeem("WELCOME-10", Some("customer-42"))?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod transport;
pub mod types;

pub use builder::VoucherBuilder;
pub use client::VoucherifyClient;
pub use config::{ClientConfig, ConfigError, Credentials};
pub use error::ApiError;
pub use filter::{Filter, RedemptionFilter, RedemptionResult, VoucherFilter};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{DateValue, Discount, RedeemTarget, RedemptionContext, RedemptionLimit, Voucher};
