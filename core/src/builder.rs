//! Fluent construction of `Voucher` values.
//!
//! The builder does no validation: the service is the authority on what a
//! valid voucher is, and malformed values are passed through for it to
//! reject.

use crate::types::{DateValue, Discount, RedemptionLimit, Voucher};

/// Accumulates voucher fields; every setter consumes and returns the
/// builder so calls chain, and `build` hands back the finished value.
///
/// ```
/// use voucherify_core::VoucherBuilder;
///
/// let voucher = VoucherBuilder::new()
///     .set_campaign("Winter")
///     .set_amount_discount(10.0)
///     .set_redemption_limit(1)
///     .build();
/// assert!(voucher.code.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VoucherBuilder {
    voucher: Voucher,
}

impl VoucherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_code(mut self, code: impl Into<String>) -> Self {
        self.voucher.code = Some(code.into());
        self
    }

    pub fn set_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.voucher.campaign = Some(campaign.into());
        self
    }

    pub fn set_category(mut self, category: impl Into<String>) -> Self {
        self.voucher.category = Some(category.into());
        self
    }

    /// Amount off in major currency units; stored multiplied by 100.
    /// Replaces any discount set earlier.
    pub fn set_amount_discount(mut self, amount_off: f64) -> Self {
        self.voucher.discount = Some(Discount::amount(amount_off));
        self
    }

    /// Replaces any discount set earlier.
    pub fn set_percent_discount(mut self, percent_off: f64) -> Self {
        self.voucher.discount = Some(Discount::Percent { percent_off });
        self
    }

    /// Replaces any discount set earlier.
    pub fn set_unit_discount(mut self, unit_off: f64, unit_type: impl Into<String>) -> Self {
        self.voucher.discount = Some(Discount::Unit {
            unit_off,
            unit_type: unit_type.into(),
        });
        self
    }

    pub fn set_start_date(mut self, start_date: impl Into<DateValue>) -> Self {
        self.voucher.start_date = Some(start_date.into().into_string());
        self
    }

    pub fn set_expiration_date(mut self, expiration_date: impl Into<DateValue>) -> Self {
        self.voucher.expiration_date = Some(expiration_date.into().into_string());
        self
    }

    pub fn set_redemption_limit(mut self, quantity: u64) -> Self {
        self.voucher.redemption = Some(RedemptionLimit { quantity });
        self
    }

    pub fn set_active(mut self, active: bool) -> Self {
        self.voucher.active = Some(active);
        self
    }

    pub fn build(self) -> Voucher {
        self.voucher
    }
}
