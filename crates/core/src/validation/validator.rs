//! Field, range and length validation for purchase orders and GRNs.
//!
//! Validation is pure: nothing here touches a repository. Existence checks
//! (supplier, product, purchase order) are done by the managers.

use rust_decimal::Decimal;
use stockyard_shared::config::LimitsConfig;
use stockyard_shared::types::Currency;
use tracing::trace;

use crate::error::ProcurementError;
use crate::purchasing::{PurchaseOrder, PurchaseOrderInput, PurchaseOrderItemInput};
use crate::receiving::{Grn, GrnInput, GrnItemInput};

const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Validates purchase order and GRN payloads against configured limits.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationValidator {
    limits: LimitsConfig,
}

impl Default for ReconciliationValidator {
    fn default() -> Self {
        Self::new(LimitsConfig::default())
    }
}

impl ReconciliationValidator {
    /// Creates a validator enforcing the given limits.
    #[must_use]
    pub const fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validates a purchase order header payload.
    ///
    /// Create and update are validated identically; `is_update` is recorded
    /// on the trace event only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing supplier, creator or order date,
    /// a tax rate outside 0-100, negative shipping, or oversized text.
    pub fn validate_purchase_order(
        &self,
        input: &PurchaseOrderInput,
        is_update: bool,
    ) -> Result<(), ProcurementError> {
        trace!(is_update, "validating purchase order header");

        if input.supplier_id.is_none() {
            return Err(invalid("supplier_id is required"));
        }
        if input.created_by_id.is_none() {
            return Err(invalid("created_by_id is required"));
        }
        if input.order_date.is_none() {
            return Err(invalid("order_date is required"));
        }

        self.check_document_number("po_number", input.po_number.as_deref())?;
        if let Some(rate) = input.tax_rate {
            check_tax_rate(rate)?;
        }
        if let Some(shipping) = input.shipping_cost {
            check_non_negative("shipping_cost", shipping)?;
        }

        let limits = &self.limits;
        check_length("reference", input.reference.as_deref(), limits.max_reference_length)?;
        check_length("terms", input.terms.as_deref(), limits.max_terms_length)?;
        check_length("notes", input.notes.as_deref(), limits.max_notes_length)?;
        check_length(
            "delivery_address",
            input.delivery_address.as_deref(),
            limits.max_delivery_field_length,
        )?;
        check_length(
            "shipping_method",
            input.shipping_method.as_deref(),
            limits.max_delivery_field_length,
        )
    }

    /// Validates a purchase order line payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if the quantity is not positive, and
    /// `InvalidInput` for a negative price, a discount outside
    /// `0..=quantity × unit_price`, or oversized notes.
    pub fn validate_purchase_order_item(
        &self,
        input: &PurchaseOrderItemInput,
    ) -> Result<(), ProcurementError> {
        if input.quantity <= 0 {
            return Err(ProcurementError::InvalidQuantity(format!(
                "quantity must be greater than zero, got {}",
                input.quantity
            )));
        }
        check_non_negative("unit_price", input.unit_price)?;
        check_non_negative("discount_amount", input.discount_amount)?;

        let gross = Decimal::from(input.quantity)
            .checked_mul(input.unit_price)
            .ok_or_else(|| invalid("line amount is too large"))?;
        if input.discount_amount > gross {
            return Err(invalid(format!(
                "discount_amount {} exceeds line amount {gross}",
                input.discount_amount
            )));
        }

        check_length("notes", input.notes.as_deref(), self.limits.max_notes_length)
    }

    /// Re-checks a purchase order after its totals have been computed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any money field is negative, the tax rate
    /// is outside 0-100, or a line price or discount has more decimals than
    /// the order currency.
    pub fn validate_purchase_order_amounts(
        &self,
        order: &PurchaseOrder,
    ) -> Result<(), ProcurementError> {
        check_tax_rate(order.tax_rate)?;
        for item in &order.items {
            check_scale("unit_price", item.unit_price, order.currency)?;
            check_scale("discount_amount", item.discount_amount, order.currency)?;
        }
        check_non_negative("sub_total", order.sub_total)?;
        check_non_negative("discount_amount", order.discount_amount)?;
        check_non_negative("tax_amount", order.tax_amount)?;
        check_non_negative("shipping_cost", order.shipping_cost)?;
        check_non_negative("total_amount", order.total_amount)
    }

    /// Validates a GRN header payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a missing purchase order, supplier,
    /// receiver or received date, a tax rate outside 0-100, or oversized text.
    pub fn validate_grn(&self, input: &GrnInput, is_update: bool) -> Result<(), ProcurementError> {
        trace!(is_update, "validating GRN header");

        if input.purchase_order_id.is_none() {
            return Err(invalid("purchase_order_id is required"));
        }
        if input.supplier_id.is_none() {
            return Err(invalid("supplier_id is required"));
        }
        if input.received_by_id.is_none() {
            return Err(invalid("received_by_id is required"));
        }
        if input.received_date.is_none() {
            return Err(invalid("received_date is required"));
        }

        self.check_document_number("grn_number", input.grn_number.as_deref())?;
        if let Some(rate) = input.tax_rate {
            check_tax_rate(rate)?;
        }

        let limits = &self.limits;
        check_length(
            "delivery_note_number",
            input.delivery_note_number.as_deref(),
            limits.max_reference_length,
        )?;
        check_length("carrier", input.carrier.as_deref(), limits.max_delivery_field_length)?;
        check_length(
            "vehicle_number",
            input.vehicle_number.as_deref(),
            limits.max_delivery_field_length,
        )?;
        check_length("notes", input.notes.as_deref(), limits.max_notes_length)
    }

    /// Validates a GRN line payload.
    ///
    /// The ordered-quantity ceiling needs the purchase order line and is
    /// checked by the receiving manager.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for negative quantities or when accepted plus
    /// rejected exceeds received, and `InvalidInput` for a negative price or
    /// oversized notes.
    pub fn validate_grn_item(&self, input: &GrnItemInput) -> Result<(), ProcurementError> {
        for (field, value) in [
            ("received_quantity", input.received_quantity),
            ("accepted_quantity", input.accepted_quantity),
            ("rejected_quantity", input.rejected_quantity),
        ] {
            if value < 0 {
                return Err(ProcurementError::InvalidQuantity(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }

        let inspected = input
            .accepted_quantity
            .checked_add(input.rejected_quantity)
            .ok_or_else(|| ProcurementError::InvalidQuantity("quantity is too large".into()))?;
        if inspected > input.received_quantity {
            return Err(ProcurementError::InvalidQuantity(format!(
                "accepted ({}) plus rejected ({}) exceeds received ({})",
                input.accepted_quantity, input.rejected_quantity, input.received_quantity
            )));
        }

        if let Some(price) = input.unit_price {
            check_non_negative("unit_price", price)?;
        }
        check_length("notes", input.notes.as_deref(), self.limits.max_notes_length)
    }

    /// Re-checks a GRN after its totals have been computed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if any money field is negative, the tax rate
    /// is outside 0-100, or a line price has more decimals than the GRN
    /// currency.
    pub fn validate_grn_amounts(&self, grn: &Grn) -> Result<(), ProcurementError> {
        check_tax_rate(grn.tax_rate)?;
        for item in &grn.items {
            check_scale("unit_price", item.unit_price, grn.currency)?;
        }
        check_non_negative("sub_total", grn.sub_total)?;
        check_non_negative("discount_amount", grn.discount_amount)?;
        check_non_negative("tax_amount", grn.tax_amount)?;
        check_non_negative("total_amount", grn.total_amount)
    }

    fn check_document_number(
        &self,
        field: &str,
        number: Option<&str>,
    ) -> Result<(), ProcurementError> {
        if let Some(number) = number {
            if number.trim().is_empty() {
                return Err(invalid(format!("{field} must not be blank")));
            }
            check_length(field, Some(number), self.limits.max_number_length)?;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ProcurementError {
    ProcurementError::InvalidInput(message.into())
}

fn check_tax_rate(rate: Decimal) -> Result<(), ProcurementError> {
    if rate < Decimal::ZERO || rate > MAX_TAX_RATE {
        return Err(invalid(format!("tax_rate must be between 0 and 100, got {rate}")));
    }
    Ok(())
}

fn check_non_negative(field: &str, amount: Decimal) -> Result<(), ProcurementError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid(format!("{field} must not be negative, got {amount}")));
    }
    Ok(())
}

// Amounts may not be finer than the currency's minor unit.
fn check_scale(field: &str, amount: Decimal, currency: Currency) -> Result<(), ProcurementError> {
    let places = currency.decimal_places();
    if amount.normalize().scale() > places {
        return Err(invalid(format!(
            "{field} {amount} has more than {places} decimal places for {currency}"
        )));
    }
    Ok(())
}

// Lengths are counted in characters, not bytes.
fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ProcurementError> {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            return Err(invalid(format!(
                "{field} is {len} characters, maximum is {max}"
            )));
        }
    }
    Ok(())
}
