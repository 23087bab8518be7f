//! Financial totals for purchase orders and goods received notes.
//!
//! All arithmetic is `Decimal`. Every derived amount is rounded to the
//! document currency with banker's rounding, and totals are assembled from
//! the rounded parts so that
//! `total_amount == sub_total − discount_amount + tax_amount (+ shipping)`
//! holds exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockyard_shared::types::{Currency, GrnId, PurchaseOrderId};
use tracing::debug;

use crate::error::ProcurementError;
use crate::purchasing::{PurchaseOrder, PurchaseOrderItem};
use crate::receiving::{Grn, GrnItem};
use crate::repository::Repositories;

/// Derived header amounts of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Gross line value before discount.
    pub sub_total: Decimal,
    /// Discount applied to the document.
    pub discount_amount: Decimal,
    /// Tax on the discounted value.
    pub tax_amount: Decimal,
    /// Amount payable.
    pub total_amount: Decimal,
}

/// Derived amounts of a purchase order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    /// `quantity × unit_price − discount_amount`.
    pub total_price: Decimal,
    /// `total_price × tax_rate / 100`.
    pub tax_amount: Decimal,
}

fn too_large() -> ProcurementError {
    ProcurementError::InvalidInput("amount is too large".into())
}

fn times(quantity: i64, unit_price: Decimal) -> Result<Decimal, ProcurementError> {
    Decimal::from(quantity).checked_mul(unit_price).ok_or_else(too_large)
}

fn percent_of(amount: Decimal, rate: Decimal) -> Result<Decimal, ProcurementError> {
    amount
        .checked_mul(rate)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(too_large)
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, ProcurementError> {
    a.checked_add(b).ok_or_else(too_large)
}

fn sub(a: Decimal, b: Decimal) -> Result<Decimal, ProcurementError> {
    a.checked_sub(b).ok_or_else(too_large)
}

fn sum<I>(amounts: I) -> Result<Decimal, ProcurementError>
where
    I: IntoIterator<Item = Result<Decimal, ProcurementError>>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| add(acc, amount?))
}

/// Computes document totals and keeps stored headers in step with their items.
///
/// The associated functions are pure and work on what is attached. The
/// methods reach the repositories: `apply_*` loads missing items, and
/// `recompute_*` also persists the result.
///
/// Amounts that overflow `Decimal` fail with `InvalidInput`.
#[derive(Clone)]
pub struct FinancialCalculator {
    repos: Repositories,
}

impl FinancialCalculator {
    /// Creates a calculator over the given repositories.
    #[must_use]
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Amounts of one purchase order line.
    pub fn purchase_order_line(
        quantity: i64,
        unit_price: Decimal,
        discount_amount: Decimal,
        tax_rate: Decimal,
        currency: Currency,
    ) -> Result<LineAmounts, ProcurementError> {
        let total_price = sub(
            currency.round(times(quantity, unit_price)?),
            currency.round(discount_amount),
        )?;
        Ok(LineAmounts {
            total_price,
            tax_amount: currency.round(percent_of(total_price, tax_rate)?),
        })
    }

    /// Value of the accepted goods on one GRN line.
    pub fn grn_line_total(
        accepted_quantity: i64,
        unit_price: Decimal,
        currency: Currency,
    ) -> Result<Decimal, ProcurementError> {
        Ok(currency.round(times(accepted_quantity, unit_price)?))
    }

    /// Totals of a purchase order from its lines.
    ///
    /// Tax is charged on the discounted subtotal; shipping is added untaxed.
    pub fn purchase_order_totals(
        items: &[PurchaseOrderItem],
        tax_rate: Decimal,
        shipping_cost: Decimal,
        currency: Currency,
    ) -> Result<DocumentTotals, ProcurementError> {
        let sub_total = sum(items.iter().map(|item| {
            times(item.quantity, item.unit_price).map(|gross| currency.round(gross))
        }))?;
        let discount_amount = sum(items.iter().map(|item| Ok(currency.round(item.discount_amount))))?;
        let net = sub(sub_total, discount_amount)?;
        let tax_amount = currency.round(percent_of(net, tax_rate)?);

        Ok(DocumentTotals {
            sub_total,
            discount_amount,
            tax_amount,
            total_amount: add(add(net, tax_amount)?, currency.round(shipping_cost))?,
        })
    }

    /// Totals of a GRN from its lines and the parent order's totals.
    ///
    /// The GRN carries the order's discount in proportion to the share of the
    /// order subtotal it delivers. An order with a zero subtotal passes on no
    /// discount.
    pub fn grn_totals(
        items: &[GrnItem],
        tax_rate: Decimal,
        order_sub_total: Decimal,
        order_discount: Decimal,
        currency: Currency,
    ) -> Result<DocumentTotals, ProcurementError> {
        let sub_total = sum(items.iter().map(|item| Ok(currency.round(item.total_price))))?;
        let discount_amount = if order_sub_total.is_zero() {
            Decimal::ZERO
        } else {
            let share = order_discount
                .checked_mul(sub_total)
                .and_then(|scaled| scaled.checked_div(order_sub_total))
                .ok_or_else(too_large)?;
            currency.round(share)
        };
        let net = sub(sub_total, discount_amount)?;
        let tax_amount = currency.round(percent_of(net, tax_rate)?);

        Ok(DocumentTotals {
            sub_total,
            discount_amount,
            tax_amount,
            total_amount: add(net, tax_amount)?,
        })
    }

    /// Recomputes every attached line and the header of `order` in place.
    ///
    /// On error `order` may be partly updated; callers discard it.
    pub fn refresh_purchase_order(order: &mut PurchaseOrder) -> Result<(), ProcurementError> {
        for item in &mut order.items {
            let line = Self::purchase_order_line(
                item.quantity,
                item.unit_price,
                item.discount_amount,
                order.tax_rate,
                order.currency,
            )?;
            item.total_price = line.total_price;
            item.tax_amount = line.tax_amount;
        }

        let totals = Self::purchase_order_totals(
            &order.items,
            order.tax_rate,
            order.shipping_cost,
            order.currency,
        )?;
        order.sub_total = totals.sub_total;
        order.discount_amount = totals.discount_amount;
        order.tax_amount = totals.tax_amount;
        order.total_amount = totals.total_amount;
        Ok(())
    }

    /// Recomputes `order` in place, loading its items from the repository
    /// when none are attached. Nothing is persisted.
    pub fn apply_purchase_order_totals(
        &self,
        order: &mut PurchaseOrder,
    ) -> Result<(), ProcurementError> {
        if order.items.is_empty() {
            order.items = self.repos.purchase_orders.list_items(order.id)?;
        }
        Self::refresh_purchase_order(order)
    }

    /// Recomputes every attached line and the header of `grn` in place,
    /// taking the discount share from `order`.
    pub fn refresh_grn(grn: &mut Grn, order: &PurchaseOrder) -> Result<(), ProcurementError> {
        for item in &mut grn.items {
            item.total_price =
                Self::grn_line_total(item.accepted_quantity, item.unit_price, grn.currency)?;
        }

        let totals = Self::grn_totals(
            &grn.items,
            grn.tax_rate,
            order.sub_total,
            order.discount_amount,
            grn.currency,
        )?;
        grn.sub_total = totals.sub_total;
        grn.discount_amount = totals.discount_amount;
        grn.tax_amount = totals.tax_amount;
        grn.total_amount = totals.total_amount;
        Ok(())
    }

    /// Recomputes `grn` in place against `order`, loading its items from the
    /// repository when none are attached. Nothing is persisted.
    pub fn apply_grn_totals(&self, grn: &mut Grn, order: &PurchaseOrder) -> Result<(), ProcurementError> {
        if grn.items.is_empty() {
            grn.items = self.repos.receipts.list_items(grn.id)?;
        }
        Self::refresh_grn(grn, order)
    }

    /// Loads a purchase order, recomputes its totals and persists the header.
    pub fn recompute_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        let mut order = self
            .repos
            .purchase_orders
            .get_by_id(id)?
            .ok_or(ProcurementError::PurchaseOrderNotFound(id))?;

        self.apply_purchase_order_totals(&mut order)?;
        let stored = self
            .repos
            .purchase_orders
            .update(&order)
            .map_err(ProcurementError::from_purchase_order_write)?;

        debug!(po_number = %stored.po_number, total = %stored.total_amount, "recomputed purchase order totals");
        Ok(stored)
    }

    /// Loads a GRN and its purchase order, recomputes and persists the GRN.
    pub fn recompute_grn(&self, id: GrnId) -> Result<Grn, ProcurementError> {
        let mut grn = self
            .repos
            .receipts
            .get_by_id(id)?
            .ok_or(ProcurementError::GrnNotFound(id))?;
        let order = self
            .repos
            .purchase_orders
            .get_by_id(grn.purchase_order_id)?
            .ok_or(ProcurementError::PurchaseOrderNotFound(grn.purchase_order_id))?;

        self.apply_grn_totals(&mut grn, &order)?;
        let stored = self
            .repos
            .receipts
            .update(&grn)
            .map_err(ProcurementError::from_grn_write)?;

        debug!(grn_number = %stored.grn_number, total = %stored.total_amount, "recomputed GRN totals");
        Ok(stored)
    }
}
