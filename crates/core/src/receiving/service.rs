//! Goods received note manager.
//!
//! A GRN can only be raised against an `Ordered` purchase order from the same
//! supplier. Each GRN line points at a purchase order line, snapshots its
//! quantity and may not receive more than that snapshot.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use stockyard_shared::config::AppConfig;
use stockyard_shared::types::{GrnId, GrnItemId, PageRequest, PageResponse, PurchaseOrderId, UserId};
use tracing::{info, warn};

use crate::error::ProcurementError;
use crate::finance::FinancialCalculator;
use crate::numbering::{DocumentKind, DocumentNumberGenerator};
use crate::purchasing::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};
use crate::receiving::summary::ReceiptSummary;
use crate::receiving::types::{Grn, GrnFilter, GrnInput, GrnItem, GrnItemInput, GrnStatus};
use crate::repository::Repositories;
use crate::validation::ReconciliationValidator;

/// Owns the GRN lifecycle, its items and its status transitions.
#[derive(Clone)]
pub struct GoodsReceiptManager {
    repos: Repositories,
    numbers: Arc<DocumentNumberGenerator>,
    validator: ReconciliationValidator,
}

impl GoodsReceiptManager {
    /// Creates a manager over the given repositories.
    #[must_use]
    pub fn new(
        repos: Repositories,
        numbers: Arc<DocumentNumberGenerator>,
        config: &AppConfig,
    ) -> Self {
        Self {
            repos,
            numbers,
            validator: ReconciliationValidator::new(config.limits),
        }
    }

    // ========== Lifecycle ==========

    /// Records a delivery against an ordered purchase order.
    ///
    /// Currency and tax rate default to the purchase order's.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` / `InvalidQuantity` for an invalid header or line
    /// - `PurchaseOrderNotFound`, `PurchaseOrderNotOrdered`, `SupplierMismatch`
    /// - `PurchaseOrderItemNotFound` if a line is not on the purchase order
    /// - `QuantityExceedsOrdered` if a line receives more than was ordered
    /// - `GrnExists` if the given number is taken
    /// - `ConcurrentModification` if the purchase order changed meanwhile
    pub fn create_grn(
        &self,
        input: GrnInput,
        items: Vec<GrnItemInput>,
    ) -> Result<Grn, ProcurementError> {
        self.validator.validate_grn(&input, false)?;
        for item in &items {
            self.validator.validate_grn_item(item)?;
        }

        let order_id = required(input.purchase_order_id, "purchase_order_id")?;
        let supplier_id = required(input.supplier_id, "supplier_id")?;
        let received_by_id = required(input.received_by_id, "received_by_id")?;
        let received_date = required(input.received_date, "received_date")?;

        let order = self.load_order(order_id)?;
        if order.status != PurchaseOrderStatus::Ordered {
            return Err(ProcurementError::PurchaseOrderNotOrdered {
                id: order.id,
                status: order.status,
            });
        }
        if supplier_id != order.supplier_id {
            return Err(ProcurementError::SupplierMismatch {
                expected: order.supplier_id,
                actual: supplier_id,
            });
        }

        let now = Utc::now();
        let grn_number = match input.grn_number {
            Some(number) => {
                let number = number.trim().to_string();
                self.ensure_number_free(&number)?;
                number
            }
            None => self.numbers.next_number(DocumentKind::GoodsReceipt, now, |candidate| {
                Ok(self.repos.receipts.get_by_number(candidate)?.is_some())
            })?,
        };

        let mut grn = Grn {
            id: GrnId::new(),
            grn_number,
            purchase_order_id: order.id,
            supplier_id,
            received_by_id,
            received_date,
            verified_by_id: None,
            verified_at: None,
            status: GrnStatus::Draft,
            currency: input.currency.unwrap_or(order.currency),
            tax_rate: input.tax_rate.unwrap_or(order.tax_rate),
            sub_total: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            delivery_note_number: input.delivery_note_number,
            carrier: input.carrier,
            vehicle_number: input.vehicle_number,
            notes: input.notes,
            items: Vec::with_capacity(items.len()),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        for item in items {
            let order_item = order_line(&order, &item)?;
            push_item(&mut grn, order_item, item)?;
        }

        FinancialCalculator::refresh_grn(&mut grn, &order)?;
        self.validator.validate_grn_amounts(&grn)?;
        self.repos
            .receipts
            .create(&grn)
            .map_err(ProcurementError::from_grn_write)?;
        self.claim_order(&order, &grn)?;

        info!(
            grn_id = %grn.id,
            grn_number = %grn.grn_number,
            po_number = %order.po_number,
            total = %grn.total_amount,
            "GRN created"
        );
        Ok(grn)
    }

    /// Replaces the header fields of a GRN.
    ///
    /// The purchase order link is fixed. Status, verification data and items
    /// are left alone; a missing number, currency or tax rate keeps its
    /// current value.
    ///
    /// # Errors
    ///
    /// - `CannotModifyCompleted` if the stored GRN is completed
    /// - `InvalidInput` if the purchase order differs from the stored one
    /// - `SupplierMismatch`, `GrnExists`
    pub fn update_grn(&self, id: GrnId, input: GrnInput) -> Result<Grn, ProcurementError> {
        self.validator.validate_grn(&input, true)?;
        let order_id = required(input.purchase_order_id, "purchase_order_id")?;
        let supplier_id = required(input.supplier_id, "supplier_id")?;
        let received_by_id = required(input.received_by_id, "received_by_id")?;
        let received_date = required(input.received_date, "received_date")?;

        let mut grn = self.load(id)?;
        ensure_editable(&grn)?;
        if order_id != grn.purchase_order_id {
            return Err(ProcurementError::InvalidInput(
                "the purchase order of a GRN cannot be changed".into(),
            ));
        }

        let order = self.load_order(order_id)?;
        if supplier_id != order.supplier_id {
            return Err(ProcurementError::SupplierMismatch {
                expected: order.supplier_id,
                actual: supplier_id,
            });
        }
        if let Some(number) = input.grn_number {
            let number = number.trim().to_string();
            if number != grn.grn_number {
                self.ensure_number_free(&number)?;
                grn.grn_number = number;
            }
        }

        grn.supplier_id = supplier_id;
        grn.received_by_id = received_by_id;
        grn.received_date = received_date;
        grn.currency = input.currency.unwrap_or(grn.currency);
        grn.tax_rate = input.tax_rate.unwrap_or(grn.tax_rate);
        grn.delivery_note_number = input.delivery_note_number;
        grn.carrier = input.carrier;
        grn.vehicle_number = input.vehicle_number;
        grn.notes = input.notes;

        let stored = self.save(grn, &order)?;
        info!(grn_number = %stored.grn_number, version = stored.version, "GRN updated");
        Ok(stored)
    }

    /// Deletes a GRN and its items.
    ///
    /// # Errors
    ///
    /// `CannotModifyCompleted` if the GRN is completed;
    /// `ConcurrentModification` if it changed after it was loaded.
    pub fn delete_grn(&self, id: GrnId) -> Result<(), ProcurementError> {
        let grn = self.load(id)?;
        ensure_editable(&grn)?;

        self.repos
            .receipts
            .delete(id, grn.version)
            .map_err(ProcurementError::from_grn_write)?;
        info!(grn_number = %grn.grn_number, "GRN deleted");
        Ok(())
    }

    // ========== Status Transitions ==========

    /// Confirms the goods were physically received (`Draft → Received`).
    ///
    /// # Errors
    ///
    /// `InvalidGrnStatus` unless `Draft`.
    pub fn process_grn_receipt(
        &self,
        id: GrnId,
        received_by_id: UserId,
    ) -> Result<Grn, ProcurementError> {
        self.transition(id, GrnStatus::Received, "receive", |grn| {
            grn.received_by_id = received_by_id;
        })
    }

    /// Records who verified a received GRN and when.
    ///
    /// The status stays `Received`.
    ///
    /// # Errors
    ///
    /// `InvalidGrnStatus` unless `Received`.
    pub fn verify_grn(&self, id: GrnId, verifier_id: UserId) -> Result<Grn, ProcurementError> {
        let mut grn = self.load(id)?;
        if grn.status != GrnStatus::Received {
            return Err(ProcurementError::InvalidGrnStatus {
                current: grn.status,
                action: "verify",
            });
        }

        let now = Utc::now();
        grn.verified_by_id = Some(verifier_id);
        grn.verified_at = Some(now);
        grn.updated_at = now;
        let stored = self
            .repos
            .receipts
            .update(&grn)
            .map_err(ProcurementError::from_grn_write)?;
        info!(grn_number = %stored.grn_number, verifier_id = %verifier_id, "GRN verified");
        Ok(stored)
    }

    /// Completes a received GRN (`Received → Completed`), locking it.
    ///
    /// # Errors
    ///
    /// `InvalidGrnStatus` unless `Received`.
    pub fn complete_grn(&self, id: GrnId) -> Result<Grn, ProcurementError> {
        self.transition(id, GrnStatus::Completed, "complete", |_| {})
    }

    // ========== Items ==========

    /// Adds a delivery line and recomputes the GRN totals.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` / `InvalidInput` for an invalid line
    /// - `CannotModifyCompleted` if the GRN is completed
    /// - `PurchaseOrderItemNotFound` if the line is not on the GRN's purchase order
    /// - `QuantityExceedsOrdered`
    pub fn add_grn_item(&self, grn_id: GrnId, input: GrnItemInput) -> Result<Grn, ProcurementError> {
        self.validator.validate_grn_item(&input)?;
        let mut grn = self.load(grn_id)?;
        ensure_editable(&grn)?;

        let order = self.load_order(grn.purchase_order_id)?;
        let order_item = order_line(&order, &input)?;
        push_item(&mut grn, order_item, input)?;

        let stored = self.save(grn, &order)?;
        info!(grn_number = %stored.grn_number, items = stored.items.len(), "GRN item added");
        Ok(stored)
    }

    /// Replaces a delivery line and recomputes the GRN totals.
    ///
    /// Keeping the same purchase order line keeps the ordered-quantity
    /// snapshot and, when no price is given, the current price. Pointing the
    /// line at another purchase order line takes a new snapshot.
    ///
    /// # Errors
    ///
    /// As [`Self::add_grn_item`], plus `GrnItemNotFound`.
    pub fn update_grn_item(
        &self,
        grn_id: GrnId,
        item_id: GrnItemId,
        input: GrnItemInput,
    ) -> Result<Grn, ProcurementError> {
        self.validator.validate_grn_item(&input)?;
        let mut grn = self.load(grn_id)?;
        ensure_editable(&grn)?;

        let order = self.load_order(grn.purchase_order_id)?;
        let order_item = order_line(&order, &input)?;
        let item = grn
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(ProcurementError::GrnItemNotFound(item_id))?;

        let (ordered_quantity, current_price) = if item.purchase_order_item_id == order_item.id {
            (item.ordered_quantity, item.unit_price)
        } else {
            (order_item.quantity, order_item.unit_price)
        };
        if input.received_quantity > ordered_quantity {
            return Err(ProcurementError::QuantityExceedsOrdered {
                ordered: ordered_quantity,
                received: input.received_quantity,
            });
        }

        item.purchase_order_item_id = order_item.id;
        item.product_id = order_item.product_id;
        item.ordered_quantity = ordered_quantity;
        item.received_quantity = input.received_quantity;
        item.accepted_quantity = input.accepted_quantity;
        item.rejected_quantity = input.rejected_quantity;
        item.unit_price = input.unit_price.unwrap_or(current_price);
        item.notes = input.notes;

        let stored = self.save(grn, &order)?;
        info!(grn_number = %stored.grn_number, item_id = %item_id, "GRN item updated");
        Ok(stored)
    }

    /// Removes a delivery line and recomputes the GRN totals.
    ///
    /// # Errors
    ///
    /// `CannotModifyCompleted`, `GrnItemNotFound`.
    pub fn remove_grn_item(&self, grn_id: GrnId, item_id: GrnItemId) -> Result<Grn, ProcurementError> {
        let mut grn = self.load(grn_id)?;
        ensure_editable(&grn)?;

        let position = grn
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(ProcurementError::GrnItemNotFound(item_id))?;
        grn.items.remove(position);
        grn.renumber_items();

        let order = self.load_order(grn.purchase_order_id)?;
        let stored = self.save(grn, &order)?;
        info!(grn_number = %stored.grn_number, item_id = %item_id, "GRN item removed");
        Ok(stored)
    }

    // ========== Queries ==========

    /// Gets a GRN with its items.
    pub fn get_grn(&self, id: GrnId) -> Result<Grn, ProcurementError> {
        self.load(id)
    }

    /// Gets a GRN by its number.
    pub fn get_grn_by_number(&self, grn_number: &str) -> Result<Option<Grn>, ProcurementError> {
        Ok(self.repos.receipts.get_by_number(grn_number.trim())?)
    }

    /// Lists GRN headers, newest first.
    pub fn list_grns(
        &self,
        filter: &GrnFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Grn>, ProcurementError> {
        let total = self.repos.receipts.count(filter)?;
        let data = self.repos.receipts.list(filter, page)?;
        Ok(PageResponse::new(data, page, total))
    }

    /// Searches GRN numbers, delivery note numbers and notes.
    pub fn search_grns(&self, query: &str, page: PageRequest) -> Result<Vec<Grn>, ProcurementError> {
        Ok(self.repos.receipts.search(query.trim(), page)?)
    }

    /// GRN headers with a received date in `[from, to]`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `from` is after `to`.
    pub fn grns_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Grn>, ProcurementError> {
        if from > to {
            return Err(ProcurementError::InvalidInput(format!(
                "date range start {from} is after end {to}"
            )));
        }
        Ok(self.repos.receipts.get_by_date_range(from, to)?)
    }

    /// Every GRN raised against a purchase order, oldest first.
    pub fn grns_for_purchase_order(
        &self,
        order_id: PurchaseOrderId,
    ) -> Result<Vec<Grn>, ProcurementError> {
        self.load_order(order_id)?;
        Ok(self.repos.receipts.list_by_purchase_order(order_id)?)
    }

    /// Rolls up every GRN of a purchase order per order line.
    pub fn receipt_summary(
        &self,
        order_id: PurchaseOrderId,
    ) -> Result<ReceiptSummary, ProcurementError> {
        let order = self.load_order(order_id)?;
        let grns = self.repos.receipts.list_by_purchase_order(order_id)?;
        Ok(ReceiptSummary::build(&order, &grns))
    }

    // ========== Internals ==========

    fn load(&self, id: GrnId) -> Result<Grn, ProcurementError> {
        self.repos
            .receipts
            .get_by_id(id)?
            .ok_or(ProcurementError::GrnNotFound(id))
    }

    fn load_order(&self, id: PurchaseOrderId) -> Result<PurchaseOrder, ProcurementError> {
        self.repos
            .purchase_orders
            .get_by_id(id)?
            .ok_or(ProcurementError::PurchaseOrderNotFound(id))
    }

    // Writes the order back at the version `grn` was built against, so any
    // concurrent write to the order conflicts with it. On failure the new GRN
    // is removed.
    fn claim_order(&self, order: &PurchaseOrder, grn: &Grn) -> Result<(), ProcurementError> {
        let Err(err) = self.repos.purchase_orders.update(order) else {
            return Ok(());
        };
        if let Err(rollback) = self.repos.receipts.delete(grn.id, grn.version) {
            warn!(grn_number = %grn.grn_number, error = %rollback, "failed to remove GRN after order conflict");
        }
        Err(ProcurementError::from_purchase_order_write(err))
    }

    fn save(&self, mut grn: Grn, order: &PurchaseOrder) -> Result<Grn, ProcurementError> {
        grn.updated_at = Utc::now();
        FinancialCalculator::refresh_grn(&mut grn, order)?;
        self.validator.validate_grn_amounts(&grn)?;
        self.repos
            .receipts
            .update(&grn)
            .map_err(ProcurementError::from_grn_write)
    }

    fn transition<F>(
        &self,
        id: GrnId,
        next: GrnStatus,
        action: &'static str,
        apply: F,
    ) -> Result<Grn, ProcurementError>
    where
        F: FnOnce(&mut Grn),
    {
        let mut grn = self.load(id)?;
        let from = grn.status;
        if !from.can_transition_to(next) {
            return Err(ProcurementError::InvalidGrnStatus {
                current: from,
                action,
            });
        }
        apply(&mut grn);
        grn.status = next;
        grn.updated_at = Utc::now();

        let stored = self
            .repos
            .receipts
            .update(&grn)
            .map_err(ProcurementError::from_grn_write)?;
        info!(
            grn_number = %stored.grn_number,
            action,
            from = %from,
            to = %next,
            "GRN status changed"
        );
        Ok(stored)
    }

    fn ensure_number_free(&self, number: &str) -> Result<(), ProcurementError> {
        if self.repos.receipts.get_by_number(number)?.is_some() {
            return Err(ProcurementError::GrnExists(number.to_string()));
        }
        Ok(())
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ProcurementError> {
    value.ok_or_else(|| ProcurementError::InvalidInput(format!("{field} is required")))
}

fn ensure_editable(grn: &Grn) -> Result<(), ProcurementError> {
    if grn.status.is_locked() {
        return Err(ProcurementError::CannotModifyCompleted);
    }
    Ok(())
}

fn order_line<'a>(
    order: &'a PurchaseOrder,
    input: &GrnItemInput,
) -> Result<&'a PurchaseOrderItem, ProcurementError> {
    order
        .item(input.purchase_order_item_id)
        .ok_or(ProcurementError::PurchaseOrderItemNotFound(input.purchase_order_item_id))
}

// Snapshots the ordered quantity; the line total is filled in by the calculator.
fn push_item(
    grn: &mut Grn,
    order_item: &PurchaseOrderItem,
    input: GrnItemInput,
) -> Result<(), ProcurementError> {
    if input.received_quantity > order_item.quantity {
        return Err(ProcurementError::QuantityExceedsOrdered {
            ordered: order_item.quantity,
            received: input.received_quantity,
        });
    }

    let line_no = u32::try_from(grn.items.len() + 1).unwrap_or(u32::MAX);
    grn.items.push(GrnItem {
        id: GrnItemId::new(),
        grn_id: grn.id,
        line_no,
        purchase_order_item_id: order_item.id,
        product_id: order_item.product_id,
        ordered_quantity: order_item.quantity,
        received_quantity: input.received_quantity,
        accepted_quantity: input.accepted_quantity,
        rejected_quantity: input.rejected_quantity,
        unit_price: input.unit_price.unwrap_or(order_item.unit_price),
        total_price: Decimal::ZERO,
        notes: input.notes,
    });
    Ok(())
}
