//! Purchase order manager.
//!
//! Every operation is one read-modify-write cycle: load the order, check its
//! status, mutate in memory, recompute totals and write header and items back
//! in a single versioned update. A stale version surfaces as
//! `ConcurrentModification`.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use stockyard_shared::config::{AppConfig, ProcurementConfig};
use stockyard_shared::types::{
    PageRequest, PageResponse, ProductId, PurchaseOrderId, PurchaseOrderItemId, SupplierId, UserId,
};
use tracing::info;

use crate::error::ProcurementError;
use crate::finance::FinancialCalculator;
use crate::numbering::{DocumentKind, DocumentNumberGenerator};
use crate::purchasing::types::{
    PurchaseOrder, PurchaseOrderFilter, PurchaseOrderInput, PurchaseOrderItem,
    PurchaseOrderItemInput, PurchaseOrderStatus,
};
use crate::receiving::GrnFilter;
use crate::repository::Repositories;
use crate::validation::ReconciliationValidator;

/// Owns the purchase order lifecycle, its items and its status transitions.
#[derive(Clone)]
pub struct PurchaseOrderManager {
    repos: Repositories,
    numbers: Arc<DocumentNumberGenerator>,
    validator: ReconciliationValidator,
    defaults: ProcurementConfig,
}

impl PurchaseOrderManager {
    /// Creates a manager over the given repositories.
    ///
    /// The number generator is shared so that every manager in the process
    /// allocates from the same cursors.
    #[must_use]
    pub fn new(
        repos: Repositories,
        numbers: Arc<DocumentNumberGenerator>,
        config: &AppConfig,
    ) -> Self {
        Self {
            validator: ReconciliationValidator::new(config.limits),
            defaults: config.procurement.clone(),
            numbers,
            repos,
        }
    }

    // ========== Lifecycle ==========

    /// Creates a draft purchase order with its initial lines.
    ///
    /// When no number is given one is allocated for the current month.
    /// Currency and tax rate fall back to the configured defaults.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` / `InvalidQuantity` if the header or a line is invalid
    /// - `SupplierNotFound` / `SupplierInactive`, `ProductNotFound` / `ProductInactive`
    /// - `PurchaseOrderExists` if the given number is taken
    pub fn create_purchase_order(
        &self,
        input: PurchaseOrderInput,
        items: Vec<PurchaseOrderItemInput>,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.validator.validate_purchase_order(&input, false)?;
        for item in &items {
            self.validator.validate_purchase_order_item(item)?;
        }

        let supplier_id = required(input.supplier_id, "supplier_id")?;
        let created_by_id = required(input.created_by_id, "created_by_id")?;
        let order_date = required(input.order_date, "order_date")?;

        self.ensure_supplier(supplier_id)?;
        for item in &items {
            self.ensure_product(item.product_id)?;
        }

        let now = Utc::now();
        let po_number = match input.po_number {
            Some(number) => {
                let number = number.trim().to_string();
                self.ensure_number_free(&number)?;
                number
            }
            None => self.numbers.next_number(DocumentKind::PurchaseOrder, now, |candidate| {
                Ok(self.repos.purchase_orders.get_by_number(candidate)?.is_some())
            })?,
        };

        let mut order = PurchaseOrder {
            id: PurchaseOrderId::new(),
            po_number,
            supplier_id,
            created_by_id,
            approved_by_id: None,
            approved_at: None,
            order_date,
            expected_date: input.expected_date,
            delivery_date: None,
            status: PurchaseOrderStatus::Draft,
            currency: input.currency.unwrap_or(self.defaults.default_currency),
            tax_rate: input.tax_rate.unwrap_or(self.defaults.default_tax_rate),
            shipping_cost: input.shipping_cost.unwrap_or(Decimal::ZERO),
            sub_total: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            reference: input.reference,
            terms: input.terms,
            notes: input.notes,
            delivery_address: input.delivery_address,
            shipping_method: input.shipping_method,
            items: Vec::with_capacity(items.len()),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        for item in items {
            push_item(&mut order, item);
        }

        FinancialCalculator::refresh_purchase_order(&mut order)?;
        self.validator.validate_purchase_order_amounts(&order)?;
        self.repos
            .purchase_orders
            .create(&order)
            .map_err(ProcurementError::from_purchase_order_write)?;

        info!(
            po_id = %order.id,
            po_number = %order.po_number,
            supplier_id = %order.supplier_id,
            total = %order.total_amount,
            "purchase order created"
        );
        Ok(order)
    }

    /// Replaces the header fields of an order.
    ///
    /// Status, approval data and items are left alone. A missing number keeps
    /// the current one; missing currency, tax rate or shipping keep their
    /// current values.
    ///
    /// # Errors
    ///
    /// - `CannotModifyReceived` / `CannotModifyCancelled` if the stored order is locked
    /// - `PurchaseOrderExists` if the new number is taken
    /// - `PurchaseOrderHasReceipts` when changing the supplier of an order with GRNs
    pub fn update_purchase_order(
        &self,
        id: PurchaseOrderId,
        input: PurchaseOrderInput,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.validator.validate_purchase_order(&input, true)?;
        let supplier_id = required(input.supplier_id, "supplier_id")?;
        let created_by_id = required(input.created_by_id, "created_by_id")?;
        let order_date = required(input.order_date, "order_date")?;

        let mut order = self.load(id)?;
        ensure_editable(&order)?;

        if supplier_id != order.supplier_id {
            self.ensure_supplier(supplier_id)?;
            if self.receipt_count(id)? > 0 {
                return Err(ProcurementError::PurchaseOrderHasReceipts(id));
            }
        }
        if let Some(number) = input.po_number {
            let number = number.trim().to_string();
            if number != order.po_number {
                self.ensure_number_free(&number)?;
                order.po_number = number;
            }
        }

        order.supplier_id = supplier_id;
        order.created_by_id = created_by_id;
        order.order_date = order_date;
        order.expected_date = input.expected_date;
        order.currency = input.currency.unwrap_or(order.currency);
        order.tax_rate = input.tax_rate.unwrap_or(order.tax_rate);
        order.shipping_cost = input.shipping_cost.unwrap_or(order.shipping_cost);
        order.reference = input.reference;
        order.terms = input.terms;
        order.notes = input.notes;
        order.delivery_address = input.delivery_address;
        order.shipping_method = input.shipping_method;

        let stored = self.save(order)?;
        info!(po_number = %stored.po_number, version = stored.version, "purchase order updated");
        Ok(stored)
    }

    /// Deletes an order and its items.
    ///
    /// # Errors
    ///
    /// - `CannotModifyReceived` if the order is received
    /// - `PurchaseOrderHasReceipts` if any GRN references the order
    /// - `ConcurrentModification` if the order changed after it was loaded
    pub fn delete_purchase_order(&self, id: PurchaseOrderId) -> Result<(), ProcurementError> {
        let order = self.load(id)?;
        if order.status == PurchaseOrderStatus::Received {
            return Err(ProcurementError::CannotModifyReceived);
        }
        if self.receipt_count(id)? > 0 {
            return Err(ProcurementError::PurchaseOrderHasReceipts(id));
        }

        self.repos
            .purchase_orders
            .delete(id, order.version)
            .map_err(ProcurementError::from_purchase_order_write)?;
        info!(po_number = %order.po_number, "purchase order deleted");
        Ok(())
    }

    // ========== Status Transitions ==========

    /// Submits a draft order for approval (`Draft → Pending`).
    ///
    /// # Errors
    ///
    /// `InvalidPurchaseOrderStatus` unless `Draft`; `InvalidInput` if the
    /// order has no items.
    pub fn submit_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.transition(id, PurchaseOrderStatus::Pending, "submit", |order| {
            if order.items.is_empty() {
                return Err(ProcurementError::InvalidInput(
                    "purchase order must have at least one item".into(),
                ));
            }
            Ok(())
        })
    }

    /// Approves a pending order (`Pending → Approved`).
    ///
    /// # Errors
    ///
    /// `InvalidPurchaseOrderStatus` unless `Pending`.
    pub fn approve_purchase_order(
        &self,
        id: PurchaseOrderId,
        approver_id: UserId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.transition(id, PurchaseOrderStatus::Approved, "approve", |order| {
            order.approved_by_id = Some(approver_id);
            order.approved_at = Some(Utc::now());
            Ok(())
        })
    }

    /// Sends an approved order to the supplier (`Approved → Ordered`).
    ///
    /// # Errors
    ///
    /// `InvalidPurchaseOrderStatus` unless `Approved`.
    pub fn send_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.transition(id, PurchaseOrderStatus::Ordered, "send", |_| Ok(()))
    }

    /// Cancels an order from any status except `Received`.
    ///
    /// Cancelling a cancelled order returns it unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidPurchaseOrderStatus` if the order is received.
    pub fn cancel_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        let order = self.load(id)?;
        if order.status == PurchaseOrderStatus::Cancelled {
            return Ok(order);
        }
        self.transition_loaded(order, PurchaseOrderStatus::Cancelled, "cancel", |_| Ok(()))
    }

    /// Marks an ordered order as received (`Ordered → Received`) and stamps
    /// the delivery time.
    ///
    /// # Errors
    ///
    /// `InvalidPurchaseOrderStatus` unless `Ordered`.
    pub fn mark_as_received(&self, id: PurchaseOrderId) -> Result<PurchaseOrder, ProcurementError> {
        self.transition(id, PurchaseOrderStatus::Received, "receive", |order| {
            order.delivery_date = Some(Utc::now());
            Ok(())
        })
    }

    // ========== Items ==========

    /// Appends a line to an order and recomputes its totals.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` / `InvalidInput` for an invalid line
    /// - `CannotModifyReceived` / `CannotModifyCancelled` if the order is locked
    /// - `ProductNotFound` / `ProductInactive`
    pub fn add_purchase_order_item(
        &self,
        order_id: PurchaseOrderId,
        input: PurchaseOrderItemInput,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.validator.validate_purchase_order_item(&input)?;
        let mut order = self.load(order_id)?;
        ensure_editable(&order)?;
        self.ensure_product(input.product_id)?;

        push_item(&mut order, input);
        let stored = self.save(order)?;
        info!(po_number = %stored.po_number, items = stored.items.len(), "purchase order item added");
        Ok(stored)
    }

    /// Replaces a line of an order and recomputes its totals.
    ///
    /// # Errors
    ///
    /// As [`Self::add_purchase_order_item`], plus `PurchaseOrderItemNotFound`
    /// if the line is not on the order.
    pub fn update_purchase_order_item(
        &self,
        order_id: PurchaseOrderId,
        item_id: PurchaseOrderItemId,
        input: PurchaseOrderItemInput,
    ) -> Result<PurchaseOrder, ProcurementError> {
        self.validator.validate_purchase_order_item(&input)?;
        let mut order = self.load(order_id)?;
        ensure_editable(&order)?;

        let item = order
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(ProcurementError::PurchaseOrderItemNotFound(item_id))?;
        if item.product_id != input.product_id {
            self.ensure_product(input.product_id)?;
        }
        item.product_id = input.product_id;
        item.quantity = input.quantity;
        item.unit_price = input.unit_price;
        item.discount_amount = input.discount_amount;
        item.notes = input.notes;

        let stored = self.save(order)?;
        info!(po_number = %stored.po_number, item_id = %item_id, "purchase order item updated");
        Ok(stored)
    }

    /// Removes a line from an order and recomputes its totals.
    ///
    /// # Errors
    ///
    /// - `CannotModifyReceived` / `CannotModifyCancelled` if the order is locked
    /// - `PurchaseOrderItemNotFound` if the line is not on the order
    /// - `PurchaseOrderHasReceipts` if a GRN line references it
    pub fn remove_purchase_order_item(
        &self,
        order_id: PurchaseOrderId,
        item_id: PurchaseOrderItemId,
    ) -> Result<PurchaseOrder, ProcurementError> {
        let mut order = self.load(order_id)?;
        ensure_editable(&order)?;

        let position = order
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(ProcurementError::PurchaseOrderItemNotFound(item_id))?;

        let referenced = self
            .repos
            .receipts
            .list_by_purchase_order(order_id)?
            .iter()
            .flat_map(|grn| &grn.items)
            .any(|line| line.purchase_order_item_id == item_id);
        if referenced {
            return Err(ProcurementError::PurchaseOrderHasReceipts(order_id));
        }

        order.items.remove(position);
        order.renumber_items();
        let stored = self.save(order)?;
        info!(po_number = %stored.po_number, item_id = %item_id, "purchase order item removed");
        Ok(stored)
    }

    // ========== Queries ==========

    /// Gets an order with its items.
    pub fn get_purchase_order(&self, id: PurchaseOrderId) -> Result<PurchaseOrder, ProcurementError> {
        self.load(id)
    }

    /// Gets an order by its number.
    pub fn get_purchase_order_by_number(
        &self,
        po_number: &str,
    ) -> Result<Option<PurchaseOrder>, ProcurementError> {
        Ok(self.repos.purchase_orders.get_by_number(po_number.trim())?)
    }

    /// Gets a single line.
    pub fn get_purchase_order_item(
        &self,
        item_id: PurchaseOrderItemId,
    ) -> Result<PurchaseOrderItem, ProcurementError> {
        self.repos
            .purchase_orders
            .get_item(item_id)?
            .ok_or(ProcurementError::PurchaseOrderItemNotFound(item_id))
    }

    /// Lists order headers, newest first.
    pub fn list_purchase_orders(
        &self,
        filter: &PurchaseOrderFilter,
        page: PageRequest,
    ) -> Result<PageResponse<PurchaseOrder>, ProcurementError> {
        let total = self.repos.purchase_orders.count(filter)?;
        let data = self.repos.purchase_orders.list(filter, page)?;
        Ok(PageResponse::new(data, page, total))
    }

    /// Searches order numbers, references and notes.
    pub fn search_purchase_orders(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<Vec<PurchaseOrder>, ProcurementError> {
        Ok(self.repos.purchase_orders.search(query.trim(), page)?)
    }

    /// Order headers with an order date in `[from, to]`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `from` is after `to`.
    pub fn purchase_orders_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PurchaseOrder>, ProcurementError> {
        if from > to {
            return Err(ProcurementError::InvalidInput(format!(
                "date range start {from} is after end {to}"
            )));
        }
        Ok(self.repos.purchase_orders.get_by_date_range(from, to)?)
    }

    // ========== Internals ==========

    fn load(&self, id: PurchaseOrderId) -> Result<PurchaseOrder, ProcurementError> {
        self.repos
            .purchase_orders
            .get_by_id(id)?
            .ok_or(ProcurementError::PurchaseOrderNotFound(id))
    }

    fn save(&self, mut order: PurchaseOrder) -> Result<PurchaseOrder, ProcurementError> {
        order.updated_at = Utc::now();
        FinancialCalculator::refresh_purchase_order(&mut order)?;
        self.validator.validate_purchase_order_amounts(&order)?;
        self.repos
            .purchase_orders
            .update(&order)
            .map_err(ProcurementError::from_purchase_order_write)
    }

    fn transition<F>(
        &self,
        id: PurchaseOrderId,
        next: PurchaseOrderStatus,
        action: &'static str,
        apply: F,
    ) -> Result<PurchaseOrder, ProcurementError>
    where
        F: FnOnce(&mut PurchaseOrder) -> Result<(), ProcurementError>,
    {
        let order = self.load(id)?;
        self.transition_loaded(order, next, action, apply)
    }

    fn transition_loaded<F>(
        &self,
        mut order: PurchaseOrder,
        next: PurchaseOrderStatus,
        action: &'static str,
        apply: F,
    ) -> Result<PurchaseOrder, ProcurementError>
    where
        F: FnOnce(&mut PurchaseOrder) -> Result<(), ProcurementError>,
    {
        let from = order.status;
        if !from.can_transition_to(next) {
            return Err(ProcurementError::InvalidPurchaseOrderStatus {
                current: from,
                action,
            });
        }
        apply(&mut order)?;
        order.status = next;
        order.updated_at = Utc::now();

        let stored = self
            .repos
            .purchase_orders
            .update(&order)
            .map_err(ProcurementError::from_purchase_order_write)?;
        info!(
            po_number = %stored.po_number,
            action,
            from = %from,
            to = %next,
            "purchase order status changed"
        );
        Ok(stored)
    }

    fn ensure_supplier(&self, id: SupplierId) -> Result<(), ProcurementError> {
        match self.repos.suppliers.get_supplier(id)? {
            None => Err(ProcurementError::SupplierNotFound(id)),
            Some(supplier) if !supplier.is_active => Err(ProcurementError::SupplierInactive(id)),
            Some(_) => Ok(()),
        }
    }

    fn ensure_product(&self, id: ProductId) -> Result<(), ProcurementError> {
        match self.repos.products.get_product(id)? {
            None => Err(ProcurementError::ProductNotFound(id)),
            Some(product) if !product.is_active => Err(ProcurementError::ProductInactive(id)),
            Some(_) => Ok(()),
        }
    }

    fn ensure_number_free(&self, number: &str) -> Result<(), ProcurementError> {
        if self.repos.purchase_orders.get_by_number(number)?.is_some() {
            return Err(ProcurementError::PurchaseOrderExists(number.to_string()));
        }
        Ok(())
    }

    fn receipt_count(&self, id: PurchaseOrderId) -> Result<u64, ProcurementError> {
        let filter = GrnFilter {
            purchase_order_id: Some(id),
            ..GrnFilter::default()
        };
        Ok(self.repos.receipts.count(&filter)?)
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ProcurementError> {
    value.ok_or_else(|| ProcurementError::InvalidInput(format!("{field} is required")))
}

fn ensure_editable(order: &PurchaseOrder) -> Result<(), ProcurementError> {
    if !order.status.is_locked() {
        return Ok(());
    }
    if order.status == PurchaseOrderStatus::Received {
        Err(ProcurementError::CannotModifyReceived)
    } else {
        Err(ProcurementError::CannotModifyCancelled)
    }
}

// Amounts are filled in by the calculator.
fn push_item(order: &mut PurchaseOrder, input: PurchaseOrderItemInput) {
    let line_no = u32::try_from(order.items.len() + 1).unwrap_or(u32::MAX);
    order.items.push(PurchaseOrderItem {
        id: PurchaseOrderItemId::new(),
        purchase_order_id: order.id,
        line_no,
        product_id: input.product_id,
        quantity: input.quantity,
        unit_price: input.unit_price,
        discount_amount: input.discount_amount,
        total_price: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        notes: input.notes,
    });
}
