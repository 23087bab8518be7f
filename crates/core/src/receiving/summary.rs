//! Receipt roll-up for a purchase order.
//!
//! Adds up every GRN raised against an order, line by line. Quantities are not
//! capped across GRNs; a line whose deliveries exceed the ordered quantity is
//! reported as over-received.

use serde::{Deserialize, Serialize};
use stockyard_shared::types::{ProductId, PurchaseOrderId, PurchaseOrderItemId};

use crate::purchasing::PurchaseOrder;
use crate::receiving::types::Grn;

/// Receipt totals for one purchase order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    /// Purchase order line.
    pub purchase_order_item_id: PurchaseOrderItemId,
    /// Position on the order.
    pub line_no: u32,
    /// Product ordered.
    pub product_id: ProductId,
    /// Current ordered quantity.
    pub ordered_quantity: i64,
    /// Delivered across all GRNs.
    pub received_quantity: i64,
    /// Accepted across all GRNs.
    pub accepted_quantity: i64,
    /// Rejected across all GRNs.
    pub rejected_quantity: i64,
    /// Still to be delivered, never negative.
    pub outstanding_quantity: i64,
    /// Deliveries exceed the ordered quantity.
    pub over_received: bool,
}

/// Receipt totals for a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    /// The purchase order.
    pub purchase_order_id: PurchaseOrderId,
    /// Its number.
    pub po_number: String,
    /// Number of GRNs counted.
    pub grn_count: usize,
    /// One entry per order line, in line order.
    pub lines: Vec<ReceiptLine>,
}

impl ReceiptSummary {
    /// Rolls up `grns` against the lines of `order`.
    ///
    /// GRN lines that point at a line no longer on the order are ignored.
    #[must_use]
    pub fn build(order: &PurchaseOrder, grns: &[Grn]) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| {
                let deliveries = grns
                    .iter()
                    .flat_map(|grn| &grn.items)
                    .filter(|line| line.purchase_order_item_id == item.id);

                let (mut received, mut accepted, mut rejected) = (0i64, 0i64, 0i64);
                for line in deliveries {
                    received = received.saturating_add(line.received_quantity);
                    accepted = accepted.saturating_add(line.accepted_quantity);
                    rejected = rejected.saturating_add(line.rejected_quantity);
                }

                ReceiptLine {
                    purchase_order_item_id: item.id,
                    line_no: item.line_no,
                    product_id: item.product_id,
                    ordered_quantity: item.quantity,
                    received_quantity: received,
                    accepted_quantity: accepted,
                    rejected_quantity: rejected,
                    outstanding_quantity: item.quantity.saturating_sub(received).max(0),
                    over_received: received > item.quantity,
                }
            })
            .collect();

        Self {
            purchase_order_id: order.id,
            po_number: order.po_number.clone(),
            grn_count: grns.len(),
            lines,
        }
    }

    /// True when every line has been delivered in full.
    #[must_use]
    pub fn is_fully_received(&self) -> bool {
        self.lines.iter().all(|line| line.outstanding_quantity == 0)
    }

    /// True when any line has been delivered beyond its ordered quantity.
    #[must_use]
    pub fn has_over_receipt(&self) -> bool {
        self.lines.iter().any(|line| line.over_received)
    }
}
