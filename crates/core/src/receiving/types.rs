//! Goods received note domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use stockyard_shared::types::{
    Currency, GrnId, GrnItemId, ProductId, PurchaseOrderId, PurchaseOrderItemId, SupplierId,
    UserId,
};

/// GRN status.
///
/// Draft → Received (process receipt) → Completed (complete). Verification
/// annotates a received GRN without changing its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrnStatus {
    /// Being recorded.
    Draft,
    /// Goods physically received.
    Received,
    /// Reconciled (locked).
    Completed,
}

impl GrnStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Draft, Self::Received, Self::Completed];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Received => "received",
            Self::Completed => "completed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "received" => Some(Self::Received),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true if the transition table allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Received) | (Self::Received, Self::Completed)
        )
    }

    /// Returns true if header and items can no longer change.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for GrnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A GRN line, reconciled against one purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrnItem {
    /// Line ID.
    pub id: GrnItemId,
    /// Owning GRN.
    pub grn_id: GrnId,
    /// 1-based position within the GRN.
    pub line_no: u32,
    /// Purchase order line this delivery is for.
    pub purchase_order_item_id: PurchaseOrderItemId,
    /// Product, copied from the purchase order line.
    pub product_id: ProductId,
    /// Snapshot of the purchase order line quantity when the item was added.
    pub ordered_quantity: i64,
    /// Quantity delivered.
    pub received_quantity: i64,
    /// Quantity accepted into stock.
    pub accepted_quantity: i64,
    /// Quantity rejected (damaged, wrong item).
    pub rejected_quantity: i64,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `accepted_quantity × unit_price` (derived).
    pub total_price: Decimal,
    /// Notes.
    pub notes: Option<String>,
}

/// A goods received note with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grn {
    /// GRN ID.
    pub id: GrnId,
    /// Unique human-readable number, e.g. `GRN2025010003`.
    pub grn_number: String,
    /// Purchase order the goods were delivered against.
    pub purchase_order_id: PurchaseOrderId,
    /// Supplier; always the purchase order's supplier.
    pub supplier_id: SupplierId,
    /// Staff member who received the goods.
    pub received_by_id: UserId,
    /// Business date of the delivery.
    pub received_date: NaiveDate,
    /// Verifier, set on verification.
    pub verified_by_id: Option<UserId>,
    /// Verification time.
    pub verified_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: GrnStatus,
    /// Document currency.
    pub currency: Currency,
    /// Tax rate in percent (0-100).
    pub tax_rate: Decimal,
    /// `Σ item total_price` (derived).
    pub sub_total: Decimal,
    /// Pro-rata share of the purchase order discount (derived).
    pub discount_amount: Decimal,
    /// `(sub_total − discount_amount) × tax_rate / 100` (derived).
    pub tax_amount: Decimal,
    /// `sub_total − discount_amount + tax_amount` (derived).
    pub total_amount: Decimal,
    /// Supplier delivery order number.
    pub delivery_note_number: Option<String>,
    /// Carrier.
    pub carrier: Option<String>,
    /// Vehicle registration.
    pub vehicle_number: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Lines in `line_no` order.
    pub items: Vec<GrnItem>,
    /// Optimistic concurrency token, incremented on every update.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Grn {
    /// Returns the item with the given ID, if it belongs to this GRN.
    #[must_use]
    pub fn item(&self, item_id: GrnItemId) -> Option<&GrnItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Renumbers lines 1..=n in their current order.
    pub fn renumber_items(&mut self) {
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        }
    }
}

/// Header payload for creating or updating a GRN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrnInput {
    /// Explicit number; allocated when absent on create.
    pub grn_number: Option<String>,
    /// Purchase order (required).
    pub purchase_order_id: Option<PurchaseOrderId>,
    /// Supplier (required, must match the purchase order).
    pub supplier_id: Option<SupplierId>,
    /// Receiver (required).
    pub received_by_id: Option<UserId>,
    /// Delivery date (required).
    pub received_date: Option<NaiveDate>,
    /// Currency; inherited from the purchase order when absent.
    pub currency: Option<Currency>,
    /// Tax rate; inherited from the purchase order when absent.
    pub tax_rate: Option<Decimal>,
    /// Supplier delivery order number.
    pub delivery_note_number: Option<String>,
    /// Carrier.
    pub carrier: Option<String>,
    /// Vehicle registration.
    pub vehicle_number: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

/// Payload for adding or updating a GRN line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrnItemInput {
    /// Purchase order line being delivered.
    pub purchase_order_item_id: PurchaseOrderItemId,
    /// Quantity delivered (>= 0, <= ordered).
    pub received_quantity: i64,
    /// Quantity accepted (>= 0).
    pub accepted_quantity: i64,
    /// Quantity rejected (>= 0).
    pub rejected_quantity: i64,
    /// Price per unit; the purchase order line price when absent.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filter for listing GRNs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrnFilter {
    /// Only GRNs in this status.
    pub status: Option<GrnStatus>,
    /// Only GRNs from this supplier.
    pub supplier_id: Option<SupplierId>,
    /// Only GRNs against this purchase order.
    pub purchase_order_id: Option<PurchaseOrderId>,
}

impl GrnFilter {
    /// Returns true if the GRN passes the filter.
    #[must_use]
    pub fn matches(&self, grn: &Grn) -> bool {
        self.status.is_none_or(|status| grn.status == status)
            && self.supplier_id.is_none_or(|supplier| grn.supplier_id == supplier)
            && self
                .purchase_order_id
                .is_none_or(|order| grn.purchase_order_id == order)
    }
}
