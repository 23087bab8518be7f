//! Purchase order domain types.
//!
//! This module defines the purchase order aggregate, its line items, the
//! status state machine and the caller-facing input payloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use stockyard_shared::types::{
    Currency, ProductId, PurchaseOrderId, PurchaseOrderItemId, SupplierId, UserId,
};

/// Purchase order status.
///
/// The valid transitions are:
/// - Draft → Pending (submit)
/// - Pending → Approved (approve)
/// - Approved → Ordered (send)
/// - Ordered → Received (mark as received)
/// - any status except Received → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    /// Being drafted; header and items may change.
    Draft,
    /// Submitted for approval.
    Pending,
    /// Approved, not yet sent to the supplier.
    Approved,
    /// Sent to the supplier; goods may be received against it.
    Ordered,
    /// Goods received (locked).
    Received,
    /// Cancelled (locked).
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::Pending,
        Self::Approved,
        Self::Ordered,
        Self::Received,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Ordered => "ordered",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "ordered" => Some(Self::Ordered),
            "received" => Some(Self::Received),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the transition table allows moving to `next`.
    ///
    /// Cancelling an already cancelled order is allowed and is a no-op.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Approved)
                | (Self::Approved, Self::Ordered)
                | (Self::Ordered, Self::Received)
                | (
                    Self::Draft
                        | Self::Pending
                        | Self::Approved
                        | Self::Ordered
                        | Self::Cancelled,
                    Self::Cancelled
                )
        )
    }

    /// Returns true if header and items can no longer change.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Received | Self::Cancelled)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    /// Line ID.
    pub id: PurchaseOrderItemId,
    /// Owning purchase order.
    pub purchase_order_id: PurchaseOrderId,
    /// 1-based position within the order.
    pub line_no: u32,
    /// Ordered product.
    pub product_id: ProductId,
    /// Ordered quantity (> 0).
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Line discount.
    pub discount_amount: Decimal,
    /// `quantity × unit_price − discount_amount` (derived).
    pub total_price: Decimal,
    /// `total_price × tax_rate / 100` (derived).
    pub tax_amount: Decimal,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A purchase order header with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Purchase order ID.
    pub id: PurchaseOrderId,
    /// Unique human-readable number, e.g. `PO2025010007`.
    pub po_number: String,
    /// Supplier the goods are ordered from.
    pub supplier_id: SupplierId,
    /// Staff member who raised the order.
    pub created_by_id: UserId,
    /// Approver, set on approval.
    pub approved_by_id: Option<UserId>,
    /// Approval time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Business date of the order.
    pub order_date: NaiveDate,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Set when the order is marked received.
    pub delivery_date: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: PurchaseOrderStatus,
    /// Document currency.
    pub currency: Currency,
    /// Tax rate in percent (0-100).
    pub tax_rate: Decimal,
    /// Shipping charged on the whole order.
    pub shipping_cost: Decimal,
    /// `Σ quantity × unit_price` (derived).
    pub sub_total: Decimal,
    /// `Σ item discount` (derived).
    pub discount_amount: Decimal,
    /// `(sub_total − discount_amount) × tax_rate / 100` (derived).
    pub tax_amount: Decimal,
    /// `sub_total − discount_amount + tax_amount + shipping_cost` (derived).
    pub total_amount: Decimal,
    /// Supplier quote or external reference.
    pub reference: Option<String>,
    /// Payment and delivery terms.
    pub terms: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Where the goods should be delivered.
    pub delivery_address: Option<String>,
    /// Carrier or shipping method.
    pub shipping_method: Option<String>,
    /// Lines in `line_no` order.
    pub items: Vec<PurchaseOrderItem>,
    /// Optimistic concurrency token, incremented on every update.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Returns the item with the given ID, if it belongs to this order.
    #[must_use]
    pub fn item(&self, item_id: PurchaseOrderItemId) -> Option<&PurchaseOrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Renumbers lines 1..=n in their current order.
    pub fn renumber_items(&mut self) {
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        }
    }
}

/// Header payload for creating or updating a purchase order.
///
/// Every field is optional so that missing required fields can be reported
/// as validation errors instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderInput {
    /// Explicit number; allocated when absent on create.
    pub po_number: Option<String>,
    /// Supplier (required).
    pub supplier_id: Option<SupplierId>,
    /// Creator (required).
    pub created_by_id: Option<UserId>,
    /// Order date (required).
    pub order_date: Option<NaiveDate>,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Currency; configured default when absent.
    pub currency: Option<Currency>,
    /// Tax rate; configured default when absent.
    pub tax_rate: Option<Decimal>,
    /// Shipping cost; zero when absent.
    pub shipping_cost: Option<Decimal>,
    /// External reference.
    pub reference: Option<String>,
    /// Terms.
    pub terms: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Shipping method.
    pub shipping_method: Option<String>,
}

/// Payload for adding or updating a purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItemInput {
    /// Product to order.
    pub product_id: ProductId,
    /// Quantity (> 0).
    pub quantity: i64,
    /// Price per unit (>= 0).
    pub unit_price: Decimal,
    /// Line discount, between zero and `quantity × unit_price`.
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filter for listing purchase orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderFilter {
    /// Only orders in this status.
    pub status: Option<PurchaseOrderStatus>,
    /// Only orders for this supplier.
    pub supplier_id: Option<SupplierId>,
}

impl PurchaseOrderFilter {
    /// Returns true if the order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &PurchaseOrder) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self.supplier_id.is_none_or(|supplier| order.supplier_id == supplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_as_str_and_parse() {
        for status in PurchaseOrderStatus::ALL {
            assert_eq!(PurchaseOrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            PurchaseOrderStatus::parse("ORDERED"),
            Some(PurchaseOrderStatus::Ordered)
        );
        assert_eq!(PurchaseOrderStatus::parse("verified"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PurchaseOrderStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(PurchaseOrderStatus::Draft.to_string(), "draft");
    }

    #[rstest]
    #[case(PurchaseOrderStatus::Draft, PurchaseOrderStatus::Pending, true)]
    #[case(PurchaseOrderStatus::Pending, PurchaseOrderStatus::Approved, true)]
    #[case(PurchaseOrderStatus::Approved, PurchaseOrderStatus::Ordered, true)]
    #[case(PurchaseOrderStatus::Ordered, PurchaseOrderStatus::Received, true)]
    #[case(PurchaseOrderStatus::Ordered, PurchaseOrderStatus::Cancelled, true)]
    #[case(PurchaseOrderStatus::Cancelled, PurchaseOrderStatus::Cancelled, true)]
    #[case(PurchaseOrderStatus::Draft, PurchaseOrderStatus::Approved, false)]
    #[case(PurchaseOrderStatus::Pending, PurchaseOrderStatus::Ordered, false)]
    #[case(PurchaseOrderStatus::Received, PurchaseOrderStatus::Cancelled, false)]
    #[case(PurchaseOrderStatus::Received, PurchaseOrderStatus::Draft, false)]
    #[case(PurchaseOrderStatus::Cancelled, PurchaseOrderStatus::Draft, false)]
    fn test_transition_table(
        #[case] from: PurchaseOrderStatus,
        #[case] to: PurchaseOrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_locked_statuses() {
        let locked: Vec<_> = PurchaseOrderStatus::ALL
            .into_iter()
            .filter(PurchaseOrderStatus::is_locked)
            .collect();
        assert_eq!(
            locked,
            vec![PurchaseOrderStatus::Received, PurchaseOrderStatus::Cancelled]
        );
    }

    #[test]
    fn test_filter_matches() {
        let supplier = SupplierId::new();
        let filter = PurchaseOrderFilter {
            status: Some(PurchaseOrderStatus::Draft),
            supplier_id: Some(supplier),
        };
        let now = Utc::now();
        let mut order = PurchaseOrder {
            id: PurchaseOrderId::new(),
            po_number: "PO2025010001".into(),
            supplier_id: supplier,
            created_by_id: UserId::new(),
            approved_by_id: None,
            approved_at: None,
            order_date: now.date_naive(),
            expected_date: None,
            delivery_date: None,
            status: PurchaseOrderStatus::Draft,
            currency: Currency::Myr,
            tax_rate: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            sub_total: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            reference: None,
            terms: None,
            notes: None,
            delivery_address: None,
            shipping_method: None,
            items: vec![],
            version: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(filter.matches(&order));
        assert!(PurchaseOrderFilter::default().matches(&order));

        order.status = PurchaseOrderStatus::Pending;
        assert!(!filter.matches(&order));
    }
}
