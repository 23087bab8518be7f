//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockyard_core::ProcurementEngine;
use stockyard_core::purchasing::{
    PurchaseOrder, PurchaseOrderInput, PurchaseOrderItemInput, PurchaseOrderStatus,
};
use stockyard_core::receiving::{Grn, GrnInput, GrnItemInput};
use stockyard_db::MemoryStore;
use stockyard_shared::AppConfig;
use stockyard_shared::types::{ProductId, SupplierId, UserId};

/// An engine over a fresh store with one supplier and one product.
pub struct Fixture {
    pub store: MemoryStore,
    pub engine: ProcurementEngine,
    pub supplier: SupplierId,
    pub product: ProductId,
    pub user: UserId,
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let supplier = store.add_supplier("Ace Hardware Supply", true);
        let product = store.add_product("HW-NAIL-50", "Box of nails (50mm)", true);
        let engine = ProcurementEngine::new(store.repositories(), &AppConfig::default());
        Self {
            store,
            engine,
            supplier,
            product,
            user: UserId::new(),
        }
    }

    pub fn order_input(&self) -> PurchaseOrderInput {
        PurchaseOrderInput {
            supplier_id: Some(self.supplier),
            created_by_id: Some(self.user),
            order_date: Some(date(2025, 1, 15)),
            tax_rate: Some(Decimal::new(6, 0)),
            ..PurchaseOrderInput::default()
        }
    }

    pub fn line(&self, quantity: i64, unit_price: Decimal) -> PurchaseOrderItemInput {
        PurchaseOrderItemInput {
            product_id: self.product,
            quantity,
            unit_price,
            discount_amount: Decimal::ZERO,
            notes: None,
        }
    }

    /// A draft order with one line of 10 x 5.00.
    pub fn draft_order(&self) -> PurchaseOrder {
        self.engine
            .purchasing()
            .create_purchase_order(self.order_input(), vec![self.line(10, Decimal::new(500, 2))])
            .unwrap()
    }

    /// The draft order moved through submit, approve and send.
    pub fn ordered_order(&self) -> PurchaseOrder {
        let purchasing = self.engine.purchasing();
        let order = self.draft_order();
        purchasing.submit_purchase_order(order.id).unwrap();
        purchasing.approve_purchase_order(order.id, self.user).unwrap();
        purchasing.send_purchase_order(order.id).unwrap()
    }

    /// A draft order walked forward to `status`.
    pub fn order_in(&self, status: PurchaseOrderStatus) -> PurchaseOrder {
        let purchasing = self.engine.purchasing();
        let mut order = self.draft_order();
        if status == PurchaseOrderStatus::Cancelled {
            return purchasing.cancel_purchase_order(order.id).unwrap();
        }
        while order.status != status {
            order = match order.status {
                PurchaseOrderStatus::Draft => purchasing.submit_purchase_order(order.id),
                PurchaseOrderStatus::Pending => purchasing.approve_purchase_order(order.id, self.user),
                PurchaseOrderStatus::Approved => purchasing.send_purchase_order(order.id),
                PurchaseOrderStatus::Ordered => purchasing.mark_as_received(order.id),
                other => panic!("no step leads out of {other}"),
            }
            .unwrap();
        }
        order
    }

    pub fn grn_input(&self, order: &PurchaseOrder) -> GrnInput {
        GrnInput {
            purchase_order_id: Some(order.id),
            supplier_id: Some(order.supplier_id),
            received_by_id: Some(self.user),
            received_date: Some(date(2025, 1, 20)),
            ..GrnInput::default()
        }
    }

    /// A draft GRN for the first line of `order`.
    pub fn receive(&self, order: &PurchaseOrder, received: i64, accepted: i64) -> Grn {
        self.engine
            .receiving()
            .create_grn(self.grn_input(order), vec![delivery(order, received, accepted)])
            .unwrap()
    }
}

pub fn delivery(order: &PurchaseOrder, received: i64, accepted: i64) -> GrnItemInput {
    GrnItemInput {
        purchase_order_item_id: order.items[0].id,
        received_quantity: received,
        accepted_quantity: accepted,
        rejected_quantity: received - accepted,
        unit_price: None,
        notes: None,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
