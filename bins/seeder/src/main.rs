//! Development seeder for Stockyard.
//!
//! Registers a supplier and a few products in an in-memory store, then walks
//! one purchase order from draft to a completed goods receipt and prints the
//! receipt summary.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use stockyard_core::ProcurementEngine;
use stockyard_core::purchasing::{PurchaseOrderInput, PurchaseOrderItemInput};
use stockyard_core::receiving::{GrnInput, GrnItemInput};
use stockyard_db::MemoryStore;
use stockyard_shared::AppConfig;
use stockyard_shared::types::{ProductId, UserId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sample catalogue: SKU, name, quantity to order, unit price in cents.
const CATALOGUE: [(&str, &str, i64, i64); 3] = [
    ("HW-NAIL-50", "Box of nails (50mm)", 40, 450),
    ("HW-HINGE-3", "Steel door hinge (3in)", 24, 1_275),
    ("HW-PAINT-5L", "Exterior paint (5L)", 6, 8_990),
];

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = MemoryStore::new();
    let engine = ProcurementEngine::new(store.repositories(), &config);
    let buyer = UserId::new();
    let storekeeper = UserId::new();

    info!("seeding master data");
    let supplier = store.add_supplier("Ace Hardware Supply", true);
    let products: Vec<(ProductId, i64, Decimal)> = CATALOGUE
        .iter()
        .map(|&(sku, name, quantity, cents)| {
            (store.add_product(sku, name, true), quantity, Decimal::new(cents, 2))
        })
        .collect();

    let purchasing = engine.purchasing();
    let order = purchasing.create_purchase_order(
        PurchaseOrderInput {
            supplier_id: Some(supplier),
            created_by_id: Some(buyer),
            order_date: Some(Utc::now().date_naive()),
            shipping_cost: Some(Decimal::new(2_500, 2)),
            reference: Some("RESTOCK-Q1".into()),
            ..PurchaseOrderInput::default()
        },
        products
            .iter()
            .map(|&(product_id, quantity, unit_price)| PurchaseOrderItemInput {
                product_id,
                quantity,
                unit_price,
                discount_amount: Decimal::ZERO,
                notes: None,
            })
            .collect(),
    )?;
    purchasing.submit_purchase_order(order.id)?;
    purchasing.approve_purchase_order(order.id, buyer)?;
    let order = purchasing.send_purchase_order(order.id)?;
    info!(po_number = %order.po_number, total = %order.total_amount, "purchase order sent");

    // First delivery: everything arrives, two hinges are damaged.
    let receiving = engine.receiving();
    let grn = receiving.create_grn(
        GrnInput {
            purchase_order_id: Some(order.id),
            supplier_id: Some(supplier),
            received_by_id: Some(storekeeper),
            received_date: Some(Utc::now().date_naive()),
            delivery_note_number: Some("DN-0001".into()),
            ..GrnInput::default()
        },
        order
            .items
            .iter()
            .map(|item| {
                let rejected = if item.line_no == 2 { 2 } else { 0 };
                GrnItemInput {
                    purchase_order_item_id: item.id,
                    received_quantity: item.quantity,
                    accepted_quantity: item.quantity - rejected,
                    rejected_quantity: rejected,
                    unit_price: None,
                    notes: None,
                }
            })
            .collect(),
    )?;
    receiving.process_grn_receipt(grn.id, storekeeper)?;
    receiving.verify_grn(grn.id, buyer)?;
    let grn = receiving.complete_grn(grn.id)?;
    info!(grn_number = %grn.grn_number, total = %grn.total_amount, "goods receipt completed");

    let summary = receiving.receipt_summary(order.id)?;
    if summary.is_fully_received() {
        purchasing.mark_as_received(order.id)?;
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("seeding complete");
    Ok(())
}
