//! Parallel writers against one engine.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use common::{Fixture, delivery};
use rust_decimal_macros::dec;
use stockyard_core::purchasing::PurchaseOrderStatus;
use stockyard_core::receiving::{Grn, GrnFilter, GrnItem};
use stockyard_core::repository::{GoodsReceiptRepository, PurchaseOrderRepository};
use stockyard_core::{ProcurementEngine, ProcurementError, RepoResult, Repositories};
use stockyard_db::MemoryStore;
use stockyard_shared::AppConfig;
use stockyard_shared::types::{GrnId, PageRequest, PurchaseOrderId};

/// Receipts that mark `order` as received whenever they are counted, which
/// lands between the delete guard's status check and the delete itself.
struct ReceiveOnCount {
    store: MemoryStore,
    order: PurchaseOrderId,
}

impl ReceiveOnCount {
    fn receive(&self) {
        let orders = self.store.purchase_orders();
        let mut order = orders.get_by_id(self.order).unwrap().unwrap();
        if order.status != PurchaseOrderStatus::Received {
            order.status = PurchaseOrderStatus::Received;
            orders.update(&order).unwrap();
        }
    }
}

impl GoodsReceiptRepository for ReceiveOnCount {
    fn create(&self, grn: &Grn) -> RepoResult<()> {
        self.store.receipts().create(grn)
    }

    fn update(&self, grn: &Grn) -> RepoResult<Grn> {
        self.store.receipts().update(grn)
    }

    fn delete(&self, id: GrnId, version: u64) -> RepoResult<()> {
        self.store.receipts().delete(id, version)
    }

    fn get_by_id(&self, id: GrnId) -> RepoResult<Option<Grn>> {
        self.store.receipts().get_by_id(id)
    }

    fn get_by_number(&self, grn_number: &str) -> RepoResult<Option<Grn>> {
        self.store.receipts().get_by_number(grn_number)
    }

    fn list(&self, filter: &GrnFilter, page: PageRequest) -> RepoResult<Vec<Grn>> {
        self.store.receipts().list(filter, page)
    }

    fn search(&self, query: &str, page: PageRequest) -> RepoResult<Vec<Grn>> {
        self.store.receipts().search(query, page)
    }

    fn count(&self, filter: &GrnFilter) -> RepoResult<u64> {
        self.receive();
        self.store.receipts().count(filter)
    }

    fn get_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<Grn>> {
        self.store.receipts().get_by_date_range(from, to)
    }

    fn list_by_purchase_order(&self, order_id: PurchaseOrderId) -> RepoResult<Vec<Grn>> {
        self.store.receipts().list_by_purchase_order(order_id)
    }

    fn list_items(&self, grn_id: GrnId) -> RepoResult<Vec<GrnItem>> {
        self.store.receipts().list_items(grn_id)
    }
}

#[test]
fn test_parallel_creates_get_unique_numbers() {
    let fx = Fixture::new();

    let numbers: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..25)
                        .map(|_| fx.draft_order().po_number)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let unique: HashSet<_> = numbers.iter().collect();
    assert_eq!(numbers.len(), 200);
    assert_eq!(unique.len(), 200);
}

#[test]
fn test_racing_edits_never_lose_a_line() {
    let fx = Fixture::new();
    let order = fx.draft_order();

    let outcomes: Vec<Result<(), ProcurementError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    fx.engine
                        .purchasing()
                        .add_purchase_order_item(order.id, fx.line(1, dec!(1.00)))
                        .map(|_| ())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let applied = outcomes.iter().filter(|r| r.is_ok()).count();
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(matches!(err, ProcurementError::ConcurrentModification { .. }));
        }
    }

    let stored = fx.engine.purchasing().get_purchase_order(order.id).unwrap();
    assert!(applied >= 1);
    assert_eq!(stored.items.len(), 1 + applied);
    assert_eq!(stored.version as usize, applied);
}

#[test]
fn test_delete_rejects_order_received_after_check() {
    let fx = Fixture::new();
    let order = fx.ordered_order();

    let repos = Repositories {
        receipts: Arc::new(ReceiveOnCount {
            store: fx.store.clone(),
            order: order.id,
        }),
        ..fx.store.repositories()
    };
    let engine = ProcurementEngine::new(repos, &AppConfig::default());

    let err = engine.purchasing().delete_purchase_order(order.id).unwrap_err();
    assert!(matches!(err, ProcurementError::ConcurrentModification { .. }));

    let stored = fx.engine.purchasing().get_purchase_order(order.id).unwrap();
    assert_eq!(stored.status, PurchaseOrderStatus::Received);
}

#[test]
fn test_delete_racing_receipt_leaves_no_orphan() {
    let fx = Fixture::new();

    for _ in 0..50 {
        let order = fx.ordered_order();
        let (deleted, received) = thread::scope(|scope| {
            let delete = scope.spawn(|| fx.engine.purchasing().delete_purchase_order(order.id));
            let receive = scope.spawn(|| {
                fx.engine
                    .receiving()
                    .create_grn(fx.grn_input(&order), vec![delivery(&order, 4, 4)])
            });
            (delete.join().unwrap(), receive.join().unwrap())
        });

        assert_ne!(deleted.is_ok(), received.is_ok());
        let receipts = fx.store.receipts().list_by_purchase_order(order.id).unwrap();
        if deleted.is_ok() {
            assert!(receipts.is_empty());
            assert!(matches!(
                received,
                Err(ProcurementError::PurchaseOrderNotFound(_)
                    | ProcurementError::ConcurrentModification { .. })
            ));
        } else {
            assert_eq!(receipts.len(), 1);
            assert!(fx.store.purchase_orders().get_by_id(order.id).unwrap().is_some());
        }
    }
}
