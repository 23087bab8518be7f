//! In-memory purchase order repository.

use chrono::NaiveDate;
use stockyard_core::purchasing::{PurchaseOrder, PurchaseOrderFilter, PurchaseOrderItem};
use stockyard_core::repository::{PurchaseOrderRepository, RepoResult};
use stockyard_shared::types::{PageRequest, PurchaseOrderId, PurchaseOrderItemId};
use tracing::trace;

use super::table::DocumentTable;
use super::text_matches;

/// Purchase orders stored as whole aggregates.
#[derive(Debug, Default)]
pub struct PurchaseOrderStore {
    table: DocumentTable<PurchaseOrder>,
}

impl PurchaseOrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PurchaseOrderRepository for PurchaseOrderStore {
    fn create(&self, order: &PurchaseOrder) -> RepoResult<()> {
        self.table.insert(order)?;
        trace!(po_number = %order.po_number, "purchase order inserted");
        Ok(())
    }

    fn update(&self, order: &PurchaseOrder) -> RepoResult<PurchaseOrder> {
        let stored = self.table.replace(order)?;
        trace!(po_number = %stored.po_number, version = stored.version, "purchase order replaced");
        Ok(stored)
    }

    fn delete(&self, id: PurchaseOrderId, version: u64) -> RepoResult<()> {
        self.table.remove(id, version).map(|_| ())
    }

    fn get_by_id(&self, id: PurchaseOrderId) -> RepoResult<Option<PurchaseOrder>> {
        Ok(self.table.get(id))
    }

    fn get_by_number(&self, po_number: &str) -> RepoResult<Option<PurchaseOrder>> {
        Ok(self.table.get_by_number(po_number))
    }

    fn list(
        &self,
        filter: &PurchaseOrderFilter,
        page: PageRequest,
    ) -> RepoResult<Vec<PurchaseOrder>> {
        Ok(page.slice(self.table.select_headers(|order| filter.matches(order))))
    }

    fn search(&self, query: &str, page: PageRequest) -> RepoResult<Vec<PurchaseOrder>> {
        let needle = query.trim().to_lowercase();
        let hits = self.table.select_headers(|order| {
            text_matches(&order.po_number, &needle)
                || order.reference.as_deref().is_some_and(|r| text_matches(r, &needle))
                || order.notes.as_deref().is_some_and(|n| text_matches(n, &needle))
        });
        Ok(page.slice(hits))
    }

    fn count(&self, filter: &PurchaseOrderFilter) -> RepoResult<u64> {
        Ok(self.table.count(|order| filter.matches(order)))
    }

    fn get_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<PurchaseOrder>> {
        let mut orders = self
            .table
            .select_headers(|order| (from..=to).contains(&order.order_date));
        orders.sort_by_key(|order| order.order_date);
        Ok(orders)
    }

    fn get_item(&self, item_id: PurchaseOrderItemId) -> RepoResult<Option<PurchaseOrderItem>> {
        Ok(self.table.find_map(|order| order.item(item_id).cloned()))
    }

    fn list_items(&self, order_id: PurchaseOrderId) -> RepoResult<Vec<PurchaseOrderItem>> {
        Ok(self
            .table
            .get(order_id)
            .map(|order| order.items)
            .unwrap_or_default())
    }
}
