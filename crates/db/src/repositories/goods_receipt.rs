//! In-memory goods received note repository.

use chrono::NaiveDate;
use stockyard_core::receiving::{Grn, GrnFilter, GrnItem};
use stockyard_core::repository::{GoodsReceiptRepository, RepoResult};
use stockyard_shared::types::{GrnId, PageRequest, PurchaseOrderId};
use tracing::trace;

use super::table::DocumentTable;
use super::text_matches;

/// GRNs stored as whole aggregates.
#[derive(Debug, Default)]
pub struct GoodsReceiptStore {
    table: DocumentTable<Grn>,
}

impl GoodsReceiptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GoodsReceiptRepository for GoodsReceiptStore {
    fn create(&self, grn: &Grn) -> RepoResult<()> {
        self.table.insert(grn)?;
        trace!(grn_number = %grn.grn_number, "grn inserted");
        Ok(())
    }

    fn update(&self, grn: &Grn) -> RepoResult<Grn> {
        let stored = self.table.replace(grn)?;
        trace!(grn_number = %stored.grn_number, version = stored.version, "grn replaced");
        Ok(stored)
    }

    fn delete(&self, id: GrnId, version: u64) -> RepoResult<()> {
        self.table.remove(id, version).map(|_| ())
    }

    fn get_by_id(&self, id: GrnId) -> RepoResult<Option<Grn>> {
        Ok(self.table.get(id))
    }

    fn get_by_number(&self, grn_number: &str) -> RepoResult<Option<Grn>> {
        Ok(self.table.get_by_number(grn_number))
    }

    fn list(&self, filter: &GrnFilter, page: PageRequest) -> RepoResult<Vec<Grn>> {
        Ok(page.slice(self.table.select_headers(|grn| filter.matches(grn))))
    }

    fn search(&self, query: &str, page: PageRequest) -> RepoResult<Vec<Grn>> {
        let needle = query.trim().to_lowercase();
        let hits = self.table.select_headers(|grn| {
            text_matches(&grn.grn_number, &needle)
                || grn
                    .delivery_note_number
                    .as_deref()
                    .is_some_and(|d| text_matches(d, &needle))
                || grn.notes.as_deref().is_some_and(|n| text_matches(n, &needle))
        });
        Ok(page.slice(hits))
    }

    fn count(&self, filter: &GrnFilter) -> RepoResult<u64> {
        Ok(self.table.count(|grn| filter.matches(grn)))
    }

    fn get_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<Grn>> {
        let mut grns = self
            .table
            .select_headers(|grn| (from..=to).contains(&grn.received_date));
        grns.sort_by_key(|grn| grn.received_date);
        Ok(grns)
    }

    fn list_by_purchase_order(&self, order_id: PurchaseOrderId) -> RepoResult<Vec<Grn>> {
        Ok(self.table.select(|grn| grn.purchase_order_id == order_id))
    }

    fn list_items(&self, grn_id: GrnId) -> RepoResult<Vec<GrnItem>> {
        Ok(self.table.get(grn_id).map(|grn| grn.items).unwrap_or_default())
    }
}
