//! Repository traits for data access abstraction.
//!
//! These traits define the interface the engine uses to reach persistence and
//! the surrounding master data (suppliers, products). Implementations can be
//! in-memory, SQLite, PostgreSQL, etc. All calls are synchronous and return
//! errors instead of retrying.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockyard_shared::types::{
    GrnId, PageRequest, ProductId, PurchaseOrderId, PurchaseOrderItemId, SupplierId,
};
use thiserror::Error;
use uuid::Uuid;

use crate::purchasing::{PurchaseOrder, PurchaseOrderFilter, PurchaseOrderItem};
use crate::receiving::{Grn, GrnFilter, GrnItem};

/// Result type alias for repository calls.
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Another record already carries this document number.
    #[error("Duplicate document number: {0}")]
    Duplicate(String),

    /// The record to update or delete does not exist.
    #[error("Record {0} not found")]
    NotFound(Uuid),

    /// The stored version differs from the version the write was based on.
    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict {
        /// Record id.
        id: Uuid,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// Backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Supplier master data needed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    /// Supplier ID.
    pub id: SupplierId,
    /// Display name.
    pub name: String,
    /// Whether new purchase orders may be raised against the supplier.
    pub is_active: bool,
}

/// Product master data needed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product ID.
    pub id: ProductId,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Whether the product can be ordered.
    pub is_active: bool,
}

/// Supplier existence and active-flag lookup.
pub trait SupplierDirectory: Send + Sync {
    /// Get supplier by ID.
    fn get_supplier(&self, id: SupplierId) -> RepoResult<Option<SupplierRecord>>;
}

/// Product existence and active-flag lookup.
pub trait ProductCatalog: Send + Sync {
    /// Get product by ID.
    fn get_product(&self, id: ProductId) -> RepoResult<Option<ProductRecord>>;
}

/// Purchase order persistence.
///
/// A purchase order is stored as one aggregate: `create` and `update` write the
/// header together with the complete `items` collection.
pub trait PurchaseOrderRepository: Send + Sync {
    /// Insert a new purchase order with its items.
    ///
    /// Fails with [`RepositoryError::Duplicate`] if the number is taken.
    fn create(&self, order: &PurchaseOrder) -> RepoResult<()>;

    /// Replace header and items if the stored version equals `order.version`.
    ///
    /// Returns the stored order with its version incremented.
    fn update(&self, order: &PurchaseOrder) -> RepoResult<PurchaseOrder>;

    /// Delete a purchase order and its items if the stored version equals
    /// `version`.
    fn delete(&self, id: PurchaseOrderId, version: u64) -> RepoResult<()>;

    /// Get purchase order by ID, items attached.
    fn get_by_id(&self, id: PurchaseOrderId) -> RepoResult<Option<PurchaseOrder>>;

    /// Get purchase order by number, items attached.
    fn get_by_number(&self, po_number: &str) -> RepoResult<Option<PurchaseOrder>>;

    /// List headers matching the filter, newest first.
    fn list(&self, filter: &PurchaseOrderFilter, page: PageRequest) -> RepoResult<Vec<PurchaseOrder>>;

    /// Case-insensitive search over number, reference and notes.
    fn search(&self, query: &str, page: PageRequest) -> RepoResult<Vec<PurchaseOrder>>;

    /// Count headers matching the filter.
    fn count(&self, filter: &PurchaseOrderFilter) -> RepoResult<u64>;

    /// Headers whose order date falls within `[from, to]`.
    fn get_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<PurchaseOrder>>;

    /// Get a single item by ID.
    fn get_item(&self, item_id: PurchaseOrderItemId) -> RepoResult<Option<PurchaseOrderItem>>;

    /// Items of a purchase order in line order.
    fn list_items(&self, order_id: PurchaseOrderId) -> RepoResult<Vec<PurchaseOrderItem>>;
}

/// Goods received note persistence.
///
/// Same aggregate contract as [`PurchaseOrderRepository`].
pub trait GoodsReceiptRepository: Send + Sync {
    /// Insert a new GRN with its items.
    fn create(&self, grn: &Grn) -> RepoResult<()>;

    /// Replace header and items if the stored version equals `grn.version`.
    fn update(&self, grn: &Grn) -> RepoResult<Grn>;

    /// Delete a GRN and its items if the stored version equals `version`.
    fn delete(&self, id: GrnId, version: u64) -> RepoResult<()>;

    /// Get GRN by ID, items attached.
    fn get_by_id(&self, id: GrnId) -> RepoResult<Option<Grn>>;

    /// Get GRN by number, items attached.
    fn get_by_number(&self, grn_number: &str) -> RepoResult<Option<Grn>>;

    /// List headers matching the filter, newest first.
    fn list(&self, filter: &GrnFilter, page: PageRequest) -> RepoResult<Vec<Grn>>;

    /// Case-insensitive search over number, delivery note and notes.
    fn search(&self, query: &str, page: PageRequest) -> RepoResult<Vec<Grn>>;

    /// Count headers matching the filter.
    fn count(&self, filter: &GrnFilter) -> RepoResult<u64>;

    /// Headers whose received date falls within `[from, to]`.
    fn get_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<Grn>>;

    /// Every GRN raised against a purchase order, items attached, oldest first.
    fn list_by_purchase_order(&self, order_id: PurchaseOrderId) -> RepoResult<Vec<Grn>>;

    /// Items of a GRN in line order.
    fn list_items(&self, grn_id: GrnId) -> RepoResult<Vec<GrnItem>>;
}

/// The collaborators the engine needs, as shared trait objects.
#[derive(Clone)]
pub struct Repositories {
    /// Purchase order persistence.
    pub purchase_orders: Arc<dyn PurchaseOrderRepository>,
    /// GRN persistence.
    pub receipts: Arc<dyn GoodsReceiptRepository>,
    /// Supplier lookup.
    pub suppliers: Arc<dyn SupplierDirectory>,
    /// Product lookup.
    pub products: Arc<dyn ProductCatalog>,
}
