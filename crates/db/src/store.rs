//! The in-memory backend as a whole.

use std::sync::Arc;

use stockyard_core::Repositories;
use stockyard_core::repository::{ProductRecord, SupplierRecord};
use stockyard_shared::types::{ProductId, SupplierId};

use crate::repositories::{GoodsReceiptStore, ProductStore, PurchaseOrderStore, SupplierStore};

/// Every store the engine needs, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    purchase_orders: Arc<PurchaseOrderStore>,
    receipts: Arc<GoodsReceiptStore>,
    suppliers: Arc<SupplierStore>,
    products: Arc<ProductStore>,
}

impl MemoryStore {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a supplier and returns its id.
    pub fn add_supplier(&self, name: impl Into<String>, is_active: bool) -> SupplierId {
        let id = SupplierId::new();
        self.suppliers.upsert(SupplierRecord {
            id,
            name: name.into(),
            is_active,
        });
        id
    }

    /// Registers a product and returns its id.
    pub fn add_product(
        &self,
        sku: impl Into<String>,
        name: impl Into<String>,
        is_active: bool,
    ) -> ProductId {
        let id = ProductId::new();
        self.products.upsert(ProductRecord {
            id,
            sku: sku.into(),
            name: name.into(),
            is_active,
        });
        id
    }

    /// Supplier master data.
    #[must_use]
    pub fn suppliers(&self) -> &SupplierStore {
        &self.suppliers
    }

    /// Product master data.
    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.products
    }

    /// Purchase order rows.
    #[must_use]
    pub fn purchase_orders(&self) -> &PurchaseOrderStore {
        &self.purchase_orders
    }

    /// GRN rows.
    #[must_use]
    pub fn receipts(&self) -> &GoodsReceiptStore {
        &self.receipts
    }

    /// The stores as engine collaborators.
    #[must_use]
    pub fn repositories(&self) -> Repositories {
        Repositories {
            purchase_orders: self.purchase_orders.clone(),
            receipts: self.receipts.clone(),
            suppliers: self.suppliers.clone(),
            products: self.products.clone(),
        }
    }
}
