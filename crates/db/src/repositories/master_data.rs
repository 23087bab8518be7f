//! Supplier and product lookups backed by in-memory maps.

use dashmap::DashMap;
use stockyard_core::repository::{
    ProductCatalog, ProductRecord, RepoResult, SupplierDirectory, SupplierRecord,
};
use stockyard_shared::types::{ProductId, SupplierId};

/// Supplier records keyed by id.
#[derive(Debug, Default)]
pub struct SupplierStore {
    rows: DashMap<SupplierId, SupplierRecord>,
}

impl SupplierStore {
    /// Inserts or replaces a supplier.
    pub fn upsert(&self, supplier: SupplierRecord) {
        self.rows.insert(supplier.id, supplier);
    }

    /// Flips the active flag. Returns false if the supplier is unknown.
    pub fn set_active(&self, id: SupplierId, is_active: bool) -> bool {
        self.rows
            .get_mut(&id)
            .map(|mut row| row.is_active = is_active)
            .is_some()
    }
}

impl SupplierDirectory for SupplierStore {
    fn get_supplier(&self, id: SupplierId) -> RepoResult<Option<SupplierRecord>> {
        Ok(self.rows.get(&id).map(|row| row.clone()))
    }
}

/// Product records keyed by id.
#[derive(Debug, Default)]
pub struct ProductStore {
    rows: DashMap<ProductId, ProductRecord>,
}

impl ProductStore {
    /// Inserts or replaces a product.
    pub fn upsert(&self, product: ProductRecord) {
        self.rows.insert(product.id, product);
    }

    /// Flips the active flag. Returns false if the product is unknown.
    pub fn set_active(&self, id: ProductId, is_active: bool) -> bool {
        self.rows
            .get_mut(&id)
            .map(|mut row| row.is_active = is_active)
            .is_some()
    }
}

impl ProductCatalog for ProductStore {
    fn get_product(&self, id: ProductId) -> RepoResult<Option<ProductRecord>> {
        Ok(self.rows.get(&id).map(|row| row.clone()))
    }
}
