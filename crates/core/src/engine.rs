//! Procurement engine facade.

use std::sync::Arc;

use stockyard_shared::config::AppConfig;

use crate::finance::FinancialCalculator;
use crate::numbering::DocumentNumberGenerator;
use crate::purchasing::PurchaseOrderManager;
use crate::receiving::GoodsReceiptManager;
use crate::repository::Repositories;

/// Both managers and the calculator, wired to one set of repositories and one
/// number generator.
#[derive(Clone)]
pub struct ProcurementEngine {
    purchasing: PurchaseOrderManager,
    receiving: GoodsReceiptManager,
    calculator: FinancialCalculator,
}

impl ProcurementEngine {
    /// Builds the engine.
    #[must_use]
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        let numbers = Arc::new(DocumentNumberGenerator::new());
        Self {
            purchasing: PurchaseOrderManager::new(repos.clone(), Arc::clone(&numbers), config),
            receiving: GoodsReceiptManager::new(repos.clone(), numbers, config),
            calculator: FinancialCalculator::new(repos),
        }
    }

    /// Purchase order operations.
    #[must_use]
    pub fn purchasing(&self) -> &PurchaseOrderManager {
        &self.purchasing
    }

    /// Goods receipt operations.
    #[must_use]
    pub fn receiving(&self) -> &GoodsReceiptManager {
        &self.receiving
    }

    /// Stand-alone total recomputation.
    #[must_use]
    pub fn calculator(&self) -> &FinancialCalculator {
        &self.calculator
    }
}
