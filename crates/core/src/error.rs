//! Procurement error types.
//!
//! This module defines every error the purchase order / goods receipt engine
//! can return. Each variant knows its HTTP status and API error code so the
//! serving layer can translate without inspecting messages.

use stockyard_shared::AppError;
use stockyard_shared::types::{
    GrnId, GrnItemId, ProductId, PurchaseOrderId, PurchaseOrderItemId, SupplierId,
};
use thiserror::Error;
use uuid::Uuid;

use crate::purchasing::PurchaseOrderStatus;
use crate::receiving::GrnStatus;
use crate::repository::RepositoryError;

/// Errors that can occur during procurement operations.
#[derive(Debug, Error)]
pub enum ProcurementError {
    // ========== Lookup Errors ==========
    /// Purchase order not found.
    #[error("Purchase order {0} not found")]
    PurchaseOrderNotFound(PurchaseOrderId),

    /// Purchase order item not found (or not part of the expected order).
    #[error("Purchase order item {0} not found")]
    PurchaseOrderItemNotFound(PurchaseOrderItemId),

    /// Goods received note not found.
    #[error("GRN {0} not found")]
    GrnNotFound(GrnId),

    /// GRN item not found on the GRN.
    #[error("GRN item {0} not found")]
    GrnItemNotFound(GrnItemId),

    /// Supplier does not exist.
    #[error("Supplier {0} not found")]
    SupplierNotFound(SupplierId),

    /// Supplier exists but is inactive.
    #[error("Supplier {0} is inactive")]
    SupplierInactive(SupplierId),

    /// Product does not exist.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// Product exists but is inactive.
    #[error("Product {0} is inactive")]
    ProductInactive(ProductId),

    // ========== Uniqueness Errors ==========
    /// A purchase order already carries this number.
    #[error("Purchase order number {0} already exists")]
    PurchaseOrderExists(String),

    /// A GRN already carries this number.
    #[error("GRN number {0} already exists")]
    GrnExists(String),

    // ========== Status Errors ==========
    /// Purchase order is not in the status the action requires.
    #[error("Cannot {action} purchase order in status {current}")]
    InvalidPurchaseOrderStatus {
        /// The current status.
        current: PurchaseOrderStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// GRN is not in the status the action requires.
    #[error("Cannot {action} GRN in status {current}")]
    InvalidGrnStatus {
        /// The current status.
        current: GrnStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// Purchase order has been received and is locked.
    #[error("Cannot modify a received purchase order")]
    CannotModifyReceived,

    /// Purchase order has been cancelled and is locked.
    #[error("Cannot modify a cancelled purchase order")]
    CannotModifyCancelled,

    /// GRN has been completed and is locked.
    #[error("Cannot modify a completed GRN")]
    CannotModifyCompleted,

    /// Goods can only be received against an ordered purchase order.
    #[error("Purchase order {id} is {status}; goods can only be received against an ordered purchase order")]
    PurchaseOrderNotOrdered {
        /// The purchase order.
        id: PurchaseOrderId,
        /// Its current status.
        status: PurchaseOrderStatus,
    },

    // ========== Input Errors ==========
    /// Missing field, out-of-range number or oversized text.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Quantity outside its allowed range.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Received quantity is larger than the ordered quantity snapshot.
    #[error("Received quantity {received} exceeds ordered quantity {ordered}")]
    QuantityExceedsOrdered {
        /// Ordered quantity snapshot.
        ordered: i64,
        /// Received quantity requested.
        received: i64,
    },

    /// GRN supplier differs from the purchase order supplier.
    #[error("GRN supplier {actual} does not match purchase order supplier {expected}")]
    SupplierMismatch {
        /// Supplier on the purchase order.
        expected: SupplierId,
        /// Supplier given for the GRN.
        actual: SupplierId,
    },

    // ========== Conflict Errors ==========
    /// Purchase order still has goods received notes.
    #[error("Purchase order {0} has goods received notes")]
    PurchaseOrderHasReceipts(PurchaseOrderId),

    /// Document was changed by someone else since it was read.
    #[error("{document} {id} was modified concurrently")]
    ConcurrentModification {
        /// Document type.
        document: &'static str,
        /// Document id.
        id: Uuid,
    },

    // ========== Infrastructure Errors ==========
    /// All sequence numbers for the period are used.
    #[error("Document numbers exhausted for prefix {prefix}")]
    NumberSpaceExhausted {
        /// The exhausted prefix, e.g. `PO202501`.
        prefix: String,
    },

    /// Persistence failure.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ProcurementError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PurchaseOrderNotFound(_)
            | Self::PurchaseOrderItemNotFound(_)
            | Self::GrnNotFound(_)
            | Self::GrnItemNotFound(_)
            | Self::SupplierNotFound(_)
            | Self::ProductNotFound(_) => 404,

            Self::SupplierInactive(_)
            | Self::ProductInactive(_)
            | Self::InvalidPurchaseOrderStatus { .. }
            | Self::InvalidGrnStatus { .. }
            | Self::CannotModifyReceived
            | Self::CannotModifyCancelled
            | Self::CannotModifyCompleted
            | Self::PurchaseOrderNotOrdered { .. }
            | Self::InvalidInput(_)
            | Self::InvalidQuantity(_)
            | Self::QuantityExceedsOrdered { .. }
            | Self::SupplierMismatch { .. } => 400,

            Self::PurchaseOrderExists(_)
            | Self::GrnExists(_)
            | Self::PurchaseOrderHasReceipts(_)
            | Self::ConcurrentModification { .. } => 409,

            Self::NumberSpaceExhausted { .. } | Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PurchaseOrderNotFound(_) => "PURCHASE_ORDER_NOT_FOUND",
            Self::PurchaseOrderItemNotFound(_) => "PURCHASE_ORDER_ITEM_NOT_FOUND",
            Self::GrnNotFound(_) => "GRN_NOT_FOUND",
            Self::GrnItemNotFound(_) => "GRN_ITEM_NOT_FOUND",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::SupplierInactive(_) => "SUPPLIER_INACTIVE",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::ProductInactive(_) => "PRODUCT_INACTIVE",
            Self::PurchaseOrderExists(_) => "PURCHASE_ORDER_EXISTS",
            Self::GrnExists(_) => "GRN_EXISTS",
            Self::InvalidPurchaseOrderStatus { .. } | Self::InvalidGrnStatus { .. } => {
                "INVALID_STATUS"
            }
            Self::CannotModifyReceived => "CANNOT_MODIFY_RECEIVED",
            Self::CannotModifyCancelled => "CANNOT_MODIFY_CANCELLED",
            Self::CannotModifyCompleted => "CANNOT_MODIFY_COMPLETED",
            Self::PurchaseOrderNotOrdered { .. } => "PURCHASE_ORDER_NOT_ORDERED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::QuantityExceedsOrdered { .. } => "QUANTITY_EXCEEDS_ORDERED",
            Self::SupplierMismatch { .. } => "SUPPLIER_MISMATCH",
            Self::PurchaseOrderHasReceipts(_) => "PURCHASE_ORDER_HAS_RECEIPTS",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::NumberSpaceExhausted { .. } => "NUMBER_SPACE_EXHAUSTED",
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl ProcurementError {
    /// Translates a failed purchase order write.
    pub(crate) fn from_purchase_order_write(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(number) => Self::PurchaseOrderExists(number),
            RepositoryError::VersionConflict { id, .. } => Self::ConcurrentModification {
                document: "Purchase order",
                id,
            },
            RepositoryError::NotFound(id) => {
                Self::PurchaseOrderNotFound(PurchaseOrderId::from_uuid(id))
            }
            other @ RepositoryError::Storage(_) => Self::Repository(other),
        }
    }

    /// Translates a failed GRN write.
    pub(crate) fn from_grn_write(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(number) => Self::GrnExists(number),
            RepositoryError::VersionConflict { id, .. } => Self::ConcurrentModification {
                document: "GRN",
                id,
            },
            RepositoryError::NotFound(id) => Self::GrnNotFound(GrnId::from_uuid(id)),
            other @ RepositoryError::Storage(_) => Self::Repository(other),
        }
    }
}

impl From<ProcurementError> for AppError {
    fn from(err: ProcurementError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            400 => match err {
                ProcurementError::InvalidInput(_)
                | ProcurementError::InvalidQuantity(_)
                | ProcurementError::QuantityExceedsOrdered { .. } => Self::Validation(message),
                _ => Self::BusinessRule(message),
            },
            _ => match err {
                ProcurementError::Repository(_) => Self::Storage(message),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProcurementError::PurchaseOrderNotFound(PurchaseOrderId::new()), 404, "PURCHASE_ORDER_NOT_FOUND")]
    #[case(ProcurementError::GrnNotFound(GrnId::new()), 404, "GRN_NOT_FOUND")]
    #[case(ProcurementError::PurchaseOrderExists("PO2025010001".into()), 409, "PURCHASE_ORDER_EXISTS")]
    #[case(ProcurementError::GrnExists("GRN2025010001".into()), 409, "GRN_EXISTS")]
    #[case(ProcurementError::CannotModifyReceived, 400, "CANNOT_MODIFY_RECEIVED")]
    #[case(ProcurementError::CannotModifyCompleted, 400, "CANNOT_MODIFY_COMPLETED")]
    #[case(ProcurementError::InvalidInput("x".into()), 400, "INVALID_INPUT")]
    #[case(ProcurementError::InvalidQuantity("x".into()), 400, "INVALID_QUANTITY")]
    #[case(ProcurementError::QuantityExceedsOrdered { ordered: 10, received: 11 }, 400, "QUANTITY_EXCEEDS_ORDERED")]
    #[case(ProcurementError::NumberSpaceExhausted { prefix: "PO202501".into() }, 500, "NUMBER_SPACE_EXHAUSTED")]
    fn test_status_and_error_codes(
        #[case] err: ProcurementError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_invalid_status_message_names_status_and_action() {
        let err = ProcurementError::InvalidPurchaseOrderStatus {
            current: PurchaseOrderStatus::Draft,
            action: "approve",
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_STATUS");
        assert_eq!(err.to_string(), "Cannot approve purchase order in status draft");
    }

    #[test]
    fn test_repository_failure_maps_to_storage_error() {
        let err = ProcurementError::from(RepositoryError::Storage("disk full".into()));
        assert_eq!(err.status_code(), 500);
        assert!(matches!(AppError::from(err), AppError::Storage(_)));
    }

    #[test]
    fn test_write_failures_are_translated() {
        let id = Uuid::now_v7();
        assert!(matches!(
            ProcurementError::from_purchase_order_write(RepositoryError::Duplicate("PO2025010001".into())),
            ProcurementError::PurchaseOrderExists(ref n) if n == "PO2025010001"
        ));
        assert!(matches!(
            ProcurementError::from_grn_write(RepositoryError::VersionConflict { id, expected: 1, found: 2 }),
            ProcurementError::ConcurrentModification { document: "GRN", .. }
        ));
        assert_eq!(
            ProcurementError::from_purchase_order_write(RepositoryError::VersionConflict {
                id,
                expected: 0,
                found: 1
            })
            .status_code(),
            409
        );
        assert!(matches!(
            ProcurementError::from_grn_write(RepositoryError::NotFound(id)),
            ProcurementError::GrnNotFound(_)
        ));
    }

    #[test]
    fn test_conversion_to_app_error() {
        assert!(matches!(
            AppError::from(ProcurementError::GrnNotFound(GrnId::new())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(ProcurementError::InvalidQuantity("negative".into())),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(ProcurementError::CannotModifyReceived),
            AppError::BusinessRule(_)
        ));
        assert!(matches!(
            AppError::from(ProcurementError::PurchaseOrderExists("PO2025010001".into())),
            AppError::Conflict(_)
        ));
    }
}
