//! Purchase order lifecycle.
//!
//! # Modules
//!
//! - `types` - Purchase order aggregate, status state machine, input payloads
//! - `service` - `PurchaseOrderManager`: create/update/delete, transitions, items

pub mod service;
pub mod types;

#[cfg(test)]
mod status_props;

pub use service::PurchaseOrderManager;
pub use types::{
    PurchaseOrder, PurchaseOrderFilter, PurchaseOrderInput, PurchaseOrderItem,
    PurchaseOrderItemInput, PurchaseOrderStatus,
};
