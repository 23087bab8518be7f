//! Goods received notes and their reconciliation against purchase orders.
//!
//! # Modules
//!
//! - `types` - GRN aggregate, status state machine, input payloads
//! - `service` - `GoodsReceiptManager`: create/update/delete, transitions, items
//! - `summary` - Per-line received/accepted/outstanding roll-up across GRNs

pub mod service;
pub mod summary;
pub mod types;

pub use service::GoodsReceiptManager;
pub use summary::{ReceiptLine, ReceiptSummary};
pub use types::{Grn, GrnFilter, GrnInput, GrnItem, GrnItemInput, GrnStatus};
