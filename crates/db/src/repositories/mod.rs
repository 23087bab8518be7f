//! Repository implementations.
//!
//! Each store implements one of the repository traits from `stockyard-core`
//! on top of `DashMap`.

pub mod goods_receipt;
pub mod master_data;
pub mod purchase_order;
pub mod table;


pub use goods_receipt::GoodsReceiptStore;
pub use master_data::{ProductStore, SupplierStore};
pub use purchase_order::PurchaseOrderStore;
pub use table::{Document, DocumentTable};

// `needle` is expected trimmed and lowercased.
fn text_matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
