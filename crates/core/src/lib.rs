//! Core business logic for Stockyard.
//!
//! This crate contains the purchase order / goods receipt reconciliation
//! engine with ZERO web or database dependencies. Persistence and master data
//! are reached through the traits in [`repository`].
//!
//! # Modules
//!
//! - `validation` - Field, range and length checks for PO and GRN payloads
//! - `numbering` - Document number allocation (`PO202501` + `0001`)
//! - `finance` - Line, purchase order and GRN totals
//! - `purchasing` - Purchase order lifecycle and item mutation
//! - `receiving` - Goods received note lifecycle and reconciliation
//! - `engine` - Facade wiring the managers to one set of repositories

pub mod engine;
pub mod error;
pub mod finance;
pub mod numbering;
pub mod purchasing;
pub mod receiving;
pub mod repository;
pub mod validation;

pub use engine::ProcurementEngine;
pub use error::ProcurementError;
pub use repository::{RepoResult, Repositories, RepositoryError};
