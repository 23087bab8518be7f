//! Persistence layer for the procurement engine.
//!
//! This crate provides:
//! - `MemoryStore`, implementing every repository trait of `stockyard-core`
//! - Document-number uniqueness and optimistic version checks on writes
//! - Supplier and product master data for existence/active lookups

pub mod repositories;
pub mod store;

pub use store::MemoryStore;
