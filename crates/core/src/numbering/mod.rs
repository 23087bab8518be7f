//! Human-readable document numbers for purchase orders and GRNs.

pub mod generator;

pub use generator::{DocumentKind, DocumentNumberGenerator, MAX_SUFFIX};
