//! Payload validation for purchase orders and goods received notes.
//!
//! - `validator` - Required fields, numeric ranges and text-length ceilings

pub mod validator;

#[cfg(test)]
mod validator_props;

pub use validator::ReconciliationValidator;
