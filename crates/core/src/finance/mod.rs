//! Document totals: line amounts, purchase order totals and pro-rata GRN
//! totals.

pub mod calculator;

#[cfg(test)]
mod calculator_props;

pub use calculator::{DocumentTotals, FinancialCalculator, LineAmounts};
