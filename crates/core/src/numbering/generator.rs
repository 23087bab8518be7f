//! Document number allocation.
//!
//! Numbers look like `PO2025010007`: a kind prefix, the UTC year and month,
//! and a 4-digit suffix. Each `(kind, prefix)` key has a cursor holding the
//! last suffix handed out. Allocation holds the key's map entry while it
//! probes, so two callers never receive the same number from one generator.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::ProcurementError;
use crate::repository::RepoResult;

/// Highest suffix available in one month.
pub const MAX_SUFFIX: u32 = 9999;

/// The kind of document being numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Purchase order (`PO`).
    PurchaseOrder,
    /// Goods received note (`GRN`).
    GoodsReceipt,
}

impl DocumentKind {
    /// Returns the number prefix for this kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PurchaseOrder => "PO",
            Self::GoodsReceipt => "GRN",
        }
    }

    /// Returns the period prefix, e.g. `PO202501`.
    #[must_use]
    pub fn prefix_at(&self, at: DateTime<Utc>) -> String {
        format!("{}{}", self.code(), at.format("%Y%m"))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Allocates unique, sequential document numbers per kind and month.
#[derive(Debug, Default)]
pub struct DocumentNumberGenerator {
    cursors: DashMap<(DocumentKind, String), u32>,
}

impl DocumentNumberGenerator {
    /// Creates a generator with no numbers claimed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the next free number for `kind` in the month of `at`.
    ///
    /// Probing starts after the last suffix this generator handed out for the
    /// period and skips any number `is_taken` reports as already persisted.
    /// A claimed number is never handed out again, even if the document that
    /// claimed it is never stored.
    ///
    /// `is_taken` runs while the period's entry is held and must not call
    /// back into this generator.
    ///
    /// # Errors
    ///
    /// Returns `NumberSpaceExhausted` once suffix 9999 is used, or the
    /// repository error raised by `is_taken`.
    pub fn next_number<F>(
        &self,
        kind: DocumentKind,
        at: DateTime<Utc>,
        is_taken: F,
    ) -> Result<String, ProcurementError>
    where
        F: Fn(&str) -> RepoResult<bool>,
    {
        let prefix = kind.prefix_at(at);
        let mut cursor = self.cursors.entry((kind, prefix.clone())).or_insert(0);

        for suffix in cursor.saturating_add(1)..=MAX_SUFFIX {
            let candidate = format!("{prefix}{suffix:04}");
            if !is_taken(&candidate)? {
                *cursor = suffix;
                debug!(kind = %kind, number = %candidate, "allocated document number");
                return Ok(candidate);
            }
        }

        *cursor = MAX_SUFFIX;
        Err(ProcurementError::NumberSpaceExhausted { prefix })
    }
}
