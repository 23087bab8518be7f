//! Versioned document table shared by the purchase order and GRN stores.
//!
//! Rows are whole aggregates (header plus items). A number index enforces
//! unique document numbers. Writers lock the number index before the row map,
//! never the other way round, and never hold two guards at once.

use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use stockyard_core::purchasing::PurchaseOrder;
use stockyard_core::receiving::Grn;
use stockyard_core::repository::{RepoResult, RepositoryError};
use stockyard_shared::types::{GrnId, PurchaseOrderId};
use uuid::Uuid;

/// A document that can be stored in a [`DocumentTable`].
pub trait Document: Clone + Debug + Send + Sync {
    /// Typed primary key.
    type Id: Copy + Eq + Hash + Debug + Send + Sync + Into<Uuid>;

    /// Primary key.
    fn id(&self) -> Self::Id;
    /// Primary key as a plain UUID, for errors.
    fn uuid(&self) -> Uuid;
    /// Unique document number.
    fn number(&self) -> &str;
    /// Optimistic concurrency token.
    fn version(&self) -> u64;
    /// Sets the concurrency token.
    fn set_version(&mut self, version: u64);
    /// Creation time, used for ordering.
    fn created_at(&self) -> DateTime<Utc>;
    /// Copy without items.
    fn header(&self) -> Self;
}

impl Document for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> PurchaseOrderId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.into_inner()
    }

    fn number(&self) -> &str {
        &self.po_number
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn header(&self) -> Self {
        Self {
            items: Vec::new(),
            ..self.clone()
        }
    }
}

impl Document for Grn {
    type Id = GrnId;

    fn id(&self) -> GrnId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.into_inner()
    }

    fn number(&self) -> &str {
        &self.grn_number
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn header(&self) -> Self {
        Self {
            items: Vec::new(),
            ..self.clone()
        }
    }
}

/// Rows keyed by id plus a unique number index.
#[derive(Debug)]
pub struct DocumentTable<D: Document> {
    rows: DashMap<D::Id, D>,
    numbers: DashMap<String, D::Id>,
}

impl<D: Document> Default for DocumentTable<D> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            numbers: DashMap::new(),
        }
    }
}

impl<D: Document> DocumentTable<D> {
    /// Inserts a new document.
    ///
    /// Fails with `Duplicate` if its number is already taken.
    pub fn insert(&self, doc: &D) -> RepoResult<()> {
        self.reserve(doc.number(), doc.id())?;
        self.rows.insert(doc.id(), doc.clone());
        Ok(())
    }

    /// Replaces a document if the stored version equals `doc.version()`.
    ///
    /// Returns the stored copy with its version incremented.
    pub fn replace(&self, doc: &D) -> RepoResult<D> {
        let id = doc.id();
        let current_number = self
            .rows
            .get(&id)
            .map(|row| row.number().to_string())
            .ok_or_else(|| RepositoryError::NotFound(doc.uuid()))?;

        let reserved = current_number != doc.number() && self.reserve(doc.number(), id)?;

        let outcome = match self.rows.get_mut(&id) {
            None => Err(RepositoryError::NotFound(doc.uuid())),
            Some(row) if row.version() != doc.version() => {
                let found = row.version();
                drop(row);
                Err(RepositoryError::VersionConflict {
                    id: doc.uuid(),
                    expected: doc.version(),
                    found,
                })
            }
            Some(mut row) => {
                let mut stored = doc.clone();
                stored.set_version(doc.version() + 1);
                let previous = std::mem::replace(&mut *row, stored.clone());
                Ok((previous.number().to_string(), stored))
            }
        };

        match outcome {
            Ok((previous_number, stored)) => {
                if previous_number != stored.number() {
                    self.numbers.remove_if(&previous_number, |_, owner| *owner == id);
                }
                Ok(stored)
            }
            Err(err) => {
                if reserved {
                    self.numbers.remove_if(doc.number(), |_, owner| *owner == id);
                }
                Err(err)
            }
        }
    }

    /// Removes a document if the stored version equals `version` and
    /// releases its number.
    pub fn remove(&self, id: D::Id, version: u64) -> RepoResult<D> {
        if let Some((_, doc)) = self.rows.remove_if(&id, |_, row| row.version() == version) {
            self.numbers.remove_if(doc.number(), |_, owner| *owner == id);
            return Ok(doc);
        }
        match self.rows.get(&id) {
            Some(row) => Err(RepositoryError::VersionConflict {
                id: row.uuid(),
                expected: version,
                found: row.version(),
            }),
            None => Err(RepositoryError::NotFound(id.into())),
        }
    }

    /// Full document by id.
    pub fn get(&self, id: D::Id) -> Option<D> {
        self.rows.get(&id).map(|row| row.clone())
    }

    /// Full document by number.
    pub fn get_by_number(&self, number: &str) -> Option<D> {
        let id = self.numbers.get(number).map(|owner| *owner)?;
        self.get(id)
    }

    /// Full documents passing `predicate`, oldest first.
    pub fn select(&self, predicate: impl Fn(&D) -> bool) -> Vec<D> {
        let mut docs: Vec<D> = self
            .rows
            .iter()
            .filter(|row| predicate(row.value()))
            .map(|row| row.value().clone())
            .collect();
        docs.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.number().cmp(b.number()))
        });
        docs
    }

    /// Headers passing `predicate`, newest first.
    pub fn select_headers(&self, predicate: impl Fn(&D) -> bool) -> Vec<D> {
        let mut headers: Vec<D> = self
            .select(predicate)
            .iter()
            .map(Document::header)
            .collect();
        headers.reverse();
        headers
    }

    /// Number of documents passing `predicate`.
    pub fn count(&self, predicate: impl Fn(&D) -> bool) -> u64 {
        let matching = self.rows.iter().filter(|row| predicate(row.value())).count();
        u64::try_from(matching).unwrap_or(u64::MAX)
    }

    /// Visits every stored document until `f` returns `Some`.
    pub fn find_map<T>(&self, f: impl Fn(&D) -> Option<T>) -> Option<T> {
        self.rows.iter().find_map(|row| f(row.value()))
    }

    // Returns true if the number was newly reserved for `id`.
    fn reserve(&self, number: &str, id: D::Id) -> RepoResult<bool> {
        match self.numbers.entry(number.to_string()) {
            Entry::Occupied(owner) if *owner.get() == id => Ok(false),
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(number.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(true)
            }
        }
    }
}
