//! Per-family keyed entity store.
//!
//! [`Registry<T>`] owns the records of one entity family, keyed by slug.
//! `save` is an upsert: writing an existing slug overwrites the record in
//! place and keeps its original position, so `list_all` stays in first
//! insertion order (the deterministic order tests rely on).

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::model::entity::Entity;
use crate::model::types::{DocumentId, Slug};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Keyed store for one entity family.
#[derive(Clone, Debug)]
pub struct Registry<T: Entity> {
    records: IndexMap<Slug, T>,
}

impl<T: Entity> Default for Registry<T> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }
}

impl<T: Entity> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a record by slug. Always succeeds.
    ///
    /// An existing record with the same slug is overwritten in place; the
    /// slug keeps its original insertion position.
    pub fn save(&mut self, record: T) {
        self.records.insert(record.slug().clone(), record);
    }

    /// Look up a record by slug.
    #[must_use]
    pub fn get(&self, slug: &Slug) -> Option<&T> {
        self.records.get(slug)
    }

    /// Mutable lookup, for later blocks in the owning document that extend
    /// a record declared by an earlier block.
    #[must_use]
    pub fn get_mut(&mut self, slug: &Slug) -> Option<&mut T> {
        self.records.get_mut(slug)
    }

    /// Batch lookup: one entry per requested slug, `None` where absent.
    ///
    /// Missing slugs never fail the call.
    #[must_use]
    pub fn get_many(&self, slugs: &[Slug]) -> BTreeMap<Slug, Option<T>> {
        slugs
            .iter()
            .map(|slug| (slug.clone(), self.records.get(slug).cloned()))
            .collect()
    }

    /// All records, in first insertion order.
    #[must_use]
    pub fn list_all(&self) -> Vec<&T> {
        self.records.values().collect()
    }

    /// Remove a record by slug. Returns `true` if something was removed.
    pub fn delete(&mut self, slug: &Slug) -> bool {
        // shift_remove keeps the surviving records in insertion order.
        self.records.shift_remove(slug).is_some()
    }

    /// Linear-scan predicate match on a named field.
    ///
    /// Field values are compared as JSON, so `find_by_field("persona",
    /// &json!("shopper"))` matches an `Option<Slug>` field holding that
    /// slug. Records without the field never match.
    #[must_use]
    pub fn find_by_field(&self, field: &str, value: &serde_json::Value) -> Vec<&T> {
        self.records
            .values()
            .filter(|record| record.field_value(field).as_ref() == Some(value))
            .collect()
    }

    /// All records owned by the given document, in insertion order.
    #[must_use]
    pub fn get_by_owning_document(&self, doc: &DocumentId) -> Vec<&T> {
        self.records
            .values()
            .filter(|record| record.owning_document() == doc)
            .collect()
    }

    /// Remove every record owned by the given document.
    ///
    /// Returns the number of records removed. Idempotent: with no
    /// intervening writes, a second call returns `0`.
    pub fn clear_by_owning_document(&mut self, doc: &DocumentId) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.owning_document() != doc);
        before - self.records.len()
    }

    /// Whether a record with this slug exists.
    #[must_use]
    pub fn contains(&self, slug: &Slug) -> bool {
        self.records.contains_key(slug)
    }

    /// Number of records in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// All slugs currently present, in insertion order.
    #[must_use]
    pub fn slugs(&self) -> Vec<&Slug> {
        self.records.keys().collect()
    }

    /// Consume the registry, yielding records in insertion order.
    pub(crate) fn into_records(self) -> impl Iterator<Item = T> {
        self.records.into_values()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
