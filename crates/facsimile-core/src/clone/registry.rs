//! Identity registry
//!
//! Maps an original object's identity to its clone for the duration of
//! one top-level clone call. Keys are `ObjectRef`s, so two objects with
//! equal contents still get separate clones, while two slots holding the
//! same reference resolve to the same clone.

use crate::defaults::DEFAULT_REGISTRY_CAPACITY;
use crate::value::ObjectRef;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Original-to-clone map scoped to a single clone call
#[derive(Debug)]
pub struct IdentityRegistry {
    entries: FxHashMap<ObjectRef, ObjectRef>,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let mut entries = FxHashMap::default();
        entries.reserve(DEFAULT_REGISTRY_CAPACITY);
        Self { entries }
    }

    /// Look up the clone of `original`
    pub fn lookup(&self, original: ObjectRef) -> Option<ObjectRef> {
        self.entries.get(&original).copied()
    }

    /// Return the existing clone of `original`, or reserve a new one
    ///
    /// `allocate` runs only when no entry exists; its result is recorded
    /// before this returns, so the clone shell is visible to every later
    /// lookup even while its own fields are still being filled. Returns
    /// the clone and whether it already existed. A failed allocation
    /// leaves the registry untouched.
    pub fn lookup_or_reserve<F, E>(
        &mut self,
        original: ObjectRef,
        allocate: F,
    ) -> Result<(ObjectRef, bool), E>
    where
        F: FnOnce() -> Result<ObjectRef, E>,
    {
        match self.entries.entry(original) {
            Entry::Occupied(entry) => Ok((*entry.get(), true)),
            Entry::Vacant(entry) => {
                let clone = allocate()?;
                entry.insert(clone);
                Ok((clone, false))
            }
        }
    }

    /// Check if `original` already has a clone
    pub fn contains(&self, original: ObjectRef) -> bool {
        self.entries.contains_key(&original)
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
