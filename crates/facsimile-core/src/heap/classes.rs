//! Class registry for managing runtime class metadata

use super::HeapError;
use crate::clone::fields::FieldWalker;
use crate::object::Class;
use crate::types::ClassId;
use rustc_hash::FxHashMap;

/// Class registry for a heap
///
/// Classes are append-only. A class can only name a parent that is
/// already registered, so the ancestor chain is always acyclic and the
/// slot layout of every class is fixed at registration.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Class>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new class, assigning its ID and slot layout
    ///
    /// Host-managed status is inherited: a subclass of a host-managed
    /// class is host-managed too.
    pub fn register(&mut self, mut class: Class) -> Result<ClassId, HeapError> {
        if self.name_to_id.contains_key(&class.name) {
            return Err(HeapError::DuplicateClass(class.name));
        }

        class.field_offset = match class.parent_id {
            Some(parent_id) => {
                let parent = self
                    .classes
                    .get(parent_id)
                    .ok_or(HeapError::UnknownClass(parent_id))?;
                class.host_managed |= parent.host_managed;
                parent.field_count
            }
            None => 0,
        };
        class.field_count = class.field_offset + class.declared.len();

        let id = self.classes.len();
        class.id = id;
        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);

        Ok(id)
    }

    /// Get class by ID
    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Get class by ID, failing with `UnknownClass`
    pub fn try_get(&self, id: ClassId) -> Result<&Class, HeapError> {
        self.classes.get(id).ok_or(HeapError::UnknownClass(id))
    }

    /// Get class by name
    pub fn by_name(&self, name: &str) -> Option<&Class> {
        self.name_to_id
            .get(name)
            .and_then(|id| self.classes.get(*id))
    }

    /// Get the parent of a class
    pub fn parent_of(&self, id: ClassId) -> Option<&Class> {
        self.get(id)
            .and_then(|c| c.parent_id)
            .and_then(|p| self.get(p))
    }

    /// Iterate the class itself and then each ancestor, outward
    pub fn lineage(&self, id: ClassId) -> impl Iterator<Item = &Class> + '_ {
        std::iter::successors(self.get(id), move |c| c.parent_id.and_then(|p| self.get(p)))
    }

    /// Iterate the ancestors of a class, nearest first
    pub fn ancestors(&self, id: ClassId) -> impl Iterator<Item = &Class> + '_ {
        self.lineage(id).skip(1)
    }

    /// Check if `id` is `base` or derives from it
    pub fn is_subclass_of(&self, id: ClassId, base: ClassId) -> bool {
        self.lineage(id).any(|c| c.id == base)
    }

    /// Walk every field of a class, most-derived declarations first
    pub fn fields_of(&self, id: ClassId) -> FieldWalker<'_> {
        FieldWalker::new(self, id)
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        self.classes.len()
    }

    /// Iterate over all classes
    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }

    /// Get number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
