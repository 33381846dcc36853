//! Field walker
//!
//! Enumerates every data field of a class: first the fields the class
//! declares itself, then each ancestor's own declarations, walking the
//! parent chain outward. A level never re-yields a field owned by
//! another level, so a name shadowed on two levels comes back as two
//! descriptors with two distinct slots.

use crate::heap::{ClassRegistry, HeapError};
use crate::object::{Class, Object};
use crate::types::{ClassId, FieldDescriptor};
use crate::value::Value;

/// Iterator over all fields of a class, including private ancestor fields
#[derive(Debug, Clone)]
pub struct FieldWalker<'a> {
    registry: &'a ClassRegistry,
    current: Option<&'a Class>,
    index: usize,
}

impl<'a> FieldWalker<'a> {
    /// Start walking at `class_id`
    ///
    /// An unknown class yields nothing.
    pub fn new(registry: &'a ClassRegistry, class_id: ClassId) -> Self {
        Self {
            registry,
            current: registry.get(class_id),
            index: 0,
        }
    }
}

impl Iterator for FieldWalker<'_> {
    type Item = FieldDescriptor;

    fn next(&mut self) -> Option<FieldDescriptor> {
        loop {
            let class = self.current?;
            if let Some(field) = class.own_field_at(self.index) {
                self.index += 1;
                return Some(field);
            }
            // This level is done, move to the parent
            self.current = class.parent_id.and_then(|p| self.registry.get(p));
            self.index = 0;
        }
    }
}

/// Read a field slot, whatever its visibility
pub fn get<'o>(object: &'o Object, field: &FieldDescriptor) -> Result<&'o Value, HeapError> {
    object.get_field(field.slot).ok_or(HeapError::FieldOutOfBounds {
        slot: field.slot,
        count: object.field_count(),
    })
}

/// Write a field slot, whatever its visibility
pub fn set(object: &mut Object, field: &FieldDescriptor, value: Value) -> Result<(), HeapError> {
    let count = object.field_count();
    object
        .set_field(field.slot, value)
        .map_err(|_| HeapError::FieldOutOfBounds {
            slot: field.slot,
            count,
        })
}
