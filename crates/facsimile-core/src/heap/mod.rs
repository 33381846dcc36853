//! Managed object heap
//!
//! The heap is an arena of [`HeapObject`]s addressed by [`ObjectRef`].
//! Handles are never reused, so a handle is a stable identity for the
//! lifetime of the heap. Together with the [`ClassRegistry`] the heap is
//! the introspection capability the clone engine runs on: it can list a
//! class's declared fields and ancestors, read and write slots, report
//! array shapes, and allocate bare instances of a class.
//!
//! # Example
//!
//! ```
//! use facsimile_core::{Class, Heap, Value, ValueType};
//!
//! let mut heap = Heap::new();
//! let node = heap
//!     .register_class(Class::new("Node").public("value", ValueType::I32))
//!     .unwrap();
//! let obj = heap.alloc_object(node).unwrap();
//! heap.set_field_by_name(obj, "value", Value::i32(5)).unwrap();
//! assert_eq!(heap.field_by_name(obj, "value").unwrap(), &Value::i32(5));
//! ```

mod classes;

pub use classes::ClassRegistry;

use crate::object::{Array, Callback, Class, HeapObject, NativeHandle, Object};
use crate::options::HeapLimits;
use crate::types::{ClassId, ValueType};
use crate::value::{ObjectRef, Value};
use thiserror::Error;

/// Heap-level failures
#[derive(Debug, Error)]
pub enum HeapError {
    /// Allocation would exceed the configured object limit
    #[error("Heap object limit exceeded ({0} objects)")]
    LimitExceeded(usize),

    /// Class ID is not registered
    #[error("Unknown class id: {0}")]
    UnknownClass(ClassId),

    /// Class name is already registered
    #[error("Class already registered: {0}")]
    DuplicateClass(String),

    /// Reference does not resolve to a heap object
    #[error("Dangling reference: {0}")]
    DanglingRef(ObjectRef),

    /// Heap object is not of the expected kind
    #[error("Expected {expected} at {at}, found {found}")]
    WrongKind {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind actually stored
        found: &'static str,
        /// Offending reference
        at: ObjectRef,
    },

    /// Slot index outside the object's layout
    #[error("Field index {slot} out of bounds (object has {count} fields)")]
    FieldOutOfBounds {
        /// Requested slot
        slot: usize,
        /// Number of slots
        count: usize,
    },

    /// No field with this name in the class hierarchy
    #[error("No field named '{0}'")]
    NoSuchField(String),

    /// Value does not fit the declared field type
    #[error("Field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type
        expected: ValueType,
        /// Runtime value type name
        found: &'static str,
    },

    /// Array index or shape error
    #[error("Invalid array access: {0}")]
    InvalidShape(String),
}

/// Heap statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total heap objects
    pub objects: usize,
    /// Class instances
    pub instances: usize,
    /// Arrays
    pub arrays: usize,
    /// Callback handles
    pub callbacks: usize,
    /// Native handles
    pub natives: usize,
}

/// Arena of heap objects plus the class registry describing them
#[derive(Debug, Default)]
pub struct Heap {
    /// All allocations, indexed by `ObjectRef`
    objects: Vec<HeapObject>,

    /// Class metadata
    classes: ClassRegistry,

    /// Allocation limits
    limits: HeapLimits,
}

impl Heap {
    /// Create a new unlimited heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a heap with allocation limits
    pub fn with_limits(limits: HeapLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Get the allocation limits
    pub fn limits(&self) -> &HeapLimits {
        &self.limits
    }

    /// Set the maximum number of heap objects
    pub fn set_max_objects(&mut self, max: Option<usize>) {
        self.limits.max_objects = max;
    }

    /// Get the class registry
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Register a class
    pub fn register_class(&mut self, class: Class) -> Result<ClassId, HeapError> {
        self.classes.register(class)
    }

    /// Get the class of an instance
    pub fn class_of(&self, r: ObjectRef) -> Result<&Class, HeapError> {
        let class_id = self.object(r)?.class_id;
        self.classes.try_get(class_id)
    }

    /// Allocate a heap object
    pub fn alloc(&mut self, object: HeapObject) -> Result<ObjectRef, HeapError> {
        if let Some(max) = self.limits.max_objects {
            if self.objects.len() >= max {
                return Err(HeapError::LimitExceeded(max));
            }
        }
        let r = ObjectRef::from_index(self.objects.len());
        self.objects.push(object);
        Ok(r)
    }

    /// Allocate an instance with every slot set to its placeholder default
    pub fn alloc_object(&mut self, class_id: ClassId) -> Result<ObjectRef, HeapError> {
        let object = self.blank_instance(class_id)?;
        self.alloc(HeapObject::Object(object))
    }

    /// Build a default instance of a class
    ///
    /// Host-managed classes are never instantiated here and yield null;
    /// the host creates those itself.
    pub fn instantiate(&mut self, class_id: ClassId) -> Result<Value, HeapError> {
        if self.classes.try_get(class_id)?.host_managed {
            return Ok(Value::Null);
        }
        self.alloc_object(class_id).map(Value::Ref)
    }

    /// Allocate an array with every cell set to the element default
    pub fn alloc_array(&mut self, element: ValueType, dims: Vec<usize>) -> Result<ObjectRef, HeapError> {
        self.alloc(HeapObject::Array(Array::new(element, dims)))
    }

    /// Allocate a callback handle
    pub fn alloc_callback(&mut self, callback: Callback) -> Result<ObjectRef, HeapError> {
        self.alloc(HeapObject::Callback(callback))
    }

    /// Allocate an opaque native handle
    pub fn alloc_native(&mut self, handle: NativeHandle) -> Result<ObjectRef, HeapError> {
        self.alloc(HeapObject::Native(handle))
    }

    /// Get a heap object
    pub fn get(&self, r: ObjectRef) -> Option<&HeapObject> {
        self.objects.get(r.index())
    }

    /// Get a heap object (mutable)
    pub fn get_mut(&mut self, r: ObjectRef) -> Option<&mut HeapObject> {
        self.objects.get_mut(r.index())
    }

    /// Get a heap object, failing with `DanglingRef`
    pub fn try_get(&self, r: ObjectRef) -> Result<&HeapObject, HeapError> {
        self.get(r).ok_or(HeapError::DanglingRef(r))
    }

    /// Get a class instance
    pub fn object(&self, r: ObjectRef) -> Result<&Object, HeapError> {
        let obj = self.try_get(r)?;
        obj.as_object().ok_or(HeapError::WrongKind {
            expected: "object",
            found: obj.kind_name(),
            at: r,
        })
    }

    /// Get a class instance (mutable)
    pub fn object_mut(&mut self, r: ObjectRef) -> Result<&mut Object, HeapError> {
        let obj = self.get_mut(r).ok_or(HeapError::DanglingRef(r))?;
        let found = obj.kind_name();
        obj.as_object_mut().ok_or(HeapError::WrongKind {
            expected: "object",
            found,
            at: r,
        })
    }

    /// Get an array
    pub fn array(&self, r: ObjectRef) -> Result<&Array, HeapError> {
        let obj = self.try_get(r)?;
        obj.as_array().ok_or(HeapError::WrongKind {
            expected: "array",
            found: obj.kind_name(),
            at: r,
        })
    }

    /// Get an array (mutable)
    pub fn array_mut(&mut self, r: ObjectRef) -> Result<&mut Array, HeapError> {
        let obj = self.get_mut(r).ok_or(HeapError::DanglingRef(r))?;
        let found = obj.kind_name();
        obj.as_array_mut().ok_or(HeapError::WrongKind {
            expected: "array",
            found,
            at: r,
        })
    }

    /// Read a field slot
    pub fn field(&self, r: ObjectRef, slot: usize) -> Result<&Value, HeapError> {
        let obj = self.object(r)?;
        obj.get_field(slot).ok_or(HeapError::FieldOutOfBounds {
            slot,
            count: obj.field_count(),
        })
    }

    /// Write a field slot without a declared-type check
    pub fn set_field(&mut self, r: ObjectRef, slot: usize, value: Value) -> Result<(), HeapError> {
        let obj = self.object_mut(r)?;
        let count = obj.field_count();
        obj.set_field(slot, value)
            .map_err(|_| HeapError::FieldOutOfBounds { slot, count })
    }

    /// Read a field by name; the most-derived declaration wins
    pub fn field_by_name(&self, r: ObjectRef, name: &str) -> Result<&Value, HeapError> {
        let class_id = self.object(r)?.class_id;
        let field = self
            .classes
            .fields_of(class_id)
            .find(|f| f.name == name)
            .ok_or_else(|| HeapError::NoSuchField(name.to_string()))?;
        self.field(r, field.slot)
    }

    /// Write a field by name, checking the declared type
    pub fn set_field_by_name(&mut self, r: ObjectRef, name: &str, value: Value) -> Result<(), HeapError> {
        let class_id = self.object(r)?.class_id;
        let field = self
            .classes
            .fields_of(class_id)
            .find(|f| f.name == name)
            .ok_or_else(|| HeapError::NoSuchField(name.to_string()))?;
        if !field.ty.admits(&value) {
            return Err(HeapError::TypeMismatch {
                field: field.name,
                expected: field.ty,
                found: value.type_name(),
            });
        }
        if let Value::Ref(target) = value {
            let held = self.try_get(target)?;
            if !self.ref_matches(field.ty, held) {
                return Err(HeapError::TypeMismatch {
                    field: field.name,
                    expected: field.ty,
                    found: held.kind_name(),
                });
            }
        }
        self.set_field(r, field.slot, value)
    }

    /// Check a referenced heap object against a declared reference type
    fn ref_matches(&self, ty: ValueType, held: &HeapObject) -> bool {
        match (ty, held) {
            (ValueType::Any, _) => true,
            (ValueType::Function, HeapObject::Callback(_)) => true,
            (ValueType::Array, HeapObject::Array(_)) => true,
            (ValueType::Object(base), HeapObject::Object(obj)) => {
                self.classes.is_subclass_of(obj.class_id, base)
            }
            // Native handles only live in untyped slots
            _ => false,
        }
    }

    /// Get number of heap objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Get heap statistics
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            objects: self.objects.len(),
            ..HeapStats::default()
        };
        for obj in &self.objects {
            match obj {
                HeapObject::Object(_) => stats.instances += 1,
                HeapObject::Array(_) => stats.arrays += 1,
                HeapObject::Callback(_) => stats.callbacks += 1,
                HeapObject::Native(_) => stats.natives += 1,
            }
        }
        stats
    }

    /// Release every object allocated at or after `len`
    ///
    /// Only sound when nothing below `len` refers to the released
    /// objects; the clone engine also restores any target it wrote into.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.objects.truncate(len);
    }

    /// Build an unallocated instance with placeholder defaults
    pub(crate) fn blank_instance(&self, class_id: ClassId) -> Result<Object, HeapError> {
        let class = self.classes.try_get(class_id)?;
        let mut object = Object::new(class_id, class.field_count);
        for field in self.classes.fields_of(class_id) {
            object.fields[field.slot] = field.ty.default_value();
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_heap() -> (Heap, ClassId, ClassId) {
        let mut heap = Heap::new();
        let base = heap
            .register_class(
                Class::new("Entity")
                    .private("id", ValueType::I64)
                    .private("name", ValueType::Str),
            )
            .unwrap();
        let person = heap
            .register_class(
                Class::new("Person")
                    .with_parent(base)
                    .public("name", ValueType::Str)
                    .public("friend", ValueType::Object(base)),
            )
            .unwrap();
        (heap, base, person)
    }

    #[test]
    fn test_heap_creation() {
        let heap = Heap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.stats(), HeapStats::default());
    }

    #[test]
    fn test_alloc_object_defaults() {
        let (mut heap, _, person) = person_heap();
        let r = heap.alloc_object(person).unwrap();

        let obj = heap.object(r).unwrap();
        assert_eq!(obj.field_count(), 4);
        assert_eq!(obj.fields[0], Value::I64(0));
        assert_eq!(obj.fields[1], Value::str(""));
        assert_eq!(obj.fields[3], Value::Null);
    }

    #[test]
    fn test_alloc_unknown_class() {
        let mut heap = Heap::new();
        assert!(matches!(
            heap.alloc_object(3),
            Err(HeapError::UnknownClass(3))
        ));
    }

    #[test]
    fn test_heap_limit() {
        let mut heap = Heap::with_limits(HeapLimits::with_max_objects(2));
        heap.alloc_array(ValueType::I32, vec![1]).unwrap();
        heap.alloc_array(ValueType::I32, vec![1]).unwrap();
        assert!(matches!(
            heap.alloc_array(ValueType::I32, vec![1]),
            Err(HeapError::LimitExceeded(2))
        ));

        heap.set_max_objects(None);
        assert!(heap.alloc_array(ValueType::I32, vec![1]).is_ok());
    }

    #[test]
    fn test_field_by_name_prefers_most_derived() {
        let (mut heap, _, person) = person_heap();
        let r = heap.alloc_object(person).unwrap();

        heap.set_field_by_name(r, "name", Value::str("derived")).unwrap();
        heap.set_field(r, 1, Value::str("base")).unwrap();

        assert_eq!(heap.field_by_name(r, "name").unwrap(), &Value::str("derived"));
        assert_eq!(heap.field(r, 1).unwrap(), &Value::str("base"));
        assert_eq!(heap.field(r, 2).unwrap(), &Value::str("derived"));
    }

    #[test]
    fn test_field_errors() {
        let (mut heap, _, person) = person_heap();
        let r = heap.alloc_object(person).unwrap();

        assert!(matches!(
            heap.field_by_name(r, "age"),
            Err(HeapError::NoSuchField(_))
        ));
        assert!(matches!(
            heap.set_field_by_name(r, "id", Value::str("x")),
            Err(HeapError::TypeMismatch { .. })
        ));
        let arr = heap.alloc_array(ValueType::I32, vec![1]).unwrap();
        assert!(matches!(
            heap.set_field_by_name(r, "friend", Value::Ref(arr)),
            Err(HeapError::TypeMismatch { found: "array", .. })
        ));
        assert!(matches!(
            heap.field(r, 9),
            Err(HeapError::FieldOutOfBounds { slot: 9, count: 4 })
        ));
        assert!(matches!(
            heap.field(ObjectRef::from_index(99), 0),
            Err(HeapError::DanglingRef(_))
        ));
    }

    #[test]
    fn test_wrong_kind() {
        let mut heap = Heap::new();
        let arr = heap.alloc_array(ValueType::I32, vec![2]).unwrap();
        assert!(matches!(
            heap.object(arr),
            Err(HeapError::WrongKind { expected: "object", found: "array", .. })
        ));
        let cb = heap.alloc_callback(Callback::new("tick")).unwrap();
        assert!(heap.array_mut(cb).is_err());
    }

    #[test]
    fn test_instantiate_skips_host_managed() {
        let mut heap = Heap::new();
        let texture = heap
            .register_class(Class::new("Texture").host_managed())
            .unwrap();
        let plain = heap.register_class(Class::new("Plain")).unwrap();

        assert_eq!(heap.instantiate(texture).unwrap(), Value::Null);
        assert!(heap.instantiate(plain).unwrap().is_ref());
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_heap_stats() {
        let (mut heap, base, _) = person_heap();
        heap.alloc_object(base).unwrap();
        heap.alloc_array(ValueType::Any, vec![2, 2]).unwrap();
        heap.alloc_callback(Callback::new("f")).unwrap();
        heap.alloc_native(NativeHandle::new("socket", 3)).unwrap();

        let stats = heap.stats();
        assert_eq!(stats.objects, 4);
        assert_eq!(stats.instances, 1);
        assert_eq!(stats.arrays, 1);
        assert_eq!(stats.callbacks, 1);
        assert_eq!(stats.natives, 1);
    }

    #[test]
    fn test_class_of() {
        let (mut heap, _, person) = person_heap();
        let r = heap.alloc_object(person).unwrap();
        assert_eq!(heap.class_of(r).unwrap().name, "Person");
    }
}
