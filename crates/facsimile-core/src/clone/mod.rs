//! Deep cloning
//!
//! Copies an object graph inside a [`Heap`] so that the copy shares no
//! mutable state with the original:
//!
//! - [`classify`] decides per value whether it is copied, excluded or
//!   traversed
//! - [`registry`] maps original identities to clones within one call
//! - [`fields`] enumerates every field of a class, ancestors included
//! - [`array`] visits every index of a rank-N array
//! - [`engine`] ties them together
//!
//! # Example
//!
//! ```
//! use facsimile_core::{Class, Heap, Value, ValueType};
//!
//! let mut heap = Heap::new();
//! let node = heap
//!     .register_class(
//!         Class::new("Node")
//!             .public("value", ValueType::I32)
//!             .public("next", ValueType::Object(0)),
//!     )
//!     .unwrap();
//!
//! // A node that points at itself
//! let a = heap.alloc_object(node).unwrap();
//! heap.set_field_by_name(a, "value", Value::i32(5)).unwrap();
//! heap.set_field_by_name(a, "next", Value::Ref(a)).unwrap();
//!
//! let copy = heap.deep_clone(&Value::Ref(a)).unwrap();
//! let b = copy.as_object_ref().unwrap();
//! assert_ne!(a, b);
//! assert_eq!(heap.field_by_name(b, "next").unwrap(), &Value::Ref(b));
//! ```

pub mod array;
pub mod classify;
pub mod engine;
pub mod fields;
pub mod registry;

pub use array::Odometer;
pub use classify::{ExclusionKind, HostMarker, Strategy, TypeClassifier};
pub use engine::{CloneEngine, CloneStats};
pub use fields::FieldWalker;
pub use registry::IdentityRegistry;

use crate::heap::Heap;
use crate::options::CloneOptions;
use crate::value::{ObjectRef, Value};
use crate::CloneResult;
use tracing::debug;

impl Heap {
    /// Deep-clone a value with default options
    pub fn deep_clone(&mut self, value: &Value) -> CloneResult<Value> {
        self.deep_clone_with(value, &CloneOptions::default())
    }

    /// Deep-clone a value
    pub fn deep_clone_with(&mut self, value: &Value, options: &CloneOptions) -> CloneResult<Value> {
        debug!(root = ?value, max_depth = options.max_depth, "deep clone started");
        CloneEngine::new(self, options).clone_value(value)
    }

    /// Copy `source` into an existing `target` with default options
    pub fn clone_into(&mut self, source: ObjectRef, target: ObjectRef) -> CloneResult<()> {
        self.clone_into_with(source, target, &CloneOptions::default())
    }

    /// Copy `source` into an existing `target`
    ///
    /// `target` must have the same runtime shape as `source`. Its slots
    /// are overwritten; references from `source`'s graph back to `source`
    /// resolve to `target`.
    pub fn clone_into_with(
        &mut self,
        source: ObjectRef,
        target: ObjectRef,
        options: &CloneOptions,
    ) -> CloneResult<()> {
        debug!(source = %source, target = %target, "deep clone into target started");
        CloneEngine::new(self, options).clone_into(source, target)
    }
}
