//! Type classifier
//!
//! Decides how the clone engine handles a value:
//!
//! | Strategy   | Values                                          | Clone result            |
//! |------------|-------------------------------------------------|-------------------------|
//! | Primitive  | null, bool, i32, i64, f64, string               | the value itself        |
//! | Excluded   | callbacks, host-managed instances, native handles, unregistered classes | null or the same reference |
//! | Array      | arrays of any rank                              | new array               |
//! | Composite  | ordinary class instances                        | new instance            |
//!
//! Class strategies are computed once per registered class and cached.

use crate::heap::{ClassRegistry, Heap, HeapError};
use crate::object::{Class, HeapObject};
use crate::types::{ClassId, ValueType};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::debug;

/// Why a value is never duplicated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionKind {
    /// Function / callback handle
    Callback,
    /// Instance owned by the host runtime
    HostManaged,
    /// Native handle whose fields cannot be enumerated
    Opaque,
}

/// Handling strategy for a value or type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Copied by value, never registered or recursed into
    Primitive,
    /// Never duplicated
    Excluded(ExclusionKind),
    /// Rank-N array
    Array,
    /// Ordinary structured object
    Composite,
}

impl Strategy {
    /// Check if values with this strategy go through the identity registry
    pub fn is_traversed(&self) -> bool {
        matches!(self, Strategy::Array | Strategy::Composite)
    }
}

/// Predicate marking classes whose instances the host owns
///
/// Implemented for any `Fn(&Class) -> bool`, so a closure can be passed
/// wherever a marker is expected.
pub trait HostMarker {
    /// Check if instances of `class` must be treated as host-managed
    fn is_host_managed(&self, class: &Class) -> bool;
}

impl<F> HostMarker for F
where
    F: Fn(&Class) -> bool,
{
    fn is_host_managed(&self, class: &Class) -> bool {
        self(class)
    }
}

/// Classifier with a per-class strategy cache
#[derive(Default)]
pub struct TypeClassifier {
    marker: Option<Box<dyn HostMarker>>,
    class_cache: FxHashMap<ClassId, Strategy>,
}

impl TypeClassifier {
    /// Create a classifier that only honors `Class::host_managed`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with an extra host-managed predicate
    pub fn with_marker(marker: impl HostMarker + 'static) -> Self {
        Self {
            marker: Some(Box::new(marker)),
            class_cache: FxHashMap::default(),
        }
    }

    /// Classify a class by ID
    ///
    /// An unregistered class has no enumerable fields and is treated as
    /// opaque. That answer is not cached, since the ID may be registered
    /// later.
    pub fn classify_class(
        &mut self,
        classes: &ClassRegistry,
        class_id: ClassId,
    ) -> Result<Strategy, HeapError> {
        if let Some(strategy) = self.class_cache.get(&class_id) {
            return Ok(*strategy);
        }

        let Some(class) = classes.get(class_id) else {
            debug!(class_id, "unregistered class treated as opaque");
            return Ok(Strategy::Excluded(ExclusionKind::Opaque));
        };
        let host_managed = class.host_managed
            || self
                .marker
                .as_ref()
                .is_some_and(|m| classes.lineage(class_id).any(|c| m.is_host_managed(c)));

        let strategy = if host_managed {
            Strategy::Excluded(ExclusionKind::HostManaged)
        } else {
            Strategy::Composite
        };
        self.class_cache.insert(class_id, strategy);
        Ok(strategy)
    }

    /// Classify a declared slot type
    ///
    /// Returns `None` for `Any`, which can only be decided per value.
    pub fn classify_type(
        &mut self,
        classes: &ClassRegistry,
        ty: ValueType,
    ) -> Result<Option<Strategy>, HeapError> {
        let strategy = match ty {
            ty if ty.is_primitive() => Strategy::Primitive,
            ValueType::Function => Strategy::Excluded(ExclusionKind::Callback),
            ValueType::Array => Strategy::Array,
            ValueType::Object(class_id) => self.classify_class(classes, class_id)?,
            _ => return Ok(None),
        };
        Ok(Some(strategy))
    }

    /// Classify a runtime value
    pub fn classify(&mut self, heap: &Heap, value: &Value) -> Result<Strategy, HeapError> {
        let r = match value {
            Value::Ref(r) => *r,
            _ => return Ok(Strategy::Primitive),
        };
        match heap.try_get(r)? {
            HeapObject::Object(obj) => self.classify_class(heap.classes(), obj.class_id),
            HeapObject::Array(_) => Ok(Strategy::Array),
            HeapObject::Callback(_) => Ok(Strategy::Excluded(ExclusionKind::Callback)),
            HeapObject::Native(_) => Ok(Strategy::Excluded(ExclusionKind::Opaque)),
        }
    }

    /// Number of classes with a cached strategy
    pub fn cached_classes(&self) -> usize {
        self.class_cache.len()
    }
}

impl fmt::Debug for TypeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeClassifier")
            .field("has_marker", &self.marker.is_some())
            .field("class_cache", &self.class_cache)
            .finish()
    }
}
