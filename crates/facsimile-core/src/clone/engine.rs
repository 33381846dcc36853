//! Clone engine
//!
//! Drives the classifier, field walker, array traverser and identity
//! registry to copy an object graph inside a [`Heap`].
//!
//! # Algorithm
//!
//! For every value reached from the root:
//!
//! 1. null and primitives are returned as they are;
//! 2. excluded values become null (callbacks) or stay the same
//!    reference (host-managed instances, native handles);
//! 3. a reference already in the registry resolves to its clone;
//! 4. otherwise a clone shell is allocated (or the explicit target is
//!    taken), registered, and queued;
//! 5. queued shells are filled from a work-list: primitive slots are
//!    assigned, every other slot goes back through step 1.
//!
//! Registering the shell before its slots are filled is what lets a
//! cycle resolve to the clone in progress instead of recursing forever.
//! The work-list keeps native stack usage flat no matter how long the
//! reference chains are; the depth budget in [`CloneOptions`] bounds
//! them instead.

use super::array;
use super::classify::{ExclusionKind, HostMarker, Strategy, TypeClassifier};
use super::fields;
use super::registry::IdentityRegistry;
use crate::heap::{Heap, HeapError};
use crate::object::{Array, HeapObject};
use crate::options::CloneOptions;
use crate::types::{ClassId, FieldDescriptor};
use crate::value::{ObjectRef, Value};
use crate::{CloneError, CloneResult};
use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Statistics for the last top-level clone call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneStats {
    /// Class instances allocated as clone shells
    pub objects_cloned: usize,
    /// Arrays allocated as clone shells
    pub arrays_cloned: usize,
    /// Identity registry entries at the end of the call
    pub registry_entries: usize,
    /// Excluded references met (callbacks, host-managed, opaque)
    pub excluded: usize,
    /// Deepest reference chain followed
    pub max_depth_reached: usize,
}

/// A registered shell whose slots still need filling
#[derive(Debug, Clone, Copy)]
struct Pending {
    original: ObjectRef,
    clone: ObjectRef,
    depth: usize,
}

/// Per-call traversal state
///
/// Created fresh by every top-level call and dropped when it returns,
/// so no registry entry ever outlives the call that made it.
struct Traversal {
    registry: IdentityRegistry,
    pending: Vec<Pending>,
}

impl Traversal {
    fn new() -> Self {
        Self {
            registry: IdentityRegistry::new(),
            pending: Vec::new(),
        }
    }
}

/// Deep-clone engine bound to a heap
///
/// The engine may be reused for several top-level calls; class layouts
/// and strategies are cached across calls, clone identities are not.
pub struct CloneEngine<'h> {
    heap: &'h mut Heap,
    options: CloneOptions,
    classifier: TypeClassifier,
    layouts: FxHashMap<ClassId, Rc<[FieldDescriptor]>>,
    stats: CloneStats,
}

impl<'h> CloneEngine<'h> {
    /// Create an engine over `heap`
    pub fn new(heap: &'h mut Heap, options: &CloneOptions) -> Self {
        Self {
            heap,
            options: options.clone(),
            classifier: TypeClassifier::new(),
            layouts: FxHashMap::default(),
            stats: CloneStats::default(),
        }
    }

    /// Install an extra host-managed predicate
    pub fn with_host_marker(mut self, marker: impl HostMarker + 'static) -> Self {
        self.classifier = TypeClassifier::with_marker(marker);
        self.layouts.clear();
        self
    }

    /// Statistics of the last top-level call
    pub fn stats(&self) -> &CloneStats {
        &self.stats
    }

    /// Get the heap the engine clones in
    pub fn heap(&self) -> &Heap {
        &*self.heap
    }

    /// Clone `original` into a fresh, independent graph
    ///
    /// On failure every shell allocated by the call is released again.
    pub fn clone_value(&mut self, original: &Value) -> CloneResult<Value> {
        self.stats = CloneStats::default();
        let mut traversal = Traversal::new();
        let mark = self.heap.len();

        let result = self
            .resolve(original, &mut traversal, 0)
            .and_then(|root| self.drain(&mut traversal).map(|_| root));
        if result.is_err() {
            self.heap.truncate(mark);
        }
        self.finish(&traversal, &result);
        result
    }

    /// Populate an existing `target` from `source`
    ///
    /// The target stands in as the clone shell of the root, so the root
    /// is copied even when it is host-managed. Everything below the root
    /// follows the usual rules. On failure the target gets its previous
    /// contents back and every shell allocated by the call is released.
    pub fn clone_into(&mut self, source: ObjectRef, target: ObjectRef) -> CloneResult<()> {
        self.stats = CloneStats::default();
        let mut traversal = Traversal::new();
        let mark = self.heap.len();
        let saved = self.heap.try_get(target)?.clone();

        let result = self
            .reserve_target(source, target, &mut traversal)
            .and_then(|_| self.drain(&mut traversal));
        if result.is_err() {
            self.heap.truncate(mark);
            if let Some(slot) = self.heap.get_mut(target) {
                *slot = saved;
            }
        }
        self.finish(&traversal, &result);
        result
    }

    fn finish<T>(&mut self, traversal: &Traversal, result: &CloneResult<T>) {
        self.stats.registry_entries = traversal.registry.len();
        match result {
            Ok(_) => debug!(
                objects = self.stats.objects_cloned,
                arrays = self.stats.arrays_cloned,
                excluded = self.stats.excluded,
                registry = self.stats.registry_entries,
                depth = self.stats.max_depth_reached,
                "deep clone finished"
            ),
            Err(err) => warn!(
                error = %err,
                registry = self.stats.registry_entries,
                "deep clone aborted"
            ),
        }
    }

    /// Resolve one slot value to its clone, queueing new shells
    fn resolve(
        &mut self,
        value: &Value,
        traversal: &mut Traversal,
        depth: usize,
    ) -> CloneResult<Value> {
        let original = match value {
            Value::Ref(r) => *r,
            // Null and primitives never touch the registry
            other => return Ok(other.clone()),
        };

        let strategy = self.classifier.classify(&*self.heap, value)?;
        if let Strategy::Excluded(kind) = strategy {
            self.stats.excluded += 1;
            return Ok(self.excluded_value(value, kind));
        }
        if !strategy.is_traversed() {
            return Ok(value.clone());
        }

        let max_depth = self.options.max_depth;
        let (clone, existed) = traversal.registry.lookup_or_reserve(original, || {
            if depth > max_depth {
                return Err(CloneError::DepthExceeded(max_depth));
            }
            self.allocate_shell(original)
        })?;

        if !existed {
            trace!(original = %original, clone = %clone, depth, "allocated clone shell");
            self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);
            traversal.pending.push(Pending {
                original,
                clone,
                depth,
            });
        }
        Ok(Value::Ref(clone))
    }

    fn excluded_value(&self, value: &Value, kind: ExclusionKind) -> Value {
        match kind {
            ExclusionKind::Callback if self.options.null_callbacks => Value::Null,
            ExclusionKind::HostManaged if !self.options.pass_through_host_managed => Value::Null,
            _ => value.clone(),
        }
    }

    /// Build a same-shape shell for `original`
    ///
    /// Instances start from placeholder defaults; arrays start as a
    /// shallow copy of the original cells.
    fn allocate_shell(&mut self, original: ObjectRef) -> CloneResult<ObjectRef> {
        let shell = match self.heap.try_get(original)? {
            HeapObject::Object(obj) => HeapObject::Object(self.heap.blank_instance(obj.class_id)?),
            HeapObject::Array(arr) => HeapObject::Array(arr.clone()),
            other => {
                return Err(CloneError::AllocationFailed(format!(
                    "cannot allocate a shell for a {} handle",
                    other.kind_name()
                )))
            }
        };
        let is_array = matches!(shell, HeapObject::Array(_));
        let clone = self
            .heap
            .alloc(shell)
            .map_err(|e| CloneError::AllocationFailed(e.to_string()))?;
        if is_array {
            self.stats.arrays_cloned += 1;
        } else {
            self.stats.objects_cloned += 1;
        }
        Ok(clone)
    }

    /// Register a caller-supplied target as the root's shell
    fn reserve_target(
        &mut self,
        source: ObjectRef,
        target: ObjectRef,
        traversal: &mut Traversal,
    ) -> CloneResult<()> {
        match (self.heap.try_get(source)?, self.heap.try_get(target)?) {
            (HeapObject::Object(src), HeapObject::Object(dst)) => {
                if src.class_id != dst.class_id {
                    let classes = self.heap.classes();
                    return Err(CloneError::TargetMismatch {
                        expected: classes.try_get(src.class_id)?.name.clone(),
                        found: classes.try_get(dst.class_id)?.name.clone(),
                    });
                }
            }
            (HeapObject::Array(src), HeapObject::Array(dst)) => {
                if src.element != dst.element || src.dims() != dst.dims() {
                    return Err(CloneError::TargetMismatch {
                        expected: describe_array(src),
                        found: describe_array(dst),
                    });
                }
            }
            (HeapObject::Callback(_) | HeapObject::Native(_), _) => {
                // Nothing enumerable to copy
                debug!(source = %source, "clone_into source has no fields, target left as is");
                self.stats.excluded += 1;
                return Ok(());
            }
            (src, dst) => {
                return Err(CloneError::TargetMismatch {
                    expected: src.kind_name().to_string(),
                    found: dst.kind_name().to_string(),
                });
            }
        }

        traversal
            .registry
            .lookup_or_reserve::<_, CloneError>(source, || Ok(target))?;
        traversal.pending.push(Pending {
            original: source,
            clone: target,
            depth: 0,
        });
        Ok(())
    }

    /// Fill queued shells until the work-list is empty
    fn drain(&mut self, traversal: &mut Traversal) -> CloneResult<()> {
        while let Some(pending) = traversal.pending.pop() {
            match self.heap.try_get(pending.original)? {
                HeapObject::Object(obj) => {
                    let class_id = obj.class_id;
                    self.fill_object(pending, class_id, traversal)?;
                }
                HeapObject::Array(_) => self.fill_array(pending, traversal)?,
                // Excluded kinds are never queued
                HeapObject::Callback(_) | HeapObject::Native(_) => {}
            }
        }
        Ok(())
    }

    fn fill_object(
        &mut self,
        pending: Pending,
        class_id: ClassId,
        traversal: &mut Traversal,
    ) -> CloneResult<()> {
        let layout = self.layout(class_id);
        for field in layout.iter() {
            let value = fields::get(self.heap.object(pending.original)?, field)?.clone();
            let cloned = match self.classifier.classify_type(self.heap.classes(), field.ty)? {
                Some(Strategy::Primitive) => value,
                // The declared type decides exclusion, whatever the slot holds
                Some(Strategy::Excluded(kind)) => {
                    if value.is_ref() {
                        self.stats.excluded += 1;
                    }
                    self.excluded_value(&value, kind)
                }
                _ => self.resolve(&value, traversal, pending.depth + 1)?,
            };
            fields::set(self.heap.object_mut(pending.clone)?, field, cloned)?;
        }
        Ok(())
    }

    fn fill_array(&mut self, pending: Pending, traversal: &mut Traversal) -> CloneResult<()> {
        let source = self.heap.array(pending.original)?;
        let element = source.element;

        if element.is_primitive() {
            // Bulk copy, no per-cell work
            let cells = source.cells().to_vec();
            self.heap
                .array_mut(pending.clone)?
                .cells_mut()
                .clone_from_slice(&cells);
            return Ok(());
        }

        let dims = source.dims().to_vec();
        array::try_for_each_index(&dims, |index| -> CloneResult<()> {
            let cell = self
                .heap
                .array(pending.original)?
                .get(index)
                .cloned()
                .unwrap_or_default();
            let cloned = self.resolve(&cell, traversal, pending.depth + 1)?;
            self.heap
                .array_mut(pending.clone)?
                .set(index, cloned)
                .map_err(HeapError::InvalidShape)?;
            Ok(())
        })
    }

    /// Full field list of a class, cached per engine
    fn layout(&mut self, class_id: ClassId) -> Rc<[FieldDescriptor]> {
        if let Some(layout) = self.layouts.get(&class_id) {
            return Rc::clone(layout);
        }
        let layout: Rc<[FieldDescriptor]> = self.heap.classes().fields_of(class_id).collect();
        self.layouts.insert(class_id, Rc::clone(&layout));
        layout
    }
}

fn describe_array(array: &Array) -> String {
    format!("{}{:?}", array.element, array.dims())
}

impl std::fmt::Debug for CloneEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneEngine")
            .field("options", &self.options)
            .field("classifier", &self.classifier)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Callback, Class, NativeHandle};
    use crate::types::ValueType;

    fn node_heap() -> (Heap, ClassId) {
        let mut heap = Heap::new();
        let node = heap
            .register_class(
                Class::new("Node")
                    .public("value", ValueType::I32)
                    .public("next", ValueType::Object(0)),
            )
            .unwrap();
        (heap, node)
    }

    fn node(heap: &mut Heap, class: ClassId, value: i32) -> ObjectRef {
        let r = heap.alloc_object(class).unwrap();
        heap.set_field(r, 0, Value::i32(value)).unwrap();
        r
    }

    #[test]
    fn test_primitives_make_no_registry_entries() {
        let (mut heap, _) = node_heap();
        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());

        for value in [Value::Null, Value::i32(4), Value::str("text")] {
            assert_eq!(engine.clone_value(&value).unwrap(), value);
            assert_eq!(engine.stats().registry_entries, 0);
        }
        assert!(engine.heap().is_empty());
    }

    #[test]
    fn test_chain_is_copied() {
        let (mut heap, class) = node_heap();
        let a = node(&mut heap, class, 1);
        let b = node(&mut heap, class, 2);
        heap.set_field(a, 1, Value::Ref(b)).unwrap();

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        let copy = engine.clone_value(&Value::Ref(a)).unwrap();
        let stats = engine.stats().clone();
        assert_eq!(stats.objects_cloned, 2);
        assert_eq!(stats.registry_entries, 2);
        assert_eq!(stats.max_depth_reached, 1);

        let a2 = copy.as_object_ref().unwrap();
        assert_ne!(a2, a);
        let b2 = heap.field(a2, 1).unwrap().as_object_ref().unwrap();
        assert_ne!(b2, b);
        assert_eq!(heap.field(b2, 0).unwrap(), &Value::i32(2));
    }

    #[test]
    fn test_depth_budget() {
        let (mut heap, class) = node_heap();
        let mut head = node(&mut heap, class, 0);
        for i in 1..10 {
            let n = node(&mut heap, class, i);
            heap.set_field(n, 1, Value::Ref(head)).unwrap();
            head = n;
        }

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::with_max_depth(5));
        let err = engine.clone_value(&Value::Ref(head)).unwrap_err();
        assert!(matches!(err, CloneError::DepthExceeded(5)));

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::with_max_depth(9));
        assert!(engine.clone_value(&Value::Ref(head)).is_ok());
        assert_eq!(engine.stats().max_depth_reached, 9);
    }

    #[test]
    fn test_excluded_options() {
        let (mut heap, _) = node_heap();
        let holder = heap
            .register_class(
                Class::new("Holder")
                    .public("callback", ValueType::Function)
                    .public("window", ValueType::Any),
            )
            .unwrap();
        let window = heap
            .register_class(Class::new("Window").host_managed())
            .unwrap();

        let h = heap.alloc_object(holder).unwrap();
        let cb = heap.alloc_callback(Callback::new("onClose")).unwrap();
        let w = heap.alloc_object(window).unwrap();
        heap.set_field(h, 0, Value::Ref(cb)).unwrap();
        heap.set_field(h, 1, Value::Ref(w)).unwrap();

        let options = CloneOptions {
            pass_through_host_managed: false,
            null_callbacks: false,
            ..CloneOptions::default()
        };
        let mut engine = CloneEngine::new(&mut heap, &options);
        let copy = engine.clone_value(&Value::Ref(h)).unwrap();
        assert_eq!(engine.stats().excluded, 2);

        let h2 = copy.as_object_ref().unwrap();
        assert_eq!(heap.field(h2, 0).unwrap(), &Value::Ref(cb));
        assert_eq!(heap.field(h2, 1).unwrap(), &Value::Null);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let (mut heap, class) = node_heap();
        let a = node(&mut heap, class, 1);
        let b = node(&mut heap, class, 2);
        heap.set_field(a, 1, Value::Ref(b)).unwrap();
        heap.set_max_objects(Some(3));

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        let err = engine.clone_value(&Value::Ref(a)).unwrap_err();
        assert!(matches!(err, CloneError::AllocationFailed(_)));
        // Only the shell that was actually allocated is counted
        assert_eq!(engine.stats().objects_cloned, 1);
        assert_eq!(engine.heap().len(), 2);
    }

    #[test]
    fn test_declared_function_slot_is_nulled() {
        let (mut heap, class) = node_heap();
        let holder = heap
            .register_class(Class::new("Holder").public("handler", ValueType::Function))
            .unwrap();
        let h = heap.alloc_object(holder).unwrap();
        let n = node(&mut heap, class, 1);
        heap.set_field(h, 0, Value::Ref(n)).unwrap();

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        let copy = engine.clone_value(&Value::Ref(h)).unwrap();
        assert_eq!(engine.stats().objects_cloned, 1);
        assert_eq!(engine.stats().excluded, 1);
        let h2 = copy.as_object_ref().unwrap();
        assert_eq!(heap.field(h2, 0).unwrap(), &Value::Null);
    }

    #[test]
    fn test_clone_into_callback_source_is_noop() {
        let (mut heap, class) = node_heap();
        let cb = heap.alloc_callback(Callback::new("f")).unwrap();
        let target = node(&mut heap, class, 7);

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        engine.clone_into(cb, target).unwrap();
        assert_eq!(heap.field(target, 0).unwrap(), &Value::i32(7));
    }

    #[test]
    fn test_clone_into_kind_mismatch() {
        let (mut heap, class) = node_heap();
        let n = node(&mut heap, class, 1);
        let arr = heap.alloc_array(ValueType::I32, vec![1]).unwrap();
        let native = heap.alloc_native(NativeHandle::new("fd", 1)).unwrap();

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        assert!(matches!(
            engine.clone_into(n, arr),
            Err(CloneError::TargetMismatch { .. })
        ));
        assert!(matches!(
            engine.clone_into(n, native),
            Err(CloneError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn test_engine_reuse_does_not_share_identities() {
        let (mut heap, class) = node_heap();
        let a = node(&mut heap, class, 1);

        let mut engine = CloneEngine::new(&mut heap, &CloneOptions::default());
        let first = engine.clone_value(&Value::Ref(a)).unwrap();
        let second = engine.clone_value(&Value::Ref(a)).unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.stats().registry_entries, 1);
    }
}
