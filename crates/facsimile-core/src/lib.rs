//! Facsimile core
//!
//! A deep-clone engine over a managed object heap:
//! - Value model and arena heap with stable object identities
//! - Class registry with single inheritance and field introspection
//! - Deep clone with cycle and aliasing preservation
//! - Exclusion of callbacks, host-managed and opaque objects
//! - Primitive value casting with defaults

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cast;
pub mod clone;
pub mod defaults;
pub mod heap;
pub mod object;
pub mod options;
pub mod types;
pub mod value;

pub use cast::{CastError, FromValue};
pub use clone::{CloneEngine, CloneStats, ExclusionKind, HostMarker, Strategy};
pub use heap::{ClassRegistry, Heap, HeapError, HeapStats};
pub use object::{Array, Callback, Class, HeapObject, NativeHandle, Object};
pub use options::{CloneOptions, HeapLimits};
pub use types::{ClassId, FieldDecl, FieldDescriptor, ValueType, Visibility};
pub use value::{ObjectRef, Value};

/// Deep clone errors
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// The heap could not build a clone shell
    #[error("Clone allocation failed: {0}")]
    AllocationFailed(String),

    /// Reference chain deeper than the configured budget
    #[error("Maximum clone depth exceeded ({0})")]
    DepthExceeded(usize),

    /// Explicit target has a different runtime shape than the source
    #[error("Clone target mismatch: expected {expected}, found {found}")]
    TargetMismatch {
        /// Shape of the source
        expected: String,
        /// Shape of the target
        found: String,
    },

    /// Reference does not resolve in the heap
    #[error("Dangling reference: {0}")]
    DanglingRef(ObjectRef),

    /// Class ID is not registered
    #[error("Unknown class id: {0}")]
    UnknownClass(ClassId),

    /// Any other heap failure
    #[error(transparent)]
    Heap(HeapError),
}

impl From<HeapError> for CloneError {
    fn from(err: HeapError) -> Self {
        match err {
            HeapError::LimitExceeded(_) => CloneError::AllocationFailed(err.to_string()),
            HeapError::DanglingRef(r) => CloneError::DanglingRef(r),
            HeapError::UnknownClass(id) => CloneError::UnknownClass(id),
            other => CloneError::Heap(other),
        }
    }
}

/// Deep clone result
pub type CloneResult<T> = Result<T, CloneError>;
