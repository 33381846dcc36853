//! Value representation for field slots and array cells
//!
//! A `Value` is either a primitive (copied by value) or a reference into
//! the managed heap. References carry an [`ObjectRef`], the object's
//! identity: two references are the same object exactly when their
//! handles are equal, regardless of what the objects contain.
//!
//! # Encoding
//!
//! ```text
//! Null            absent reference
//! Bool/I32/I64/F64  fixed-size scalars, copied by value
//! Str             immutable UTF-8 text, copied by value (shared storage)
//! Ref             arena handle into the Heap
//! ```

use std::fmt;
use std::sync::Arc;

/// Stable handle to a heap object
///
/// The handle is the arena index of the object and never changes for
/// the lifetime of the heap, so it doubles as the object's identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectRef(usize);

impl ObjectRef {
    /// Create a handle from a raw arena index
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        ObjectRef(index)
    }

    /// Get the raw arena index
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef(#{})", self.0)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot value stored in object fields and array cells
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// Absent reference
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit floating point number
    F64(f64),
    /// Immutable text
    Str(Arc<str>),
    /// Reference to a heap object
    Ref(ObjectRef),
}

impl Value {
    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an i32 value
    #[inline]
    pub const fn i32(i: i32) -> Self {
        Value::I32(i)
    }

    /// Create an i64 value
    #[inline]
    pub const fn i64(i: i64) -> Self {
        Value::I64(i)
    }

    /// Create an f64 value
    #[inline]
    pub const fn f64(f: f64) -> Self {
        Value::F64(f)
    }

    /// Create a string value
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a reference value
    #[inline]
    pub const fn reference(r: ObjectRef) -> Self {
        Value::Ref(r)
    }

    /// Check if this value is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value points into the heap
    #[inline]
    pub const fn is_ref(&self) -> bool {
        matches!(self, Value::Ref(_))
    }

    /// Check if this value is copied by value (everything except `Ref`)
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        !self.is_ref()
    }

    /// Extract boolean value
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract i32 value
    #[inline]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract i64 value
    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract f64 value
    #[inline]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract heap reference
    #[inline]
    pub const fn as_object_ref(&self) -> Option<ObjectRef> {
        match self {
            Value::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::I32(i) => *i != 0,
            Value::I64(i) => *i != 0,
            Value::F64(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) => !s.is_empty(),
            // References are always truthy
            Value::Ref(_) => true,
        }
    }

    /// Get type name for debugging
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Ref(_) => "ref",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::I32(i) => write!(f, "i32({})", i),
            Value::I64(i) => write!(f, "i64({})", i),
            Value::F64(fl) => write!(f, "f64({})", fl),
            Value::Str(s) => write!(f, "str({:?})", s),
            Value::Ref(r) => write!(f, "ref({})", r),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(fl) => write!(f, "{}", fl),
            Value::Str(s) => write!(f, "{}", s),
            Value::Ref(r) => write!(f, "[object {}]", r),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::Ref(r)
    }
}
