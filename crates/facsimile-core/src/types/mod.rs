//! Declared types for fields and array elements
//!
//! A `ValueType` is what a class declaration says a slot holds. The
//! clone engine uses it to decide whether a slot can be assigned
//! directly (primitive) or must go through the graph walk.

mod field;

pub use field::{FieldDecl, FieldDescriptor, Visibility};

use crate::value::Value;
use std::fmt;

/// Class identifier (index into the class registry)
pub type ClassId = usize;

/// Declared type of a field slot or array cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Boolean scalar
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 64-bit floating point number
    F64,
    /// Immutable text
    Str,
    /// Instance of a class (or one of its subclasses)
    Object(ClassId),
    /// Array of any rank
    Array,
    /// Callback / function handle
    Function,
    /// Untyped slot; resolved from the runtime value
    Any,
}

impl ValueType {
    /// Check if slots of this type are copied by plain assignment
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            ValueType::Bool | ValueType::I32 | ValueType::I64 | ValueType::F64 | ValueType::Str
        )
    }

    /// Placeholder value a freshly instantiated slot of this type holds
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::Str => Value::str(""),
            ValueType::Object(_) | ValueType::Array | ValueType::Function | ValueType::Any => {
                Value::Null
            }
        }
    }

    /// Check whether a runtime value may be stored in a slot of this type
    ///
    /// Reference slots accept any reference here. What the reference
    /// points at (callback, array, instance of the right class) can only
    /// be checked against the heap, which `Heap::set_field_by_name` does.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (_, Value::Null) => !self.is_primitive() || *self == ValueType::Str,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::I32, Value::I32(_)) => true,
            (ValueType::I64, Value::I64(_)) => true,
            (ValueType::F64, Value::F64(_)) => true,
            (ValueType::Str, Value::Str(_)) => true,
            (ValueType::Object(_) | ValueType::Array | ValueType::Function, Value::Ref(_)) => true,
            _ => false,
        }
    }

    /// Get the type name for diagnostics
    pub fn name(&self) -> String {
        match self {
            ValueType::Bool => "bool".to_string(),
            ValueType::I32 => "i32".to_string(),
            ValueType::I64 => "i64".to_string(),
            ValueType::F64 => "f64".to_string(),
            ValueType::Str => "string".to_string(),
            ValueType::Object(id) => format!("object<{}>", id),
            ValueType::Array => "array".to_string(),
            ValueType::Function => "function".to_string(),
            ValueType::Any => "any".to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
