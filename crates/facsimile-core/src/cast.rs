//! Primitive value casting
//!
//! Converts between the primitive kinds of [`Value`]:
//!
//! - same kind: returned unchanged
//! - integer to integer: range checked
//! - float to integer: truncated toward zero, range checked
//! - integer to float: widened
//! - bool to number: `1` / `0`; number to bool: non-zero
//! - string to anything: parsed after trimming whitespace
//! - anything to string: its display form
//!
//! References only cast to reference types. The `*_or` helpers fall back
//! to a caller-supplied default instead of failing.

use crate::types::ValueType;
use crate::value::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Cast failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// No conversion exists between the two kinds
    #[error("Cannot cast {from} to {to}")]
    Unsupported {
        /// Source value kind
        from: &'static str,
        /// Requested type
        to: ValueType,
    },

    /// Numeric value does not fit the requested type
    #[error("Value {value} out of range for {to}")]
    OutOfRange {
        /// Source value, formatted
        value: String,
        /// Requested type
        to: ValueType,
    },

    /// String does not parse as the requested type
    #[error("Cannot parse '{input}' as {to}")]
    Parse {
        /// Source string
        input: String,
        /// Requested type
        to: ValueType,
    },
}

/// Rust types a [`Value`] can be cast into
pub trait FromValue: Sized {
    /// Value type the cast goes through
    const TYPE: ValueType;

    /// Extract from a value already of kind `TYPE`
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE: ValueType = ValueType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i32 {
    const TYPE: ValueType = ValueType::I32;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i32()
    }
}

impl FromValue for i64 {
    const TYPE: ValueType = ValueType::I64;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    const TYPE: ValueType = ValueType::F64;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    const TYPE: ValueType = ValueType::Str;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl Value {
    /// Convert to a value of type `ty`
    pub fn cast_to(&self, ty: ValueType) -> Result<Value, CastError> {
        let unsupported = || CastError::Unsupported {
            from: self.type_name(),
            to: ty,
        };

        match (ty, self) {
            (ValueType::Any, v) => Ok(v.clone()),

            // References and null stay as they are for reference types
            (ValueType::Object(_) | ValueType::Array | ValueType::Function, Value::Null | Value::Ref(_)) => {
                Ok(self.clone())
            }
            (ValueType::Object(_) | ValueType::Array | ValueType::Function, _) => Err(unsupported()),
            (_, Value::Ref(_)) => Err(unsupported()),

            // String slots admit null
            (ValueType::Str, Value::Null) => Ok(Value::Null),
            (_, Value::Null) => Err(unsupported()),

            (ValueType::Bool, v) => cast_bool(v, ty).map(Value::Bool),
            (ValueType::I32, v) => {
                let wide = cast_i64(v, ty)?;
                i32::try_from(wide)
                    .map(Value::I32)
                    .map_err(|_| out_of_range(v, ty))
            }
            (ValueType::I64, v) => cast_i64(v, ty).map(Value::I64),
            (ValueType::F64, v) => cast_f64(v, ty).map(Value::F64),
            (ValueType::Str, Value::Str(_)) => Ok(self.clone()),
            (ValueType::Str, v) => Ok(Value::str(v.to_string())),
        }
    }

    /// Cast into a Rust type
    pub fn cast<T: FromValue>(&self) -> Result<T, CastError> {
        let converted = self.cast_to(T::TYPE)?;
        T::from_value(&converted).ok_or(CastError::Unsupported {
            from: converted.type_name(),
            to: T::TYPE,
        })
    }

    /// Cast into a Rust type, falling back to `default` on failure
    pub fn cast_or<T: FromValue>(&self, default: T) -> T {
        match self.cast() {
            Ok(v) => v,
            Err(err) => {
                debug!(value = ?self, error = %err, "cast fell back to default");
                default
            }
        }
    }

    /// Cast into a Rust type, falling back to the type's default
    pub fn cast_or_default<T: FromValue + Default>(&self) -> T {
        self.cast_or(T::default())
    }
}

fn out_of_range(value: &impl fmt::Display, to: ValueType) -> CastError {
    CastError::OutOfRange {
        value: value.to_string(),
        to,
    }
}

fn parse_error(input: &str, to: ValueType) -> CastError {
    CastError::Parse {
        input: input.to_string(),
        to,
    }
}

fn cast_bool(value: &Value, to: ValueType) -> Result<bool, CastError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::I32(i) => Ok(*i != 0),
        Value::I64(i) => Ok(*i != 0),
        Value::F64(f) => Ok(*f != 0.0 && !f.is_nan()),
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(parse_error(s, to))
            }
        }
        other => Err(CastError::Unsupported {
            from: other.type_name(),
            to,
        }),
    }
}

fn cast_i64(value: &Value, to: ValueType) -> Result<i64, CastError> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::I32(i) => Ok(i64::from(*i)),
        Value::I64(i) => Ok(*i),
        Value::F64(f) => {
            let t = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            if !t.is_finite() || t < i64::MIN as f64 || t >= i64::MAX as f64 {
                return Err(out_of_range(f, to));
            }
            Ok(t as i64)
        }
        Value::Str(s) => s.trim().parse::<i64>().map_err(|_| parse_error(s, to)),
        other => Err(CastError::Unsupported {
            from: other.type_name(),
            to,
        }),
    }
}

fn cast_f64(value: &Value, to: ValueType) -> Result<f64, CastError> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::I32(i) => Ok(f64::from(*i)),
        Value::I64(i) => Ok(*i as f64),
        Value::F64(f) => Ok(*f),
        Value::Str(s) => s.trim().parse::<f64>().map_err(|_| parse_error(s, to)),
        other => Err(CastError::Unsupported {
            from: other.type_name(),
            to,
        }),
    }
}
