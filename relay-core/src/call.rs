//! The uniform call surface behind synthesized proxies.
//!
//! Every proxy stub marshals its typed arguments into [`Value`]s and hands
//! them, together with a [`MethodDescriptor`], to a single [`CallHandler`].
//! Skeletons do the reverse. Null values coerce to zero-ish primitives on
//! the way back out; reference-like targets treat null as an error.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{CallError, ValueError};

/// A marshalled argument or return value.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer (all integer widths marshal through `i64`).
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Character.
    Char(char),
    /// String.
    Str(String),
    /// Byte buffer.
    Bytes(Vec<u8>),
    /// Homogeneous or heterogeneous list.
    List(Vec<Value>),
    /// Anything else, passed through by reference identity.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Short kind label used in marshalling errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Opaque(_) => "opaque",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::Char(v) => write!(f, "Char({v:?})"),
            Value::Str(v) => write!(f, "Str({v:?})"),
            Value::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Conversion of a typed argument into a [`Value`].
pub trait IntoValue {
    /// Marshals `self`.
    fn into_value(self) -> Value;
}

/// Conversion of a [`Value`] back into a typed result.
pub trait FromValue: Sized {
    /// Unmarshals, coercing null to the type's zero value where one exists.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::Char(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Bytes(self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_: Value) -> Result<Self, ValueError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(v) => Ok(v),
            other => Err(ValueError::Type {
                expected: "bool",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(v) => Ok(v),
            other => Err(ValueError::Type {
                expected: "int",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(0),
            Value::Int(v) => i32::try_from(v).map_err(|_| ValueError::Type {
                expected: "i32",
                found: "int out of range",
            }),
            other => Err(ValueError::Type {
                expected: "i32",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(0.0),
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(ValueError::Type {
                expected: "float",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok('\0'),
            Value::Char(v) => Ok(v),
            other => Err(ValueError::Type {
                expected: "char",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(v) => Ok(v),
            Value::Null => Err(ValueError::Null { expected: "string" }),
            other => Err(ValueError::Type {
                expected: "string",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Null => Err(ValueError::Null { expected: "bytes" }),
            other => Err(ValueError::Type {
                expected: "bytes",
                found: other.kind(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Identity of one contract method, as seen through a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Contract the method belongs to.
    pub contract: &'static str,
    /// Method name.
    pub name: &'static str,
    /// Rendered parameter type list, used for de-duplication and display.
    pub params: &'static [&'static str],
}

impl MethodDescriptor {
    /// `name(param, param)` rendering for error messages.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }
}

/// The single funnel every proxy call goes through.
pub trait CallHandler: Send + Sync {
    /// Handles one call.
    fn invoke(&self, method: &MethodDescriptor, args: Vec<Value>) -> Result<Value, CallError>;
}

/// Standard handler answering every call with [`Value::Null`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

impl CallHandler for NullHandler {
    fn invoke(&self, _method: &MethodDescriptor, _args: Vec<Value>) -> Result<Value, CallError> {
        Ok(Value::Null)
    }
}

/// Standard handler refusing every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedHandler;

impl CallHandler for UnsupportedHandler {
    fn invoke(&self, method: &MethodDescriptor, _args: Vec<Value>) -> Result<Value, CallError> {
        Err(CallError::Unsupported {
            method: method.signature(),
        })
    }
}
