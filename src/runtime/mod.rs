//! Reference object model - a small refcounted heap implementing [`Context`]
//!
//! Design: handles are plain ids, objects live in a sharded concurrent map:
//! - `ObjRef` is 8 bytes and `Copy`, id 0 is the null handle
//! - Every object carries an explicit refcount
//! - Refcount reaching zero frees the object immediately
//!
//! Used by the CLI, tests and benches to drive the engine without a host
//! language runtime.

use crate::object::{Context, Number};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

/// Handle to a heap object
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u64);

impl ObjRef {
    pub const NULL: ObjRef = ObjRef(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ObjRef(NULL)")
        } else {
            write!(f, "ObjRef(#{})", self.0)
        }
    }
}

/// Object value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::None => ObjectType::None,
            Self::Bool(_) => ObjectType::Bool,
            Self::Int(_) => ObjectType::Int,
            Self::Float(_) => ObjectType::Float,
            Self::Str(_) => ObjectType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Object types for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectType {
    None = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
}

impl ObjectType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "str",
        }
    }
}

struct Entry {
    value: Value,
    refcount: u32,
}

/// Error from [`Heap::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    NullHandle,
    Unsupported { left: ObjectType, right: ObjectType },
    Overflow,
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullHandle => write!(f, "operation on a null or freed handle"),
            Self::Unsupported { left, right } => write!(
                f,
                "unsupported operand type(s) for +: '{}' and '{}'",
                left.name(),
                right.name()
            ),
            Self::Overflow => write!(f, "integer overflow"),
        }
    }
}

impl std::error::Error for OpError {}

/// Thread-safe refcounted object heap
pub struct Heap {
    objects: DashMap<u64, Entry>,
    next_id: AtomicU64,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a new object with refcount 1
    pub fn alloc(&self, value: Value) -> ObjRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(event = "object_new", id, ty = value.object_type().name());
        self.objects.insert(id, Entry { value, refcount: 1 });
        ObjRef(id)
    }

    pub fn int(&self, value: i128) -> ObjRef {
        self.alloc(Value::Int(value))
    }

    pub fn float(&self, value: f64) -> ObjRef {
        self.alloc(Value::Float(value))
    }

    pub fn str(&self, value: &str) -> ObjRef {
        self.alloc(Value::Str(value.to_string()))
    }

    pub fn bool(&self, value: bool) -> ObjRef {
        self.alloc(Value::Bool(value))
    }

    pub fn none(&self) -> ObjRef {
        self.alloc(Value::None)
    }

    /// Snapshot of the object's value, `None` for null or freed handles
    pub fn get(&self, obj: ObjRef) -> Option<Value> {
        self.objects.get(&obj.0).map(|entry| entry.value.clone())
    }

    pub fn object_type(&self, obj: ObjRef) -> Option<ObjectType> {
        self.objects.get(&obj.0).map(|entry| entry.value.object_type())
    }

    /// Current refcount, 0 for null or freed handles
    pub fn refcount(&self, obj: ObjRef) -> u32 {
        self.objects.get(&obj.0).map_or(0, |entry| entry.refcount)
    }

    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    /// `left + right` as a new object
    pub fn add(&self, left: ObjRef, right: ObjRef) -> Result<ObjRef, OpError> {
        let lhs = self.get(left).ok_or(OpError::NullHandle)?;
        let rhs = self.get(right).ok_or(OpError::NullHandle)?;

        let value = match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (Value::Float(a), other) | (other, Value::Float(a)) => match integral(&other) {
                Some(b) => Value::Float(a + b as f64),
                None => return Err(unsupported(&Value::Float(a), &other)),
            },
            (a, b) => match (integral(&a), integral(&b)) {
                (Some(x), Some(y)) => Value::Int(x.checked_add(y).ok_or(OpError::Overflow)?),
                _ => return Err(unsupported(&a, &b)),
            },
        };

        Ok(self.alloc(value))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Bool(b) => Some(i128::from(*b)),
        _ => None,
    }
}

fn unsupported(left: &Value, right: &Value) -> OpError {
    OpError::Unsupported {
        left: left.object_type(),
        right: right.object_type(),
    }
}

impl Context for Heap {
    type Handle = ObjRef;

    fn dup(&self, handle: &ObjRef) -> ObjRef {
        match self.objects.get_mut(&handle.0) {
            Some(mut entry) => {
                debug_assert!(entry.refcount < u32::MAX, "refcount overflow");
                entry.refcount += 1;
                trace!(event = "incref", id = handle.0, count = entry.refcount);
            }
            None => warn!(id = handle.0, "dup of a null or freed handle"),
        }
        *handle
    }

    fn close(&self, handle: ObjRef) {
        if handle.is_null() {
            return;
        }

        let freed = match self.objects.get_mut(&handle.0) {
            Some(mut entry) => {
                entry.refcount -= 1;
                trace!(event = "decref", id = handle.0, count = entry.refcount);
                entry.refcount == 0
            }
            None => {
                warn!(id = handle.0, "close of a freed handle");
                false
            }
        };

        // The shard guard from get_mut must be gone before removing
        if freed {
            self.objects.remove(&handle.0);
            trace!(event = "object_destroy", id = handle.0);
        }
    }

    fn is_null(&self, handle: &ObjRef) -> bool {
        handle.is_null()
    }

    fn number(&self, handle: &ObjRef) -> Option<Number> {
        let entry = self.objects.get(&handle.0)?;
        match entry.value {
            Value::Int(v) => Some(Number::Int(v)),
            Value::Bool(b) => Some(Number::Int(i128::from(b))),
            Value::Float(v) => Some(Number::Float(v)),
            Value::None | Value::Str(_) => None,
        }
    }

    fn long_from(&self, value: i64) -> ObjRef {
        self.int(i128::from(value))
    }

    fn float_from(&self, value: f64) -> ObjRef {
        self.float(value)
    }
}

#[cfg(test)]
mod tests;
