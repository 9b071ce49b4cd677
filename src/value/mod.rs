//! The uniform value model diffed and patched by the engines.
//!
//! Every runtime value the library can inspect is a [`Value`]: a primitive,
//! a timestamp, an ordered [`List`](Value::List), an insertion-ordered keyed
//! [`Map`](Value::Map), a [`Record`] with named fields and resolved metadata,
//! a nullable shared [`Ref`](Value::Ref) (the only way to build aliased or
//! cyclic graphs), or a nullable polymorphic [`Slot`](Value::Slot).
//!
//! `List` and `Map` are never nil: the empty collection is their zero form.
//! Nullability is expressed through `Ref` and `Slot` wrappers, and "absent"
//! (no value present at all) is modelled as `Option::<&Value>::None` at the
//! diff API boundary.

mod record;
mod wire;

pub use record::{Field, FieldMeta, Record};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A dynamically-typed structured value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    /// Ordered, index-addressed sequence.
    List(Vec<Value>),
    /// Key-addressed collection; iteration follows insertion order.
    Map(IndexMap<String, Value>),
    /// Named fields with per-field metadata.
    Record(Record),
    /// Nullable shared reference; the only kind that can alias or cycle.
    Ref(Option<Rc<RefCell<Value>>>),
    /// Nullable slot holding a value of varying concrete kind.
    Slot(Option<Box<Value>>),
}

/// The fundamental kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
    List,
    Map,
    Record,
    Ref,
    Slot,
}

impl Kind {
    /// Lowercase name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Time => "time",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Record => "record",
            Kind::Ref => "reference",
            Kind::Slot => "slot",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Classify this value into its fundamental kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Time(_) => Kind::Time,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Record(_) => Kind::Record,
            Value::Ref(_) => Kind::Ref,
            Value::Slot(_) => Kind::Slot,
        }
    }

    /// True for a nil reference or empty slot.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Ref(None) | Value::Slot(None))
    }

    /// The zero-valued instance of this value's kind. Records keep their
    /// schema (field names and metadata) with every field zeroed.
    #[must_use]
    pub fn zero_like(&self) -> Value {
        match self {
            Value::Bool(_) => Value::Bool(false),
            Value::Int(_) => Value::Int(0),
            Value::Uint(_) => Value::Uint(0),
            Value::Float(_) => Value::Float(0.0),
            Value::String(_) => Value::String(String::new()),
            Value::Time(_) => Value::Time(DateTime::<Utc>::default()),
            Value::List(_) => Value::List(Vec::new()),
            Value::Map(_) => Value::Map(IndexMap::new()),
            Value::Record(rec) => Value::Record(rec.zero_like()),
            Value::Ref(_) => Value::Ref(None),
            Value::Slot(_) => Value::Slot(None),
        }
    }

    /// Build a keyed map from entries, preserving insertion order.
    pub fn map<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Wrap a value in a shared reference.
    #[must_use]
    pub fn reference(value: Value) -> Value {
        Value::Ref(Some(Rc::new(RefCell::new(value))))
    }

    /// A nil reference.
    #[must_use]
    pub fn null_reference() -> Value {
        Value::Ref(None)
    }

    /// Wrap a value in a polymorphic slot.
    #[must_use]
    pub fn slot(value: Value) -> Value {
        Value::Slot(Some(Box::new(value)))
    }

    /// An empty polymorphic slot.
    #[must_use]
    pub fn empty_slot() -> Value {
        Value::Slot(None)
    }

    /// Run `f` against the value behind any `Ref`/`Slot` layers.
    pub(crate) fn with_unwrapped<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match self {
            Value::Ref(Some(cell)) => {
                let inner = cell.borrow();
                inner.with_unwrapped(f)
            }
            Value::Slot(Some(inner)) => inner.with_unwrapped(f),
            other => f(other),
        }
    }

    /// The reconciliation key of an identifier-bearing record, unwrapping
    /// `Ref`/`Slot` layers first.
    pub(crate) fn identity_key(&self) -> Option<String> {
        self.with_unwrapped(|v| match v {
            Value::Record(rec) => rec.identifier().and_then(key_string),
            _ => None,
        })
    }

    /// True when the value (behind any wrappers) is a record declaring an
    /// identifier field.
    pub(crate) fn has_identifier(&self) -> bool {
        self.with_unwrapped(|v| match v {
            Value::Record(rec) => rec.identifier().is_some(),
            _ => false,
        })
    }
}

/// Stringify a value for use as a reconciliation key. Primitives use their
/// canonical string form; composites fall back to their JSON encoding.
pub(crate) fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Uint(u) => Some(u.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Time(t) => Some(t.to_rfc3339()),
        other => serde_json::to_string(other).ok(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Ref(None), Value::Ref(None)) => true,
            (Value::Ref(Some(a)), Value::Ref(Some(b))) => {
                // Pointer identity first, so self-comparison of cyclic
                // graphs terminates without walking the contents.
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Slot(None), Value::Slot(None)) => true,
            (Value::Slot(Some(a)), Value::Slot(Some(b))) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Value::Bool(true).kind(), Kind::Bool);
        assert_eq!(Value::Int(-1).kind(), Kind::Int);
        assert_eq!(Value::Uint(1).kind(), Kind::Uint);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::List(vec![]).kind(), Kind::List);
        assert_eq!(Value::null_reference().kind(), Kind::Ref);
        assert_eq!(Value::empty_slot().kind(), Kind::Slot);
    }

    #[test]
    fn test_nil_test() {
        assert!(Value::null_reference().is_nil());
        assert!(Value::empty_slot().is_nil());
        assert!(!Value::reference(Value::Int(1)).is_nil());
        assert!(!Value::Int(0).is_nil());
    }

    #[test]
    fn test_zero_like_preserves_record_schema() {
        let rec = Record::new("Tag")
            .with_field("name,identifier", Value::from("kind"))
            .with_field("value", Value::from("fruit"));
        let zero = Value::Record(rec).zero_like();

        let Value::Record(zero) = zero else {
            panic!("zero of a record is a record");
        };
        assert_eq!(zero.get("name"), Some(&Value::from("")));
        assert!(zero.field("name").is_some_and(|f| f.meta.identifier));
    }

    #[test]
    fn test_identity_key_unwraps_layers() {
        let tag = Record::new("Tag")
            .with_field("name,identifier", Value::from("kind"))
            .with_field("value", Value::from("fruit"));
        let wrapped = Value::reference(Value::slot(Value::Record(tag)));

        assert_eq!(wrapped.identity_key().as_deref(), Some("kind"));
        assert!(wrapped.has_identifier());
        assert!(!Value::Int(1).has_identifier());
    }

    #[test]
    fn test_key_string_forms() {
        assert_eq!(key_string(&Value::Int(-3)).as_deref(), Some("-3"));
        assert_eq!(key_string(&Value::from("id")).as_deref(), Some("id"));
        assert_eq!(key_string(&Value::Bool(true)).as_deref(), Some("true"));
        // Composite identifiers fall back to their JSON encoding.
        let composite = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(key_string(&composite).as_deref(), Some(r#"[1,"a"]"#));
    }

    #[test]
    fn test_reference_equality_uses_pointer_identity_first() {
        let shared = Value::reference(Value::Int(5));
        assert_eq!(shared, shared.clone());
        assert_eq!(Value::reference(Value::Int(5)), Value::reference(Value::Int(5)));
        assert_ne!(Value::reference(Value::Int(5)), Value::reference(Value::Int(6)));
        assert_ne!(Value::reference(Value::Int(5)), Value::null_reference());
    }

    #[test]
    fn test_numeric_kinds_are_distinct() {
        assert_ne!(Value::Int(1), Value::Uint(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }
}
