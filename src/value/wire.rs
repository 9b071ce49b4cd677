//! Wire-format serialization for [`Value`].
//!
//! Values serialize transparently into the JSON-equivalent data model:
//! records and maps become objects, lists become arrays, times become
//! RFC 3339 strings, nil references and empty slots become null, and
//! `Ref`/`Slot` wrappers serialize as their contents. Deserialization maps
//! the generic model back: objects become maps and integers that fit become
//! `Int`. Record-ness, time-ness and reference identity are not
//! reconstructed. The round-trip guarantee is for change paths and the
//! generic data shape, not for the exact kind lattice.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Value;

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Record(rec) => {
                let visible = rec.fields().iter().filter(|f| !f.meta.skip);
                let mut out = serializer.serialize_map(None)?;
                for field in visible {
                    out.serialize_entry(&field.meta.name, &field.value)?;
                }
                out.end()
            }
            Value::Ref(Some(cell)) => cell.borrow().serialize(serializer),
            Value::Slot(Some(inner)) => inner.serialize(serializer),
            Value::Ref(None) | Value::Slot(None) => serializer.serialize_unit(),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any structured value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E>
    where
        E: de::Error,
    {
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => Ok(Value::Uint(v)),
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Slot(None))
    }

    fn visit_none<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Slot(None))
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Record;
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_primitives_serialize_transparently() {
        assert_eq!(serde_json::to_string(&Value::Int(-3)).unwrap(), "-3");
        assert_eq!(serde_json::to_string(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Value::from("hi")).unwrap(), r#""hi""#);
    }

    #[test]
    fn test_record_serializes_as_object_skipping_excluded() {
        let rec = Value::Record(
            Record::new("Fruit")
                .with_field("id", Value::Int(1))
                .with_field("-", Value::Bool(true))
                .with_field("name", Value::from("apple")),
        );
        assert_eq!(
            serde_json::to_string(&rec).unwrap(),
            r#"{"id":1,"name":"apple"}"#
        );
    }

    #[test]
    fn test_wrappers_serialize_as_contents() {
        let v = Value::reference(Value::slot(Value::Int(7)));
        assert_eq!(serde_json::to_string(&v).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Value::null_reference()).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::empty_slot()).unwrap(), "null");
    }

    #[test]
    fn test_time_serializes_rfc3339() {
        let t = Utc.with_ymd_and_hms(2021, 6, 12, 10, 30, 0).unwrap();
        let encoded = serde_json::to_string(&Value::Time(t)).unwrap();
        assert!(encoded.contains("2021-06-12T10:30:00"));
    }

    #[test]
    fn test_deserialize_generic_model() {
        let v: Value = serde_json::from_str(r#"{"a":[1,2.5,"x",null],"b":true}"#).unwrap();
        let Value::Map(map) = v else {
            panic!("objects decode as maps");
        };
        assert_eq!(
            map.get("a"),
            Some(&Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Slot(None),
            ]))
        );
        assert_eq!(map.get("b"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_large_unsigned_survives() {
        let big = u64::MAX;
        let v: Value = serde_json::from_str(&big.to_string()).unwrap();
        assert_eq!(v, Value::Uint(big));
    }
}
