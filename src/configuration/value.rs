//! The typed configuration tree produced by coercion, and the conversions
//! from it into concrete field types.

use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    fmt,
    path::PathBuf,
};

use toml::value::Datetime;

use super::{errors::SchemaError, raw::RawValue, traits::ConfigRecord};


/// Key of a coerced map.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    String(String),
    Integer(i64),
    Bool(bool),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(key) => f.write_str(key),
            Self::Integer(key) => write!(f, "{key}"),
            Self::Bool(key) => write!(f, "{key}"),
        }
    }
}

impl TryFrom<Value> for MapKey {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(key) => Ok(Self::String(key)),
            Value::Integer(key) => Ok(Self::Integer(key)),
            Value::Bool(key) => Ok(Self::Bool(key)),
            other => Err(other),
        }
    }
}


trait ErasedRecord: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + fmt::Debug + Send + Sync> ErasedRecord for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}


/// A constructed configuration record, with its concrete type erased.
#[derive(Debug)]
pub struct RecordValue {
    name: &'static str,
    inner: Box<dyn ErasedRecord>,
}

impl RecordValue {
    pub fn new<R: ConfigRecord>(record: R) -> Self {
        Self {
            name: R::SPEC.name,
            inner: Box::new(record),
        }
    }

    /// Name of the record type, as declared in its schema.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn downcast_ref<R: ConfigRecord>(&self) -> Option<&R> {
        (*self.inner).as_any().downcast_ref::<R>()
    }

    pub fn downcast<R: ConfigRecord>(self) -> Result<R, Self> {
        if !(*self.inner).as_any().is::<R>() {
            return Err(self);
        }

        // PANIC SAFETY: the concrete type was checked above.
        Ok(*self.inner.into_any().downcast::<R>().unwrap())
    }
}


/// A coerced configuration value.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Datetime(Datetime),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
    Record(RecordValue),
    /// Produced by the `Any` type: the raw value, unchecked.
    Raw(RawValue),
}

impl Value {
    pub fn record<R: ConfigRecord>(record: R) -> Self {
        Self::Record(RecordValue::new(record))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::Datetime(_) => "datetime",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "dict",
            Self::Record(record) => record.name(),
            Self::Raw(raw) => raw.type_name(),
        }
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn as_record<R: ConfigRecord>(&self) -> Option<&R> {
        match self {
            Self::Record(record) => record.downcast_ref::<R>(),
            _ => None,
        }
    }

    /// Extracts a record of type `R`; `path` is only used in the error.
    pub fn into_record<R: ConfigRecord>(self, path: &str) -> Result<R, SchemaError> {
        match self {
            Self::Record(record) => record
                .downcast::<R>()
                .map_err(|record| mismatch(path, R::SPEC.name, record.name())),
            other => Err(mismatch(path, R::SPEC.name, other.type_name())),
        }
    }
}


fn mismatch(path: &str, expected: &str, found: &str) -> SchemaError {
    SchemaError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}


/// Conversion from a coerced [`Value`] into a concrete field type.
///
/// Coercion has already checked the value against the field's declared
/// type, so a failure here means the record's schema and its Rust fields
/// disagree.
pub trait FromValue: Sized {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError>;
}

impl FromValue for Value {
    fn from_value(value: Value, _path: &str) -> Result<Self, SchemaError> {
        Ok(value)
    }
}

macro_rules! impl_from_scalar_value {
    ($target:ty, $variant:ident, $expected:literal) => {
        impl FromValue for $target {
            fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(mismatch(path, $expected, other.type_name())),
                }
            }
        }
    };
}

impl_from_scalar_value!(bool, Bool, "bool");
impl_from_scalar_value!(i64, Integer, "int");
impl_from_scalar_value!(f64, Float, "float");
impl_from_scalar_value!(String, String, "str");
impl_from_scalar_value!(Datetime, Datetime, "datetime");
impl_from_scalar_value!(RawValue, Raw, "Any");

impl FromValue for PathBuf {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        String::from_value(value, path).map(PathBuf::from)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other, path).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::List(items) | Value::Tuple(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| T::from_value(item, &format!("{path}[{index}]")))
                .collect(),
            other => Err(mismatch(path, "list", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<MapKey, T> {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, item)| {
                    let item_path = format!("{path}[{key}]");
                    T::from_value(item, &item_path).map(|item| (key, item))
                })
                .collect(),
            other => Err(mismatch(path, "dict", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        BTreeMap::<MapKey, T>::from_value(value, path)?
            .into_iter()
            .map(|(key, item)| match key {
                MapKey::String(key) => Ok((key, item)),
                other => Err(mismatch(&format!("{path}.<key>"), "str", map_key_type_name(&other))),
            })
            .collect()
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        BTreeMap::<String, T>::from_value(value, path).map(|entries| entries.into_iter().collect())
    }
}

fn map_key_type_name(key: &MapKey) -> &'static str {
    match key {
        MapKey::String(_) => "str",
        MapKey::Integer(_) => "int",
        MapKey::Bool(_) => "bool",
    }
}

macro_rules! impl_from_tuple_value {
    ($arity:literal; $($element:ident),+) => {
        impl<$($element: FromValue),+> FromValue for ($($element,)+) {
            fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
                let items = match value {
                    Value::Tuple(items) | Value::List(items) if items.len() == $arity => items,
                    other => {
                        return Err(mismatch(path, concat!("tuple of ", $arity), other.type_name()))
                    }
                };

                let mut items = items.into_iter().enumerate();
                Ok(($({
                    // PANIC SAFETY: the length was checked above.
                    let (index, item) = items.next().unwrap();
                    $element::from_value(item, &format!("{path}[{index}]"))?
                },)+))
            }
        }
    };
}

impl_from_tuple_value!(2; A, B);
impl_from_tuple_value!(3; A, B, C);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_nested_containers() {
        let value = Value::List(vec![
            Value::Tuple(vec![Value::Integer(1), Value::String("a".to_string())]),
            Value::Tuple(vec![Value::Integer(2), Value::String("b".to_string())]),
        ]);

        let pairs = Vec::<(i64, String)>::from_value(value, "pairs").unwrap();

        assert_eq!(pairs, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }

    #[test]
    fn reports_indexed_path_on_conversion_failure() {
        let value = Value::List(vec![Value::Integer(1), Value::Bool(true)]);

        let error = Vec::<i64>::from_value(value, "retries").unwrap_err();

        assert_eq!(error.path(), "retries[1]");
    }

    #[test]
    fn string_keyed_maps_reject_other_keys() {
        let mut entries = BTreeMap::new();
        entries.insert(MapKey::Integer(1), Value::Integer(2));

        let error = BTreeMap::<String, i64>::from_value(Value::Map(entries), "limits").unwrap_err();

        assert_eq!(error.path(), "limits.<key>");
    }

    #[test]
    fn none_becomes_an_empty_option() {
        assert_eq!(Option::<String>::from_value(Value::None, "x").unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::String("y".to_string()), "x").unwrap(),
            Some("y".to_string())
        );
    }
}
