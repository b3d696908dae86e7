//! The untyped configuration tree, as produced by the TOML parser.

use std::{collections::BTreeMap, fmt};

use serde::{ser::SerializeMap, Serialize, Serializer};
use toml::value::Datetime;


/// Key of a raw table.
///
/// TOML only ever produces string keys, but raw trees may also be built
/// by hand, so the other key shapes are representable (and rejected by
/// [`ConfigRecord::from_mapping`][super::ConfigRecord::from_mapping]).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RawKey {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl RawKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(key) => Some(key),
            _ => None,
        }
    }

    /// The key as a raw value, so it can be coerced like any other value.
    pub fn to_raw_value(&self) -> RawValue {
        match self {
            Self::String(key) => RawValue::String(key.clone()),
            Self::Integer(key) => RawValue::Integer(*key),
            Self::Boolean(key) => RawValue::Boolean(*key),
        }
    }

    /// Representation used in error messages and field paths (`"cpu"`, `3`).
    pub fn repr(&self) -> String {
        match self {
            Self::String(key) => format!("{key:?}"),
            Self::Integer(key) => key.to_string(),
            Self::Boolean(key) => key.to_string(),
        }
    }
}

impl From<&str> for RawKey {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(key) => f.write_str(key),
            Self::Integer(key) => write!(f, "{key}"),
            Self::Boolean(key) => write!(f, "{key}"),
        }
    }
}

impl Serialize for RawKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}


pub type RawTable = BTreeMap<RawKey, RawValue>;


/// A single untyped configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(Datetime),
    Array(Vec<RawValue>),
    Table(RawTable),
}

impl RawValue {
    /// Short name of the value's shape, used as the "found" part of type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "str",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Boolean(_) => "bool",
            Self::Datetime(_) => "datetime",
            Self::Array(_) => "list",
            Self::Table(_) => "dict",
        }
    }

    #[cfg(test)]
    pub fn as_table(&self) -> Option<&RawTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl From<toml::Value> for RawValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(value) => Self::String(value),
            toml::Value::Integer(value) => Self::Integer(value),
            toml::Value::Float(value) => Self::Float(value),
            toml::Value::Boolean(value) => Self::Boolean(value),
            toml::Value::Datetime(value) => Self::Datetime(value),
            toml::Value::Array(values) => Self::Array(values.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => Self::Table(table_from_toml(table)),
        }
    }
}

/// Converts a parsed TOML document into a raw table.
pub fn table_from_toml(table: toml::Table) -> RawTable {
    table
        .into_iter()
        .map(|(key, value)| (RawKey::String(key), RawValue::from(value)))
        .collect()
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Datetime(value) => write!(f, "{value}"),
            Self::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Table(table) => {
                f.write_str("{")?;
                for (index, (key, value)) in table.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {value}", key.repr())?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(value) => serializer.serialize_str(value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::Boolean(value) => serializer.serialize_bool(*value),
            Self::Datetime(value) => value.serialize(serializer),
            Self::Array(values) => values.serialize(serializer),
            Self::Table(table) => {
                let mut map = serializer.serialize_map(Some(table.len()))?;
                for (key, value) in table {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
