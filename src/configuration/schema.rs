//! Static schema descriptors.
//!
//! Every configuration record declares its fields once, as `const` data
//! (see [`RecordSpec`]). The coercion engine walks these descriptors instead
//! of inspecting types at runtime.

use std::fmt;

use super::{
    errors::SchemaError,
    raw::{RawTable, RawValue},
    value::Value,
};


/// A single allowed value of a literal set or an enumeration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    None,
    Str(&'static str),
    Int(i64),
    Bool(bool),
}

impl Literal {
    /// Exact equality against a raw value. Values of different kinds never
    /// match each other (`true` is not `1`, `1` is not `1.0`).
    pub fn matches(&self, raw: &RawValue) -> bool {
        match (self, raw) {
            (Self::Str(expected), RawValue::String(value)) => expected == value,
            (Self::Int(expected), RawValue::Integer(value)) => expected == value,
            (Self::Bool(expected), RawValue::Boolean(value)) => expected == value,
            _ => false,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Self::None => Value::None,
            Self::Str(value) => Value::String(value.to_string()),
            Self::Int(value) => Value::Integer(value),
            Self::Bool(value) => Value::Bool(value),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Str(value) => write!(f, "'{value}'"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}


/// An enumerated-choice type: a named, closed set of member values.
#[derive(Debug)]
pub struct EnumSpec {
    pub name: &'static str,
    pub members: &'static [Literal],
}


#[derive(Debug)]
pub enum TupleShape {
    /// `tuple` without element types.
    Unchecked,

    /// `tuple[T, ...]`: any length, every element is a `T`.
    Variadic(&'static TypeSpec),

    /// `tuple[A, B, ...]` with exactly one element per listed type.
    Fixed(&'static [TypeSpec]),
}


/// Declared type of a configuration value.
#[derive(Debug)]
pub enum TypeSpec {
    /// Accept anything, unchanged.
    Any,
    Record(&'static RecordSpec),
    Literal(&'static [Literal]),
    /// Alternatives, tried left to right.
    Union(&'static [TypeSpec]),
    Enum(&'static EnumSpec),
    None,
    Bool,
    Integer,
    Float,
    String,
    Datetime,
    List(Option<&'static TypeSpec>),
    Map(Option<(&'static TypeSpec, &'static TypeSpec)>),
    Tuple(TupleShape),
}

impl TypeSpec {
    /// Human-readable description, used as the "expected" part of type errors.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Record(spec) => f.write_str(spec.name),
            Self::Literal(allowed) => {
                f.write_str("Literal[")?;
                write_separated(f, allowed.iter(), ", ")?;
                f.write_str("]")
            }
            Self::Union(alternatives) => write_separated(f, alternatives.iter(), " | "),
            Self::Enum(spec) => f.write_str(spec.name),
            Self::None => f.write_str("None"),
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("str"),
            Self::Datetime => f.write_str("datetime"),
            Self::List(None) => f.write_str("list"),
            Self::List(Some(item)) => write!(f, "list[{item}]"),
            Self::Map(None) => f.write_str("dict"),
            Self::Map(Some((key, value))) => write!(f, "dict[{key}, {value}]"),
            Self::Tuple(TupleShape::Unchecked) => f.write_str("tuple"),
            Self::Tuple(TupleShape::Variadic(item)) => write!(f, "tuple[{item}, ...]"),
            Self::Tuple(TupleShape::Fixed(items)) => {
                f.write_str("tuple[")?;
                write_separated(f, items.iter(), ", ")?;
                f.write_str("]")
            }
        }
    }
}

fn write_separated<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
    separator: &str,
) -> fmt::Result {
    for (index, item) in items.enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }

    Ok(())
}


/// What to do when a field is absent from the raw table.
#[derive(Debug)]
pub enum FieldDefault {
    Required,
    Value(Literal),
    Factory(fn() -> Value),
}

impl FieldDefault {
    /// Produces the default value for a field at `path`, or a
    /// [`SchemaError::MissingField`] if the field has none.
    pub fn resolve(&self, path: &str) -> Result<Value, SchemaError> {
        match self {
            Self::Required => Err(SchemaError::MissingField {
                path: path.to_string(),
            }),
            Self::Value(literal) => Ok(literal.to_value()),
            Self::Factory(factory) => Ok(factory()),
        }
    }
}


#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: TypeSpec,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn required(name: &'static str, ty: TypeSpec) -> Self {
        Self {
            name,
            ty,
            default: FieldDefault::Required,
        }
    }

    pub const fn with_default(name: &'static str, ty: TypeSpec, default: Literal) -> Self {
        Self {
            name,
            ty,
            default: FieldDefault::Value(default),
        }
    }

    pub const fn with_factory(name: &'static str, ty: TypeSpec, factory: fn() -> Value) -> Self {
        Self {
            name,
            ty,
            default: FieldDefault::Factory(factory),
        }
    }
}


/// Schema of a configuration record.
#[derive(Debug)]
pub struct RecordSpec {
    pub name: &'static str,

    /// Declared fields. Their order is the coercion order.
    pub fields: &'static [FieldSpec],

    /// Type-erased [`ConfigRecord::from_mapping`][super::ConfigRecord::from_mapping],
    /// see [`build_record`][super::build_record].
    pub build: fn(&RawTable, &str) -> Result<Value, SchemaError>,
}

impl RecordSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}
