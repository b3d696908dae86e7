//! Conversion of raw values into typed values, driven by [`TypeSpec`].

use std::collections::BTreeMap;

use tracing::trace;

use super::{
    errors::SchemaError,
    raw::{RawKey, RawValue},
    schema::{TupleShape, TypeSpec},
    value::{MapKey, Value},
};


fn mismatch(path: &str, expected: &TypeSpec, raw: &RawValue) -> SchemaError {
    SchemaError::TypeMismatch {
        path: path.to_string(),
        expected: expected.describe(),
        found: raw.type_name().to_string(),
    }
}

/// Joins a field name onto its parent path (`time_zone` + `name` -> `time_zone.name`).
pub fn join_key(parent_key: &str, field_name: &str) -> String {
    if parent_key.is_empty() {
        field_name.to_string()
    } else {
        format!("{parent_key}.{field_name}")
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}


/// Coerces `raw` into a value of type `ty`.
///
/// `path` is the dotted path of `raw` inside the configuration tree and only
/// ends up in error messages. The raw value is never modified.
pub fn coerce(raw: &RawValue, ty: &TypeSpec, path: &str) -> Result<Value, SchemaError> {
    match ty {
        TypeSpec::Any => Ok(Value::Raw(raw.clone())),

        TypeSpec::Record(spec) => match raw {
            RawValue::Table(table) => (spec.build)(table, path),
            _ => Err(mismatch(path, ty, raw)),
        },

        TypeSpec::Literal(allowed) => allowed
            .iter()
            .find(|literal| literal.matches(raw))
            .map(|literal| literal.to_value())
            .ok_or_else(|| mismatch(path, ty, raw)),

        TypeSpec::Union(alternatives) => coerce_union(raw, ty, alternatives, path),

        TypeSpec::Enum(spec) => spec
            .members
            .iter()
            .find(|member| member.matches(raw))
            .map(|member| member.to_value())
            .ok_or_else(|| SchemaError::InvalidChoice {
                path: path.to_string(),
                value: raw.to_string(),
                allowed: spec.members.iter().map(ToString::to_string).collect(),
            }),

        TypeSpec::List(item) => {
            let RawValue::Array(items) = raw else {
                return Err(mismatch(path, ty, raw));
            };

            coerce_sequence(items, *item, path).map(Value::List)
        }

        TypeSpec::Map(key_and_value) => {
            let RawValue::Table(table) = raw else {
                return Err(mismatch(path, ty, raw));
            };

            let mut entries = BTreeMap::new();
            for (key, item) in table {
                let (key, item) = match key_and_value {
                    Some((key_type, value_type)) => (
                        coerce_map_key(key, key_type, path)?,
                        coerce(item, value_type, &format!("{path}[{}]", key.repr()))?,
                    ),
                    None => (unchecked_map_key(key), Value::Raw(item.clone())),
                };

                entries.insert(key, item);
            }

            Ok(Value::Map(entries))
        }

        TypeSpec::Tuple(shape) => {
            let RawValue::Array(items) = raw else {
                return Err(mismatch(path, ty, raw));
            };

            let items = match shape {
                TupleShape::Unchecked => coerce_sequence(items, None, path)?,
                TupleShape::Variadic(item) => coerce_sequence(items, Some(*item), path)?,
                TupleShape::Fixed(item_types) => {
                    if items.len() != item_types.len() {
                        return Err(mismatch(path, ty, raw));
                    }

                    items
                        .iter()
                        .zip(item_types.iter())
                        .enumerate()
                        .map(|(index, (item, item_type))| {
                            coerce(item, item_type, &index_path(path, index))
                        })
                        .collect::<Result<Vec<_>, _>>()?
                }
            };

            Ok(Value::Tuple(items))
        }

        TypeSpec::None => Err(mismatch(path, ty, raw)),

        // Booleans are their own raw variant, so an integer field can never
        // silently accept `true` or `false`. Integers are not widened to floats.
        TypeSpec::Bool
        | TypeSpec::Integer
        | TypeSpec::Float
        | TypeSpec::String
        | TypeSpec::Datetime => match (ty, raw) {
            (TypeSpec::Bool, RawValue::Boolean(value)) => Ok(Value::Bool(*value)),
            (TypeSpec::Integer, RawValue::Integer(value)) => Ok(Value::Integer(*value)),
            (TypeSpec::Float, RawValue::Float(value)) => Ok(Value::Float(*value)),
            (TypeSpec::String, RawValue::String(value)) => Ok(Value::String(value.clone())),
            (TypeSpec::Datetime, RawValue::Datetime(value)) => Ok(Value::Datetime(value.clone())),
            _ => Err(mismatch(path, ty, raw)),
        },
    }
}


fn coerce_union(
    raw: &RawValue,
    union: &TypeSpec,
    alternatives: &[TypeSpec],
    path: &str,
) -> Result<Value, SchemaError> {
    for alternative in alternatives {
        match coerce(raw, alternative, path) {
            Ok(value) => return Ok(value),
            Err(error) => trace!(
                path,
                alternative = %alternative,
                failed_at = error.path(),
                %error,
                "Union alternative rejected value."
            ),
        }
    }

    Err(mismatch(path, union, raw))
}

fn coerce_sequence(
    items: &[RawValue],
    item_type: Option<&TypeSpec>,
    path: &str,
) -> Result<Vec<Value>, SchemaError> {
    match item_type {
        Some(item_type) => items
            .iter()
            .enumerate()
            .map(|(index, item)| coerce(item, item_type, &index_path(path, index)))
            .collect(),
        None => Ok(items.iter().cloned().map(Value::Raw).collect()),
    }
}

fn coerce_map_key(key: &RawKey, key_type: &TypeSpec, path: &str) -> Result<MapKey, SchemaError> {
    if let TypeSpec::Any = key_type {
        return Ok(unchecked_map_key(key));
    }

    let key_path = format!("{path}.<key>");
    let raw_key = key.to_raw_value();

    let coerced = coerce(&raw_key, key_type, &key_path)?;

    MapKey::try_from(coerced).map_err(|_| mismatch(&key_path, key_type, &raw_key))
}

fn unchecked_map_key(key: &RawKey) -> MapKey {
    match key {
        RawKey::String(key) => MapKey::String(key.clone()),
        RawKey::Integer(key) => MapKey::Integer(*key),
        RawKey::Boolean(key) => MapKey::Bool(*key),
    }
}


#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::configuration::{
        loader::parse_toml_str,
        raw::RawTable,
        schema::{EnumSpec, Literal},
    };

    fn raw(toml_value: &str) -> RawValue {
        let table: RawTable =
            parse_toml_str(&format!("value = {toml_value}"), Path::new("<inline>")).unwrap();
        table.get(&RawKey::from("value")).cloned().unwrap()
    }

    const MODE: EnumSpec = EnumSpec {
        name: "ApplicationMode",
        members: &[Literal::Str("debug"), Literal::Str("prod")],
    };

    #[test]
    fn any_passes_values_through() {
        let value = coerce(&raw("[1, \"two\"]"), &TypeSpec::Any, "value").unwrap();

        assert!(matches!(
            value,
            Value::Raw(RawValue::Array(items)) if items.len() == 2
        ));
    }

    #[test]
    fn rejects_booleans_for_integers() {
        let error = coerce(&raw("true"), &TypeSpec::Integer, "retries").unwrap_err();

        assert_eq!(
            error,
            SchemaError::TypeMismatch {
                path: "retries".to_string(),
                expected: "int".to_string(),
                found: "bool".to_string(),
            }
        );
    }

    #[test]
    fn does_not_widen_integers_to_floats() {
        assert!(coerce(&raw("1"), &TypeSpec::Float, "ratio").is_err());
        assert_eq!(
            coerce(&raw("1.5"), &TypeSpec::Float, "ratio")
                .unwrap()
                .type_name(),
            "float"
        );
    }

    #[test]
    fn list_items_are_checked_with_indexed_paths() {
        let tags = TypeSpec::List(Some(&TypeSpec::String));

        let value = coerce(&raw("[\"a\", \"b\"]"), &tags, "tags").unwrap();
        let Value::List(items) = value else {
            panic!("expected a list");
        };
        assert_eq!(items[1].as_str(), Some("b"));

        let error = coerce(&raw("[\"a\", 1]"), &tags, "tags").unwrap_err();
        assert_eq!(error.path(), "tags[1]");
    }

    #[test]
    fn untyped_lists_are_not_checked() {
        let value = coerce(&raw("[\"a\", 1, true]"), &TypeSpec::List(None), "mixed").unwrap();

        assert!(matches!(value, Value::List(items) if items.len() == 3));
    }

    #[test]
    fn map_values_are_checked_with_keyed_paths() {
        let limits = TypeSpec::Map(Some((&TypeSpec::String, &TypeSpec::Integer)));

        let value = coerce(&raw("{ cpu = 2 }"), &limits, "limits").unwrap();
        let Value::Map(entries) = value else {
            panic!("expected a map");
        };
        assert_eq!(
            entries
                .get(&MapKey::String("cpu".to_string()))
                .and_then(Value::as_integer),
            Some(2)
        );

        let error = coerce(&raw("{ cpu = \"2\" }"), &limits, "limits").unwrap_err();
        assert_eq!(error.path(), "limits[\"cpu\"]");
    }

    #[test]
    fn any_map_keys_are_accepted_as_is() {
        let limits = TypeSpec::Map(Some((&TypeSpec::Any, &TypeSpec::Integer)));

        let value = coerce(&raw("{ cpu = 2 }"), &limits, "limits").unwrap();
        let Value::Map(entries) = value else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries
                .get(&MapKey::String("cpu".to_string()))
                .and_then(Value::as_integer),
            Some(2)
        );

        let mut table = RawTable::new();
        table.insert(RawKey::Integer(1), RawValue::Integer(3));

        let value = coerce(&RawValue::Table(table), &limits, "limits").unwrap();
        assert!(matches!(
            value,
            Value::Map(entries) if entries.contains_key(&MapKey::Integer(1))
        ));
    }

    #[test]
    fn map_keys_are_checked() {
        let by_port = TypeSpec::Map(Some((&TypeSpec::Integer, &TypeSpec::String)));

        let mut table = RawTable::new();
        table.insert(RawKey::from("http"), RawValue::String("80".to_string()));

        let error = coerce(&RawValue::Table(table), &by_port, "ports").unwrap_err();
        assert_eq!(error.path(), "ports.<key>");

        let mut table = RawTable::new();
        table.insert(RawKey::Integer(80), RawValue::String("http".to_string()));

        let value = coerce(&RawValue::Table(table), &by_port, "ports").unwrap();
        assert!(matches!(
            value,
            Value::Map(entries) if entries.contains_key(&MapKey::Integer(80))
        ));
    }

    #[test]
    fn fixed_tuples_require_exact_arity() {
        let coords = TypeSpec::Tuple(TupleShape::Fixed(&[TypeSpec::Integer, TypeSpec::Integer]));

        let value = coerce(&raw("[1, 2]"), &coords, "coords").unwrap();
        let Value::Tuple(items) = value else {
            panic!("expected a tuple");
        };
        assert_eq!(
            items.iter().map(|item| item.as_integer()).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );

        for wrong_length in ["[1]", "[1, 2, 3]", "[]"] {
            let error = coerce(&raw(wrong_length), &coords, "coords").unwrap_err();
            assert_eq!(
                error,
                SchemaError::TypeMismatch {
                    path: "coords".to_string(),
                    expected: "tuple[int, int]".to_string(),
                    found: "list".to_string(),
                }
            );
        }

        let error = coerce(&raw("[1, \"2\"]"), &coords, "coords").unwrap_err();
        assert_eq!(error.path(), "coords[1]");
    }

    #[test]
    fn variadic_tuples_accept_any_length() {
        let scores = TypeSpec::Tuple(TupleShape::Variadic(&TypeSpec::Integer));

        for (input, length) in [("[]", 0), ("[1]", 1), ("[1, 2, 3, 4]", 4)] {
            let value = coerce(&raw(input), &scores, "scores").unwrap();
            assert!(matches!(value, Value::Tuple(items) if items.len() == length));
        }

        let error = coerce(&raw("[1, 2, false]"), &scores, "scores").unwrap_err();
        assert_eq!(error.path(), "scores[2]");
    }

    #[test]
    fn literals_require_exact_values() {
        let level = TypeSpec::Literal(&[Literal::Str("debug"), Literal::Int(1)]);

        assert_eq!(
            coerce(&raw("\"debug\""), &level, "level").unwrap().as_str(),
            Some("debug")
        );
        assert_eq!(
            coerce(&raw("1"), &level, "level").unwrap().as_integer(),
            Some(1)
        );
        assert!(coerce(&raw("true"), &level, "level").is_err());
        assert!(coerce(&raw("\"DEBUG\""), &level, "level").is_err());
    }

    #[test]
    fn enums_list_allowed_values() {
        let mode = TypeSpec::Enum(&MODE);

        assert_eq!(
            coerce(&raw("\"prod\""), &mode, "mode").unwrap().as_str(),
            Some("prod")
        );

        let error = coerce(&raw("\"staging\""), &mode, "mode").unwrap_err();
        assert_eq!(
            error,
            SchemaError::InvalidChoice {
                path: "mode".to_string(),
                value: "\"staging\"".to_string(),
                allowed: vec!["'debug'".to_string(), "'prod'".to_string()],
            }
        );

        let error = coerce(&raw("1.0"), &mode, "mode").unwrap_err();
        assert!(matches!(
            error,
            SchemaError::InvalidChoice { ref value, .. } if value == "1.0"
        ));
    }

    #[test]
    fn unions_try_alternatives_in_order() {
        let number_or_text = TypeSpec::Union(&[TypeSpec::Integer, TypeSpec::String]);

        assert_eq!(
            coerce(&raw("3"), &number_or_text, "value").unwrap().as_integer(),
            Some(3)
        );
        assert_eq!(
            coerce(&raw("\"three\""), &number_or_text, "value").unwrap().as_str(),
            Some("three")
        );

        let error = coerce(&raw("3.0"), &number_or_text, "value").unwrap_err();
        assert_eq!(
            error,
            SchemaError::TypeMismatch {
                path: "value".to_string(),
                expected: "int | str".to_string(),
                found: "float".to_string(),
            }
        );
    }

    #[test]
    fn optional_values_reject_mismatches() {
        let optional = TypeSpec::Union(&[TypeSpec::String, TypeSpec::None]);

        assert_eq!(
            coerce(&raw("\"x\""), &optional, "name").unwrap().as_str(),
            Some("x")
        );
        assert!(coerce(&raw("1"), &optional, "name").is_err());
    }
}
