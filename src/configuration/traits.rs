use std::{fmt, path::Path};

use tracing::debug;

use super::{
    coercion::{coerce, join_key},
    errors::{ConfigError, SchemaError},
    loader::load_toml_file,
    raw::{RawKey, RawTable},
    schema::RecordSpec,
    utilities::resolve_configuration_file_path,
    value::{FromValue, Value},
};


/// A typed, immutable configuration record with a static schema.
///
/// Implementors declare their fields in [`ConfigRecord::SPEC`] and turn the
/// coerced field values into `Self` in [`ConfigRecord::from_fields`]. That is
/// also where construction side effects belong: it runs exactly once for
/// every record built.
pub trait ConfigRecord: fmt::Debug + Send + Sync + Sized + 'static {
    const SPEC: &'static RecordSpec;

    /// Builds the record from its coerced fields.
    fn from_fields(fields: Fields) -> Result<Self, SchemaError>;

    /// Builds the record from an untyped table, coercing every declared field.
    ///
    /// `parent_key` is the dotted path of `raw` (empty for the root) and is
    /// only used in error messages.
    fn from_mapping(raw: &RawTable, parent_key: &str) -> Result<Self, SchemaError> {
        let spec = Self::SPEC;
        let parent = || {
            if parent_key.is_empty() {
                "<root>".to_string()
            } else {
                parent_key.to_string()
            }
        };

        if let Some(key) = raw.keys().find(|key| key.as_str().is_none()) {
            return Err(SchemaError::NonStringKey {
                parent: parent(),
                key: key.repr(),
            });
        }

        let mut unknown_fields = raw
            .keys()
            .filter_map(RawKey::as_str)
            .filter(|key| spec.field(key).is_none())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if !unknown_fields.is_empty() {
            unknown_fields.sort();
            return Err(SchemaError::UnknownFields {
                parent: parent(),
                fields: unknown_fields,
            });
        }


        let mut values = Vec::with_capacity(spec.fields.len());

        for field in spec.fields {
            let path = join_key(parent_key, field.name);

            let value = match raw.get(&RawKey::from(field.name)) {
                Some(raw_value) => coerce(raw_value, &field.ty, &path)?,
                None => field.default.resolve(&path)?,
            };

            values.push((field.name, value));
        }

        Self::from_fields(Fields::new(parent_key, values))
    }

    /// Resolves the configuration file path (explicit path, then the
    /// `CONFIG_FILE_PATH` environment variable, then `config.toml`), loads it
    /// and builds the record from its root table.
    fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_configuration_file_path(explicit_path)?;

        Self::load_from_resolved_path(&path)
    }

    /// Loads the record from a path returned by
    /// [`resolve_configuration_file_path`]. The path is not validated again.
    fn load_from_resolved_path(path: &Path) -> Result<Self, ConfigError> {
        let table = load_toml_file(path)?;

        debug!(
            record = Self::SPEC.name,
            path = %path.display(),
            "Building configuration record."
        );

        Ok(Self::from_mapping(&table, "")?)
    }
}


/// Type-erased [`ConfigRecord::from_mapping`], stored in [`RecordSpec::build`]
/// so that nested record fields can be coerced.
pub fn build_record<R: ConfigRecord>(raw: &RawTable, parent_key: &str) -> Result<Value, SchemaError> {
    R::from_mapping(raw, parent_key).map(Value::record)
}


/// Coerced field values of a record under construction, in declaration order.
#[derive(Debug)]
pub struct Fields {
    parent_key: String,
    values: Vec<(&'static str, Value)>,
}

impl Fields {
    pub fn new(parent_key: &str, values: Vec<(&'static str, Value)>) -> Self {
        Self {
            parent_key: parent_key.to_string(),
            values,
        }
    }

    /// Dotted path of the named field.
    pub fn path_of(&self, field_name: &str) -> String {
        join_key(&self.parent_key, field_name)
    }

    fn take_value(&mut self, field_name: &str) -> Result<Value, SchemaError> {
        self.values
            .iter_mut()
            .find(|(name, _)| *name == field_name)
            .map(|(_, value)| std::mem::take(value))
            .ok_or_else(|| SchemaError::MissingField {
                path: self.path_of(field_name),
            })
    }

    /// Removes the named field and converts it into `T`.
    pub fn take<T: FromValue>(&mut self, field_name: &str) -> Result<T, SchemaError> {
        let value = self.take_value(field_name)?;
        T::from_value(value, &self.path_of(field_name))
    }

    /// Removes the named field, which must hold a nested record of type `R`.
    pub fn record<R: ConfigRecord>(&mut self, field_name: &str) -> Result<R, SchemaError> {
        let value = self.take_value(field_name)?;
        value.into_record(&self.path_of(field_name))
    }

    /// Like [`Fields::record`], but `None` values are accepted.
    pub fn optional_record<R: ConfigRecord>(&mut self, field_name: &str) -> Result<Option<R>, SchemaError> {
        match self.take_value(field_name)? {
            Value::None => Ok(None),
            value => value.into_record(&self.path_of(field_name)).map(Some),
        }
    }
}
