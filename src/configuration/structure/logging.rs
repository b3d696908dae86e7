use std::{collections::BTreeMap, path::PathBuf};

use serde::Serialize;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;

use crate::configuration::{
    build_record,
    ConfigRecord,
    FieldSpec,
    Fields,
    FromValue,
    Literal,
    RawKey,
    RawTable,
    RawValue,
    RecordSpec,
    SchemaError,
    TypeSpec,
    Value,
};


pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_FILE_NAME: &str = "application.log";


/// How often the log file is rotated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    const CHOICES: &'static [Literal] = &[
        Literal::Str("minutely"),
        Literal::Str("hourly"),
        Literal::Str("daily"),
        Literal::Str("never"),
    ];

    pub fn as_rotation(self) -> Rotation {
        match self {
            Self::Minutely => Rotation::MINUTELY,
            Self::Hourly => Rotation::HOURLY,
            Self::Daily => Rotation::DAILY,
            Self::Never => Rotation::NEVER,
        }
    }
}

impl FromValue for LogRotation {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        match String::from_value(value, path)?.as_str() {
            "minutely" => Ok(Self::Minutely),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "never" => Ok(Self::Never),
            other => Err(SchemaError::InvalidValue {
                path: path.to_string(),
                reason: format!("unknown rotation {other:?}"),
            }),
        }
    }
}


/// Rolling log file output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogFileSettings {
    directory: PathBuf,
    file_name: String,
    rotation: LogRotation,
}

impl LogFileSettings {
    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn rotation(&self) -> LogRotation {
        self.rotation
    }

    /// Splits the file name into the prefix and suffix rotated files are named
    /// with: `application.log` rotates into `application.2024-01-01.log`.
    pub fn file_name_prefix_and_suffix(&self) -> (&str, Option<&str>) {
        match self.file_name.rsplit_once('.') {
            Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => {
                (prefix, Some(suffix))
            }
            _ => (&self.file_name, None),
        }
    }
}

impl ConfigRecord for LogFileSettings {
    const SPEC: &'static RecordSpec = &RecordSpec {
        name: "LogFileSettings",
        fields: &[
            FieldSpec::required("directory", TypeSpec::String),
            FieldSpec::with_default("file_name", TypeSpec::String, Literal::Str(DEFAULT_LOG_FILE_NAME)),
            FieldSpec::with_default(
                "rotation",
                TypeSpec::Literal(LogRotation::CHOICES),
                Literal::Str("daily"),
            ),
        ],
        build: build_record::<Self>,
    };

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let directory: PathBuf = fields.take("directory")?;
        let file_name: String = fields.take("file_name")?;
        let rotation: LogRotation = fields.take("rotation")?;

        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(SchemaError::InvalidValue {
                path: fields.path_of("file_name"),
                reason: format!("{file_name:?} is not a plain file name"),
            });
        }

        Ok(Self {
            directory,
            file_name,
            rotation,
        })
    }
}


/// Logger configuration, read from the application's `logger` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggerSettings {
    level: String,
    ansi: bool,
    file: Option<LogFileSettings>,
}

impl LoggerSettings {
    /// Builds the settings from the application's free-form `logger` table.
    pub fn from_logger_table(
        logger: &BTreeMap<String, RawValue>,
        parent_key: &str,
    ) -> Result<Self, SchemaError> {
        let raw: RawTable = logger
            .iter()
            .map(|(key, value)| (RawKey::String(key.clone()), value.clone()))
            .collect();

        Self::from_mapping(&raw, parent_key)
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn level_filter(&self) -> EnvFilter {
        // PANIC SAFETY: This is safe because we checked that the input is valid in `from_fields`.
        EnvFilter::try_new(&self.level).unwrap()
    }

    pub fn ansi(&self) -> bool {
        self.ansi
    }

    pub fn file(&self) -> Option<&LogFileSettings> {
        self.file.as_ref()
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            ansi: true,
            file: None,
        }
    }
}

impl ConfigRecord for LoggerSettings {
    const SPEC: &'static RecordSpec = &RecordSpec {
        name: "LoggerSettings",
        fields: &[
            FieldSpec::with_default("level", TypeSpec::String, Literal::Str(DEFAULT_LOG_LEVEL)),
            FieldSpec::with_default("ansi", TypeSpec::Bool, Literal::Bool(true)),
            FieldSpec::with_default(
                "file",
                TypeSpec::Union(&[TypeSpec::Record(LogFileSettings::SPEC), TypeSpec::None]),
                Literal::None,
            ),
        ],
        build: build_record::<Self>,
    };

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let level: String = fields.take("level")?;
        let ansi: bool = fields.take("ansi")?;
        let file = fields.optional_record::<LogFileSettings>("file")?;

        // Validate the level filter.
        EnvFilter::try_new(&level).map_err(|error| SchemaError::InvalidValue {
            path: fields.path_of("level"),
            reason: error.to_string(),
        })?;

        Ok(Self { level, ansi, file })
    }
}
