use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::debug;

pub use self::logging::{LogFileSettings, LoggerSettings};
pub use self::time_zone::TimeZone;
use super::{
    build_record,
    ConfigRecord,
    EnumSpec,
    FieldSpec,
    Fields,
    FromValue,
    Literal,
    RawValue,
    RecordSpec,
    SchemaError,
    TypeSpec,
    Value,
};
use crate::logging::apply_logger_settings;

mod logging;
mod time_zone;



#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationMode {
    Debug,
    Prod,
}

impl ApplicationMode {
    pub const SPEC: &'static EnumSpec = &EnumSpec {
        name: "ApplicationMode",
        members: &[Literal::Str("debug"), Literal::Str("prod")],
    };

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Prod => "prod",
        }
    }
}

impl FromValue for ApplicationMode {
    fn from_value(value: Value, path: &str) -> Result<Self, SchemaError> {
        match String::from_value(value, path)?.as_str() {
            "debug" => Ok(Self::Debug),
            "prod" => Ok(Self::Prod),
            other => Err(SchemaError::InvalidChoice {
                path: path.to_string(),
                value: format!("{other:?}"),
                allowed: Self::SPEC.members.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}


fn empty_logger_table() -> Value {
    Value::Map(BTreeMap::new())
}

fn redact_secret<S: Serializer>(_secret: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("<redacted>")
}


/// The entire process configuration: the root of the configuration file.
///
/// Building this record applies the `logger` table to the global tracing
/// subscriber (see [`apply_logger_settings`]); building its `time_zone`
/// exports the process time zone.
#[derive(Clone, Debug, Serialize)]
pub struct Application {
    name: String,

    mode: ApplicationMode,

    #[serde(serialize_with = "redact_secret")]
    secret: String,

    time_zone: TimeZone,

    /// The `logger` table as written in the configuration file.
    logger: BTreeMap<String, RawValue>,

    #[serde(skip)]
    logger_settings: LoggerSettings,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ApplicationMode {
        self.mode
    }

    #[allow(dead_code)]
    pub fn is_debug(&self) -> bool {
        self.mode == ApplicationMode::Debug
    }

    #[allow(dead_code)]
    pub fn is_prod(&self) -> bool {
        self.mode == ApplicationMode::Prod
    }

    #[allow(dead_code)]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    #[allow(dead_code)]
    pub fn logger(&self) -> &BTreeMap<String, RawValue> {
        &self.logger
    }

    #[allow(dead_code)]
    pub fn logger_settings(&self) -> &LoggerSettings {
        &self.logger_settings
    }
}

impl ConfigRecord for Application {
    const SPEC: &'static RecordSpec = &RecordSpec {
        name: "Application",
        fields: &[
            FieldSpec::required("name", TypeSpec::String),
            FieldSpec::with_default("mode", TypeSpec::Enum(ApplicationMode::SPEC), Literal::Str("debug")),
            FieldSpec::required("secret", TypeSpec::String),
            FieldSpec::required("time_zone", TypeSpec::Record(TimeZone::SPEC)),
            FieldSpec::with_factory(
                "logger",
                TypeSpec::Map(Some((&TypeSpec::String, &TypeSpec::Any))),
                empty_logger_table,
            ),
        ],
        build: build_record::<Self>,
    };

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let name: String = fields.take("name")?;
        let mode: ApplicationMode = fields.take("mode")?;
        let secret: String = fields.take("secret")?;
        let time_zone: TimeZone = fields.record("time_zone")?;
        let logger: BTreeMap<String, RawValue> = fields.take("logger")?;

        let logger_path = fields.path_of("logger");
        let logger_settings = LoggerSettings::from_logger_table(&logger, &logger_path)?;

        apply_logger_settings(&logger_settings).map_err(|error| SchemaError::InvalidValue {
            path: logger_path,
            reason: error.to_string().trim_end_matches('.').to_string(),
        })?;

        debug!(
            application = %name,
            mode = mode.as_str(),
            "Application configuration built."
        );

        Ok(Self {
            name,
            mode,
            secret,
            time_zone,
            logger,
            logger_settings,
        })
    }
}
