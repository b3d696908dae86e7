use std::env;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::configuration::{
    build_record,
    ConfigRecord,
    FieldSpec,
    Fields,
    Literal,
    RecordSpec,
    SchemaError,
    TypeSpec,
    Value,
};


pub const DEFAULT_FIXED_ZONE_NAME: &str = "CST";

/// UTC+8, in seconds.
pub const DEFAULT_FIXED_ZONE_OFFSET: i64 = 8 * 3600;

pub const DEFAULT_TIME_ZONE_NAME: &str = "Asia/Shanghai";


/// A named, constant offset from UTC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FixedZone {
    name: String,

    /// Offset east of UTC, in seconds.
    offset: i32,
}

impl FixedZone {
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn offset_seconds(&self) -> i64 {
        i64::from(self.offset)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        // PANIC SAFETY: This is safe because we checked that the offset is valid in `from_fields`.
        FixedOffset::east_opt(self.offset).unwrap()
    }
}

impl Default for FixedZone {
    fn default() -> Self {
        Self {
            name: DEFAULT_FIXED_ZONE_NAME.to_string(),
            offset: DEFAULT_FIXED_ZONE_OFFSET as i32,
        }
    }
}

impl ConfigRecord for FixedZone {
    const SPEC: &'static RecordSpec = &RecordSpec {
        name: "FixedZone",
        fields: &[
            FieldSpec::with_default("name", TypeSpec::String, Literal::Str(DEFAULT_FIXED_ZONE_NAME)),
            FieldSpec::with_default(
                "offset",
                TypeSpec::Integer,
                Literal::Int(DEFAULT_FIXED_ZONE_OFFSET),
            ),
        ],
        build: build_record::<Self>,
    };

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let name: String = fields.take("name")?;
        let offset: i64 = fields.take("offset")?;

        let offset = i32::try_from(offset)
            .ok()
            .filter(|offset| FixedOffset::east_opt(*offset).is_some())
            .ok_or_else(|| SchemaError::InvalidValue {
                path: fields.path_of("offset"),
                reason: format!("{offset} is not a valid UTC offset in seconds (must be within ±86399)"),
            })?;

        Ok(Self { name, offset })
    }
}


fn default_fixed_zone() -> Value {
    Value::record(FixedZone::default())
}


/// Process time zone settings.
///
/// Building this record exports `name` as the `TZ` environment variable,
/// unless `TZ` is already set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeZone {
    name: String,
    fixed_zone: FixedZone,
}

impl TimeZone {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixed_zone(&self) -> &FixedZone {
        &self.fixed_zone
    }

    /// Current time in the configured fixed zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.fixed_zone.utc_offset())
    }
}

impl ConfigRecord for TimeZone {
    const SPEC: &'static RecordSpec = &RecordSpec {
        name: "TimeZone",
        fields: &[
            FieldSpec::with_default("name", TypeSpec::String, Literal::Str(DEFAULT_TIME_ZONE_NAME)),
            FieldSpec::with_factory(
                "fixed_zone",
                TypeSpec::Record(FixedZone::SPEC),
                default_fixed_zone,
            ),
        ],
        build: build_record::<Self>,
    };

    fn from_fields(mut fields: Fields) -> Result<Self, SchemaError> {
        let name: String = fields.take("name")?;
        let fixed_zone: FixedZone = fields.record("fixed_zone")?;

        if name.trim().is_empty() {
            return Err(SchemaError::InvalidValue {
                path: fields.path_of("name"),
                reason: "time zone name must not be empty".to_string(),
            });
        }

        apply_process_time_zone(&name);

        Ok(Self { name, fixed_zone })
    }
}


/// Exports `TZ` for the process if nothing has set it yet. Repeated calls
/// (for example on configuration reload) leave an existing value alone.
fn apply_process_time_zone(name: &str) {
    match env::var_os("TZ") {
        Some(existing) => debug!(
            requested = name,
            existing = %existing.to_string_lossy(),
            "TZ is already set, leaving it unchanged."
        ),
        None => {
            export_time_zone(name);
            info!(time_zone = name, "Process time zone set.");
        }
    }
}

/// Configuration is loaded on the main thread before any other thread is
/// started (the script runtime is current-thread), so writing the
/// environment here does not race with readers. Once `TZ` is set, later
/// loads never write it again.
#[cfg(not(test))]
fn export_time_zone(name: &str) {
    env::set_var("TZ", name);
}

// Tests load configurations from many threads at once, so the export is
// recorded per thread instead of touching the process environment.
#[cfg(test)]
thread_local! {
    static EXPORTED_TIME_ZONE: std::cell::RefCell<Option<String>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(test)]
fn export_time_zone(name: &str) {
    EXPORTED_TIME_ZONE.with(|exported| *exported.borrow_mut() = Some(name.to_string()));
}
