//! This module contains all configuration-relevant code, including
//! the full configuration structure as well as methods needed to load
//! and validate it.
//!
//! Your starting point should probably be [`Application`] and its
//! [`ConfigRecord::load`] method.
//!
//! # Internals
//! Every configuration structure is a [`ConfigRecord`]: a plain immutable struct
//! with a static schema ([`RecordSpec`]) declared next to it.
//!
//! Loading a configuration file first parses it into an untyped tree
//! ([`RawValue`]). The root table is then handed to
//! [`from_mapping`][ConfigRecord::from_mapping], which rejects unknown
//! fields, fills in defaults and [`coerce`][coercion::coerce]s every field into a typed
//! [`Value`] according to its [`TypeSpec`]. Nested records are built the same way,
//! leaves first.
//!
//! The coerced fields are finally turned into the struct in
//! [`from_fields`][ConfigRecord::from_fields]. This is where any additional
//! validation lives (e.g. checking that a log level filter actually parses),
//! as well as construction side effects such as setting the process time zone.
//!
//! Errors carry the dotted path of the offending field
//! (e.g. `time_zone.fixed_zone.offset` or `tags[2]`).

#![allow(rustdoc::private_intra_doc_links)]

mod coercion;
mod errors;
pub mod loader;
mod raw;
mod schema;
mod structure;
mod traits;
mod utilities;
mod value;

pub use errors::{ConfigError, SchemaError};
pub use raw::{RawKey, RawTable, RawValue};
pub use schema::{EnumSpec, FieldSpec, Literal, RecordSpec, TypeSpec};
pub use structure::*;
pub use traits::{build_record, ConfigRecord, Fields};
pub use utilities::resolve_configuration_file_path;
pub use value::{FromValue, Value};
