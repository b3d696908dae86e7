use std::{io, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;


/// Errors raised while locating or reading the configuration file.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigFileError {
    #[error("Configuration file must be a TOML file (*.toml): {}.", .path.display())]
    #[diagnostic(code(scaffold::config::not_toml))]
    NotToml { path: PathBuf },

    #[error("Configuration file {} does not exist.", .path.display())]
    #[diagnostic(
        code(scaffold::config::not_found),
        help("Pass --config <PATH> or set the CONFIG_FILE_PATH environment variable.")
    )]
    NotFound { path: PathBuf },

    #[error("Configuration file {} is not a file.", .path.display())]
    #[diagnostic(code(scaffold::config::not_a_file))]
    NotAFile { path: PathBuf },

    #[error("Failed to read configuration file {}.", .path.display())]
    #[diagnostic(code(scaffold::config::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to determine the current working directory.")]
    #[diagnostic(code(scaffold::config::no_working_directory))]
    NoWorkingDirectory(#[source] io::Error),
}

/// Schema validation failures. Every variant carries the dotted
/// field path of the value that caused it.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{parent} contains a non-string key: {key}.")]
    #[diagnostic(code(scaffold::config::non_string_key))]
    NonStringKey { parent: String, key: String },

    #[error("{parent} contains unknown fields: {}.", .fields.join(", "))]
    #[diagnostic(
        code(scaffold::config::unknown_fields),
        help("Remove these fields or check them for typos.")
    )]
    UnknownFields { parent: String, fields: Vec<String> },

    #[error("{path} must be set.")]
    #[diagnostic(code(scaffold::config::missing_field))]
    MissingField { path: String },

    #[error("{path} must be set {expected}, found {found}.")]
    #[diagnostic(code(scaffold::config::type_mismatch))]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid value {value} for {path}. Valid values are [{}].", .allowed.join(", "))]
    #[diagnostic(code(scaffold::config::invalid_choice))]
    InvalidChoice {
        path: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Invalid value for {path}: {reason}.")]
    #[diagnostic(code(scaffold::config::invalid_value))]
    InvalidValue { path: String, reason: String },
}

impl SchemaError {
    /// Dotted path of the offending value. For key-level failures this is
    /// the path of the table that contains the keys.
    pub fn path(&self) -> &str {
        match self {
            Self::NonStringKey { parent, .. } | Self::UnknownFields { parent, .. } => parent,
            Self::MissingField { path }
            | Self::TypeMismatch { path, .. }
            | Self::InvalidChoice { path, .. }
            | Self::InvalidValue { path, .. } => path,
        }
    }
}


/// Top-level error of [`ConfigRecord::load`][super::ConfigRecord::load].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    File(#[from] ConfigFileError),

    #[error("Configuration file {} is not valid TOML.", .path.display())]
    #[diagnostic(code(scaffold::config::parse))]
    Parse {
        path: PathBuf,

        #[source_code]
        source_code: NamedSource<String>,

        #[label("invalid TOML")]
        span: Option<SourceSpan>,

        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),
}
