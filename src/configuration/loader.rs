use std::{fs, path::Path};

use miette::NamedSource;
use tracing::debug;

use super::{
    errors::{ConfigError, ConfigFileError},
    raw::{table_from_toml, RawTable},
};


/// Reads and parses a TOML file into a raw table.
///
/// The path is expected to be validated already (see
/// [`resolve_configuration_file_path`][super::utilities::resolve_configuration_file_path]).
pub fn load_toml_file(path: &Path) -> Result<RawTable, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigFileError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = contents.len(), "Read configuration file.");

    parse_toml_str(&contents, path)
}

/// Parses TOML text into a raw table. `path` names the source in errors.
pub fn parse_toml_str(contents: &str, path: &Path) -> Result<RawTable, ConfigError> {
    let document = toml::from_str::<toml::Table>(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source_code: NamedSource::new(path.display().to_string(), contents.to_string()),
        span: source.span().map(Into::into),
        source,
    })?;

    Ok(table_from_toml(document))
}
