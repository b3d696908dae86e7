//! Global `tracing` subscriber setup, driven by [`LoggerSettings`].

use std::{fs, io, path::PathBuf};

use miette::Diagnostic;
use parking_lot::{const_mutex, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{InitError, RollingFileAppender};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
    EnvFilter,
    Registry,
};

use crate::configuration::{LogFileSettings, LoggerSettings};


type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Set once this process has installed its subscriber.
static FILTER_HANDLE: Mutex<Option<FilterHandle>> = const_mutex(None);


#[derive(Debug, Error, Diagnostic)]
pub enum LoggingError {
    #[error("Failed to create log directory {}.", .path.display())]
    #[diagnostic(code(scaffold::logging::directory))]
    CreateDirectory {
        path: PathBuf,

        #[source]
        source: io::Error,
    },

    #[error("Failed to initialize the rolling log file.")]
    #[diagnostic(code(scaffold::logging::appender))]
    Appender(#[source] InitError),

    #[error("Failed to reload the log level filter.")]
    #[diagnostic(code(scaffold::logging::reload))]
    Reload(#[source] reload::Error),
}


/// Applies logger settings to the global `tracing` subscriber.
///
/// The first call installs a subscriber made of a reloadable [`EnvFilter`],
/// a console layer and, if configured, a rolling log file layer. Every later
/// call only swaps the level filter; console and file output stay as they
/// were first installed.
///
/// If a global subscriber was installed by someone else, nothing is installed.
pub fn apply_logger_settings(settings: &LoggerSettings) -> Result<(), LoggingError> {
    if let Some(file) = settings.file() {
        ensure_log_directory(file)?;
    }

    let mut installed_handle = FILTER_HANDLE.lock();

    if let Some(handle) = installed_handle.as_ref() {
        handle
            .reload(settings.level_filter())
            .map_err(LoggingError::Reload)?;

        debug!(level = settings.level(), "Log level filter reloaded.");
        return Ok(());
    }


    let (filter_layer, filter_handle) = reload::Layer::new(settings.level_filter());

    let console_layer = fmt::layer()
        .with_ansi(settings.ansi())
        .with_writer(io::stderr);

    let file_layer = match settings.file() {
        Some(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(build_file_appender(file)?),
        ),
        None => None,
    };

    let installation_result = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    match installation_result {
        Ok(()) => {
            *installed_handle = Some(filter_handle);

            info!(
                level = settings.level(),
                log_file = ?settings.file().map(LogFileSettings::file_name),
                "Tracing initialized."
            );
        }
        Err(error) => {
            warn!(
                %error,
                "A global tracing subscriber is already installed, logger settings are not applied."
            );
        }
    }

    Ok(())
}


fn ensure_log_directory(file: &LogFileSettings) -> Result<(), LoggingError> {
    let directory = file.directory();
    if directory.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(directory).map_err(|source| LoggingError::CreateDirectory {
        path: directory.clone(),
        source,
    })
}

fn build_file_appender(file: &LogFileSettings) -> Result<RollingFileAppender, LoggingError> {
    let (prefix, suffix) = file.file_name_prefix_and_suffix();

    let mut builder = RollingFileAppender::builder()
        .rotation(file.rotation().as_rotation())
        .filename_prefix(prefix);

    if let Some(suffix) = suffix {
        builder = builder.filename_suffix(suffix);
    }

    builder
        .build(file.directory())
        .map_err(LoggingError::Appender)
}


#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, path::Path};

    use super::*;
    use crate::configuration::{loader::parse_toml_str, RawValue};

    fn settings(contents: &str) -> LoggerSettings {
        let logger = parse_toml_str(contents, Path::new("<inline>"))
            .unwrap()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<BTreeMap<String, RawValue>>();

        LoggerSettings::from_logger_table(&logger, "logger").unwrap()
    }

    #[test]
    fn repeated_application_is_accepted() {
        apply_logger_settings(&LoggerSettings::default()).unwrap();
        apply_logger_settings(&settings("level = \"debug\"")).unwrap();
        apply_logger_settings(&LoggerSettings::default()).unwrap();
    }

    #[test]
    fn log_directory_under_a_file_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let blocker = directory.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let settings = settings(&format!(
            "[file]\ndirectory = {:?}\n",
            blocker.join("logs").display().to_string()
        ));

        assert!(matches!(
            apply_logger_settings(&settings),
            Err(LoggingError::CreateDirectory { .. })
        ));
    }

    #[test]
    fn builds_appenders_in_the_configured_directory() {
        let directory = tempfile::tempdir().unwrap();
        let logs = directory.path().join("logs");

        let settings = settings(&format!(
            "[file]\ndirectory = {:?}\nrotation = \"never\"\n",
            logs.display().to_string()
        ));
        let file = settings.file().unwrap();

        ensure_log_directory(file).unwrap();
        build_file_appender(file).unwrap();

        assert!(logs.join("application.log").is_file());
    }
}
