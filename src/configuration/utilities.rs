use std::{
    env::{self, current_dir},
    ffi::{OsStr, OsString},
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::errors::ConfigFileError;


/// Environment variable consulted when no explicit configuration path is given.
pub const CONFIGURATION_FILE_PATH_ENV_VAR: &str = "CONFIG_FILE_PATH";

/// Used when neither an explicit path nor the environment variable is given.
/// Relative to the current working directory.
pub const DEFAULT_CONFIGURATION_FILE_PATH: &str = "config.toml";


/// Resolves the configuration file path from, in order: `explicit_path`,
/// the `CONFIG_FILE_PATH` environment variable and the default `config.toml`.
///
/// Relative paths are taken relative to the current working directory, and
/// the resolved path is validated with [`validate_configuration_file_path_in`].
pub fn resolve_configuration_file_path(
    explicit_path: Option<&Path>,
) -> Result<PathBuf, ConfigFileError> {
    let working_directory = current_dir().map_err(ConfigFileError::NoWorkingDirectory)?;

    resolve_configuration_file_path_in(
        &working_directory,
        explicit_path,
        env::var_os(CONFIGURATION_FILE_PATH_ENV_VAR),
    )
}

/// Same as [`resolve_configuration_file_path`], but with the base directory
/// and the environment variable's value passed in. An empty value counts as unset.
pub fn resolve_configuration_file_path_in(
    base_directory: &Path,
    explicit_path: Option<&Path>,
    environment_value: Option<OsString>,
) -> Result<PathBuf, ConfigFileError> {
    let candidate = match (explicit_path, environment_value) {
        (Some(path), _) => {
            debug!(path = %path.display(), "Using explicit configuration file path.");
            path.to_path_buf()
        }
        (None, Some(value)) if !value.is_empty() => {
            debug!(
                variable = CONFIGURATION_FILE_PATH_ENV_VAR,
                "Using configuration file path from environment."
            );
            PathBuf::from(value)
        }
        _ => {
            debug!("Using default configuration file path.");
            PathBuf::from(DEFAULT_CONFIGURATION_FILE_PATH)
        }
    };

    validate_configuration_file_path_in(base_directory, &candidate)
}


/// Expands a leading `~`, makes the path absolute against `base_directory`,
/// canonicalizes it and checks that the canonical path is an existing
/// `*.toml` file. Returns the canonical path.
pub fn validate_configuration_file_path_in(
    base_directory: &Path,
    path: &Path,
) -> Result<PathBuf, ConfigFileError> {
    let expanded = expand_home_directory(path);
    let absolute = base_directory.join(expanded);

    // Symlinks are followed here, so the checks below see the real target.
    let canonical = dunce::canonicalize(&absolute).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigFileError::NotFound {
            path: absolute.clone(),
        },
        _ => ConfigFileError::Unreadable {
            path: absolute.clone(),
            source,
        },
    })?;

    let has_toml_extension = canonical
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));

    if !has_toml_extension {
        return Err(ConfigFileError::NotToml { path: canonical });
    }

    if !canonical.is_file() {
        return Err(ConfigFileError::NotAFile { path: canonical });
    }

    Ok(canonical)
}


fn home_directory() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Replaces a leading `~` component with the user's home directory.
/// Paths without one (and `~user` forms) are returned unchanged.
#[must_use = "function returns the expanded path"]
pub fn expand_home_directory(path: &Path) -> PathBuf {
    let mut components = path.components();

    let starts_with_tilde = components
        .next()
        .is_some_and(|first| first.as_os_str() == "~");

    match (starts_with_tilde, home_directory()) {
        (true, Some(home)) => home.join(components.as_path()),
        _ => path.to_path_buf(),
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let directory = tempfile::tempdir().unwrap();
        let explicit = directory.path().join("explicit.toml");
        let from_environment = directory.path().join("environment.toml");
        fs::write(&explicit, "").unwrap();
        fs::write(&from_environment, "").unwrap();

        let resolved = resolve_configuration_file_path_in(
            directory.path(),
            Some(&explicit),
            Some(from_environment.clone().into_os_string()),
        )
        .unwrap();
        assert_eq!(resolved, dunce::canonicalize(&explicit).unwrap());

        let resolved = resolve_configuration_file_path_in(
            directory.path(),
            None,
            Some(OsString::from("environment.toml")),
        )
        .unwrap();
        assert_eq!(resolved, dunce::canonicalize(&from_environment).unwrap());
    }

    #[test]
    fn missing_default_file_is_not_found() {
        let directory = tempfile::tempdir().unwrap();
        let expected_path = directory.path().join(DEFAULT_CONFIGURATION_FILE_PATH);

        for environment_value in [None, Some(OsString::new())] {
            match resolve_configuration_file_path_in(directory.path(), None, environment_value) {
                Err(ConfigFileError::NotFound { path }) => assert_eq!(path, expected_path),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn falls_back_to_default_file() {
        let directory = tempfile::tempdir().unwrap();
        let default_path = directory.path().join(DEFAULT_CONFIGURATION_FILE_PATH);
        fs::write(&default_path, "").unwrap();

        let resolved = resolve_configuration_file_path_in(directory.path(), None, None).unwrap();

        assert_eq!(resolved, dunce::canonicalize(&default_path).unwrap());
    }

    #[test]
    fn rejects_non_toml_extensions() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            validate_configuration_file_path_in(directory.path(), &path),
            Err(ConfigFileError::NotToml { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn extension_is_checked_on_the_symlink_target() {
        let directory = tempfile::tempdir().unwrap();
        let target = directory.path().join("settings.txt");
        let link = directory.path().join("config.toml");
        fs::write(&target, "").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        match validate_configuration_file_path_in(directory.path(), &link) {
            Err(ConfigFileError::NotToml { path }) => {
                assert_eq!(path, dunce::canonicalize(&target).unwrap())
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn extension_check_ignores_case() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("CONFIG.TOML");
        fs::write(&path, "").unwrap();

        assert!(validate_configuration_file_path_in(directory.path(), &path).is_ok());
    }

    #[test]
    fn rejects_missing_files_and_directories() {
        let directory = tempfile::tempdir().unwrap();

        assert!(matches!(
            validate_configuration_file_path_in(directory.path(), Path::new("absent.toml")),
            Err(ConfigFileError::NotFound { .. })
        ));

        let nested = directory.path().join("nested.toml");
        fs::create_dir(&nested).unwrap();
        assert!(matches!(
            validate_configuration_file_path_in(directory.path(), &nested),
            Err(ConfigFileError::NotAFile { .. })
        ));
    }

    #[test]
    fn expands_leading_tilde_only() {
        let unchanged = Path::new("/srv/~/config.toml");
        assert_eq!(expand_home_directory(unchanged), unchanged);

        if let Some(home) = home_directory() {
            assert_eq!(
                expand_home_directory(Path::new("~/app/config.toml")),
                home.join("app/config.toml")
            );
        }
    }
}
