use std::path::{Path, PathBuf};

use tracing::info;

use crate::configuration::{
    resolve_configuration_file_path,
    Application,
    ConfigError,
    ConfigRecord,
};


/// Everything a command needs: the loaded configuration and where it came from.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// Canonical path of the loaded configuration file.
    pub configuration_file_path: PathBuf,

    pub application: Application,
}

impl AppContext {
    /// Resolves the configuration file path (see [`resolve_configuration_file_path`])
    /// and loads the application configuration from it.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let configuration_file_path = resolve_configuration_file_path(explicit_path)?;
        let application = Application::load_from_resolved_path(&configuration_file_path)?;

        info!(
            path = %configuration_file_path.display(),
            application = application.name(),
            mode = application.mode().as_str(),
            "Configuration loaded."
        );

        Ok(Self {
            configuration_file_path,
            application,
        })
    }

    /// Loads the configuration file this context was loaded from again.
    /// The path is validated again, since the file may have been moved or replaced.
    pub fn reloaded(&self) -> Result<Self, ConfigError> {
        let application = Application::load(Some(&self.configuration_file_path))?;

        info!(
            path = %self.configuration_file_path.display(),
            application = application.name(),
            "Configuration reloaded."
        );

        Ok(Self {
            configuration_file_path: self.configuration_file_path.clone(),
            application,
        })
    }

    /// The loaded configuration as TOML, with secrets redacted.
    pub fn configuration_as_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.application)
    }
}




#[cfg(test)]
mod tests {
    use std::fs;

    use super::{test_support::test_context, *};

    #[test]
    fn keeps_the_canonical_source_path() {
        let (directory, context) = test_context();

        assert_eq!(
            context.configuration_file_path,
            dunce::canonicalize(directory.path().join("config.toml")).unwrap()
        );
        assert_eq!(context.application.name(), "svc");
        assert!(context.application.is_prod());
    }

    #[test]
    fn reload_picks_up_changes() {
        let (_directory, context) = test_context();

        let updated = fs::read_to_string(&context.configuration_file_path)
            .unwrap()
            .replace("name = \"svc\"", "name = \"svc-2\"");
        fs::write(&context.configuration_file_path, updated).unwrap();

        let reloaded = context.reloaded().unwrap();
        assert_eq!(reloaded.application.name(), "svc-2");
        assert_eq!(reloaded.configuration_file_path, context.configuration_file_path);
    }

    #[test]
    fn printed_configuration_hides_the_secret() {
        let (_directory, context) = test_context();

        let printed = context.configuration_as_toml().unwrap();

        assert!(printed.contains("name = \"svc\""));
        assert!(printed.contains("[time_zone.fixed_zone]"));
        assert!(!printed.contains("hunter2"));
    }
}
