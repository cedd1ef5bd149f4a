//! Per subscriber settings.

use std::path::Path;

use tracing::level_filters::LevelFilter;

pub mod console_log;
pub use console_log::*;

pub mod file_log;
pub use file_log::*;

/// Level filtering shared by every subscriber.
#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    /// Environment variable holding [`EnvFilter`] directives. Takes
    /// precedence over [`Self::default_level`] when set.
    ///
    /// [`EnvFilter`]: tracing_subscriber::EnvFilter
    pub environment_variable: &'static str,

    pub default_level: LevelFilter,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }
}

impl Default for Settings {
    fn default() -> Self {
        SettingsBuilder::default().build()
    }
}

pub trait SettingsToggle {
    /// Whether the subscriber is installed by [`Tracing::init`].
    ///
    /// [`Tracing::init`]: crate::tracing::Tracing::init
    fn is_enabled(&self) -> bool;

    fn is_disabled(&self) -> bool {
        !self.is_enabled()
    }
}

/// Reads `RUST_LOG` and logs nothing by default.
pub struct SettingsBuilder {
    environment_variable: &'static str,
    default_level: LevelFilter,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            environment_variable: "RUST_LOG",
            default_level: LevelFilter::OFF,
        }
    }
}

impl SettingsBuilder {
    pub fn with_environment_variable(mut self, name: &'static str) -> Self {
        self.environment_variable = name;
        self
    }

    pub fn with_default_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            environment_variable: self.environment_variable,
            default_level: self.default_level,
        }
    }

    /// Continues with the settings of a file subscriber writing
    /// `<service>.<filename_suffix>` files into `directory`.
    pub fn file_log_settings_builder(
        self,
        directory: impl AsRef<Path>,
        filename_suffix: impl Into<String>,
    ) -> FileLogSettingsBuilder {
        FileLogSettingsBuilder {
            common_settings: self.build(),
            file_log_dir: directory.as_ref().to_path_buf(),
            rotation_period: Rotation::NEVER,
            filename_suffix: filename_suffix.into(),
            max_log_files: None,
        }
    }
}
