//! JSON file logs, rolled over by [`Rotation`].

use std::path::PathBuf;

pub use tracing_appender::rolling::Rotation;

use super::{Settings, SettingsToggle};

#[derive(Debug, Default, PartialEq, Eq)]
pub enum FileLogSettings {
    #[default]
    Disabled,

    Enabled {
        common_settings: Settings,
        file_log_dir: PathBuf,
        rotation_period: Rotation,
        filename_suffix: String,
        /// Older files beyond this count are deleted.
        max_log_files: Option<usize>,
    },
}

impl SettingsToggle for FileLogSettings {
    fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

impl<T: Into<Self>> From<Option<T>> for FileLogSettings {
    fn from(settings: Option<T>) -> Self {
        settings.map_or(Self::Disabled, Into::into)
    }
}

/// Created by [`SettingsBuilder::file_log_settings_builder`].
///
/// [`SettingsBuilder::file_log_settings_builder`]: super::SettingsBuilder::file_log_settings_builder
pub struct FileLogSettingsBuilder {
    pub(crate) common_settings: Settings,
    pub(crate) file_log_dir: PathBuf,
    pub(crate) rotation_period: Rotation,
    pub(crate) filename_suffix: String,
    pub(crate) max_log_files: Option<usize>,
}

impl FileLogSettingsBuilder {
    pub fn with_rotation_period(mut self, rotation_period: impl Into<Rotation>) -> Self {
        self.rotation_period = rotation_period.into();
        self
    }

    pub fn with_max_files(mut self, max_log_files: impl Into<Option<usize>>) -> Self {
        self.max_log_files = max_log_files.into();
        self
    }

    pub fn build(self) -> FileLogSettings {
        FileLogSettings::Enabled {
            common_settings: self.common_settings,
            file_log_dir: self.file_log_dir,
            rotation_period: self.rotation_period,
            filename_suffix: self.filename_suffix,
            max_log_files: self.max_log_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn builds_settings() {
        let settings = Settings::builder()
            .with_environment_variable("FILE_LOG_LEVEL")
            .with_default_level(LevelFilter::DEBUG)
            .file_log_settings_builder("/var/log/ign-converter", "tracing-rs.json")
            .with_rotation_period(Rotation::HOURLY)
            .with_max_files(6)
            .build();

        assert_eq!(settings, FileLogSettings::Enabled {
            common_settings: Settings {
                environment_variable: "FILE_LOG_LEVEL",
                default_level: LevelFilter::DEBUG,
            },
            file_log_dir: PathBuf::from("/var/log/ign-converter"),
            rotation_period: Rotation::HOURLY,
            filename_suffix: "tracing-rs.json".to_owned(),
            max_log_files: Some(6),
        });
    }

    #[test]
    fn none_is_disabled() {
        assert!(FileLogSettings::from(None::<FileLogSettings>).is_disabled());
    }
}
