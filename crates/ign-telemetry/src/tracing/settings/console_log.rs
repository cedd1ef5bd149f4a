//! Human readable logs on stderr. Stdout is left to the translated config.

use tracing::level_filters::LevelFilter;

use super::{Settings, SettingsToggle};

#[derive(Debug, Default, PartialEq, Eq)]
pub enum ConsoleLogSettings {
    #[default]
    Disabled,

    Enabled { common_settings: Settings },
}

impl SettingsToggle for ConsoleLogSettings {
    fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

impl From<Settings> for ConsoleLogSettings {
    fn from(common_settings: Settings) -> Self {
        Self::Enabled { common_settings }
    }
}

impl<T: Into<Self>> From<Option<T>> for ConsoleLogSettings {
    fn from(settings: Option<T>) -> Self {
        settings.map_or(Self::Disabled, Into::into)
    }
}

/// Environment variable and default level.
impl From<(&'static str, LevelFilter)> for ConsoleLogSettings {
    fn from((environment_variable, default_level): (&'static str, LevelFilter)) -> Self {
        Settings {
            environment_variable,
            default_level,
        }
        .into()
    }
}

/// As above, the flag switches the subscriber on or off.
impl From<(&'static str, LevelFilter, bool)> for ConsoleLogSettings {
    fn from(
        (environment_variable, default_level, enabled): (&'static str, LevelFilter, bool),
    ) -> Self {
        if enabled {
            (environment_variable, default_level).into()
        } else {
            Self::Disabled
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn from_settings() {
        let settings = ConsoleLogSettings::from(
            Settings::builder()
                .with_environment_variable("CONSOLE_LOG_LEVEL")
                .with_default_level(LevelFilter::DEBUG)
                .build(),
        );

        assert_eq!(settings, ConsoleLogSettings::Enabled {
            common_settings: Settings {
                environment_variable: "CONSOLE_LOG_LEVEL",
                default_level: LevelFilter::DEBUG,
            },
        });
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn toggles_with_flag(#[case] enabled: bool) {
        let settings = ConsoleLogSettings::from(("CONSOLE_LOG_LEVEL", LevelFilter::INFO, enabled));
        assert_eq!(settings.is_enabled(), enabled);
    }

    #[test]
    fn none_is_disabled() {
        assert!(ConsoleLogSettings::from(None::<Settings>).is_disabled());
    }
}
