//! Subscriber setup for console and rolling file logs.
//!
//! The entry point is [`Tracing`], usually created through
//! [`Tracing::pre_configured`] from the flattened [`TelemetryOptions`].

use std::path::PathBuf;

use snafu::{ResultExt as _, Snafu};
use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError};
use tracing_appender::rolling::{InitError, RollingFileAppender};
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::Directive, layer::SubscriberExt};

use crate::tracing::settings::*;

pub mod settings;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to initialize rolling file appender"))]
    InitRollingFileAppender { source: InitError },

    #[snafu(display("unable to set the global default subscriber"))]
    SetGlobalDefaultSubscriber { source: SetGlobalDefaultError },
}

/// A set of log subscribers, installed globally by [`Tracing::init`].
///
/// The value returned by `init` must be kept alive for as long as logs should
/// be written. Bind it to a named variable, `let _ = ...` drops it right away.
///
/// ```
/// use ign_telemetry::tracing::{Error, TelemetryOptions, Tracing};
///
/// fn main() -> Result<(), Error> {
///     let _tracing = Tracing::pre_configured("ign-converter", TelemetryOptions::default())
///         .init()?;
///
///     tracing::info!("translating");
///     Ok(())
/// }
/// ```
///
/// Both subscribers can also be set up by hand:
///
/// ```
/// use ign_telemetry::tracing::{Tracing, settings::Settings};
/// use tracing_subscriber::filter::LevelFilter;
///
/// let tracing = Tracing::new("ign-converter")
///     .with_console_output(("CONSOLE_LOG_LEVEL", LevelFilter::WARN))
///     .with_file_output(
///         Settings::builder()
///             .with_environment_variable("FILE_LOG_LEVEL")
///             .with_default_level(LevelFilter::DEBUG)
///             .file_log_settings_builder("/tmp/logs", Tracing::FILE_LOG_SUFFIX)
///             .build(),
///     );
/// ```
///
/// Console logs always go to stderr. Their level is read from
/// `CONSOLE_LOG_LEVEL`, the level of file logs from `FILE_LOG_LEVEL`. Both
/// accept [`EnvFilter`] directives.
pub struct Tracing {
    service_name: &'static str,
    console_log_settings: ConsoleLogSettings,
    file_log_settings: FileLogSettings,
}

impl Tracing {
    pub const CONSOLE_LOG_LEVEL: &str = "CONSOLE_LOG_LEVEL";
    pub const FILE_LOG_LEVEL: &str = "FILE_LOG_LEVEL";
    /// Appended to the service name to form the log file name.
    pub const FILE_LOG_SUFFIX: &str = "tracing-rs.json";

    /// Both subscribers start out disabled.
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            console_log_settings: ConsoleLogSettings::Disabled,
            file_log_settings: FileLogSettings::Disabled,
        }
    }

    /// Console logs at INFO unless disabled, file logs at INFO when a
    /// directory is given. Log files are never rotated unless a period is
    /// set.
    pub fn pre_configured(service_name: &'static str, options: TelemetryOptions) -> Self {
        let TelemetryOptions {
            console_log_disabled,
            file_log_directory,
            file_log_rotation_period,
            file_log_max_files,
        } = options;

        Self::new(service_name)
            .with_console_output((
                Self::CONSOLE_LOG_LEVEL,
                LevelFilter::INFO,
                !console_log_disabled,
            ))
            .with_file_output(file_log_directory.map(|directory| {
                Settings::builder()
                    .with_environment_variable(Self::FILE_LOG_LEVEL)
                    .with_default_level(LevelFilter::INFO)
                    .file_log_settings_builder(directory, Self::FILE_LOG_SUFFIX)
                    .with_rotation_period(file_log_rotation_period.unwrap_or_default())
                    .with_max_files(file_log_max_files)
                    .build()
            }))
    }

    pub fn with_console_output(mut self, settings: impl Into<ConsoleLogSettings>) -> Self {
        self.console_log_settings = settings.into();
        self
    }

    pub fn with_file_output(mut self, settings: impl Into<FileLogSettings>) -> Self {
        self.file_log_settings = settings.into();
        self
    }

    /// Installs the enabled subscribers as the global default. Nothing is
    /// installed when both are disabled.
    pub fn init(self) -> Result<Self> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

        if let ConsoleLogSettings::Enabled { common_settings } = &self.console_log_settings {
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter(
                        common_settings.environment_variable,
                        common_settings.default_level,
                    ))
                    .boxed(),
            );
        }

        if let FileLogSettings::Enabled {
            common_settings,
            file_log_dir,
            rotation_period,
            filename_suffix,
            max_log_files,
        } = &self.file_log_settings
        {
            let mut appender = RollingFileAppender::builder()
                .rotation(rotation_period.clone())
                .filename_prefix(self.service_name)
                .filename_suffix(filename_suffix);
            if let Some(max_log_files) = max_log_files {
                appender = appender.max_log_files(*max_log_files);
            }
            let appender = appender
                .build(file_log_dir)
                .context(InitRollingFileAppenderSnafu)?;

            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(appender)
                    .with_filter(env_filter(
                        common_settings.environment_variable,
                        common_settings.default_level,
                    ))
                    .boxed(),
            );
        }

        if !layers.is_empty() {
            tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers))
                .context(SetGlobalDefaultSubscriberSnafu)?;
        }

        Ok(self)
    }
}

impl Drop for Tracing {
    fn drop(&mut self) {
        tracing::debug!(
            console_log.enabled = self.console_log_settings.is_enabled(),
            file_log.enabled = self.file_log_settings.is_enabled(),
            "shutting down tracing subscribers"
        );
    }
}

fn env_filter(env_var: &str, default_directive: impl Into<Directive>) -> EnvFilter {
    EnvFilter::builder()
        .with_env_var(env_var)
        .with_default_directive(default_directive.into())
        .from_env_lossy()
}

/// Logging flags of a binary, see [`Tracing::pre_configured`].
///
/// With the `clap` feature this can be flattened into a clap parser.
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TelemetryOptions {
    /// Disable console logs.
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub console_log_disabled: bool,

    /// Also write JSON logs to files in DIRECTORY.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "DIRECTORY", group = "file_log")
    )]
    pub file_log_directory: Option<PathBuf>,

    /// Start a new log file every PERIOD.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "PERIOD", requires = "file_log")
    )]
    pub file_log_rotation_period: Option<RotationPeriod>,

    /// Delete the oldest log files beyond this count.
    #[cfg_attr(feature = "clap", arg(long, env, requires = "file_log"))]
    pub file_log_max_files: Option<usize>,
}

#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    Daily,
    #[default]
    Never,
}

impl From<RotationPeriod> for Rotation {
    fn from(value: RotationPeriod) -> Self {
        match value {
            RotationPeriod::Minutely => Self::MINUTELY,
            RotationPeriod::Hourly => Self::HOURLY,
            RotationPeriod::Daily => Self::DAILY,
            RotationPeriod::Never => Self::NEVER,
        }
    }
}
