//! Typed Ignition configs for every supported spec version, together with a
//! JSON parser and a structural validator.
//!
//! Each spec version lives in its own module (for example [`v3_1`]). Types
//! which did not change between two adjacent minor versions are re-exported
//! from the older module, so moving such a value from one version to the next
//! needs no conversion at all.
//!
//! Every optional scalar is modelled as an [`Option`], an explicit `false`,
//! `0` or `""` is therefore never confused with an unset field.
//!
//! ```
//! use ign_config::v3_1;
//!
//! let (config, report) = v3_1::parse(br#"{"ignition": {"version": "3.1.0"}}"#)
//!     .expect("minimal config is valid");
//! assert!(report.is_empty());
//! assert_eq!(config.ignition.version, "3.1.0");
//! ```
use ign_version::{ParseVersionError, SpecVersion};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

pub mod report;
pub mod validate;

pub mod v2_2;
pub mod v2_3;
pub mod v2_4;
pub mod v3_0;
pub mod v3_1;
pub mod v3_2;
pub mod v3_3;
pub mod v3_4;

pub use report::{JsonPath, Kind, Report};
pub use validate::{Validate, Validator};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to deserialize config"))]
    Deserialize { source: serde_json::Error },

    #[snafu(display("config does not declare ignition.version"))]
    MissingVersion,

    #[snafu(display("config declares an invalid ignition.version"))]
    InvalidVersion { source: ParseVersionError },

    #[snafu(display("spec version {version} is not supported"))]
    UnsupportedVersion { version: SpecVersion },

    #[snafu(display("expected a spec {expected} config but got spec {declared}"))]
    VersionMismatch {
        declared: SpecVersion,
        expected: SpecVersion,
    },

    #[snafu(display("invalid config:\n{report}"))]
    InvalidConfig { report: Report },
}

/// A config type bound to exactly one spec version.
pub trait VersionedConfig: Serialize + DeserializeOwned + Validate {
    const VERSION: SpecVersion;
}

/// Validates `config` against the rules of its spec version.
pub fn validate<C: VersionedConfig>(config: &C) -> Report {
    let mut validator = Validator::new(C::VERSION);
    config.validate(&mut validator, &JsonPath::root());
    validator.into_report()
}

/// Reads `ignition.version` from a raw config without parsing the rest of it.
pub fn detect_version(raw: &[u8]) -> Result<SpecVersion> {
    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        ignition: IgnitionProbe,
    }

    #[derive(Default, Deserialize)]
    struct IgnitionProbe {
        version: Option<String>,
    }

    let probe: Probe = serde_json::from_slice(raw).context(DeserializeSnafu)?;
    let version = probe
        .ignition
        .version
        .filter(|version| !version.is_empty())
        .context(MissingVersionSnafu)?;
    let version: SpecVersion = version.parse().context(InvalidVersionSnafu)?;

    ensure!(version.is_supported(), UnsupportedVersionSnafu { version });
    Ok(version)
}

/// Parses and validates a raw config of spec version `C::VERSION`.
///
/// Fatal reports are returned as [`Error::InvalidConfig`]. Otherwise the
/// report is handed back next to the config, it may still contain warnings
/// and deprecations.
pub fn parse<C: VersionedConfig>(raw: &[u8]) -> Result<(C, Report)> {
    let declared = detect_version(raw)?;
    ensure!(
        declared == C::VERSION,
        VersionMismatchSnafu {
            declared,
            expected: C::VERSION
        }
    );

    let config: C = serde_json::from_slice(raw).context(DeserializeSnafu)?;
    let report = validate(&config);
    ensure!(!report.is_fatal(), InvalidConfigSnafu { report });

    Ok((config, report))
}

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(br#"{"ignition": {"version": "2.2.0"}}"#, SpecVersion::V2_2)]
    #[case(br#"{"ignition": {"version": "3.4.0"}, "storage": {}}"#, SpecVersion::V3_4)]
    fn detects_version(#[case] raw: &[u8], #[case] expected: SpecVersion) {
        assert_eq!(detect_version(raw).expect("version is detectable"), expected);
    }

    #[rstest]
    #[case(b"{}")]
    #[case(br#"{"ignition": {}}"#)]
    #[case(br#"{"ignition": {"version": ""}}"#)]
    fn missing_version(#[case] raw: &[u8]) {
        let err = detect_version(raw).expect_err("version is missing");
        assert!(matches!(err, Error::MissingVersion), "{err:?}");
    }

    #[test]
    fn unsupported_version() {
        let err = detect_version(br#"{"ignition": {"version": "3.5.0"}}"#)
            .expect_err("3.5.0 is unknown");
        assert!(matches!(err, Error::UnsupportedVersion { .. }), "{err:?}");
    }

    #[test]
    fn malformed_json() {
        let err = detect_version(b"{").expect_err("truncated json");
        assert!(matches!(err, Error::Deserialize { .. }), "{err:?}");
    }

    #[test]
    fn version_mismatch() {
        let err = v3_1::parse(br#"{"ignition": {"version": "3.0.0"}}"#)
            .expect_err("3.0.0 is not 3.1.0");
        assert_eq!(
            err.to_string(),
            "expected a spec 3.1.0 config but got spec 3.0.0"
        );
    }

    #[test]
    fn fatal_report() {
        let err = v3_3::parse(
            br#"{
                "ignition": {"version": "3.3.0"},
                "storage": {"filesystems": [{"device": "/dev/foo", "format": "util.None"}]}
            }"#,
        )
        .expect_err("format is invalid");
        assert_eq!(
            err.to_string(),
            "invalid config:\nerror at $.storage.filesystems.0.format: invalid filesystem format\n"
        );
    }
}
