//! A config of any supported spec version.
use ign_config::{Report, v2_2, v2_3, v2_4, v3_0, v3_1, v3_2, v3_3, v3_4};
use ign_version::SpecVersion;
use snafu::{ResultExt, Snafu};
use tracing::{instrument, warn};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse config"))]
    ParseDocument { source: ign_config::Error },

    #[snafu(display("failed to encode spec {version} config"))]
    EncodeDocument {
        source: serde_json::Error,
        version: SpecVersion,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Document {
    V2_2(v2_2::Config),
    V2_3(v2_3::Config),
    V2_4(v2_4::Config),
    V3_0(v3_0::Config),
    V3_1(v3_1::Config),
    V3_2(v3_2::Config),
    V3_3(v3_3::Config),
    V3_4(v3_4::Config),
}

impl Document {
    /// Detects the declared version of `raw` and parses it as such.
    ///
    /// Non-fatal report entries are logged and returned next to the document.
    #[instrument(skip_all)]
    pub fn parse(raw: &[u8]) -> Result<(Self, Report)> {
        let version = ign_config::detect_version(raw).context(ParseDocumentSnafu)?;

        let (document, report) = match version {
            SpecVersion::V2_2 => v2_2::parse(raw).map(|(c, r)| (Self::V2_2(c), r)),
            SpecVersion::V2_3 => v2_3::parse(raw).map(|(c, r)| (Self::V2_3(c), r)),
            SpecVersion::V2_4 => v2_4::parse(raw).map(|(c, r)| (Self::V2_4(c), r)),
            SpecVersion::V3_0 => v3_0::parse(raw).map(|(c, r)| (Self::V3_0(c), r)),
            SpecVersion::V3_1 => v3_1::parse(raw).map(|(c, r)| (Self::V3_1(c), r)),
            SpecVersion::V3_2 => v3_2::parse(raw).map(|(c, r)| (Self::V3_2(c), r)),
            SpecVersion::V3_3 => v3_3::parse(raw).map(|(c, r)| (Self::V3_3(c), r)),
            SpecVersion::V3_4 => v3_4::parse(raw).map(|(c, r)| (Self::V3_4(c), r)),
            version => Err(ign_config::Error::UnsupportedVersion { version }),
        }
        .context(ParseDocumentSnafu)?;

        for entry in report.entries() {
            warn!(%version, "{entry}");
        }
        Ok((document, report))
    }

    pub fn version(&self) -> SpecVersion {
        match self {
            Self::V2_2(_) => SpecVersion::V2_2,
            Self::V2_3(_) => SpecVersion::V2_3,
            Self::V2_4(_) => SpecVersion::V2_4,
            Self::V3_0(_) => SpecVersion::V3_0,
            Self::V3_1(_) => SpecVersion::V3_1,
            Self::V3_2(_) => SpecVersion::V3_2,
            Self::V3_3(_) => SpecVersion::V3_3,
            Self::V3_4(_) => SpecVersion::V3_4,
        }
    }

    /// Encodes the document as pretty printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        match self {
            Self::V2_2(config) => serde_json::to_vec_pretty(config),
            Self::V2_3(config) => serde_json::to_vec_pretty(config),
            Self::V2_4(config) => serde_json::to_vec_pretty(config),
            Self::V3_0(config) => serde_json::to_vec_pretty(config),
            Self::V3_1(config) => serde_json::to_vec_pretty(config),
            Self::V3_2(config) => serde_json::to_vec_pretty(config),
            Self::V3_3(config) => serde_json::to_vec_pretty(config),
            Self::V3_4(config) => serde_json::to_vec_pretty(config),
        }
        .context(EncodeDocumentSnafu {
            version: self.version(),
        })
    }
}

/// Wraps a config into its variant and unwraps it again, handing the
/// document back if it holds another version.
macro_rules! document_variant {
    ($($variant:ident => $module:ident),* $(,)?) => {
        $(
            impl From<$module::Config> for Document {
                fn from(config: $module::Config) -> Self {
                    Self::$variant(config)
                }
            }

            impl TryFrom<Document> for $module::Config {
                type Error = Document;

                fn try_from(document: Document) -> Result<Self, Self::Error> {
                    match document {
                        Document::$variant(config) => Ok(config),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

document_variant! {
    V2_2 => v2_2,
    V2_3 => v2_3,
    V2_4 => v2_4,
    V3_0 => v3_0,
    V3_1 => v3_1,
    V3_2 => v3_2,
    V3_3 => v3_3,
    V3_4 => v3_4,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(br#"{"ignition": {"version": "2.2.0"}}"#, SpecVersion::V2_2)]
    #[case(br#"{"ignition": {"version": "2.4.0"}}"#, SpecVersion::V2_4)]
    #[case(br#"{"ignition": {"version": "3.0.0"}}"#, SpecVersion::V3_0)]
    #[case(br#"{"ignition": {"version": "3.4.0"}}"#, SpecVersion::V3_4)]
    fn parse_detects_version(#[case] raw: &[u8], #[case] expected: SpecVersion) {
        let (document, report) = Document::parse(raw).expect("config is valid");

        assert_eq!(document.version(), expected);
        assert!(report.is_empty());
    }

    #[rstest]
    #[case::missing_version(br#"{"ignition": {}}"#)]
    #[case::unknown_version(br#"{"ignition": {"version": "3.9.0"}}"#)]
    #[case::malformed(b"{")]
    fn parse_rejects(#[case] raw: &[u8]) {
        let err = Document::parse(raw).expect_err("config is unusable");
        assert!(matches!(err, Error::ParseDocument { .. }));
    }

    #[test]
    fn parse_keeps_warnings() {
        let (document, report) = Document::parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.0.0"},
                  "storage": {"files": [{"path": "/usr/local/bin/tool", "mode": 2541}]}
                }
            "#}
            .as_bytes(),
        )
        .expect("warnings are not fatal");

        assert_eq!(document.version(), SpecVersion::V3_0);
        assert!(!report.is_empty());
        assert!(!report.is_fatal());
    }

    #[test]
    fn variants_convert_back_and_forth() {
        let document = Document::from(v3_1::Config::default());
        assert_eq!(document.version(), SpecVersion::V3_1);

        let document = v3_0::Config::try_from(document).expect_err("document holds 3.1");
        let config = v3_1::Config::try_from(document).expect("document holds 3.1");
        assert_eq!(config, v3_1::Config::default());
    }

    #[test]
    fn to_json_skips_unset_fields() {
        let document = Document::from(v3_3::Config {
            ignition: v3_3::Ignition {
                version: "3.3.0".to_owned(),
                ..Default::default()
            },
            ..Default::default()
        });

        let json: serde_json::Value =
            serde_json::from_slice(&document.to_json().expect("config encodes"))
                .expect("output is JSON");
        assert_eq!(json, serde_json::json!({"ignition": {"version": "3.3.0"}}));
    }
}
