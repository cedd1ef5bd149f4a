//! Features which cannot be expressed in an older spec version.
//!
//! Translators call [`ensure_unused`] for every feature the destination
//! version lacks before mapping a single field.
use ign_version::SpecVersion;
use snafu::{Snafu, ensure};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Feature {
    #[strum(to_string = "Networkd section")]
    Networkd,

    #[strum(to_string = "Append with more than one entry in Storage.Files")]
    MultipleAppends,

    #[strum(to_string = "Contents together with Append in Storage.Files")]
    ContentsWithAppend,

    #[strum(to_string = "Filesystem without Format in Storage.Filesystems")]
    FilesystemWithoutFormat,

    #[strum(to_string = "ShouldExist in Storage.Disks.Partitions")]
    PartitionShouldExist,

    #[strum(to_string = "WipePartitionEntry in Storage.Disks.Partitions")]
    PartitionWipeEntry,

    #[strum(to_string = "SizeMiB or StartMiB beyond the sector range of Storage.Disks.Partitions")]
    PartitionSizeOutOfRange,

    #[strum(to_string = "MountOptions in Storage.Filesystems")]
    MountOptions,

    #[strum(to_string = "Compression in Ignition.Config and Ignition.Security")]
    ConfigCompression,

    #[strum(to_string = "LUKS")]
    Luks,

    #[strum(to_string = "Resize in Storage.Disks.Partitions")]
    PartitionResize,

    #[strum(to_string = "ShouldExist in Passwd.Users")]
    UserShouldExist,

    #[strum(to_string = "ShouldExist in Passwd.Groups")]
    GroupShouldExist,

    #[strum(to_string = "KernelArguments")]
    KernelArguments,

    #[strum(to_string = "Raid without Level in Storage.Raid")]
    RaidWithoutLevel,

    #[strum(to_string = "Link without Target in Storage.Links")]
    LinkWithoutTarget,

    #[strum(to_string = "Format none in Storage.Filesystems")]
    NoneFormat,

    #[strum(to_string = "tang offline provisioning")]
    TangOfflineProvisioning,

    #[strum(to_string = "luks discard")]
    LuksDiscard,

    #[strum(to_string = "luks openOptions")]
    LuksOpenOptions,

    #[strum(to_string = "Mode with setuid/setgid/sticky bits")]
    SpecialModeBits,

    #[strum(to_string = "arn: scheme for s3")]
    ArnSource,
}

#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display("{feature} is not supported on spec {version}"))]
pub struct UnsupportedFeature {
    pub feature: Feature,
    pub version: SpecVersion,
}

/// Fails with [`UnsupportedFeature`] when `used` is true.
pub fn ensure_unused(
    used: bool,
    feature: Feature,
    version: SpecVersion,
) -> Result<(), UnsupportedFeature> {
    ensure!(!used, UnsupportedFeatureSnafu { feature, version });
    Ok(())
}

/// Returns true if `mode` carries setuid, setgid or sticky bits.
pub fn has_special_bits(mode: Option<u32>) -> bool {
    mode.is_some_and(|mode| mode & 0o7000 != 0)
}

/// Returns true if `source` addresses an S3 object through an ARN.
pub fn is_arn(source: Option<&str>) -> bool {
    source.is_some_and(|source| source.starts_with("arn:"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Feature::Luks, SpecVersion::V3_1, "LUKS is not supported on spec 3.1.0")]
    #[case(
        Feature::PartitionResize,
        SpecVersion::V3_1,
        "Resize in Storage.Disks.Partitions is not supported on spec 3.1.0"
    )]
    #[case(
        Feature::TangOfflineProvisioning,
        SpecVersion::V3_3,
        "tang offline provisioning is not supported on spec 3.3.0"
    )]
    #[case(
        Feature::PartitionSizeOutOfRange,
        SpecVersion::V2_2,
        "SizeMiB or StartMiB beyond the sector range of Storage.Disks.Partitions is not supported on spec 2.2.0"
    )]
    #[case(Feature::Networkd, SpecVersion::V3_0, "Networkd section is not supported on spec 3.0.0")]
    fn display(#[case] feature: Feature, #[case] version: SpecVersion, #[case] expected: &str) {
        let err = ensure_unused(true, feature, version).expect_err("feature is used");
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn unused_features_pass() {
        ensure_unused(false, Feature::Luks, SpecVersion::V3_1).expect("feature is not used");
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(0o644), false)]
    #[case(Some(0o4755), true)]
    #[case(Some(0o1777), true)]
    fn special_bits(#[case] mode: Option<u32>, #[case] expected: bool) {
        assert_eq!(has_special_bits(mode), expected);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("s3://bucket/key"), false)]
    #[case(Some("arn:aws:s3:::bucket/key"), true)]
    fn arn_sources(#[case] source: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_arn(source), expected);
    }
}
