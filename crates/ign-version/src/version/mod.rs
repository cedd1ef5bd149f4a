use std::{cmp::Ordering, fmt::Display, num::ParseIntError, str::FromStr, sync::LazyLock};

use regex::Regex;
use snafu::{OptionExt, ResultExt, Snafu};

#[cfg(feature = "serde")]
mod serde;

static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)$")
        .expect("failed to compile spec version regex")
});

/// Error variants which can be encountered when creating a new [`SpecVersion`]
/// from unparsed input.
#[derive(Debug, PartialEq, Snafu)]
pub enum ParseVersionError {
    #[snafu(display("invalid spec version format, expected <MAJOR>.<MINOR>.0 but got {input:?}"))]
    InvalidFormat { input: String },

    #[snafu(display("failed to parse major version"))]
    ParseMajorVersion { source: ParseIntError },

    #[snafu(display("failed to parse minor version"))]
    ParseMinorVersion { source: ParseIntError },

    #[snafu(display("spec versions carry no patch level, got {patch}"))]
    NonZeroPatch { patch: String },
}

/// An Ignition config spec version, following the `<MAJOR>.<MINOR>.0` format.
///
/// Versions are ordered by major version first and minor version second. The
/// set of versions this workspace can parse and translate is listed in
/// [`SpecVersion::SUPPORTED`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SpecVersion {
    pub major: u64,
    pub minor: u64,
}

impl SpecVersion {
    pub const V2_2: Self = Self::new(2, 2);
    pub const V2_3: Self = Self::new(2, 3);
    pub const V2_4: Self = Self::new(2, 4);
    pub const V3_0: Self = Self::new(3, 0);
    pub const V3_1: Self = Self::new(3, 1);
    pub const V3_2: Self = Self::new(3, 2);
    pub const V3_3: Self = Self::new(3, 3);
    pub const V3_4: Self = Self::new(3, 4);

    /// All spec versions with a known document shape, oldest first.
    pub const SUPPORTED: [Self; 8] = [
        Self::V2_2,
        Self::V2_3,
        Self::V2_4,
        Self::V3_0,
        Self::V3_1,
        Self::V3_2,
        Self::V3_3,
        Self::V3_4,
    ];

    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// Returns `true` if this version is one of [`SpecVersion::SUPPORTED`].
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }
}

impl FromStr for SpecVersion {
    type Err = ParseVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let captures = VERSION_REGEX
            .captures(input)
            .context(InvalidFormatSnafu { input })?;

        let major = captures
            .name("major")
            .expect("internal error: check that the correct match label is specified")
            .as_str()
            .parse::<u64>()
            .context(ParseMajorVersionSnafu)?;

        let minor = captures
            .name("minor")
            .expect("internal error: check that the correct match label is specified")
            .as_str()
            .parse::<u64>()
            .context(ParseMinorVersionSnafu)?;

        let patch = captures
            .name("patch")
            .expect("internal error: check that the correct match label is specified")
            .as_str();

        if patch != "0" {
            return NonZeroPatchSnafu { patch }.fail();
        }

        Ok(Self { major, minor })
    }
}

impl PartialOrd for SpecVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SpecVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }

        self.minor.cmp(&other.minor)
    }
}

impl Display for SpecVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{major}.{minor}.0", major = self.major, minor = self.minor)
    }
}
