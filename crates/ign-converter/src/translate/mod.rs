//! Pairwise translators between spec versions.
//!
//! Every translator consumes a config of one version and returns a freshly
//! built config of another. Translators to an older version first make sure
//! the input only uses features the destination can express.
use ign_config::{Report, VersionedConfig};
use snafu::{Snafu, ensure};

use crate::{fsmap::FsMap, gate, inode};

pub mod spec2;
pub mod spec2_to_spec3;
pub mod spec3;
pub mod spec3_to_spec2;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid input config:\n{report}"))]
    InvalidConfig { report: Report },

    #[snafu(transparent)]
    Inode { source: inode::Error },

    #[snafu(transparent)]
    UnsupportedFeature { source: gate::UnsupportedFeature },
}

/// Inputs shared by every translator.
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Mount paths of the 2.x filesystems, only used when upgrading to 3.x.
    pub fs_map: FsMap,
}

impl Context {
    pub fn new(fs_map: FsMap) -> Self {
        Self { fs_map }
    }
}

/// Rejects configs with fatal validation entries, and also deprecated ones
/// when `reject_deprecated` is set.
pub(crate) fn ensure_valid<C: VersionedConfig>(config: &C, reject_deprecated: bool) -> Result<()> {
    let report = ign_config::validate(config);
    ensure!(
        !report.is_fatal() && !(reject_deprecated && report.is_deprecated()),
        InvalidConfigSnafu { report }
    );
    Ok(())
}

/// Stamps the literal version string of `C` into a config.
pub(crate) fn version_of<C: VersionedConfig>() -> String {
    C::VERSION.to_string()
}
