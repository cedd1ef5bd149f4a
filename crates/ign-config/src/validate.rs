//! Structural validation shared by every spec version.
//!
//! Each config type implements [`Validate`] and reports problems into a
//! [`Validator`]. Rules which differ between spec versions consult
//! [`Validator::version`] instead of being duplicated per version module.
use std::{collections::BTreeSet, path::Path, sync::LazyLock};

use ign_version::SpecVersion;
use regex::Regex;
use url::Url;

use crate::report::{JsonPath, Kind, Report};

static HASH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<function>[a-z0-9]+)-(?P<sum>[0-9a-f]+)$")
        .expect("failed to compile hash regex")
});

const FILESYSTEM_FORMATS: &[&str] = &["btrfs", "ext4", "swap", "vfat", "xfs"];
const RAID_LEVELS: &[&str] = &[
    "linear", "raid0", "raid1", "raid4", "raid5", "raid6", "raid10",
];
const UNIT_SUFFIXES: &[&str] = &[
    ".automount",
    ".device",
    ".mount",
    ".path",
    ".scope",
    ".service",
    ".slice",
    ".snapshot",
    ".socket",
    ".swap",
    ".target",
    ".timer",
];
const NETWORKD_SUFFIXES: &[&str] = &[".link", ".netdev", ".network"];

/// Implemented by every config type which can be structurally validated.
pub trait Validate {
    fn validate(&self, validator: &mut Validator, path: &JsonPath);
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, validator: &mut Validator, path: &JsonPath) {
        for (index, item) in self.iter().enumerate() {
            item.validate(validator, &path.index(index));
        }
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, validator: &mut Validator, path: &JsonPath) {
        if let Some(inner) = self {
            inner.validate(validator, path);
        }
    }
}

/// Collects the [`Report`] for a config of one spec version.
#[derive(Debug)]
pub struct Validator {
    version: SpecVersion,
    report: Report,
}

impl Validator {
    pub fn new(version: SpecVersion) -> Self {
        Self {
            version,
            report: Report::default(),
        }
    }

    /// The spec version the config is validated against.
    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn error(&mut self, path: &JsonPath, message: impl Into<String>) {
        self.report.push(Kind::Error, path.clone(), message);
    }

    pub fn warning(&mut self, path: &JsonPath, message: impl Into<String>) {
        self.report.push(Kind::Warning, path.clone(), message);
    }

    pub fn deprecated<T>(&mut self, path: &JsonPath, field: &Option<T>) {
        if field.is_some() {
            self.report
                .push(Kind::Deprecated, path.clone(), "field is deprecated");
        }
    }

    pub fn check_version(&mut self, path: &JsonPath, declared: &str) {
        if declared != self.version.to_string() {
            self.error(
                path,
                format!("invalid config version, expected {}", self.version),
            );
        }
    }

    pub fn check_required(&mut self, path: &JsonPath, value: &str) {
        if value.is_empty() {
            self.error(path, "field is required");
        }
    }

    pub fn check_absolute(&mut self, path: &JsonPath, value: &str) {
        if !Path::new(value).is_absolute() {
            self.error(path, "path not absolute");
        }
    }

    /// Validates a remote source. An empty source is accepted, it stands for
    /// empty contents.
    pub fn check_source(&mut self, path: &JsonPath, source: Option<&str>) {
        let Some(source) = source.filter(|source| !source.is_empty()) else {
            return;
        };

        let Ok(url) = Url::parse(source) else {
            self.error(path, "invalid url");
            return;
        };

        let supported = match url.scheme() {
            "http" | "https" | "tftp" | "s3" | "gs" | "data" => true,
            "oem" => self.version.major == 2,
            "arn" => self.version >= SpecVersion::V3_4,
            _ => false,
        };
        if !supported {
            self.error(path, format!("unsupported url scheme {:?}", url.scheme()));
        }
    }

    pub fn check_hash(&mut self, path: &JsonPath, hash: Option<&str>) {
        let Some(hash) = hash else {
            return;
        };

        let Some(captures) = HASH_REGEX.captures(hash) else {
            self.error(path, "malformed hash specifier");
            return;
        };

        let expected_length = match &captures["function"] {
            "sha512" => 128,
            "sha256" => 64,
            _ => {
                self.error(path, "unrecognized hash function");
                return;
            }
        };
        if captures["sum"].len() != expected_length {
            self.error(path, "incorrect size for hash sum");
        }
    }

    pub fn check_compression(&mut self, path: &JsonPath, compression: Option<&str>) {
        match compression {
            None | Some("" | "gzip") => {}
            Some(_) => self.error(path, "invalid compression method"),
        }
    }

    pub fn check_mode(&mut self, path: &JsonPath, mode: Option<u32>) {
        let Some(mode) = mode else {
            return;
        };

        if mode > 0o7777 {
            self.error(path, "illegal file mode");
        } else if mode & 0o7000 != 0 && self.version < SpecVersion::V3_4 {
            self.warning(path, "setuid/setgid/sticky bits are not supported");
        }
    }

    pub fn check_filesystem_format(&mut self, path: &JsonPath, format: Option<&str>) {
        let Some(format) = format else {
            return;
        };

        let none_allowed = self.version >= SpecVersion::V3_3;
        if !(FILESYSTEM_FORMATS.contains(&format) || (none_allowed && format == "none")) {
            self.error(path, "invalid filesystem format");
        }
    }

    pub fn check_raid_level(&mut self, path: &JsonPath, level: Option<&str>) {
        match level {
            Some(level) if RAID_LEVELS.contains(&level) => {}
            Some(_) => self.error(path, "invalid raid level"),
            None if self.version >= SpecVersion::V3_3 => {}
            None => self.error(path, "field is required"),
        }
    }

    pub fn check_unit_name(&mut self, path: &JsonPath, name: &str) {
        if !UNIT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            self.error(path, "invalid systemd unit extension");
        }
    }

    pub fn check_networkd_unit_name(&mut self, path: &JsonPath, name: &str) {
        if !NETWORKD_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            self.error(path, "invalid networkd unit extension");
        }
    }

    pub fn check_dropin_name(&mut self, path: &JsonPath, name: &str) {
        if !name.ends_with(".conf") {
            self.error(path, "invalid systemd unit drop-in extension");
        }
    }

    /// Reports every key which occurs more than once in `keys`. The entry
    /// points at the second occurrence.
    pub fn check_unique<'a>(
        &mut self,
        path: &JsonPath,
        field: &'static str,
        keys: impl IntoIterator<Item = &'a str>,
    ) {
        let mut seen = BTreeSet::new();
        for (index, key) in keys.into_iter().enumerate() {
            if !seen.insert(key) {
                self.error(
                    &path.index(index).key(field),
                    format!("duplicate entry defined for {key:?}"),
                );
            }
        }
    }

    /// Like [`Validator::check_unique`], but for keys spread over several
    /// lists, each key comes with the path it was found at.
    pub fn check_unique_paths<'a>(&mut self, entries: impl IntoIterator<Item = (JsonPath, &'a str)>) {
        let mut seen = BTreeSet::new();
        for (path, key) in entries {
            if !seen.insert(key) {
                self.error(&path, format!("duplicate entry defined for {key:?}"));
            }
        }
    }

    pub fn check_node_owner(&mut self, path: &JsonPath, id: Option<i64>, name: Option<&str>) {
        if id.is_some() && name.is_some_and(|name| !name.is_empty()) {
            self.error(path, "cannot set both id and name");
        }
    }
}
