//! Spec 2.3.0. Partitions are sized in MiB and gain existence assertions,
//! networkd units gain drop-ins.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v2_2::{
    CaReference, ConfigReference, Directory, Dropin, File, FileContents, Filesystem, Ignition,
    IgnitionConfig, Link, Mount, MountCreate, Node, NodeGroup, NodeUser, Passwd, PasswdGroup,
    PasswdUser, Raid, Security, Systemd, Timeouts, Tls, Unit, UserCreate, Verification,
};
use crate::{JsonPath, Report, Validate, Validator, VersionedConfig, is_default};

pub fn parse(raw: &[u8]) -> Result<(Config, Report), crate::Error> {
    crate::parse(raw)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub ignition: Ignition,
    #[serde(skip_serializing_if = "is_default")]
    pub networkd: Networkd,
    #[serde(skip_serializing_if = "is_default")]
    pub passwd: Passwd,
    #[serde(skip_serializing_if = "is_default")]
    pub storage: Storage,
    #[serde(skip_serializing_if = "is_default")]
    pub systemd: Systemd,
}

impl VersionedConfig for Config {
    const VERSION: SpecVersion = SpecVersion::V2_3;
}

impl Validate for Config {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.ignition.validate(v, &path.key("ignition"));
        self.networkd.validate(v, &path.key("networkd"));
        self.passwd.validate(v, &path.key("passwd"));
        self.storage.validate(v, &path.key("storage"));
        self.systemd.validate(v, &path.key("systemd"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Networkd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<NetworkdUnit>,
}

impl Validate for Networkd {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.units.validate(v, &path.key("units"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkdUnit {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
}

impl Validate for NetworkdUnit {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_networkd_unit_name(&path.key("name"), &self.name);
        self.dropins.validate(v, &path.key("dropins"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Storage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Disk>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raid: Vec<Raid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<Filesystem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Validate for Storage {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.disks.validate(v, &path.key("disks"));
        self.raid.validate(v, &path.key("raid"));
        self.filesystems.validate(v, &path.key("filesystems"));
        self.files.validate(v, &path.key("files"));
        self.directories.validate(v, &path.key("directories"));
        self.links.validate(v, &path.key("links"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Disk {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_table: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,
}

impl Validate for Disk {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_absolute(&path.key("device"), &self.device);
        self.partitions.validate(v, &path.key("partitions"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Partition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub number: i64,
    #[serde(rename = "sizeMiB", skip_serializing_if = "Option::is_none")]
    pub size_mib: Option<i64>,
    #[serde(rename = "startMiB", skip_serializing_if = "Option::is_none")]
    pub start_mib: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_partition_entry: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
    /// Deprecated in favour of `sizeMiB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Deprecated in favour of `startMiB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
}

impl Validate for Partition {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        if self.label.as_ref().is_some_and(|label| label.len() > 36) {
            v.error(
                &path.key("label"),
                "partition labels may not exceed 36 characters",
            );
        }
        if self.size.is_some() && self.size_mib.is_some() {
            v.error(path, "size and sizeMiB are mutually exclusive");
        }
        if self.start.is_some() && self.start_mib.is_some() {
            v.error(path, "start and startMiB are mutually exclusive");
        }
        v.deprecated(&path.key("size"), &self.size);
        v.deprecated(&path.key("start"), &self.start);
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parse_mib_partitions() {
        let (config, report) = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "2.3.0"},
                  "storage": {
                    "disks": [{
                      "device": "/dev/sda",
                      "partitions": [{"number": 1, "sizeMiB": 5000, "startMiB": 2048, "shouldExist": false}]
                    }]
                  }
                }
            "#}
            .as_bytes(),
        )
        .expect("config is valid");

        assert!(report.is_empty(), "{report}");
        let partition = &config.storage.disks[0].partitions[0];
        assert_eq!(partition.size_mib, Some(5000));
        assert_eq!(partition.start_mib, Some(2048));
        assert_eq!(partition.should_exist, Some(false));
    }

    #[test]
    fn sector_sizes_are_deprecated() {
        let (_, report) = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "2.3.0"},
                  "storage": {"disks": [{"device": "/dev/sda", "partitions": [{"size": 1024}]}]}
                }
            "#}
            .as_bytes(),
        )
        .expect("deprecated fields are not fatal");

        assert!(report.is_deprecated());
        assert!(!report.is_fatal());
    }
}
