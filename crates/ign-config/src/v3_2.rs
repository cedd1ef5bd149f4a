//! Spec 3.2.0. Adds LUKS volumes, partition resizing and explicit existence
//! assertions for users and groups.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v3_1::{
    Directory, Dropin, File, Filesystem, HttpHeader, Ignition, IgnitionConfig, Link, Node,
    NodeGroup, NodeUser, Proxy, Raid, Resource, Security, Systemd, Timeouts, Tls, Unit,
    Verification,
};
use crate::{JsonPath, Report, Validate, Validator, VersionedConfig, is_default, v3_0};

pub fn parse(raw: &[u8]) -> Result<(Config, Report), crate::Error> {
    crate::parse(raw)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub ignition: Ignition,
    #[serde(skip_serializing_if = "is_default")]
    pub passwd: Passwd,
    #[serde(skip_serializing_if = "is_default")]
    pub storage: Storage,
    #[serde(skip_serializing_if = "is_default")]
    pub systemd: Systemd,
}

impl VersionedConfig for Config {
    const VERSION: SpecVersion = SpecVersion::V3_2;
}

impl Validate for Config {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.ignition.validate(v, &path.key("ignition"));
        self.passwd.validate(v, &path.key("passwd"));
        self.storage.validate(v, &path.key("storage"));
        self.systemd.validate(v, &path.key("systemd"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Passwd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<PasswdUser>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<PasswdGroup>,
}

impl Validate for Passwd {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.users.validate(v, &path.key("users"));
        self.groups.validate(v, &path.key("groups"));
        v.check_unique(
            &path.key("users"),
            "name",
            self.users.iter().map(|user| user.name.as_str()),
        );
        v.check_unique(
            &path.key("groups"),
            "name",
            self.groups.iter().map(|group| group.name.as_str()),
        );
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswdUser {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gecos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_create_home: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_group: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_user_group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_log_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<bool>,
}

impl Validate for PasswdUser {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("name"), &self.name);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswdGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<bool>,
}

impl Validate for PasswdGroup {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("name"), &self.name);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Storage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Disk>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<Filesystem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub luks: Vec<Luks>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raid: Vec<Raid>,
}

impl Validate for Storage {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.directories.validate(v, &path.key("directories"));
        self.disks.validate(v, &path.key("disks"));
        self.files.validate(v, &path.key("files"));
        self.filesystems.validate(v, &path.key("filesystems"));
        self.links.validate(v, &path.key("links"));
        self.luks.validate(v, &path.key("luks"));
        self.raid.validate(v, &path.key("raid"));
        v3_0::validate_node_paths(&self.files, &self.directories, &self.links, v, path);
        v.check_unique(
            &path.key("disks"),
            "device",
            self.disks.iter().map(|disk| disk.device.as_str()),
        );
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Disk {
    pub device: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_table: Option<bool>,
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
    pub guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
    #[serde(rename = "sizeMiB", skip_serializing_if = "Option::is_none")]
    pub size_mib: Option<i64>,
    #[serde(rename = "startMiB", skip_serializing_if = "Option::is_none")]
    pub start_mib: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_partition_entry: Option<bool>,
}

impl Validate for Partition {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        if self.label.as_ref().is_some_and(|label| label.len() > 36) {
            v.error(
                &path.key("label"),
                "partition labels may not exceed 36 characters",
            );
        }
    }
}

/// An encrypted volume.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Luks {
    #[serde(skip_serializing_if = "is_default")]
    pub clevis: Clevis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub key_file: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_volume: Option<bool>,
}

impl Validate for Luks {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        if let Some(device) = &self.device {
            v.check_absolute(&path.key("device"), device);
        }
        self.key_file.validate(v, &path.key("keyFile"));
        self.clevis.validate(v, &path.key("clevis"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Clevis {
    #[serde(skip_serializing_if = "is_default")]
    pub custom: Custom,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tang: Vec<Tang>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tpm2: Option<bool>,
}

impl Validate for Clevis {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.custom.validate(v, &path.key("custom"));
        self.tang.validate(v, &path.key("tang"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Custom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_network: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl Validate for Custom {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        match self.pin.as_deref() {
            None | Some("tpm2" | "tang" | "sss") => {}
            Some(_) => v.error(&path.key("pin"), "unsupported clevis pin"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tang {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    pub url: String,
}

impl Validate for Tang {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("url"), &self.url);
        v.check_source(&path.key("url"), Some(&self.url));
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parse_luks_and_existence_assertions() {
        let (config, report) = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.2.0"},
                  "passwd": {"users": [{"name": "core", "shouldExist": false}]},
                  "storage": {
                    "disks": [{"device": "/dev/sda", "partitions": [{"label": "root", "resize": true}]}],
                    "luks": [{
                      "name": "data",
                      "device": "/dev/sdb",
                      "clevis": {"tang": [{"url": "https://tang.example.com", "thumbprint": "z"}]}
                    }]
                  }
                }
            "#}
            .as_bytes(),
        )
        .expect("config is valid");

        assert!(report.is_empty(), "{report}");
        assert_eq!(config.passwd.users[0].should_exist, Some(false));
        assert_eq!(config.storage.disks[0].partitions[0].resize, Some(true));
        assert_eq!(config.storage.luks[0].clevis.tang[0].url, "https://tang.example.com");
    }

    #[test]
    fn unsupported_clevis_pin() {
        let err = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.2.0"},
                  "storage": {"luks": [{"name": "data", "clevis": {"custom": {"pin": "magic", "config": "{}"}}}]}
                }
            "#}
            .as_bytes(),
        )
        .expect_err("pin is unknown");

        assert_eq!(
            err.to_string(),
            "invalid config:\nerror at $.storage.luks.0.clevis.custom.pin: unsupported clevis pin\n"
        );
    }
}
