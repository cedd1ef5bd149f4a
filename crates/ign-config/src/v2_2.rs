//! Spec 2.2.0, the oldest supported spec. Storage entries are addressed by a
//! filesystem name plus a path relative to that filesystem.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

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
    const VERSION: SpecVersion = SpecVersion::V2_2;
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
pub struct Ignition {
    pub version: String,
    #[serde(skip_serializing_if = "is_default")]
    pub config: IgnitionConfig,
    #[serde(skip_serializing_if = "is_default")]
    pub security: Security,
    #[serde(skip_serializing_if = "is_default")]
    pub timeouts: Timeouts,
}

impl Validate for Ignition {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_version(&path.key("version"), &self.version);
        self.config.append.validate(v, &path.key("config").key("append"));
        self.config.replace.validate(v, &path.key("config").key("replace"));
        self.security
            .tls
            .certificate_authorities
            .validate(v, &path.key("security").key("tls").key("certificateAuthorities"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IgnitionConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<ConfigReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<ConfigReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigReference {
    pub source: String,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
}

impl Validate for ConfigReference {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("source"), &self.source);
        v.check_source(&path.key("source"), Some(&self.source));
        self.verification.validate(v, &path.key("verification"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Security {
    #[serde(skip_serializing_if = "is_default")]
    pub tls: Tls,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tls {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificate_authorities: Vec<CaReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaReference {
    pub source: String,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
}

impl Validate for CaReference {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("source"), &self.source);
        v.check_source(&path.key("source"), Some(&self.source));
        self.verification.validate(v, &path.key("verification"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Verification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Validate for Verification {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_hash(&path.key("hash"), self.hash.as_deref());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timeouts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_response_headers: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_total: Option<i64>,
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
}

impl Validate for NetworkdUnit {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_networkd_unit_name(&path.key("name"), &self.name);
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
    pub system: Option<bool>,
    /// Deprecated in favour of the fields on the user itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<UserCreate>,
}

impl Validate for PasswdUser {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("name"), &self.name);
        v.deprecated(&path.key("create"), &self.create);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserCreate {
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
    pub system: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_log_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
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
    /// Size in sectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Start in sectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
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

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Raid {
    pub name: String,
    pub level: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spares: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Validate for Raid {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("name"), &self.name);
        v.check_raid_level(&path.key("level"), Some(&self.level));
        for (index, device) in self.devices.iter().enumerate() {
            v.check_absolute(&path.key("devices").index(index), device);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filesystem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount: Option<Mount>,
    /// Path of an already mounted filesystem, mutually exclusive with
    /// `mount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Validate for Filesystem {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("name"), &self.name);
        match (&self.mount, &self.path) {
            (Some(_), Some(_)) => v.error(path, "filesystem must not define both mount and path"),
            (None, None) => v.error(path, "filesystem must define either mount or path"),
            (None, Some(fs_path)) => v.check_absolute(&path.key("path"), fs_path),
            (Some(mount), None) => mount.validate(v, &path.key("mount")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mount {
    pub device: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_filesystem: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Deprecated in favour of `wipeFilesystem` and `options`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<MountCreate>,
}

impl Validate for Mount {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_absolute(&path.key("device"), &self.device);
        v.check_filesystem_format(&path.key("format"), Some(&self.format));
        v.deprecated(&path.key("create"), &self.create);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MountCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// The location shared by files, directories and links.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub filesystem: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeGroup>,
}

impl Validate for Node {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("filesystem"), &self.filesystem);
        v.check_absolute(&path.key("path"), &self.path);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct File {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "is_default")]
    pub contents: FileContents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
}

impl Validate for File {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.node.validate(v, path);
        self.contents.validate(v, &path.key("contents"));
        v.check_mode(&path.key("mode"), self.mode);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileContents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
}

impl Validate for FileContents {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_compression(&path.key("compression"), self.compression.as_deref());
        v.check_source(&path.key("source"), self.source.as_deref());
        self.verification.validate(v, &path.key("verification"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Directory {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl Validate for Directory {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.node.validate(v, path);
        v.check_mode(&path.key("mode"), self.mode);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    #[serde(flatten)]
    pub node: Node,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard: Option<bool>,
}

impl Validate for Link {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.node.validate(v, path);
        v.check_required(&path.key("target"), &self.target);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Systemd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

impl Validate for Systemd {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.units.validate(v, &path.key("units"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Deprecated in favour of `enabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
}

impl Validate for Unit {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_unit_name(&path.key("name"), &self.name);
        v.deprecated(&path.key("enable"), &self.enable);
        self.dropins.validate(v, &path.key("dropins"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dropin {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl Validate for Dropin {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_dropin_name(&path.key("name"), &self.name);
    }
}
