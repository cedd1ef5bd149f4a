//! Spec 3.0.0. Filesystems are mounted at explicit paths and storage entries
//! carry absolute paths. Entries are keyed, a config may not define the same
//! path, unit or user twice.
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
    pub passwd: Passwd,
    #[serde(skip_serializing_if = "is_default")]
    pub storage: Storage,
    #[serde(skip_serializing_if = "is_default")]
    pub systemd: Systemd,
}

impl VersionedConfig for Config {
    const VERSION: SpecVersion = SpecVersion::V3_0;
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
        let merge_path = path.key("config").key("merge");
        for (index, reference) in self.config.merge.iter().enumerate() {
            let reference_path = merge_path.index(index);
            v.check_required(
                &reference_path.key("source"),
                reference.source.as_deref().unwrap_or_default(),
            );
            reference.validate(v, &reference_path);
        }
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
    pub merge: Vec<ConfigReference>,
    #[serde(skip_serializing_if = "is_default")]
    pub replace: ConfigReference,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
}

impl Validate for ConfigReference {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_source(&path.key("source"), self.source.as_deref());
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
    pub raid: Vec<Raid>,
}

impl Validate for Storage {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.directories.validate(v, &path.key("directories"));
        self.disks.validate(v, &path.key("disks"));
        self.files.validate(v, &path.key("files"));
        self.filesystems.validate(v, &path.key("filesystems"));
        self.links.validate(v, &path.key("links"));
        self.raid.validate(v, &path.key("raid"));
        validate_node_paths(&self.files, &self.directories, &self.links, v, path);
        v.check_unique(
            &path.key("disks"),
            "device",
            self.disks.iter().map(|disk| disk.device.as_str()),
        );
    }
}

/// Checks that no two files, directories or links share a path. Shared with
/// later spec versions which redefine [`File`] or [`Link`].
pub(crate) fn validate_node_paths<'a, F, D, L>(
    files: &'a [F],
    directories: &'a [D],
    links: &'a [L],
    v: &mut Validator,
    path: &JsonPath,
) where
    F: AsRef<Node>,
    D: AsRef<Node>,
    L: AsRef<Node>,
{
    let files = files
        .iter()
        .enumerate()
        .map(|(index, file)| (path.key("files").index(index).key("path"), file.as_ref().path.as_str()));
    let directories = directories.iter().enumerate().map(|(index, directory)| {
        (
            path.key("directories").index(index).key("path"),
            directory.as_ref().path.as_str(),
        )
    });
    let links = links
        .iter()
        .enumerate()
        .map(|(index, link)| (path.key("links").index(index).key("path"), link.as_ref().path.as_str()));

    v.check_unique_paths(files.chain(directories).chain(links));
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
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wipe_filesystem: Option<bool>,
}

impl Validate for Filesystem {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_absolute(&path.key("device"), &self.device);
        v.check_filesystem_format(&path.key("format"), self.format.as_deref());
        if let Some(fs_path) = self.path.as_deref().filter(|fs_path| !fs_path.is_empty()) {
            v.check_absolute(&path.key("path"), fs_path);
        }
    }
}

/// The location and ownership shared by files, directories and links.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    #[serde(skip_serializing_if = "is_default")]
    pub group: NodeGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    pub path: String,
    #[serde(skip_serializing_if = "is_default")]
    pub user: NodeUser,
}

impl Validate for Node {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_absolute(&path.key("path"), &self.path);
        v.check_node_owner(&path.key("user"), self.user.id, self.user.name.as_deref());
        v.check_node_owner(&path.key("group"), self.group.id, self.group.name.as_deref());
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<FileContents>,
    #[serde(skip_serializing_if = "is_default")]
    pub contents: FileContents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl AsRef<Node> for File {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

impl Validate for File {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.node.validate(v, path);
        self.append.validate(v, &path.key("append"));
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

impl AsRef<Node> for Directory {
    fn as_ref(&self) -> &Node {
        &self.node
    }
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard: Option<bool>,
    pub target: String,
}

impl AsRef<Node> for Link {
    fn as_ref(&self) -> &Node {
        &self.node
    }
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
        v.check_unique(
            &path.key("units"),
            "name",
            self.units.iter().map(|unit| unit.name.as_str()),
        );
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Unit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,
    pub name: String,
}

impl Validate for Unit {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_unit_name(&path.key("name"), &self.name);
        self.dropins.validate(v, &path.key("dropins"));
        v.check_unique(
            &path.key("dropins"),
            "name",
            self.dropins.iter().map(|dropin| dropin.name.as_str()),
        );
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dropin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    pub name: String,
}

impl Validate for Dropin {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_dropin_name(&path.key("name"), &self.name);
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn duplicate_paths_are_fatal() {
        let err = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.0.0"},
                  "storage": {
                    "files": [{"path": "/etc/motd"}],
                    "directories": [{"path": "/etc/motd"}]
                  }
                }
            "#}
            .as_bytes(),
        )
        .expect_err("paths must be unique");

        assert_eq!(
            err.to_string(),
            "invalid config:\nerror at $.storage.directories.0.path: duplicate entry defined for \"/etc/motd\"\n"
        );
    }

    #[test]
    fn file_with_append_list() {
        let (config, report) = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.0.0"},
                  "storage": {
                    "files": [{
                      "path": "/var/log/app",
                      "overwrite": false,
                      "append": [{"source": "data:,one"}, {"source": "data:,two"}]
                    }]
                  }
                }
            "#}
            .as_bytes(),
        )
        .expect("config is valid");

        assert!(report.is_empty(), "{report}");
        let file = &config.storage.files[0];
        assert_eq!(file.node.overwrite, Some(false));
        assert_eq!(file.append.len(), 2);
        assert_eq!(file.contents, FileContents::default());
    }

    #[test]
    fn owner_by_id_and_name_is_fatal() {
        let err = parse(
            indoc! {r#"
                {
                  "ignition": {"version": "3.0.0"},
                  "storage": {"directories": [{"path": "/srv", "user": {"id": 0, "name": "root"}}]}
                }
            "#}
            .as_bytes(),
        )
        .expect_err("owner is ambiguous");

        assert!(matches!(err, crate::Error::InvalidConfig { .. }));
    }
}
