//! Spec 3.3.0. Adds kernel argument assertions and the `none` filesystem
//! format. RAID levels and link targets become optional.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v3_2::{
    Clevis, Custom, Directory, Disk, Dropin, File, Filesystem, HttpHeader, Ignition,
    IgnitionConfig, Luks, Node, NodeGroup, NodeUser, Partition, Passwd, PasswdGroup, PasswdUser,
    Proxy, Resource, Security, Systemd, Tang, Timeouts, Tls, Unit, Verification,
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
    pub kernel_arguments: KernelArguments,
    #[serde(skip_serializing_if = "is_default")]
    pub passwd: Passwd,
    #[serde(skip_serializing_if = "is_default")]
    pub storage: Storage,
    #[serde(skip_serializing_if = "is_default")]
    pub systemd: Systemd,
}

impl VersionedConfig for Config {
    const VERSION: SpecVersion = SpecVersion::V3_3;
}

impl Validate for Config {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.ignition.validate(v, &path.key("ignition"));
        self.kernel_arguments.validate(v, &path.key("kernelArguments"));
        self.passwd.validate(v, &path.key("passwd"));
        self.storage.validate(v, &path.key("storage"));
        self.systemd.validate(v, &path.key("systemd"));
    }
}

/// Kernel command line arguments which must or must not be present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KernelArguments {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should_exist: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should_not_exist: Vec<String>,
}

impl KernelArguments {
    pub fn is_empty(&self) -> bool {
        self.should_exist.is_empty() && self.should_not_exist.is_empty()
    }
}

impl Validate for KernelArguments {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        for (index, argument) in self.should_not_exist.iter().enumerate() {
            if self.should_exist.contains(argument) {
                v.error(
                    &path.key("shouldNotExist").index(index),
                    "kernel argument cannot be both present and absent",
                );
            }
        }
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
pub struct Raid {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
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
        v.check_raid_level(&path.key("level"), self.level.as_deref());
        for (index, device) in self.devices.iter().enumerate() {
            v.check_absolute(&path.key("devices").index(index), device);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl AsRef<Node> for Link {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

impl Validate for Link {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        self.node.validate(v, path);
        if let Some(target) = &self.target {
            v.check_required(&path.key("target"), target);
        }
    }
}
