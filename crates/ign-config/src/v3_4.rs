//! Spec 3.4.0. Adds offline Tang provisioning, LUKS discard and open options.
//! Modes may carry setuid, setgid and sticky bits and S3 objects may be
//! addressed by `arn:` URLs.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v3_3::{
    Custom, Directory, Disk, Dropin, File, Filesystem, HttpHeader, Ignition, IgnitionConfig,
    KernelArguments, Link, Node, NodeGroup, NodeUser, Partition, Passwd, PasswdGroup, PasswdUser,
    Proxy, Raid, Resource, Security, Systemd, Timeouts, Tls, Unit, Verification,
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
    const VERSION: SpecVersion = SpecVersion::V3_4;
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
pub struct Luks {
    #[serde(skip_serializing_if = "is_default")]
    pub clevis: Clevis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard: Option<bool>,
    #[serde(skip_serializing_if = "is_default")]
    pub key_file: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub open_options: Vec<String>,
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
pub struct Tang {
    /// Signed advertisement of the Tang server, used to provision the volume
    /// without contacting the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertisement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    pub url: String,
}

impl Validate for Tang {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("url"), &self.url);
        v.check_source(&path.key("url"), Some(&self.url));
        if self
            .advertisement
            .as_deref()
            .is_some_and(|advertisement| serde_json::from_str::<serde_json::Value>(advertisement).is_err())
        {
            v.error(&path.key("advertisement"), "advertisement is not valid JSON");
        }
    }
}
