//! Spec 3.1.0. Remote configs, CA bundles and file contents share one
//! [`Resource`] type which supports custom HTTP headers. Adds an HTTP proxy
//! and filesystem mount options.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v3_0::{
    Directory, Disk, Dropin, Link, Node, NodeGroup, NodeUser, Partition, Passwd, PasswdGroup,
    PasswdUser, Raid, Systemd, Timeouts, Unit, Verification,
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
    const VERSION: SpecVersion = SpecVersion::V3_1;
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
    pub proxy: Proxy,
    #[serde(skip_serializing_if = "is_default")]
    pub security: Security,
    #[serde(skip_serializing_if = "is_default")]
    pub timeouts: Timeouts,
}

impl Validate for Ignition {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_version(&path.key("version"), &self.version);
        let merge_path = path.key("config").key("merge");
        for (index, resource) in self.config.merge.iter().enumerate() {
            let resource_path = merge_path.index(index);
            v.check_required(
                &resource_path.key("source"),
                resource.source.as_deref().unwrap_or_default(),
            );
            resource.validate(v, &resource_path);
        }
        self.config.replace.validate(v, &path.key("config").key("replace"));
        self.proxy.validate(v, &path.key("proxy"));

        let ca_path = path.key("security").key("tls").key("certificateAuthorities");
        for (index, ca) in self.security.tls.certificate_authorities.iter().enumerate() {
            let ca_path = ca_path.index(index);
            v.check_required(&ca_path.key("source"), ca.source.as_deref().unwrap_or_default());
            ca.validate(v, &ca_path);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IgnitionConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge: Vec<Resource>,
    #[serde(skip_serializing_if = "is_default")]
    pub replace: Resource,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Proxy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub no_proxy: Vec<String>,
}

impl Validate for Proxy {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_source(&path.key("httpProxy"), self.http_proxy.as_deref());
        v.check_source(&path.key("httpsProxy"), self.https_proxy.as_deref());
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
    pub certificate_authorities: Vec<Resource>,
}

/// A remote or inline piece of data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
}

impl Validate for Resource {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_compression(&path.key("compression"), self.compression.as_deref());
        v.check_source(&path.key("source"), self.source.as_deref());
        self.verification.validate(v, &path.key("verification"));

        let headers_path = path.key("httpHeaders");
        for (index, header) in self.http_headers.iter().enumerate() {
            v.check_required(&headers_path.index(index).key("name"), &header.name);
        }
        v.check_unique(
            &headers_path,
            "name",
            self.http_headers.iter().map(|header| header.name.as_str()),
        );
        if !self.http_headers.is_empty()
            && self
                .source
                .as_deref()
                .is_some_and(|source| !(source.starts_with("http://") || source.starts_with("https://")))
        {
            v.error(&headers_path, "unsupported scheme for http headers");
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpHeader {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
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
pub struct Filesystem {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mount_options: Vec<String>,
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

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct File {
    #[serde(flatten)]
    pub node: Node,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<Resource>,
    #[serde(skip_serializing_if = "is_default")]
    pub contents: Resource,
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
