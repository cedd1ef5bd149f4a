//! Spec 2.4.0. Adds an HTTP proxy and custom HTTP headers for remote
//! resources.
use ign_version::SpecVersion;
use serde::{Deserialize, Serialize};

pub use crate::v2_3::{
    Directory, Disk, Dropin, Filesystem, Link, Mount, MountCreate, Networkd, NetworkdUnit, Node,
    NodeGroup, NodeUser, Partition, Passwd, PasswdGroup, PasswdUser, Raid, Systemd, Timeouts,
    Unit, UserCreate, Verification,
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
    const VERSION: SpecVersion = SpecVersion::V2_4;
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
    pub proxy: Proxy,
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
        self.proxy.validate(v, &path.key("proxy"));
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
    pub certificate_authorities: Vec<CaReference>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

fn validate_headers(headers: &[HttpHeader], v: &mut Validator, path: &JsonPath) {
    for (index, header) in headers.iter().enumerate() {
        v.check_required(&path.index(index).key("name"), &header.name);
    }
    v.check_unique(path, "name", headers.iter().map(|header| header.name.as_str()));
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigReference {
    pub source: String,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

impl Validate for ConfigReference {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("source"), &self.source);
        v.check_source(&path.key("source"), Some(&self.source));
        self.verification.validate(v, &path.key("verification"));
        validate_headers(&self.http_headers, v, &path.key("httpHeaders"));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaReference {
    pub source: String,
    #[serde(skip_serializing_if = "is_default")]
    pub verification: Verification,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

impl Validate for CaReference {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_required(&path.key("source"), &self.source);
        v.check_source(&path.key("source"), Some(&self.source));
        self.verification.validate(v, &path.key("verification"));
        validate_headers(&self.http_headers, v, &path.key("httpHeaders"));
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_headers: Vec<HttpHeader>,
}

impl Validate for FileContents {
    fn validate(&self, v: &mut Validator, path: &JsonPath) {
        v.check_compression(&path.key("compression"), self.compression.as_deref());
        v.check_source(&path.key("source"), self.source.as_deref());
        self.verification.validate(v, &path.key("verification"));
        validate_headers(&self.http_headers, v, &path.key("httpHeaders"));
    }
}
