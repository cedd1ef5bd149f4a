//! Config builders shared by the integration tests.
//!
//! Every builder returns a fresh value, tests adjust the parts they care
//! about.
#![allow(dead_code)]

use ign_config::{v2_2, v2_3, v2_4, v3_0, v3_1};
use ign_converter::FsMap;

pub const HASH: &str = "sha512-cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";
pub const DISK_GUID: &str = "8a7a6e26-5e8f-4cca-a654-46215d4696ac";
pub const TYPE_GUID: &str = "0fc63daf-8483-4772-8e79-3d69d8477de4";

/// Mapping used together with [`exhaustive_v2_4`]. The `/var` filesystem
/// maps to itself so a downgrade produces the very same name again.
pub fn exhaustive_map() -> FsMap {
    FsMap::from_iter([("var", "/var"), ("/var", "/var")])
}

fn verification() -> v2_2::Verification {
    v2_2::Verification {
        hash: Some(HASH.to_owned()),
    }
}

fn headers() -> Vec<v2_4::HttpHeader> {
    vec![
        v2_4::HttpHeader {
            name: "X-Token".to_owned(),
            value: "abc".to_owned(),
        },
        v2_4::HttpHeader {
            name: "X-Empty".to_owned(),
            value: String::new(),
        },
    ]
}

fn node(filesystem: &str, path: &str, overwrite: bool) -> v2_2::Node {
    v2_2::Node {
        filesystem: filesystem.to_owned(),
        path: path.to_owned(),
        overwrite: Some(overwrite),
        ..Default::default()
    }
}

fn passwd_v2() -> v2_2::Passwd {
    v2_2::Passwd {
        users: vec![v2_2::PasswdUser {
            name: "core".to_owned(),
            password_hash: Some("$6$rounds=4096$salt$hash".to_owned()),
            ssh_authorized_keys: vec!["ssh-ed25519 AAAAC3Nza core@example".to_owned()],
            uid: Some(1000),
            gecos: Some("CoreOS Admin".to_owned()),
            home_dir: Some("/home/core".to_owned()),
            no_create_home: Some(false),
            primary_group: Some("core".to_owned()),
            groups: vec!["wheel".to_owned(), "sudo".to_owned()],
            no_user_group: Some(false),
            no_log_init: Some(true),
            shell: Some("/bin/bash".to_owned()),
            system: Some(false),
            create: None,
        }],
        groups: vec![v2_2::PasswdGroup {
            name: "admins".to_owned(),
            gid: Some(1001),
            password_hash: Some("*".to_owned()),
            system: Some(true),
        }],
    }
}

fn systemd_v2() -> v2_2::Systemd {
    v2_2::Systemd {
        units: vec![v2_2::Unit {
            name: "example.service".to_owned(),
            enabled: Some(true),
            enable: None,
            mask: Some(false),
            contents: Some("[Service]\nType=oneshot\nExecStart=/usr/bin/true\n".to_owned()),
            dropins: vec![v2_2::Dropin {
                name: "override.conf".to_owned(),
                contents: Some("[Service]\nEnvironment=DEBUG=1\n".to_owned()),
            }],
        }],
    }
}

fn raid_v2() -> Vec<v2_2::Raid> {
    vec![v2_2::Raid {
        name: "md0".to_owned(),
        level: "raid1".to_owned(),
        devices: vec!["/dev/sdb".to_owned(), "/dev/sdc".to_owned()],
        spares: Some(1),
        options: vec!["--assume-clean".to_owned()],
    }]
}

fn var_mount() -> v2_2::Mount {
    v2_2::Mount {
        device: "/dev/disk/by-partlabel/var".to_owned(),
        format: "xfs".to_owned(),
        wipe_filesystem: Some(true),
        label: Some("var".to_owned()),
        uuid: Some(DISK_GUID.to_owned()),
        options: vec!["-m".to_owned(), "bigtime=1".to_owned()],
        create: None,
    }
}

/// A 2.4 config touching every field 3.1 can express. Node fields which the
/// upgrade defaults are set explicitly so the config survives a round trip.
pub fn exhaustive_v2_4() -> v2_4::Config {
    v2_4::Config {
        ignition: v2_4::Ignition {
            version: "2.4.0".to_owned(),
            config: v2_4::IgnitionConfig {
                append: vec![v2_4::ConfigReference {
                    source: "https://example.com/extra.ign".to_owned(),
                    verification: verification(),
                    http_headers: headers(),
                }],
                replace: Some(v2_4::ConfigReference {
                    source: "https://example.com/replace.ign".to_owned(),
                    verification: verification(),
                    http_headers: Vec::new(),
                }),
            },
            proxy: v2_4::Proxy {
                http_proxy: Some("http://proxy.example.com:3128".to_owned()),
                https_proxy: Some("https://proxy.example.com:3129".to_owned()),
                no_proxy: vec!["www.example.net".to_owned()],
            },
            security: v2_4::Security {
                tls: v2_4::Tls {
                    certificate_authorities: vec![v2_4::CaReference {
                        source: "https://example.com/ca.pem".to_owned(),
                        verification: verification(),
                        http_headers: headers(),
                    }],
                },
            },
            timeouts: v2_4::Timeouts {
                http_response_headers: Some(5),
                http_total: Some(10),
            },
        },
        networkd: v2_4::Networkd::default(),
        passwd: passwd_v2(),
        storage: v2_4::Storage {
            disks: vec![v2_4::Disk {
                device: "/dev/sda".to_owned(),
                wipe_table: Some(true),
                partitions: vec![v2_4::Partition {
                    label: Some("var".to_owned()),
                    number: 1,
                    size_mib: Some(5000),
                    start_mib: Some(2048),
                    type_guid: Some(TYPE_GUID.to_owned()),
                    guid: Some(DISK_GUID.to_owned()),
                    wipe_partition_entry: Some(true),
                    should_exist: Some(true),
                    size: None,
                    start: None,
                }],
            }],
            raid: raid_v2(),
            filesystems: vec![v2_4::Filesystem {
                name: "/var".to_owned(),
                mount: Some(var_mount()),
                path: None,
            }],
            files: vec![
                v2_4::File {
                    node: v2_2::Node {
                        user: Some(v2_2::NodeUser {
                            id: Some(1000),
                            name: None,
                        }),
                        group: Some(v2_2::NodeGroup {
                            id: None,
                            name: Some("core".to_owned()),
                        }),
                        ..node("/var", "/varfile", false)
                    },
                    contents: v2_4::FileContents {
                        compression: Some("gzip".to_owned()),
                        source: Some("https://example.com/varfile.gz".to_owned()),
                        verification: verification(),
                        http_headers: headers(),
                    },
                    mode: Some(0o644),
                    append: None,
                },
                v2_4::File {
                    node: node("root", "/etc/motd", false),
                    contents: v2_4::FileContents {
                        source: Some("data:,hello%20world".to_owned()),
                        ..Default::default()
                    },
                    mode: Some(0o644),
                    append: Some(true),
                },
                v2_4::File {
                    node: node("root", "/empty", true),
                    contents: v2_4::FileContents::default(),
                    mode: None,
                    append: None,
                },
            ],
            directories: vec![v2_4::Directory {
                node: node("/var", "/vardir", true),
                mode: Some(0o755),
            }],
            links: vec![v2_4::Link {
                node: node("root", "/etc/localtime", true),
                target: "/usr/share/zoneinfo/UTC".to_owned(),
                hard: Some(false),
            }],
        },
        systemd: systemd_v2(),
    }
}

fn node_v3(path: &str, overwrite: bool) -> v3_0::Node {
    v3_0::Node {
        path: path.to_owned(),
        overwrite: Some(overwrite),
        ..Default::default()
    }
}

fn resource(source: &str, headers: bool) -> v3_1::Resource {
    v3_1::Resource {
        source: Some(source.to_owned()),
        verification: v3_0::Verification {
            hash: Some(HASH.to_owned()),
        },
        http_headers: if headers {
            vec![
                v3_1::HttpHeader {
                    name: "X-Token".to_owned(),
                    value: Some("abc".to_owned()),
                },
                v3_1::HttpHeader {
                    name: "X-Empty".to_owned(),
                    value: Some(String::new()),
                },
            ]
        } else {
            Vec::new()
        },
        compression: None,
    }
}

/// The 3.1 counterpart of [`exhaustive_v2_4`] under [`exhaustive_map`].
pub fn exhaustive_v3_1() -> v3_1::Config {
    v3_1::Config {
        ignition: v3_1::Ignition {
            version: "3.1.0".to_owned(),
            config: v3_1::IgnitionConfig {
                merge: vec![resource("https://example.com/extra.ign", true)],
                replace: resource("https://example.com/replace.ign", false),
            },
            proxy: v3_1::Proxy {
                http_proxy: Some("http://proxy.example.com:3128".to_owned()),
                https_proxy: Some("https://proxy.example.com:3129".to_owned()),
                no_proxy: vec!["www.example.net".to_owned()],
            },
            security: v3_1::Security {
                tls: v3_1::Tls {
                    certificate_authorities: vec![resource("https://example.com/ca.pem", true)],
                },
            },
            timeouts: v3_0::Timeouts {
                http_response_headers: Some(5),
                http_total: Some(10),
            },
        },
        passwd: v3_0::Passwd {
            users: vec![v3_0::PasswdUser {
                name: "core".to_owned(),
                password_hash: Some("$6$rounds=4096$salt$hash".to_owned()),
                ssh_authorized_keys: vec!["ssh-ed25519 AAAAC3Nza core@example".to_owned()],
                uid: Some(1000),
                gecos: Some("CoreOS Admin".to_owned()),
                home_dir: Some("/home/core".to_owned()),
                no_create_home: Some(false),
                primary_group: Some("core".to_owned()),
                groups: vec!["wheel".to_owned(), "sudo".to_owned()],
                no_user_group: Some(false),
                no_log_init: Some(true),
                shell: Some("/bin/bash".to_owned()),
                system: Some(false),
            }],
            groups: vec![v3_0::PasswdGroup {
                name: "admins".to_owned(),
                gid: Some(1001),
                password_hash: Some("*".to_owned()),
                system: Some(true),
            }],
        },
        storage: v3_1::Storage {
            directories: vec![v3_0::Directory {
                node: node_v3("/var/vardir", true),
                mode: Some(0o755),
            }],
            disks: vec![v3_0::Disk {
                device: "/dev/sda".to_owned(),
                partitions: vec![v3_0::Partition {
                    guid: Some(DISK_GUID.to_owned()),
                    label: Some("var".to_owned()),
                    number: 1,
                    should_exist: Some(true),
                    size_mib: Some(5000),
                    start_mib: Some(2048),
                    type_guid: Some(TYPE_GUID.to_owned()),
                    wipe_partition_entry: Some(true),
                }],
                wipe_table: Some(true),
            }],
            files: vec![
                v3_1::File {
                    node: v3_0::Node {
                        user: v3_0::NodeUser {
                            id: Some(1000),
                            name: None,
                        },
                        group: v3_0::NodeGroup {
                            id: None,
                            name: Some("core".to_owned()),
                        },
                        ..node_v3("/var/varfile", false)
                    },
                    append: Vec::new(),
                    contents: v3_1::Resource {
                        compression: Some("gzip".to_owned()),
                        ..resource("https://example.com/varfile.gz", true)
                    },
                    mode: Some(0o644),
                },
                v3_1::File {
                    node: node_v3("/etc/motd", false),
                    append: vec![v3_1::Resource {
                        source: Some("data:,hello%20world".to_owned()),
                        ..Default::default()
                    }],
                    contents: v3_1::Resource::default(),
                    mode: Some(0o644),
                },
                v3_1::File {
                    node: node_v3("/empty", true),
                    append: Vec::new(),
                    contents: v3_1::Resource {
                        source: Some(String::new()),
                        ..Default::default()
                    },
                    mode: None,
                },
            ],
            filesystems: vec![v3_1::Filesystem {
                device: "/dev/disk/by-partlabel/var".to_owned(),
                format: Some("xfs".to_owned()),
                label: Some("var".to_owned()),
                mount_options: Vec::new(),
                options: vec!["-m".to_owned(), "bigtime=1".to_owned()],
                path: Some("/var".to_owned()),
                uuid: Some(DISK_GUID.to_owned()),
                wipe_filesystem: Some(true),
            }],
            links: vec![v3_0::Link {
                node: node_v3("/etc/localtime", true),
                hard: Some(false),
                target: "/usr/share/zoneinfo/UTC".to_owned(),
            }],
            raid: vec![v3_0::Raid {
                name: "md0".to_owned(),
                level: "raid1".to_owned(),
                devices: vec!["/dev/sdb".to_owned(), "/dev/sdc".to_owned()],
                spares: Some(1),
                options: vec!["--assume-clean".to_owned()],
            }],
        },
        systemd: v3_0::Systemd {
            units: vec![v3_0::Unit {
                contents: Some("[Service]\nType=oneshot\nExecStart=/usr/bin/true\n".to_owned()),
                dropins: vec![v3_0::Dropin {
                    contents: Some("[Service]\nEnvironment=DEBUG=1\n".to_owned()),
                    name: "override.conf".to_owned(),
                }],
                enabled: Some(true),
                mask: Some(false),
                name: "example.service".to_owned(),
            }],
        },
    }
}

/// A 2.3 config with the parts 3.0 can express, used for the 2.3 upgrade.
pub fn simple_v2_3() -> v2_3::Config {
    v2_3::Config {
        ignition: v2_3::Ignition {
            version: "2.3.0".to_owned(),
            ..Default::default()
        },
        passwd: passwd_v2(),
        storage: v2_3::Storage {
            filesystems: vec![v2_3::Filesystem {
                name: "var".to_owned(),
                mount: Some(var_mount()),
                path: None,
            }],
            files: vec![
                v2_3::File {
                    node: node("var", "/varfile", true),
                    contents: v2_3::FileContents {
                        source: Some("data:,var".to_owned()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                v2_3::File {
                    node: v2_2::Node {
                        filesystem: "root".to_owned(),
                        path: "/empty".to_owned(),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            ],
            raid: raid_v2(),
            ..Default::default()
        },
        systemd: systemd_v2(),
        ..Default::default()
    }
}

/// A 3.0 config exercising the 2.2 downgrade, including partition sizes.
pub fn simple_v3_0() -> v3_0::Config {
    v3_0::Config {
        ignition: v3_0::Ignition {
            version: "3.0.0".to_owned(),
            config: v3_0::IgnitionConfig {
                merge: vec![v3_0::ConfigReference {
                    source: Some("https://example.com/extra.ign".to_owned()),
                    verification: v3_0::Verification::default(),
                }],
                replace: v3_0::ConfigReference::default(),
            },
            ..Default::default()
        },
        storage: v3_0::Storage {
            disks: vec![v3_0::Disk {
                device: "/dev/sda".to_owned(),
                partitions: vec![v3_0::Partition {
                    label: Some("var".to_owned()),
                    number: 1,
                    size_mib: Some(1024),
                    start_mib: Some(1),
                    should_exist: Some(true),
                    wipe_partition_entry: Some(false),
                    ..Default::default()
                }],
                wipe_table: None,
            }],
            filesystems: vec![
                v3_0::Filesystem {
                    device: "/dev/disk/by-partlabel/var".to_owned(),
                    format: Some("ext4".to_owned()),
                    path: Some("/var".to_owned()),
                    ..Default::default()
                },
                v3_0::Filesystem {
                    device: "/dev/sdb".to_owned(),
                    format: Some("swap".to_owned()),
                    ..Default::default()
                },
            ],
            files: vec![v3_0::File {
                node: v3_0::Node {
                    user: v3_0::NodeUser {
                        id: Some(0),
                        name: None,
                    },
                    ..node_v3("/var/lib/data", true)
                },
                contents: v3_0::FileContents {
                    source: Some("data:,payload".to_owned()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            links: vec![v3_0::Link {
                node: node_v3("/etc/localtime", false),
                hard: None,
                target: "/usr/share/zoneinfo/UTC".to_owned(),
            }],
            ..Default::default()
        },
        ..Default::default()
    }
}
