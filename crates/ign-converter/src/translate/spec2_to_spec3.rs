//! Upgrades from 2.x to 3.x.
//!
//! 2.x nodes live on named filesystems while 3.x nodes carry absolute paths,
//! so these translators need the filesystem mapping from [`FsMap`]. Duplicate
//! declarations are merged first since 3.x rejects them.
use ign_config::{VersionedConfig, v2_2, v2_3, v2_4, v3_0, v3_1};
use tracing::instrument;

use super::{Result, ensure_valid, version_of};
use crate::{
    dedup::Dedup,
    fsmap::FsMap,
    gate::{self, Feature},
    inode,
};

/// Checks that a 2.3 config can be upgraded to 3.0 with `fs_map`.
pub fn check_v2_3(config: &v2_3::Config, fs_map: &FsMap) -> Result<()> {
    ensure_valid(config, true)?;
    gate::ensure_unused(
        !config.networkd.units.is_empty(),
        Feature::Networkd,
        v3_0::Config::VERSION,
    )?;
    check_inodes(
        &config.storage.filesystems,
        config.storage.files.iter().map(|file| &file.node),
        &config.storage.directories,
        &config.storage.links,
        fs_map,
    )
}

/// Checks that a 2.4 config can be upgraded to 3.1 with `fs_map`.
pub fn check_v2_4(config: &v2_4::Config, fs_map: &FsMap) -> Result<()> {
    ensure_valid(config, true)?;
    gate::ensure_unused(
        !config.networkd.units.is_empty(),
        Feature::Networkd,
        v3_1::Config::VERSION,
    )?;
    check_inodes(
        &config.storage.filesystems,
        config.storage.files.iter().map(|file| &file.node),
        &config.storage.directories,
        &config.storage.links,
        fs_map,
    )
}

#[instrument(skip_all)]
pub fn v2_3_to_v3_0(config: v2_3::Config, fs_map: &FsMap) -> Result<v3_0::Config> {
    let config = config.dedup();
    check_v2_3(&config, fs_map)?;
    let fs_map = fs_map.with_root();

    let v2_3::Config {
        ignition,
        passwd,
        storage,
        systemd,
        networkd: _,
    } = config;

    Ok(v3_0::Config {
        ignition: v3_0::Ignition {
            version: version_of::<v3_0::Config>(),
            config: v3_0::IgnitionConfig {
                merge: ignition
                    .config
                    .append
                    .into_iter()
                    .map(|reference| v3_0::ConfigReference {
                        source: Some(reference.source),
                        verification: verification(reference.verification),
                    })
                    .collect(),
                replace: ignition
                    .config
                    .replace
                    .map(|reference| v3_0::ConfigReference {
                        source: Some(reference.source),
                        verification: verification(reference.verification),
                    })
                    .unwrap_or_default(),
            },
            security: v3_0::Security {
                tls: v3_0::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|ca| v3_0::CaReference {
                            source: ca.source,
                            verification: verification(ca.verification),
                        })
                        .collect(),
                },
            },
            timeouts: timeouts(ignition.timeouts),
        },
        passwd: passwd_v3(passwd),
        storage: v3_0::Storage {
            directories: directories(storage.directories, &fs_map),
            disks: disks(storage.disks),
            files: storage
                .files
                .into_iter()
                .map(|file| {
                    let appending = file.append == Some(true);
                    let node = file_node(file.node, appending, &fs_map);
                    let mut contents = file_contents(file.contents);
                    if appending {
                        v3_0::File {
                            node,
                            append: vec![contents],
                            mode: file.mode,
                            ..Default::default()
                        }
                    } else {
                        contents.source.get_or_insert_with(String::new);
                        v3_0::File {
                            node,
                            contents,
                            mode: file.mode,
                            ..Default::default()
                        }
                    }
                })
                .collect(),
            filesystems: filesystems(storage.filesystems, &fs_map)
                .into_iter()
                .map(|(mount, path)| v3_0::Filesystem {
                    device: mount.device,
                    format: Some(mount.format),
                    label: mount.label,
                    options: mount.options,
                    path: Some(path),
                    uuid: mount.uuid,
                    wipe_filesystem: mount.wipe_filesystem,
                })
                .collect(),
            links: links(storage.links, &fs_map),
            raid: raid(storage.raid),
        },
        systemd: systemd_v3(systemd),
    })
}

#[instrument(skip_all)]
pub fn v2_4_to_v3_1(config: v2_4::Config, fs_map: &FsMap) -> Result<v3_1::Config> {
    let config = config.dedup();
    check_v2_4(&config, fs_map)?;
    let fs_map = fs_map.with_root();

    let v2_4::Config {
        ignition,
        passwd,
        storage,
        systemd,
        networkd: _,
    } = config;

    Ok(v3_1::Config {
        ignition: v3_1::Ignition {
            version: version_of::<v3_1::Config>(),
            config: v3_1::IgnitionConfig {
                merge: ignition
                    .config
                    .append
                    .into_iter()
                    .map(config_resource)
                    .collect(),
                replace: ignition
                    .config
                    .replace
                    .map(config_resource)
                    .unwrap_or_default(),
            },
            proxy: v3_1::Proxy {
                http_proxy: ignition.proxy.http_proxy,
                https_proxy: ignition.proxy.https_proxy,
                no_proxy: ignition.proxy.no_proxy,
            },
            security: v3_1::Security {
                tls: v3_1::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|ca| v3_1::Resource {
                            source: Some(ca.source),
                            verification: verification(ca.verification),
                            http_headers: http_headers(ca.http_headers),
                            compression: None,
                        })
                        .collect(),
                },
            },
            timeouts: timeouts(ignition.timeouts),
        },
        passwd: passwd_v3(passwd),
        storage: v3_1::Storage {
            directories: directories(storage.directories, &fs_map),
            disks: disks(storage.disks),
            files: storage
                .files
                .into_iter()
                .map(|file| {
                    let appending = file.append == Some(true);
                    let node = file_node(file.node, appending, &fs_map);
                    let mut contents = file_resource(file.contents);
                    if appending {
                        v3_1::File {
                            node,
                            append: vec![contents],
                            mode: file.mode,
                            ..Default::default()
                        }
                    } else {
                        contents.source.get_or_insert_with(String::new);
                        v3_1::File {
                            node,
                            contents,
                            mode: file.mode,
                            ..Default::default()
                        }
                    }
                })
                .collect(),
            filesystems: filesystems(storage.filesystems, &fs_map)
                .into_iter()
                .map(|(mount, path)| v3_1::Filesystem {
                    device: mount.device,
                    format: Some(mount.format),
                    label: mount.label,
                    mount_options: Vec::new(),
                    options: mount.options,
                    path: Some(path),
                    uuid: mount.uuid,
                    wipe_filesystem: mount.wipe_filesystem,
                })
                .collect(),
            links: links(storage.links, &fs_map),
            raid: raid(storage.raid),
        },
        systemd: systemd_v3(systemd),
    })
}

fn check_inodes<'a>(
    filesystems: &'a [v2_2::Filesystem],
    files: impl IntoIterator<Item = &'a v2_2::Node>,
    directories: &'a [v2_2::Directory],
    links: &'a [v2_2::Link],
    fs_map: &FsMap,
) -> Result<()> {
    inode::check(
        filesystems,
        files,
        directories.iter().map(|directory| &directory.node),
        links.iter().map(|link| &link.node),
        &fs_map.with_root(),
    )?;
    Ok(())
}

fn verification(verification: v2_2::Verification) -> v3_0::Verification {
    v3_0::Verification {
        hash: verification.hash,
    }
}

fn timeouts(timeouts: v2_2::Timeouts) -> v3_0::Timeouts {
    v3_0::Timeouts {
        http_response_headers: timeouts.http_response_headers,
        http_total: timeouts.http_total,
    }
}

fn http_headers(headers: Vec<v2_4::HttpHeader>) -> Vec<v3_1::HttpHeader> {
    headers
        .into_iter()
        .map(|header| v3_1::HttpHeader {
            name: header.name,
            value: Some(header.value),
        })
        .collect()
}

fn config_resource(reference: v2_4::ConfigReference) -> v3_1::Resource {
    v3_1::Resource {
        compression: None,
        http_headers: http_headers(reference.http_headers),
        source: Some(reference.source),
        verification: verification(reference.verification),
    }
}

fn file_contents(contents: v2_2::FileContents) -> v3_0::FileContents {
    v3_0::FileContents {
        compression: contents.compression,
        source: contents.source,
        verification: verification(contents.verification),
    }
}

fn file_resource(contents: v2_4::FileContents) -> v3_1::Resource {
    v3_1::Resource {
        compression: contents.compression,
        http_headers: http_headers(contents.http_headers),
        source: contents.source,
        verification: verification(contents.verification),
    }
}

/// 2.x files overwrite by default, appending files never overwrite.
fn file_node(node: v2_2::Node, appending: bool, fs_map: &FsMap) -> v3_0::Node {
    let mut node = node_v3(node, fs_map);
    node.overwrite = if appending {
        Some(false)
    } else {
        node.overwrite.or(Some(true))
    };
    node
}

fn node_v3(node: v2_2::Node, fs_map: &FsMap) -> v3_0::Node {
    let path = fs_map
        .resolve(&node.filesystem, &node.path)
        .unwrap_or(node.path);
    let user = node.user.unwrap_or_default();
    let group = node.group.unwrap_or_default();

    v3_0::Node {
        group: v3_0::NodeGroup {
            id: group.id,
            name: group.name,
        },
        overwrite: node.overwrite,
        path,
        user: v3_0::NodeUser {
            id: user.id,
            name: user.name,
        },
    }
}

fn directories(directories: Vec<v2_2::Directory>, fs_map: &FsMap) -> Vec<v3_0::Directory> {
    directories
        .into_iter()
        .map(|directory| v3_0::Directory {
            node: node_v3(directory.node, fs_map),
            mode: directory.mode,
        })
        .collect()
}

fn links(links: Vec<v2_2::Link>, fs_map: &FsMap) -> Vec<v3_0::Link> {
    links
        .into_iter()
        .map(|link| v3_0::Link {
            node: node_v3(link.node, fs_map),
            hard: link.hard,
            target: link.target,
        })
        .collect()
}

/// Filesystems which only declare a path have no 3.x counterpart, their
/// nodes are resolved through the mapping instead.
fn filesystems(filesystems: Vec<v2_2::Filesystem>, fs_map: &FsMap) -> Vec<(v2_2::Mount, String)> {
    filesystems
        .into_iter()
        .filter_map(|filesystem| {
            let path = fs_map.get(&filesystem.name)?.to_owned();
            filesystem.mount.map(|mount| (mount, path))
        })
        .collect()
}

fn disks(disks: Vec<v2_3::Disk>) -> Vec<v3_0::Disk> {
    disks
        .into_iter()
        .map(|disk| v3_0::Disk {
            device: disk.device,
            partitions: disk
                .partitions
                .into_iter()
                .map(|partition| v3_0::Partition {
                    guid: partition.guid,
                    label: partition.label,
                    number: partition.number,
                    should_exist: partition.should_exist,
                    size_mib: partition.size_mib,
                    start_mib: partition.start_mib,
                    type_guid: partition.type_guid,
                    wipe_partition_entry: partition.wipe_partition_entry,
                })
                .collect(),
            wipe_table: disk.wipe_table,
        })
        .collect()
}

fn raid(raid: Vec<v2_2::Raid>) -> Vec<v3_0::Raid> {
    raid.into_iter()
        .map(|array| v3_0::Raid {
            name: array.name,
            level: array.level,
            devices: array.devices,
            spares: array.spares,
            options: array.options,
        })
        .collect()
}

fn passwd_v3(passwd: v2_2::Passwd) -> v3_0::Passwd {
    v3_0::Passwd {
        users: passwd
            .users
            .into_iter()
            .map(|user| v3_0::PasswdUser {
                name: user.name,
                password_hash: user.password_hash,
                ssh_authorized_keys: user.ssh_authorized_keys,
                uid: user.uid,
                gecos: user.gecos,
                home_dir: user.home_dir,
                no_create_home: user.no_create_home,
                primary_group: user.primary_group,
                groups: user.groups,
                no_user_group: user.no_user_group,
                no_log_init: user.no_log_init,
                shell: user.shell,
                system: user.system,
            })
            .collect(),
        groups: passwd
            .groups
            .into_iter()
            .map(|group| v3_0::PasswdGroup {
                name: group.name,
                gid: group.gid,
                password_hash: group.password_hash,
                system: group.system,
            })
            .collect(),
    }
}

fn systemd_v3(systemd: v2_2::Systemd) -> v3_0::Systemd {
    v3_0::Systemd {
        units: systemd
            .units
            .into_iter()
            .map(|unit| v3_0::Unit {
                contents: unit.contents,
                dropins: unit
                    .dropins
                    .into_iter()
                    .map(|dropin| v3_0::Dropin {
                        contents: dropin.contents,
                        name: dropin.name,
                    })
                    .collect(),
                enabled: unit.enabled,
                mask: unit.mask,
                name: unit.name,
            })
            .collect(),
    }
}
