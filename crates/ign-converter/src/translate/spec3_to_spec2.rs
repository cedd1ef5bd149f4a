//! Downgrades from 3.x to 2.x.
//!
//! Absolute 3.x paths are split back into a filesystem name and a relative
//! path. Filesystems are named after their mount path, every node outside of
//! a declared mount ends up on `root`.
use ign_config::{VersionedConfig, v2_2, v2_3, v2_4, v3_0, v3_1, v3_2};
use ign_version::SpecVersion;
use tracing::instrument;

use super::{Result, ensure_valid, spec3, version_of};
use crate::{
    fsmap::split_mount,
    gate::{self, Feature},
};

/// 2.2 sizes partitions in 512 byte sectors.
const SECTORS_PER_MIB: i64 = 2048;

fn mib_to_sectors(mib: i64) -> Option<i64> {
    mib.checked_mul(SECTORS_PER_MIB)
}

pub fn check_v3_0(config: &v3_0::Config) -> Result<()> {
    ensure_valid(config, false)?;
    let version = v2_2::Config::VERSION;

    check_files(
        config
            .storage
            .files
            .iter()
            .map(|file| (file.contents.source.is_some(), file.append.len())),
        version,
    )?;
    check_filesystems(
        config.storage.filesystems.iter().map(|fs| fs.format.as_deref()),
        version,
    )?;

    let partitions = || {
        config
            .storage
            .disks
            .iter()
            .flat_map(|disk| &disk.partitions)
    };
    gate::ensure_unused(
        partitions().any(|partition| {
            [partition.size_mib, partition.start_mib]
                .into_iter()
                .flatten()
                .any(|mib| mib_to_sectors(mib).is_none())
        }),
        Feature::PartitionSizeOutOfRange,
        version,
    )?;
    gate::ensure_unused(
        partitions().any(|partition| partition.should_exist == Some(false)),
        Feature::PartitionShouldExist,
        version,
    )?;
    gate::ensure_unused(
        partitions().any(|partition| partition.wipe_partition_entry == Some(true)),
        Feature::PartitionWipeEntry,
        version,
    )?;
    Ok(())
}

pub fn check_v3_1(config: &v3_1::Config) -> Result<()> {
    ensure_valid(config, false)?;
    let version = v2_4::Config::VERSION;

    check_files(
        config
            .storage
            .files
            .iter()
            .map(|file| (file.contents.source.is_some(), file.append.len())),
        version,
    )?;
    check_filesystems(
        config.storage.filesystems.iter().map(|fs| fs.format.as_deref()),
        version,
    )?;
    gate::ensure_unused(
        config
            .storage
            .filesystems
            .iter()
            .any(|fs| !fs.mount_options.is_empty()),
        Feature::MountOptions,
        version,
    )?;

    let ignition = &config.ignition;
    gate::ensure_unused(
        ignition
            .config
            .merge
            .iter()
            .chain([&ignition.config.replace])
            .chain(&ignition.security.tls.certificate_authorities)
            .any(|resource| resource.compression.as_deref().is_some_and(|c| !c.is_empty())),
        Feature::ConfigCompression,
        version,
    )?;
    Ok(())
}

#[instrument(skip_all)]
pub fn v3_0_to_v2_2(config: v3_0::Config) -> Result<v2_2::Config> {
    check_v3_0(&config)?;

    let v3_0::Config {
        ignition,
        passwd,
        storage,
        systemd,
    } = config;
    let mounts = mount_paths(storage.filesystems.iter().map(|fs| fs.path.as_deref()));

    Ok(v2_2::Config {
        ignition: v2_2::Ignition {
            version: version_of::<v2_2::Config>(),
            config: v2_2::IgnitionConfig {
                append: ignition
                    .config
                    .merge
                    .into_iter()
                    .map(|reference| v2_2::ConfigReference {
                        source: reference.source.unwrap_or_default(),
                        verification: verification(reference.verification),
                    })
                    .collect(),
                replace: ignition
                    .config
                    .replace
                    .source
                    .map(|source| v2_2::ConfigReference {
                        source,
                        verification: verification(ignition.config.replace.verification),
                    }),
            },
            security: v2_2::Security {
                tls: v2_2::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|ca| v2_2::CaReference {
                            source: ca.source,
                            verification: verification(ca.verification),
                        })
                        .collect(),
                },
            },
            timeouts: timeouts(ignition.timeouts),
        },
        networkd: v2_2::Networkd::default(),
        passwd: passwd_v2(passwd),
        storage: v2_2::Storage {
            disks: storage
                .disks
                .into_iter()
                .map(|disk| v2_2::Disk {
                    device: disk.device,
                    wipe_table: disk.wipe_table,
                    partitions: disk
                        .partitions
                        .into_iter()
                        .map(|partition| v2_2::Partition {
                            label: partition.label,
                            number: partition.number,
                            size: partition.size_mib.and_then(mib_to_sectors),
                            start: partition.start_mib.and_then(mib_to_sectors),
                            type_guid: partition.type_guid,
                            guid: partition.guid,
                        })
                        .collect(),
                })
                .collect(),
            raid: raid(storage.raid),
            filesystems: storage
                .filesystems
                .into_iter()
                .map(|fs| {
                    filesystem(
                        fs.path,
                        v2_2::Mount {
                            device: fs.device,
                            format: fs.format.unwrap_or_default(),
                            wipe_filesystem: fs.wipe_filesystem,
                            label: fs.label,
                            uuid: fs.uuid,
                            options: fs.options,
                            create: None,
                        },
                    )
                })
                .collect(),
            files: storage
                .files
                .into_iter()
                .map(|file| {
                    let node = node_v2(file.node, &mounts);
                    let (contents, append) = single_contents(file.contents, file.append);
                    v2_2::File {
                        node,
                        contents: v2_2::FileContents {
                            compression: contents.compression,
                            source: contents.source.filter(|source| !source.is_empty()),
                            verification: verification(contents.verification),
                        },
                        mode: file.mode,
                        append,
                    }
                })
                .collect(),
            directories: directories(storage.directories, &mounts),
            links: links(storage.links, &mounts),
        },
        systemd: systemd_v2(systemd),
    })
}

#[instrument(skip_all)]
pub fn v3_1_to_v2_4(config: v3_1::Config) -> Result<v2_4::Config> {
    check_v3_1(&config)?;

    let v3_1::Config {
        ignition,
        passwd,
        storage,
        systemd,
    } = config;
    let mounts = mount_paths(storage.filesystems.iter().map(|fs| fs.path.as_deref()));

    Ok(v2_4::Config {
        ignition: v2_4::Ignition {
            version: version_of::<v2_4::Config>(),
            config: v2_4::IgnitionConfig {
                append: ignition
                    .config
                    .merge
                    .into_iter()
                    .map(|resource| {
                        let (source, verification, http_headers) = reference_parts(resource);
                        v2_4::ConfigReference {
                            source: source.unwrap_or_default(),
                            verification,
                            http_headers,
                        }
                    })
                    .collect(),
                replace: {
                    let (source, verification, http_headers) =
                        reference_parts(ignition.config.replace);
                    source.map(|source| v2_4::ConfigReference {
                        source,
                        verification,
                        http_headers,
                    })
                },
            },
            proxy: v2_4::Proxy {
                http_proxy: ignition.proxy.http_proxy,
                https_proxy: ignition.proxy.https_proxy,
                no_proxy: ignition.proxy.no_proxy,
            },
            security: v2_4::Security {
                tls: v2_4::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|resource| {
                            let (source, verification, http_headers) = reference_parts(resource);
                            v2_4::CaReference {
                                source: source.unwrap_or_default(),
                                verification,
                                http_headers,
                            }
                        })
                        .collect(),
                },
            },
            timeouts: timeouts(ignition.timeouts),
        },
        networkd: v2_4::Networkd::default(),
        passwd: passwd_v2(passwd),
        storage: v2_4::Storage {
            disks: storage
                .disks
                .into_iter()
                .map(|disk| v2_4::Disk {
                    device: disk.device,
                    wipe_table: disk.wipe_table,
                    partitions: disk
                        .partitions
                        .into_iter()
                        .map(|partition| v2_3::Partition {
                            label: partition.label,
                            number: partition.number,
                            size_mib: partition.size_mib,
                            start_mib: partition.start_mib,
                            type_guid: partition.type_guid,
                            guid: partition.guid,
                            wipe_partition_entry: partition.wipe_partition_entry,
                            should_exist: partition.should_exist,
                            size: None,
                            start: None,
                        })
                        .collect(),
                })
                .collect(),
            raid: raid(storage.raid),
            filesystems: storage
                .filesystems
                .into_iter()
                .map(|fs| {
                    filesystem(
                        fs.path,
                        v2_2::Mount {
                            device: fs.device,
                            format: fs.format.unwrap_or_default(),
                            wipe_filesystem: fs.wipe_filesystem,
                            label: fs.label,
                            uuid: fs.uuid,
                            options: fs.options,
                            create: None,
                        },
                    )
                })
                .collect(),
            files: storage
                .files
                .into_iter()
                .map(|file| {
                    let node = node_v2(file.node, &mounts);
                    let (contents, append) = single_contents(file.contents, file.append);
                    v2_4::File {
                        node,
                        contents: v2_4::FileContents {
                            compression: contents.compression,
                            source: contents.source.filter(|source| !source.is_empty()),
                            verification: verification(contents.verification),
                            http_headers: http_headers(contents.http_headers),
                        },
                        mode: file.mode,
                        append,
                    }
                })
                .collect(),
            directories: directories(storage.directories, &mounts),
            links: links(storage.links, &mounts),
        },
        systemd: systemd_v2(systemd),
    })
}

/// Downgrades 3.2 to 2.4 by way of 3.1.
pub fn v3_2_to_v2_4(config: v3_2::Config) -> Result<v2_4::Config> {
    v3_1_to_v2_4(spec3::v3_2_to_v3_1(config)?)
}

/// Every 3.x file must collapse into exactly one 2.x file.
fn check_files(
    mut files: impl Iterator<Item = (bool, usize)>,
    version: SpecVersion,
) -> Result<()> {
    files.try_for_each(|(has_contents, appends)| {
        gate::ensure_unused(appends > 1, Feature::MultipleAppends, version)?;
        gate::ensure_unused(
            has_contents && appends > 0,
            Feature::ContentsWithAppend,
            version,
        )
    })?;
    Ok(())
}

fn check_filesystems<'a>(
    mut formats: impl Iterator<Item = Option<&'a str>>,
    version: SpecVersion,
) -> Result<()> {
    gate::ensure_unused(
        formats.any(|format| format.is_none_or(str::is_empty)),
        Feature::FilesystemWithoutFormat,
        version,
    )?;
    Ok(())
}

fn mount_paths<'a>(paths: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    paths
        .flatten()
        .filter(|path| !path.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Names a filesystem after its mount path, or its device if it has none.
fn filesystem(path: Option<String>, mount: v2_2::Mount) -> v2_2::Filesystem {
    v2_2::Filesystem {
        name: path
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| mount.device.clone()),
        mount: Some(mount),
        path: None,
    }
}

/// Picks the payload of a 3.x file which passed [`check_files`].
fn single_contents<C>(contents: C, append: Vec<C>) -> (C, Option<bool>) {
    match append.into_iter().next() {
        Some(appended) => (appended, Some(true)),
        None => (contents, None),
    }
}

fn node_v2(node: v3_0::Node, mounts: &[String]) -> v2_2::Node {
    let (filesystem, path) = split_mount(&node.path, mounts.iter().map(String::as_str));
    let user = node.user;
    let group = node.group;

    v2_2::Node {
        filesystem,
        path,
        overwrite: node.overwrite,
        user: (user != v3_0::NodeUser::default()).then(|| v2_2::NodeUser {
            id: user.id,
            name: user.name,
        }),
        group: (group != v3_0::NodeGroup::default()).then(|| v2_2::NodeGroup {
            id: group.id,
            name: group.name,
        }),
    }
}

fn directories(directories: Vec<v3_0::Directory>, mounts: &[String]) -> Vec<v2_2::Directory> {
    directories
        .into_iter()
        .map(|directory| v2_2::Directory {
            node: node_v2(directory.node, mounts),
            mode: directory.mode,
        })
        .collect()
}

fn links(links: Vec<v3_0::Link>, mounts: &[String]) -> Vec<v2_2::Link> {
    links
        .into_iter()
        .map(|link| v2_2::Link {
            node: node_v2(link.node, mounts),
            target: link.target,
            hard: link.hard,
        })
        .collect()
}

fn verification(verification: v3_0::Verification) -> v2_2::Verification {
    v2_2::Verification {
        hash: verification.hash,
    }
}

fn timeouts(timeouts: v3_0::Timeouts) -> v2_2::Timeouts {
    v2_2::Timeouts {
        http_response_headers: timeouts.http_response_headers,
        http_total: timeouts.http_total,
    }
}

fn http_headers(headers: Vec<v3_1::HttpHeader>) -> Vec<v2_4::HttpHeader> {
    headers
        .into_iter()
        .map(|header| v2_4::HttpHeader {
            name: header.name,
            value: header.value.unwrap_or_default(),
        })
        .collect()
}

fn reference_parts(
    resource: v3_1::Resource,
) -> (Option<String>, v2_2::Verification, Vec<v2_4::HttpHeader>) {
    (
        resource.source,
        verification(resource.verification),
        http_headers(resource.http_headers),
    )
}

fn raid(raid: Vec<v3_0::Raid>) -> Vec<v2_2::Raid> {
    raid.into_iter()
        .map(|array| v2_2::Raid {
            name: array.name,
            level: array.level,
            devices: array.devices,
            spares: array.spares,
            options: array.options,
        })
        .collect()
}

fn passwd_v2(passwd: v3_0::Passwd) -> v2_2::Passwd {
    v2_2::Passwd {
        users: passwd
            .users
            .into_iter()
            .map(|user| v2_2::PasswdUser {
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
                create: None,
            })
            .collect(),
        groups: passwd
            .groups
            .into_iter()
            .map(|group| v2_2::PasswdGroup {
                name: group.name,
                gid: group.gid,
                password_hash: group.password_hash,
                system: group.system,
            })
            .collect(),
    }
}

fn systemd_v2(systemd: v3_0::Systemd) -> v2_2::Systemd {
    v2_2::Systemd {
        units: systemd
            .units
            .into_iter()
            .map(|unit| v2_2::Unit {
                name: unit.name,
                enabled: unit.enabled,
                enable: None,
                mask: unit.mask,
                contents: unit.contents,
                dropins: unit
                    .dropins
                    .into_iter()
                    .map(|dropin| v2_2::Dropin {
                        name: dropin.name,
                        contents: dropin.contents,
                    })
                    .collect(),
            })
            .collect(),
    }
}
