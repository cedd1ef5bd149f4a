//! Upgrades within the 2.x series. Neither step can fail.
use ign_config::{v2_2, v2_3, v2_4};

use super::version_of;

/// 2.3 adds networkd drop-ins and replaces partition sizes in sectors with
/// sizes in MiB. The sector fields are carried into their deprecated 2.3
/// counterparts.
pub fn v2_2_to_v2_3(config: v2_2::Config) -> v2_3::Config {
    let v2_2::Config {
        mut ignition,
        networkd,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v2_3::Config>();

    v2_3::Config {
        ignition,
        networkd: v2_3::Networkd {
            units: networkd
                .units
                .into_iter()
                .map(|unit| v2_3::NetworkdUnit {
                    name: unit.name,
                    contents: unit.contents,
                    dropins: Vec::new(),
                })
                .collect(),
        },
        passwd,
        storage: v2_3::Storage {
            disks: storage
                .disks
                .into_iter()
                .map(|disk| v2_3::Disk {
                    device: disk.device,
                    wipe_table: disk.wipe_table,
                    partitions: disk
                        .partitions
                        .into_iter()
                        .map(|partition| v2_3::Partition {
                            label: partition.label,
                            number: partition.number,
                            type_guid: partition.type_guid,
                            guid: partition.guid,
                            size: partition.size,
                            start: partition.start,
                            ..Default::default()
                        })
                        .collect(),
                })
                .collect(),
            raid: storage.raid,
            filesystems: storage.filesystems,
            files: storage.files,
            directories: storage.directories,
            links: storage.links,
        },
        systemd,
    }
}

/// 2.4 adds an HTTP proxy and custom HTTP headers on remote resources.
pub fn v2_3_to_v2_4(config: v2_3::Config) -> v2_4::Config {
    let v2_3::Config {
        ignition,
        networkd,
        passwd,
        storage,
        systemd,
    } = config;

    v2_4::Config {
        ignition: v2_4::Ignition {
            version: version_of::<v2_4::Config>(),
            config: v2_4::IgnitionConfig {
                append: ignition
                    .config
                    .append
                    .into_iter()
                    .map(config_reference)
                    .collect(),
                replace: ignition.config.replace.map(config_reference),
            },
            proxy: v2_4::Proxy::default(),
            security: v2_4::Security {
                tls: v2_4::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|ca| v2_4::CaReference {
                            source: ca.source,
                            verification: ca.verification,
                            http_headers: Vec::new(),
                        })
                        .collect(),
                },
            },
            timeouts: ignition.timeouts,
        },
        networkd,
        passwd,
        storage: v2_4::Storage {
            disks: storage.disks,
            raid: storage.raid,
            filesystems: storage.filesystems,
            files: storage
                .files
                .into_iter()
                .map(|file| v2_4::File {
                    node: file.node,
                    contents: v2_4::FileContents {
                        compression: file.contents.compression,
                        source: file.contents.source,
                        verification: file.contents.verification,
                        http_headers: Vec::new(),
                    },
                    mode: file.mode,
                    append: file.append,
                })
                .collect(),
            directories: storage.directories,
            links: storage.links,
        },
        systemd,
    }
}

fn config_reference(reference: v2_3::ConfigReference) -> v2_4::ConfigReference {
    v2_4::ConfigReference {
        source: reference.source,
        verification: reference.verification,
        http_headers: Vec::new(),
    }
}
