//! Translators between adjacent 3.x versions.
//!
//! Upgrades are total. Downgrades reject every feature the older version
//! lacks, values which restate the older default are dropped silently.
use ign_config::{VersionedConfig, v3_0, v3_1, v3_2, v3_3, v3_4};
use tracing::instrument;

use super::{Result, ensure_valid, version_of};
use crate::gate::{self, Feature};

/// 3.1 folds config references, CA references and file contents into one
/// resource type and adds filesystem mount options.
pub fn v3_0_to_v3_1(config: v3_0::Config) -> v3_1::Config {
    let v3_0::Config {
        ignition,
        passwd,
        storage,
        systemd,
    } = config;

    v3_1::Config {
        ignition: v3_1::Ignition {
            version: version_of::<v3_1::Config>(),
            config: v3_1::IgnitionConfig {
                merge: ignition
                    .config
                    .merge
                    .into_iter()
                    .map(config_resource)
                    .collect(),
                replace: config_resource(ignition.config.replace),
            },
            proxy: v3_1::Proxy::default(),
            security: v3_1::Security {
                tls: v3_1::Tls {
                    certificate_authorities: ignition
                        .security
                        .tls
                        .certificate_authorities
                        .into_iter()
                        .map(|ca| v3_1::Resource {
                            source: Some(ca.source),
                            verification: ca.verification,
                            ..Default::default()
                        })
                        .collect(),
                },
            },
            timeouts: ignition.timeouts,
        },
        passwd,
        storage: v3_1::Storage {
            directories: storage.directories,
            disks: storage.disks,
            files: storage
                .files
                .into_iter()
                .map(|file| v3_1::File {
                    node: file.node,
                    append: file.append.into_iter().map(contents_resource).collect(),
                    contents: contents_resource(file.contents),
                    mode: file.mode,
                })
                .collect(),
            filesystems: storage
                .filesystems
                .into_iter()
                .map(|fs| v3_1::Filesystem {
                    device: fs.device,
                    format: fs.format,
                    label: fs.label,
                    mount_options: Vec::new(),
                    options: fs.options,
                    path: fs.path,
                    uuid: fs.uuid,
                    wipe_filesystem: fs.wipe_filesystem,
                })
                .collect(),
            links: storage.links,
            raid: storage.raid,
        },
        systemd,
    }
}

/// 3.2 adds LUKS volumes, partition resizing and `shouldExist` for users and
/// groups.
pub fn v3_1_to_v3_2(config: v3_1::Config) -> v3_2::Config {
    let v3_1::Config {
        mut ignition,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v3_2::Config>();

    v3_2::Config {
        ignition,
        passwd: v3_2::Passwd {
            users: passwd
                .users
                .into_iter()
                .map(|user| v3_2::PasswdUser {
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
                    should_exist: None,
                    system: user.system,
                })
                .collect(),
            groups: passwd
                .groups
                .into_iter()
                .map(|group| v3_2::PasswdGroup {
                    name: group.name,
                    gid: group.gid,
                    password_hash: group.password_hash,
                    should_exist: None,
                    system: group.system,
                })
                .collect(),
        },
        storage: v3_2::Storage {
            directories: storage.directories,
            disks: storage
                .disks
                .into_iter()
                .map(|disk| v3_2::Disk {
                    device: disk.device,
                    partitions: disk
                        .partitions
                        .into_iter()
                        .map(|partition| v3_2::Partition {
                            guid: partition.guid,
                            label: partition.label,
                            number: partition.number,
                            resize: None,
                            should_exist: partition.should_exist,
                            size_mib: partition.size_mib,
                            start_mib: partition.start_mib,
                            type_guid: partition.type_guid,
                            wipe_partition_entry: partition.wipe_partition_entry,
                        })
                        .collect(),
                    wipe_table: disk.wipe_table,
                })
                .collect(),
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage.links,
            luks: Vec::new(),
            raid: storage.raid,
        },
        systemd,
    }
}

/// 3.3 adds kernel arguments, makes RAID levels and link targets optional
/// and accepts the `none` filesystem format.
pub fn v3_2_to_v3_3(config: v3_2::Config) -> v3_3::Config {
    let v3_2::Config {
        mut ignition,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v3_3::Config>();

    v3_3::Config {
        ignition,
        kernel_arguments: v3_3::KernelArguments::default(),
        passwd,
        storage: v3_3::Storage {
            directories: storage.directories,
            disks: storage.disks,
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage
                .links
                .into_iter()
                .map(|link| v3_3::Link {
                    node: link.node,
                    hard: link.hard,
                    target: Some(link.target),
                })
                .collect(),
            luks: storage.luks,
            raid: storage
                .raid
                .into_iter()
                .map(|array| v3_3::Raid {
                    name: array.name,
                    level: Some(array.level),
                    devices: array.devices,
                    spares: array.spares,
                    options: array.options,
                })
                .collect(),
        },
        systemd,
    }
}

/// 3.4 adds offline Tang provisioning, LUKS discard and open options.
pub fn v3_3_to_v3_4(config: v3_3::Config) -> v3_4::Config {
    let v3_3::Config {
        mut ignition,
        kernel_arguments,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v3_4::Config>();

    v3_4::Config {
        ignition,
        kernel_arguments,
        passwd,
        storage: v3_4::Storage {
            directories: storage.directories,
            disks: storage.disks,
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage.links,
            luks: storage
                .luks
                .into_iter()
                .map(|luks| v3_4::Luks {
                    clevis: v3_4::Clevis {
                        custom: luks.clevis.custom,
                        tang: luks
                            .clevis
                            .tang
                            .into_iter()
                            .map(|tang| v3_4::Tang {
                                advertisement: None,
                                thumbprint: tang.thumbprint,
                                url: tang.url,
                            })
                            .collect(),
                        threshold: luks.clevis.threshold,
                        tpm2: luks.clevis.tpm2,
                    },
                    device: luks.device,
                    discard: None,
                    key_file: luks.key_file,
                    label: luks.label,
                    name: luks.name,
                    open_options: Vec::new(),
                    options: luks.options,
                    uuid: luks.uuid,
                    wipe_volume: luks.wipe_volume,
                })
                .collect(),
            raid: storage.raid,
        },
        systemd,
    }
}

pub fn check_v3_2(config: &v3_2::Config) -> Result<()> {
    ensure_valid(config, false)?;
    let version = v3_1::Config::VERSION;

    gate::ensure_unused(!config.storage.luks.is_empty(), Feature::Luks, version)?;
    gate::ensure_unused(
        config
            .storage
            .disks
            .iter()
            .flat_map(|disk| &disk.partitions)
            .any(|partition| partition.resize == Some(true)),
        Feature::PartitionResize,
        version,
    )?;
    gate::ensure_unused(
        config
            .passwd
            .users
            .iter()
            .any(|user| user.should_exist == Some(false)),
        Feature::UserShouldExist,
        version,
    )?;
    gate::ensure_unused(
        config
            .passwd
            .groups
            .iter()
            .any(|group| group.should_exist == Some(false)),
        Feature::GroupShouldExist,
        version,
    )?;
    Ok(())
}

#[instrument(skip_all)]
pub fn v3_2_to_v3_1(config: v3_2::Config) -> Result<v3_1::Config> {
    check_v3_2(&config)?;

    let v3_2::Config {
        mut ignition,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v3_1::Config>();

    Ok(v3_1::Config {
        ignition,
        passwd: v3_1::Passwd {
            users: passwd
                .users
                .into_iter()
                .map(|user| v3_1::PasswdUser {
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
                .map(|group| v3_1::PasswdGroup {
                    name: group.name,
                    gid: group.gid,
                    password_hash: group.password_hash,
                    system: group.system,
                })
                .collect(),
        },
        storage: v3_1::Storage {
            directories: storage.directories,
            disks: storage
                .disks
                .into_iter()
                .map(|disk| v3_1::Disk {
                    device: disk.device,
                    partitions: disk
                        .partitions
                        .into_iter()
                        .map(|partition| v3_1::Partition {
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
                .collect(),
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage.links,
            raid: storage.raid,
        },
        systemd,
    })
}

pub fn check_v3_3(config: &v3_3::Config) -> Result<()> {
    ensure_valid(config, false)?;
    let version = v3_2::Config::VERSION;

    gate::ensure_unused(
        !config.kernel_arguments.is_empty(),
        Feature::KernelArguments,
        version,
    )?;
    gate::ensure_unused(
        config.storage.raid.iter().any(|array| array.level.is_none()),
        Feature::RaidWithoutLevel,
        version,
    )?;
    gate::ensure_unused(
        config.storage.links.iter().any(|link| link.target.is_none()),
        Feature::LinkWithoutTarget,
        version,
    )?;
    gate::ensure_unused(
        config
            .storage
            .filesystems
            .iter()
            .any(|fs| fs.format.as_deref() == Some("none")),
        Feature::NoneFormat,
        version,
    )?;
    Ok(())
}

#[instrument(skip_all)]
pub fn v3_3_to_v3_2(config: v3_3::Config) -> Result<v3_2::Config> {
    check_v3_3(&config)?;

    let v3_3::Config {
        mut ignition,
        passwd,
        storage,
        systemd,
        kernel_arguments: _,
    } = config;
    ignition.version = version_of::<v3_2::Config>();

    Ok(v3_2::Config {
        ignition,
        passwd,
        storage: v3_2::Storage {
            directories: storage.directories,
            disks: storage.disks,
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage
                .links
                .into_iter()
                .map(|link| v3_2::Link {
                    node: link.node,
                    hard: link.hard,
                    target: link.target.unwrap_or_default(),
                })
                .collect(),
            luks: storage.luks,
            raid: storage
                .raid
                .into_iter()
                .map(|array| v3_2::Raid {
                    name: array.name,
                    level: array.level.unwrap_or_default(),
                    devices: array.devices,
                    spares: array.spares,
                    options: array.options,
                })
                .collect(),
        },
        systemd,
    })
}

pub fn check_v3_4(config: &v3_4::Config) -> Result<()> {
    ensure_valid(config, false)?;
    let version = v3_3::Config::VERSION;
    let luks = &config.storage.luks;

    gate::ensure_unused(
        luks.iter()
            .flat_map(|luks| &luks.clevis.tang)
            .any(|tang| tang.advertisement.is_some()),
        Feature::TangOfflineProvisioning,
        version,
    )?;
    gate::ensure_unused(
        luks.iter().any(|luks| luks.discard == Some(true)),
        Feature::LuksDiscard,
        version,
    )?;
    gate::ensure_unused(
        luks.iter().any(|luks| !luks.open_options.is_empty()),
        Feature::LuksOpenOptions,
        version,
    )?;
    gate::ensure_unused(
        config
            .storage
            .files
            .iter()
            .map(|file| file.mode)
            .chain(config.storage.directories.iter().map(|directory| directory.mode))
            .any(gate::has_special_bits),
        Feature::SpecialModeBits,
        version,
    )?;

    let ignition = &config.ignition;
    let mut resources = ignition
        .config
        .merge
        .iter()
        .chain([&ignition.config.replace])
        .chain(&ignition.security.tls.certificate_authorities)
        .chain(
            config
                .storage
                .files
                .iter()
                .flat_map(|file| std::iter::once(&file.contents).chain(&file.append)),
        )
        .chain(luks.iter().map(|luks| &luks.key_file));
    gate::ensure_unused(
        resources.any(|resource| gate::is_arn(resource.source.as_deref())),
        Feature::ArnSource,
        version,
    )?;
    Ok(())
}

#[instrument(skip_all)]
pub fn v3_4_to_v3_3(config: v3_4::Config) -> Result<v3_3::Config> {
    check_v3_4(&config)?;

    let v3_4::Config {
        mut ignition,
        kernel_arguments,
        passwd,
        storage,
        systemd,
    } = config;
    ignition.version = version_of::<v3_3::Config>();

    Ok(v3_3::Config {
        ignition,
        kernel_arguments,
        passwd,
        storage: v3_3::Storage {
            directories: storage.directories,
            disks: storage.disks,
            files: storage.files,
            filesystems: storage.filesystems,
            links: storage.links,
            luks: storage
                .luks
                .into_iter()
                .map(|luks| v3_3::Luks {
                    clevis: v3_3::Clevis {
                        custom: luks.clevis.custom,
                        tang: luks
                            .clevis
                            .tang
                            .into_iter()
                            .map(|tang| v3_3::Tang {
                                thumbprint: tang.thumbprint,
                                url: tang.url,
                            })
                            .collect(),
                        threshold: luks.clevis.threshold,
                        tpm2: luks.clevis.tpm2,
                    },
                    device: luks.device,
                    key_file: luks.key_file,
                    label: luks.label,
                    name: luks.name,
                    options: luks.options,
                    uuid: luks.uuid,
                    wipe_volume: luks.wipe_volume,
                })
                .collect(),
            raid: storage.raid,
        },
        systemd,
    })
}

fn config_resource(reference: v3_0::ConfigReference) -> v3_1::Resource {
    v3_1::Resource {
        source: reference.source,
        verification: reference.verification,
        ..Default::default()
    }
}

fn contents_resource(contents: v3_0::FileContents) -> v3_1::Resource {
    v3_1::Resource {
        compression: contents.compression,
        source: contents.source,
        verification: contents.verification,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    fn parse<C: VersionedConfig>(raw: &str) -> C {
        ign_config::parse::<C>(raw.as_bytes())
            .expect("fixture is valid")
            .0
    }

    #[test]
    fn upgrade_moves_references_into_resources() {
        let config: v3_0::Config = parse(indoc! {r#"
            {
              "ignition": {
                "version": "3.0.0",
                "config": {"merge": [{"source": "https://example.com/extra.ign"}]},
                "security": {"tls": {"certificateAuthorities": [{"source": "https://example.com/ca.pem"}]}}
              },
              "storage": {
                "files": [{"path": "/etc/motd", "append": [{"source": "data:,hello", "compression": "gzip"}]}]
              }
            }
        "#});

        let upgraded = v3_0_to_v3_1(config);

        assert_eq!(upgraded.ignition.version, "3.1.0");
        assert_eq!(
            upgraded.ignition.config.merge[0].source.as_deref(),
            Some("https://example.com/extra.ign")
        );
        assert_eq!(
            upgraded.ignition.security.tls.certificate_authorities[0]
                .source
                .as_deref(),
            Some("https://example.com/ca.pem")
        );
        assert_eq!(
            upgraded.storage.files[0].append[0].compression.as_deref(),
            Some("gzip")
        );
        assert!(upgraded.storage.files[0].append[0].http_headers.is_empty());
    }

    #[test]
    fn upgrade_fills_optional_targets() {
        let config: v3_2::Config = parse(indoc! {r#"
            {
              "ignition": {"version": "3.2.0"},
              "storage": {
                "links": [{"path": "/etc/localtime", "target": "/usr/share/zoneinfo/UTC"}],
                "raid": [{"name": "md0", "level": "raid1", "devices": ["/dev/sdb", "/dev/sdc"]}]
              }
            }
        "#});

        let upgraded = v3_3_to_v3_4(v3_2_to_v3_3(config));

        assert_eq!(upgraded.ignition.version, "3.4.0");
        assert_eq!(
            upgraded.storage.links[0].target.as_deref(),
            Some("/usr/share/zoneinfo/UTC")
        );
        assert_eq!(upgraded.storage.raid[0].level.as_deref(), Some("raid1"));
    }

    #[test]
    fn downgrade_drops_values_older_versions_imply() {
        let config: v3_2::Config = parse(indoc! {r#"
            {
              "ignition": {"version": "3.2.0"},
              "passwd": {"users": [{"name": "core", "shouldExist": true}]},
              "storage": {"disks": [{"device": "/dev/sda", "partitions": [{"number": 1, "resize": false}]}]}
            }
        "#});

        let downgraded = v3_2_to_v3_1(config).expect("no 3.2 only feature is in use");

        assert_eq!(downgraded.ignition.version, "3.1.0");
        assert_eq!(downgraded.passwd.users[0].name, "core");
        assert_eq!(downgraded.storage.disks[0].partitions[0].number, 1);
    }

    #[rstest]
    #[case::luks(
        r#"{"ignition": {"version": "3.2.0"}, "storage": {"luks": [{"name": "data", "device": "/dev/sdb"}]}}"#,
        "LUKS is not supported on spec 3.1.0"
    )]
    #[case::resize(
        r#"{"ignition": {"version": "3.2.0"}, "storage": {"disks": [{"device": "/dev/sda", "partitions": [{"number": 1, "resize": true}]}]}}"#,
        "Resize in Storage.Disks.Partitions is not supported on spec 3.1.0"
    )]
    #[case::user_should_exist(
        r#"{"ignition": {"version": "3.2.0"}, "passwd": {"users": [{"name": "core", "shouldExist": false}]}}"#,
        "ShouldExist in Passwd.Users is not supported on spec 3.1.0"
    )]
    #[case::group_should_exist(
        r#"{"ignition": {"version": "3.2.0"}, "passwd": {"groups": [{"name": "wheel", "shouldExist": false}]}}"#,
        "ShouldExist in Passwd.Groups is not supported on spec 3.1.0"
    )]
    fn v3_2_gates(#[case] raw: &str, #[case] expected: &str) {
        let err = v3_2_to_v3_1(parse(raw)).expect_err("feature is not expressible");
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case::kernel_arguments(
        r#"{"ignition": {"version": "3.3.0"}, "kernelArguments": {"shouldExist": ["quiet"]}}"#,
        "KernelArguments is not supported on spec 3.2.0"
    )]
    #[case::raid_level(
        r#"{"ignition": {"version": "3.3.0"}, "storage": {"raid": [{"name": "md0", "devices": ["/dev/sdb"]}]}}"#,
        "Raid without Level in Storage.Raid is not supported on spec 3.2.0"
    )]
    #[case::link_target(
        r#"{"ignition": {"version": "3.3.0"}, "storage": {"links": [{"path": "/etc/localtime"}]}}"#,
        "Link without Target in Storage.Links is not supported on spec 3.2.0"
    )]
    #[case::none_format(
        r#"{"ignition": {"version": "3.3.0"}, "storage": {"filesystems": [{"device": "/dev/sdb1", "format": "none"}]}}"#,
        "Format none in Storage.Filesystems is not supported on spec 3.2.0"
    )]
    fn v3_3_gates(#[case] raw: &str, #[case] expected: &str) {
        let err = v3_3_to_v3_2(parse(raw)).expect_err("feature is not expressible");
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    #[case::advertisement(
        r#"{"ignition": {"version": "3.4.0"}, "storage": {"luks": [{"name": "data", "clevis": {"tang": [{"url": "https://tang.example.com", "advertisement": "{}"}]}}]}}"#,
        "tang offline provisioning is not supported on spec 3.3.0"
    )]
    #[case::discard(
        r#"{"ignition": {"version": "3.4.0"}, "storage": {"luks": [{"name": "data", "discard": true}]}}"#,
        "luks discard is not supported on spec 3.3.0"
    )]
    #[case::open_options(
        r#"{"ignition": {"version": "3.4.0"}, "storage": {"luks": [{"name": "data", "openOptions": ["--allow-discards"]}]}}"#,
        "luks openOptions is not supported on spec 3.3.0"
    )]
    #[case::special_mode(
        r#"{"ignition": {"version": "3.4.0"}, "storage": {"directories": [{"path": "/tmp/shared", "mode": 1023}]}}"#,
        "Mode with setuid/setgid/sticky bits is not supported on spec 3.3.0"
    )]
    #[case::arn(
        r#"{"ignition": {"version": "3.4.0"}, "storage": {"files": [{"path": "/etc/motd", "contents": {"source": "arn:aws:s3:::bucket/motd"}}]}}"#,
        "arn: scheme for s3 is not supported on spec 3.3.0"
    )]
    fn v3_4_gates(#[case] raw: &str, #[case] expected: &str) {
        let err = v3_4_to_v3_3(parse(raw)).expect_err("feature is not expressible");
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn downgrade_rejects_invalid_input() {
        let config = v3_3::Config {
            ignition: v3_3::Ignition {
                version: "3.3.0".to_owned(),
                ..Default::default()
            },
            storage: v3_3::Storage {
                filesystems: vec![v3_3::Filesystem {
                    device: "/dev/sdb1".to_owned(),
                    format: Some("zfs".to_owned()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        };

        let err = v3_3_to_v3_2(config).expect_err("format is unknown");

        assert_eq!(
            err.to_string(),
            "invalid input config:\nerror at $.storage.filesystems.0.format: invalid filesystem format\n"
        );
    }

    #[test]
    fn empty_configs_pass_every_step() {
        let v3_4 = v3_3_to_v3_4(v3_2_to_v3_3(v3_1_to_v3_2(v3_0_to_v3_1(
            v3_0::Config::default(),
        ))));
        assert_eq!(v3_4.ignition.version, "3.4.0");

        let v3_1 = v3_4_to_v3_3(v3_4)
            .and_then(v3_3_to_v3_2)
            .and_then(v3_2_to_v3_1)
            .expect("empty config uses no feature");
        assert_eq!(v3_1, v3_1::Config {
            ignition: v3_1::Ignition {
                version: "3.1.0".to_owned(),
                ..Default::default()
            },
            ..Default::default()
        });
    }
}
