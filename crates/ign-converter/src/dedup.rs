//! Collapses repeated declarations in 2.x configs.
//!
//! 2.x allows the same file, unit or user to be declared several times and
//! applies them in order. 3.x rejects duplicates, so they are merged before
//! upgrading. Merged entries keep the position of their first declaration.
use ign_config::{
    v2_2::{Dropin, Node, PasswdUser, Unit},
    v2_3, v2_4,
};
use indexmap::IndexMap;

/// Merges duplicate files, systemd units and users. Applying it twice yields
/// the same config as applying it once.
pub trait Dedup {
    fn dedup(self) -> Self;
}

impl Dedup for v2_3::Config {
    fn dedup(mut self) -> Self {
        self.storage.files = dedup_files(self.storage.files, |file| &file.node);
        self.systemd.units = dedup_units(self.systemd.units);
        self.passwd.users = dedup_users(self.passwd.users);
        self
    }
}

impl Dedup for v2_4::Config {
    fn dedup(mut self) -> Self {
        self.storage.files = dedup_files(self.storage.files, |file| &file.node);
        self.systemd.units = dedup_units(self.systemd.units);
        self.passwd.users = dedup_users(self.passwd.users);
        self
    }
}

/// The last declaration of a `(filesystem, path)` pair replaces all earlier
/// ones.
fn dedup_files<F>(files: Vec<F>, node_of: impl Fn(&F) -> &Node) -> Vec<F> {
    let declared = files.len();
    let mut merged: IndexMap<(String, String), F> = IndexMap::new();

    for file in files {
        let node = node_of(&file);
        merged.insert((node.filesystem.clone(), node.path.clone()), file);
    }

    if merged.len() < declared {
        tracing::debug!(declared, merged = merged.len(), "merged duplicate files");
    }
    merged.into_values().collect()
}

/// Units sharing a name are merged into one unit, placed where the name is
/// first declared.
fn dedup_units(units: Vec<Unit>) -> Vec<Unit> {
    group_by_name(units, |unit| &unit.name)
        .into_values()
        .map(|declarations| merge_units(&declarations))
        .collect()
}

/// Users sharing a name are merged into one user, placed where the name is
/// first declared. Users declared in between keep following it.
fn dedup_users(users: Vec<PasswdUser>) -> Vec<PasswdUser> {
    group_by_name(users, |user| &user.name)
        .into_values()
        .map(|declarations| merge_users(&declarations))
        .collect()
}

fn group_by_name<T>(items: Vec<T>, name: impl Fn(&T) -> &String) -> IndexMap<String, Vec<T>> {
    let mut groups: IndexMap<String, Vec<T>> = IndexMap::new();
    for item in items {
        groups.entry(name(&item).clone()).or_default().push(item);
    }
    groups
}

fn merge_units(declarations: &[Unit]) -> Unit {
    let mut dropins: IndexMap<&str, &Dropin> = IndexMap::new();
    for declaration in declarations.iter().rev() {
        let local: IndexMap<&str, &Dropin> = declaration
            .dropins
            .iter()
            .map(|dropin| (dropin.name.as_str(), dropin))
            .collect();
        for (name, dropin) in local {
            dropins.entry(name).or_insert(dropin);
        }
    }

    Unit {
        name: declarations
            .first()
            .map(|unit| unit.name.clone())
            .unwrap_or_default(),
        enabled: newest(declarations, |unit| &unit.enabled),
        enable: newest(declarations, |unit| &unit.enable),
        mask: newest(declarations, |unit| &unit.mask),
        contents: newest_text(declarations, |unit| &unit.contents),
        dropins: dropins.into_values().cloned().collect(),
    }
}

fn merge_users(declarations: &[PasswdUser]) -> PasswdUser {
    PasswdUser {
        name: declarations
            .first()
            .map(|user| user.name.clone())
            .unwrap_or_default(),
        password_hash: newest_text(declarations, |user| &user.password_hash),
        ssh_authorized_keys: declarations
            .iter()
            .rev()
            .flat_map(|user| user.ssh_authorized_keys.iter().cloned())
            .collect(),
        uid: newest(declarations, |user| &user.uid),
        gecos: newest_text(declarations, |user| &user.gecos),
        home_dir: newest_text(declarations, |user| &user.home_dir),
        no_create_home: newest(declarations, |user| &user.no_create_home),
        primary_group: newest_text(declarations, |user| &user.primary_group),
        groups: declarations
            .iter()
            .rev()
            .map(|user| &user.groups)
            .find(|groups| !groups.is_empty())
            .cloned()
            .unwrap_or_default(),
        no_user_group: newest(declarations, |user| &user.no_user_group),
        no_log_init: newest(declarations, |user| &user.no_log_init),
        shell: newest_text(declarations, |user| &user.shell),
        system: newest(declarations, |user| &user.system),
        create: newest(declarations, |user| &user.create),
    }
}

/// The most recently declared value which is set.
fn newest<T, V: Clone>(declarations: &[T], field: impl Fn(&T) -> &Option<V>) -> Option<V> {
    declarations
        .iter()
        .rev()
        .find_map(|declaration| field(declaration).clone())
}

/// The most recently declared non-empty string, falling back to whatever the
/// most recent declaration holds.
fn newest_text<T>(declarations: &[T], field: impl Fn(&T) -> &Option<String>) -> Option<String> {
    declarations
        .iter()
        .rev()
        .find_map(|declaration| field(declaration).clone().filter(|value| !value.is_empty()))
        .or_else(|| declarations.last().and_then(|declaration| field(declaration).clone()))
}

#[cfg(test)]
mod tests {
    use ign_config::v2_4::{File, FileContents};

    use super::*;

    fn file(path: &str, source: &str) -> File {
        File {
            node: Node {
                filesystem: "root".to_owned(),
                path: path.to_owned(),
                ..Default::default()
            },
            contents: FileContents {
                source: Some(source.to_owned()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn unit(contents: &str, dropins: &[(&str, &str)]) -> Unit {
        Unit {
            name: "testUnit".to_owned(),
            contents: Some(contents.to_owned()),
            dropins: dropins
                .iter()
                .map(|(name, contents)| Dropin {
                    name: (*name).to_owned(),
                    contents: Some((*contents).to_owned()),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn user(name: &str, keys: &[&str]) -> PasswdUser {
        PasswdUser {
            name: name.to_owned(),
            ssh_authorized_keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            ..Default::default()
        }
    }

    fn config() -> v2_4::Config {
        let mut config = v2_4::Config::default();
        config.ignition.version = "2.4.0".to_owned();
        config.storage.files = vec![
            file("/etc/motd", "data:,old"),
            file("/etc/issue", "data:,issue"),
            file("/etc/motd", "data:,new"),
        ];
        config.systemd.units = vec![
            unit("old", &[("one", "old")]),
            unit("middle", &[("one", "new")]),
            unit("new", &[("two", "new")]),
        ];
        config.passwd.users = vec![
            user("testUser", &["one", "two"]),
            user("otherUser", &["other"]),
            user("testUser", &["three"]),
        ];
        config
    }

    #[test]
    fn last_file_declaration_wins() {
        let config = config().dedup();

        let sources: Vec<_> = config
            .storage
            .files
            .iter()
            .map(|file| (file.node.path.as_str(), file.contents.source.as_deref()))
            .collect();
        assert_eq!(sources, vec![
            ("/etc/motd", Some("data:,new")),
            ("/etc/issue", Some("data:,issue")),
        ]);
    }

    #[test]
    fn files_on_different_filesystems_are_kept() {
        let mut config = v2_4::Config::default();
        let mut var_file = file("/motd", "data:,var");
        var_file.node.filesystem = "var".to_owned();
        config.storage.files = vec![file("/motd", "data:,root"), var_file];

        assert_eq!(config.dedup().storage.files.len(), 2);
    }

    #[test]
    fn units_merge_dropins() {
        let config = config().dedup();

        assert_eq!(config.systemd.units.len(), 1);
        let unit = &config.systemd.units[0];
        assert_eq!(unit.name, "testUnit");
        assert_eq!(unit.contents.as_deref(), Some("new"));

        let dropins: Vec<_> = unit
            .dropins
            .iter()
            .map(|dropin| (dropin.name.as_str(), dropin.contents.as_deref()))
            .collect();
        assert_eq!(dropins, vec![("two", Some("new")), ("one", Some("new"))]);
    }

    #[test]
    fn merged_units_stay_at_first_declaration() {
        let mut other = unit("other", &[]);
        other.name = "other.service".to_owned();
        let mut config = v2_4::Config::default();
        config.systemd.units = vec![unit("old", &[]), other, unit("new", &[])];

        let names: Vec<_> = config
            .dedup()
            .systemd
            .units
            .iter()
            .map(|unit| (unit.name.clone(), unit.contents.clone()))
            .collect();
        assert_eq!(names, vec![
            ("testUnit".to_owned(), Some("new".to_owned())),
            ("other.service".to_owned(), Some("other".to_owned())),
        ]);
    }

    #[test]
    fn unit_contents_skip_empty_declarations() {
        let mut config = v2_4::Config::default();
        config.systemd.units = vec![unit("kept", &[]), unit("", &[])];
        config.systemd.units[1].mask = Some(false);

        let merged = &config.dedup().systemd.units[0];
        assert_eq!(merged.contents.as_deref(), Some("kept"));
        assert_eq!(merged.mask, Some(false));
    }

    #[test]
    fn users_concatenate_keys() {
        let config = config().dedup();

        let users: Vec<_> = config
            .passwd
            .users
            .iter()
            .map(|user| (user.name.as_str(), user.ssh_authorized_keys.clone()))
            .collect();
        assert_eq!(users, vec![
            ("testUser", vec!["three".to_owned(), "one".to_owned(), "two".to_owned()]),
            ("otherUser", vec!["other".to_owned()]),
        ]);
    }

    #[test]
    fn user_scalars_take_newest_value() {
        let mut first = user("core", &[]);
        first.uid = Some(1000);
        first.shell = Some("/bin/bash".to_owned());
        first.groups = vec!["wheel".to_owned()];
        let mut second = user("core", &[]);
        second.shell = Some(String::new());
        second.home_dir = Some("/home/core".to_owned());

        let mut config = v2_3::Config::default();
        config.passwd.users = vec![first, second];

        let merged = &config.dedup().passwd.users[0];
        assert_eq!(merged.uid, Some(1000));
        assert_eq!(merged.shell.as_deref(), Some("/bin/bash"));
        assert_eq!(merged.home_dir.as_deref(), Some("/home/core"));
        assert_eq!(merged.groups, vec!["wheel"]);
    }

    #[test]
    fn idempotent() {
        let once = config().dedup();
        let twice = once.clone().dedup();

        assert_eq!(once, twice);
    }
}
