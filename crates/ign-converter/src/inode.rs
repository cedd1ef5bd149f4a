//! Detects 2.x configs whose nodes collapse onto the same absolute path once
//! their filesystems are resolved, or which place nodes below a link the
//! config itself creates.
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use ign_config::v2_2::{Filesystem, Node};
use snafu::{OptionExt, Snafu, ensure};

use crate::fsmap::FsMap;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("config defined filesystem {name:?} but no mapping was defined"))]
    NoFilesystem { name: String },

    #[snafu(display("config has conflicting inodes: {old:?} and {new:?}"))]
    DuplicateInode { old: String, new: String },

    #[snafu(display("{name} uses link in config {link_path:?}"))]
    UsesOwnLink { name: String, link_path: String },
}

#[derive(Clone, Copy, Debug, strum::Display)]
enum NodeKind {
    File,
    Directory,
    Link,
}

/// Checks that every filesystem is mapped and that no two nodes resolve to
/// the same absolute path.
///
/// `fs_map` must already contain the `root` entry.
pub fn check<'a>(
    filesystems: impl IntoIterator<Item = &'a Filesystem>,
    files: impl IntoIterator<Item = &'a Node>,
    directories: impl IntoIterator<Item = &'a Node>,
    links: impl IntoIterator<Item = &'a Node>,
    fs_map: &FsMap,
) -> Result<(), Error> {
    for filesystem in filesystems {
        ensure!(
            fs_map.contains(&filesystem.name),
            NoFilesystemSnafu {
                name: &filesystem.name
            }
        );
    }

    let links: Vec<&Node> = links.into_iter().collect();
    let link_paths = links
        .iter()
        .map(|node| resolve(node, fs_map))
        .collect::<Result<BTreeSet<_>, _>>()?;

    let nodes = files
        .into_iter()
        .map(|node| (NodeKind::File, node))
        .chain(directories.into_iter().map(|node| (NodeKind::Directory, node)))
        .chain(links.into_iter().map(|node| (NodeKind::Link, node)));

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (kind, node) in nodes {
        let path = resolve(node, fs_map)?;
        let description = format!("{kind}: {path}");

        if let Some(link_path) = Path::new(&path)
            .ancestors()
            .skip(1)
            .filter_map(Path::to_str)
            .find(|ancestor| link_paths.contains(*ancestor))
        {
            return UsesOwnLinkSnafu {
                name: description,
                link_path,
            }
            .fail();
        }

        if let Some(old) = seen.get(&path) {
            return DuplicateInodeSnafu {
                old: old.clone(),
                new: description,
            }
            .fail();
        }
        seen.insert(path, description);
    }

    Ok(())
}

fn resolve(node: &Node, fs_map: &FsMap) -> Result<String, Error> {
    fs_map
        .resolve(&node.filesystem, &node.path)
        .context(NoFilesystemSnafu {
            name: &node.filesystem,
        })
}

#[cfg(test)]
mod tests {
    use ign_config::v2_2::Mount;
    use rstest::rstest;

    use super::*;

    fn node(filesystem: &str, path: &str) -> Node {
        Node {
            filesystem: filesystem.to_owned(),
            path: path.to_owned(),
            ..Default::default()
        }
    }

    fn filesystem(name: &str) -> Filesystem {
        Filesystem {
            name: name.to_owned(),
            mount: Some(Mount {
                device: "/dev/sdb1".to_owned(),
                format: "ext4".to_owned(),
                ..Default::default()
            }),
            path: None,
        }
    }

    fn fs_map() -> FsMap {
        FsMap::from_iter([("var", "/var")]).with_root()
    }

    #[test]
    fn distinct_paths_pass() {
        let files = [node("var", "/varfile"), node("root", "/empty")];
        let directories = [node("root", "/rootdir")];
        let links = [node("root", "/rootlink")];

        check(
            &[filesystem("var")],
            &files,
            &directories,
            &links,
            &fs_map(),
        )
        .expect("no conflicts");
    }

    #[test]
    fn unmapped_declared_filesystem() {
        let err = check(&[filesystem("data")], &[], &[], &[], &fs_map())
            .expect_err("data is not mapped");

        assert_eq!(err, Error::NoFilesystem {
            name: "data".to_owned()
        });
        assert_eq!(
            err.to_string(),
            "config defined filesystem \"data\" but no mapping was defined"
        );
    }

    #[test]
    fn unmapped_node_filesystem() {
        let err = check(&[], &[node("data", "/x")], &[], &[], &fs_map())
            .expect_err("data is not mapped");

        assert_eq!(err, Error::NoFilesystem {
            name: "data".to_owned()
        });
    }

    #[rstest]
    #[case::file_and_directory(
        vec![node("root", "/var/x")],
        vec![node("var", "/x")],
        vec![],
        "File: /var/x",
        "Directory: /var/x"
    )]
    #[case::two_files(
        vec![node("var", "/a/../x"), node("root", "/var/x")],
        vec![],
        vec![],
        "File: /var/x",
        "File: /var/x"
    )]
    #[case::directory_and_link(
        vec![],
        vec![node("root", "/srv")],
        vec![node("root", "/srv/")],
        "Directory: /srv",
        "Link: /srv"
    )]
    fn duplicate_inodes(
        #[case] files: Vec<Node>,
        #[case] directories: Vec<Node>,
        #[case] links: Vec<Node>,
        #[case] old: &str,
        #[case] new: &str,
    ) {
        let err = check(&[], &files, &directories, &links, &fs_map())
            .expect_err("paths collide");

        assert_eq!(err, Error::DuplicateInode {
            old: old.to_owned(),
            new: new.to_owned()
        });
    }

    #[rstest]
    #[case::file(vec![node("root", "/foo/bar")], vec![], "File: /foo/bar")]
    #[case::directory(vec![], vec![node("var", "/../foo/baz/qux")], "Directory: /foo/baz/qux")]
    fn nodes_below_links(
        #[case] files: Vec<Node>,
        #[case] directories: Vec<Node>,
        #[case] name: &str,
    ) {
        let links = [node("root", "/foo")];
        let err = check(&[], &files, &directories, &links, &fs_map())
            .expect_err("node lives below a link");

        assert_eq!(err, Error::UsesOwnLink {
            name: name.to_owned(),
            link_path: "/foo".to_owned()
        });
        assert_eq!(
            err.to_string(),
            format!("{name} uses link in config \"/foo\"")
        );
    }

    #[test]
    fn link_below_link() {
        let links = [node("root", "/foo"), node("root", "/foo/bar")];
        let err = check(&[], &[], &[], &links, &fs_map()).expect_err("link lives below a link");

        assert_eq!(err, Error::UsesOwnLink {
            name: "Link: /foo/bar".to_owned(),
            link_path: "/foo".to_owned()
        });
    }

    #[test]
    fn sibling_with_common_prefix_is_not_nested() {
        let links = [node("root", "/foo")];
        let files = [node("root", "/foobar")];

        check(&[], &files, &[], &links, &fs_map()).expect("/foobar is not below /foo");
    }
}
