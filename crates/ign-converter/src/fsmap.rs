//! Mapping between 2.x filesystem names and 3.x mount paths.
//!
//! The mapping is read from a plain text file with one `<name> <path>` pair
//! per line.
use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use snafu::{ResultExt, Snafu, ensure};

/// The name 2.x configs use for the filesystem mounted at `/`.
pub const ROOT: &str = "root";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read filesystem mapping from {path:?}"))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("filesystem mapping line {line_number} is malformed: {line:?}"))]
    ParseLine { line_number: usize, line: String },

    #[snafu(display("filesystem mapping line {line_number} mounts {name:?} at relative path {path:?}"))]
    RelativePath {
        line_number: usize,
        name: String,
        path: String,
    },

    #[snafu(display("filesystem mapping line {line_number} maps {name:?} a second time"))]
    DuplicateName { line_number: usize, name: String },
}

/// Maps filesystem names to the absolute path they are mounted at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FsMap(BTreeMap<String, String>);

impl FsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).context(ReadFileSnafu { path })?;
        contents.parse()
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), path.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns a copy with `root` mapped to `/`, overriding any user entry.
    pub fn with_root(&self) -> Self {
        let mut fs_map = self.clone();
        fs_map.insert(ROOT, "/");
        fs_map
    }

    /// Resolves a path relative to the filesystem `name` into an absolute,
    /// lexically cleaned path.
    pub fn resolve(&self, name: &str, relative: &str) -> Option<String> {
        self.get(name).map(|mount| join_clean(mount, relative))
    }
}

impl FromStr for FsMap {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut fs_map = Self::new();

        for (index, line) in input.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split(' ').collect();
            ensure!(
                parts.len() == 2 && parts.iter().all(|part| !part.is_empty()),
                ParseLineSnafu {
                    line_number: index + 1,
                    line,
                }
            );
            let (name, path) = (parts[0], parts[1]);
            let line_number = index + 1;
            ensure!(
                path.starts_with('/'),
                RelativePathSnafu {
                    line_number,
                    name,
                    path,
                }
            );
            ensure!(!fs_map.contains(name), DuplicateNameSnafu { line_number, name });
            fs_map.insert(name, path);
        }

        Ok(fs_map)
    }
}

impl<N, P> FromIterator<(N, P)> for FsMap
where
    N: Into<String>,
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        )
    }
}

/// Joins `relative` onto `mount` below `/` and removes `.`, `..` and
/// repeated separators without touching the filesystem.
pub fn join_clean(mount: &str, relative: &str) -> String {
    let mut components: Vec<&str> = Vec::new();

    for component in Path::new(mount)
        .components()
        .chain(Path::new(relative).components())
    {
        match component {
            Component::Normal(part) => components.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => {
                components.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    format!("/{}", components.join("/"))
}

/// Splits an absolute path into the filesystem it lives on and the path
/// relative to that filesystem.
///
/// The longest mount path which is a component-wise prefix of `path` wins,
/// ties are broken by picking the lexicographically smallest name. Paths
/// outside every mount belong to [`ROOT`].
pub fn split_mount<'a>(path: &str, mounts: impl IntoIterator<Item = &'a str>) -> (String, String) {
    let target = Path::new(path);

    let best = mounts
        .into_iter()
        .filter(|mount| !mount.is_empty() && target.starts_with(mount))
        .min_by(|left, right| {
            let left_len = Path::new(left).components().count();
            let right_len = Path::new(right).components().count();
            right_len.cmp(&left_len).then_with(|| left.cmp(right))
        });

    let Some(mount) = best else {
        return (ROOT.to_owned(), path.to_owned());
    };

    let relative = match target.strip_prefix(mount) {
        Ok(rest) if rest.as_os_str().is_empty() => "/".to_owned(),
        Ok(rest) => format!("/{}", rest.to_string_lossy().trim_end_matches('/')),
        Err(_) => path.to_owned(),
    };

    (mount.to_owned(), relative)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;

    #[test]
    fn parse_mapping_file() {
        let fs_map: FsMap = indoc! {"
            var /var

            data /srv/data
        "}
        .parse()
        .expect("mapping is well formed");

        assert_eq!(fs_map.get("var"), Some("/var"));
        assert_eq!(fs_map.get("data"), Some("/srv/data"));
        assert_eq!(fs_map.get(ROOT), None);
    }

    #[rstest]
    #[case("var\n", 1, "var")]
    #[case("var /var\ndata /srv /data\n", 2, "data /srv /data")]
    #[case("var  /var", 1, "var  /var")]
    fn malformed_lines(#[case] input: &str, #[case] expected_line: usize, #[case] expected: &str) {
        let err = input.parse::<FsMap>().expect_err("line is malformed");
        assert!(
            matches!(&err, Error::ParseLine { line_number, line } if *line_number == expected_line && line == expected),
            "{err:?}"
        );
    }

    #[rstest]
    #[case("var var\n", 1, "var")]
    #[case("var /var\ndata srv/data\n", 2, "data")]
    fn relative_mount_paths(
        #[case] input: &str,
        #[case] expected_line: usize,
        #[case] expected: &str,
    ) {
        let err = input.parse::<FsMap>().expect_err("mount path is relative");
        assert!(
            matches!(&err, Error::RelativePath { line_number, name, .. } if *line_number == expected_line && name == expected),
            "{err:?}"
        );
    }

    #[test]
    fn duplicate_names() {
        let err = "var /var\ndata /srv\nvar /mnt/var\n"
            .parse::<FsMap>()
            .expect_err("name is mapped twice");
        assert!(
            matches!(&err, Error::DuplicateName { line_number: 3, name } if name == "var"),
            "{err:?}"
        );
        assert_eq!(
            err.to_string(),
            "filesystem mapping line 3 maps \"var\" a second time"
        );
    }

    #[test]
    fn read_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file can be created");
        std::io::Write::write_all(&mut file, b"var /var\n").expect("temp file is writable");

        let fs_map = FsMap::from_file(file.path()).expect("mapping is readable");
        assert_eq!(fs_map.get("var"), Some("/var"));
    }

    #[test]
    fn missing_file() {
        let err = FsMap::from_file("/nonexistent/fsmap").expect_err("file does not exist");
        assert!(matches!(err, Error::ReadFile { .. }), "{err:?}");
    }

    #[test]
    fn with_root_leaves_original_untouched() {
        let fs_map = FsMap::from_iter([("var", "/var")]);
        let rooted = fs_map.with_root();

        assert_eq!(rooted.get(ROOT), Some("/"));
        assert!(!fs_map.contains(ROOT));
    }

    #[rstest]
    #[case("/var", "/varfile", "/var/varfile")]
    #[case("/", "/empty", "/empty")]
    #[case("/var/", "lib//x", "/var/lib/x")]
    #[case("/var", "/../etc/passwd", "/etc/passwd")]
    #[case("/var", "/./a/./b/", "/var/a/b")]
    #[case("/", "/", "/")]
    fn join_and_clean(#[case] mount: &str, #[case] relative: &str, #[case] expected: &str) {
        assert_eq!(join_clean(mount, relative), expected);
    }

    #[rstest]
    #[case("/var/varfile", &["/var"], "/var", "/varfile")]
    #[case("/empty", &["/var"], ROOT, "/empty")]
    #[case("/var", &["/var"], "/var", "/")]
    #[case("/variable", &["/var"], ROOT, "/variable")]
    #[case("/var/lib/x", &["/var", "/var/lib"], "/var/lib", "/x")]
    #[case("/var/lib/x", &["/var/lib", "/var"], "/var/lib", "/x")]
    #[case("/srv/x", &["/srv/", "/srv"], "/srv", "/x")]
    fn split_into_mount(
        #[case] path: &str,
        #[case] mounts: &[&str],
        #[case] expected_fs: &str,
        #[case] expected_path: &str,
    ) {
        let (filesystem, relative) = split_mount(path, mounts.iter().copied());
        assert_eq!(filesystem, expected_fs);
        assert_eq!(relative, expected_path);
    }
}
