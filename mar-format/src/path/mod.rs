use std::{
    ffi::OsStr,
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoMarPathError;

#[cfg(not(windows))]
/// The platform-specific separator as a string, used for printing `MarPath`s
/// in the platform-preferred manner.
pub const PATH_PLATFORM_SEP: &str = "/";

#[cfg(windows)]
/// The platform-specific separator as a string, used for printing `MarPath`s
/// in the platform-preferred manner.
pub const PATH_PLATFORM_SEP: &str = "\\";

/// The separator used in `MarPath` type paths, on every platform.
pub const PATH_MAR_SEP: u8 = b'/';

/// The longest path a record header can describe: the low 15 bits of `pathLen`.
pub const MAX_PATH_LEN: usize = 0x7fff;

/// A record path: relative, `/`-delimited raw bytes with no `..` segment and
/// at most `MAX_PATH_LEN` bytes long.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MarPath(pub(crate) Vec<u8>);

#[inline(always)]
fn is_sep(b: u8) -> bool {
    b == PATH_MAR_SEP || (cfg!(windows) && b == b'\\')
}

#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Result<&[u8], IntoMarPathError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(s.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Result<&[u8], IntoMarPathError> {
    s.to_str()
        .map(str::as_bytes)
        .ok_or(IntoMarPathError::UnrepresentableStr)
}

#[cfg(unix)]
pub(crate) fn bytes_to_path_buf(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
pub(crate) fn bytes_to_path_buf(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).as_ref())
}

pub(crate) fn validate(bytes: &[u8]) -> Result<(), IntoMarPathError> {
    if bytes.is_empty() {
        return Err(IntoMarPathError::EmptyPath);
    }
    if bytes.len() > MAX_PATH_LEN {
        return Err(IntoMarPathError::TooLong(bytes.len()));
    }
    if bytes[0] == PATH_MAR_SEP {
        return Err(IntoMarPathError::Absolute);
    }
    if cfg!(windows) && bytes.iter().any(|b| *b == b'\\' || *b == b':') {
        return Err(IntoMarPathError::Absolute);
    }
    if bytes.contains(&0) {
        return Err(IntoMarPathError::NulByte);
    }
    if bytes.split(|b| *b == PATH_MAR_SEP).any(|s| s == b"..") {
        return Err(IntoMarPathError::ParentDir);
    }
    if bytes
        .split(|b| *b == PATH_MAR_SEP)
        .all(|s| s.is_empty() || s == b".")
    {
        return Err(IntoMarPathError::EmptyPath);
    }
    Ok(())
}

impl MarPath {
    /// Builds a record path from a relative filesystem path. `.` segments are
    /// dropped; `..` segments and absolute paths are refused.
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<MarPath, IntoMarPathError> {
        let mut out: Vec<&[u8]> = vec![];

        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => return Err(IntoMarPathError::ParentDir),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(IntoMarPathError::Absolute)
                }
                Component::Normal(os_str) => out.push(os_bytes(os_str)?),
            }
        }

        MarPath::from_bytes(out.join(&PATH_MAR_SEP))
    }

    /// Validates raw bytes as they appear in a record.
    pub fn from_bytes(bytes: Vec<u8>) -> std::result::Result<MarPath, IntoMarPathError> {
        validate(&bytes)?;
        Ok(MarPath(bytes))
    }

    /// Appends one directory entry name, producing a new path.
    pub fn join(&self, name: &OsStr) -> std::result::Result<MarPath, IntoMarPathError> {
        let name = os_bytes(name)?;
        let mut bytes = Vec::with_capacity(self.0.len() + 1 + name.len());
        bytes.extend_from_slice(&self.0);
        bytes.push(PATH_MAR_SEP);
        bytes.extend_from_slice(name);
        MarPath::from_bytes(bytes)
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The meaningful segments, skipping empty and `.` ones.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.0
            .split(|b| *b == PATH_MAR_SEP)
            .filter(|s| !s.is_empty() && *s != b".")
    }

    pub fn to_path_buf(&self) -> PathBuf {
        let mut out = PathBuf::new();
        for segment in self.iter() {
            out.push(bytes_to_path_buf(segment));
        }
        out
    }

    /// Where this path lands when extracted below `root`.
    pub fn resolve_under(&self, root: &Path) -> PathBuf {
        root.join(self.to_path_buf())
    }
}

impl fmt::Display for MarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.split(|b| *b == PATH_MAR_SEP);
        if let Some(v) = iter.next() {
            f.write_str(&String::from_utf8_lossy(v))?;
        }
        for v in iter {
            f.write_str(PATH_PLATFORM_SEP)?;
            f.write_str(&String::from_utf8_lossy(v))?;
        }
        Ok(())
    }
}

/// A root argument handed to the archive writer, split into the path used to
/// reach it on disk and the relative path recorded for it in the archive.
#[derive(Debug, Clone)]
pub struct RootPath {
    /// The argument with trailing separators removed.
    pub fs_path: PathBuf,
    /// `None` when the root is the current directory itself, in which case its
    /// contents are recorded at the top level of the archive.
    pub archived: Option<MarPath>,
    /// How many leading separators were stripped to make the path relative.
    pub path_start_index: usize,
}

impl RootPath {
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<RootPath, IntoMarPathError> {
        let raw = os_bytes(path.as_ref().as_os_str())?;
        if raw.is_empty() {
            return Err(IntoMarPathError::EmptyPath);
        }
        if raw.split(|b| is_sep(*b)).any(|s| s == b"..") {
            return Err(IntoMarPathError::ParentDir);
        }

        let path_start_index = raw.iter().take_while(|b| is_sep(**b)).count();
        let rest = &raw[path_start_index..];
        if rest.is_empty() {
            // Nothing but separators: the filesystem root.
            return Err(IntoMarPathError::EmptyPath);
        }

        let trailing = rest.iter().rev().take_while(|b| is_sep(**b)).count();
        let rest = &rest[..rest.len() - trailing];
        let fs_path = bytes_to_path_buf(&raw[..path_start_index + rest.len()]);

        let segments = rest
            .split(|b| is_sep(*b))
            .filter(|s| !s.is_empty() && *s != b".")
            .collect::<Vec<_>>();

        let archived = if segments.is_empty() {
            None
        } else {
            Some(MarPath::from_bytes(segments.join(&PATH_MAR_SEP))?)
        };

        Ok(RootPath {
            fs_path,
            archived,
            path_start_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_drops_cur_dir() {
        let mar_path = MarPath::new("./something/./foo.txt").unwrap();
        assert_eq!(mar_path.as_bytes(), b"something/foo.txt");
    }

    #[test]
    fn new_rejects_parent_dir() {
        assert_eq!(
            MarPath::new("something/../foo.txt"),
            Err(IntoMarPathError::ParentDir)
        );
    }

    #[test]
    fn new_rejects_absolute() {
        assert_eq!(MarPath::new("/etc/passwd"), Err(IntoMarPathError::Absolute));
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(MarPath::new(""), Err(IntoMarPathError::EmptyPath));
        assert_eq!(MarPath::new("."), Err(IntoMarPathError::EmptyPath));
    }

    #[test]
    fn from_bytes_validation() {
        assert!(MarPath::from_bytes(b"a/b".to_vec()).is_ok());
        assert!(MarPath::from_bytes(b"a/..b/c".to_vec()).is_ok());
        assert_eq!(
            MarPath::from_bytes(b"../evil".to_vec()),
            Err(IntoMarPathError::ParentDir)
        );
        assert_eq!(
            MarPath::from_bytes(b"a/../../evil".to_vec()),
            Err(IntoMarPathError::ParentDir)
        );
        assert_eq!(
            MarPath::from_bytes(b"/evil".to_vec()),
            Err(IntoMarPathError::Absolute)
        );
        assert_eq!(
            MarPath::from_bytes(b"a\0b".to_vec()),
            Err(IntoMarPathError::NulByte)
        );
        assert_eq!(
            MarPath::from_bytes(b"./.".to_vec()),
            Err(IntoMarPathError::EmptyPath)
        );
    }

    #[test]
    fn length_boundary() {
        assert!(MarPath::from_bytes(vec![b'x'; MAX_PATH_LEN]).is_ok());
        assert_eq!(
            MarPath::from_bytes(vec![b'x'; MAX_PATH_LEN + 1]),
            Err(IntoMarPathError::TooLong(MAX_PATH_LEN + 1))
        );
    }

    #[test]
    fn join_checks_length() {
        let base = MarPath::from_bytes(vec![b'x'; MAX_PATH_LEN - 2]).unwrap();
        assert!(base.join(OsStr::new("y")).is_ok());
        assert_eq!(
            base.join(OsStr::new("yz")),
            Err(IntoMarPathError::TooLong(MAX_PATH_LEN + 1))
        );
    }

    #[test]
    fn resolve_skips_dot_segments() {
        let mar_path = MarPath::from_bytes(b"a/./b//c".to_vec()).unwrap();
        assert_eq!(
            mar_path.resolve_under(Path::new("out")),
            Path::new("out").join("a").join("b").join("c")
        );
    }

    #[test]
    fn root_strips_leading_and_trailing() {
        let root = RootPath::new("///tmp/data//").unwrap();
        assert_eq!(root.path_start_index, 3);
        assert_eq!(root.fs_path, PathBuf::from("///tmp/data"));
        assert_eq!(root.archived.unwrap().as_bytes(), b"tmp/data");
    }

    #[test]
    fn root_of_filesystem_is_refused() {
        assert_eq!(RootPath::new("/").unwrap_err(), IntoMarPathError::EmptyPath);
        assert_eq!(RootPath::new("///").unwrap_err(), IntoMarPathError::EmptyPath);
        assert_eq!(RootPath::new("").unwrap_err(), IntoMarPathError::EmptyPath);
    }

    #[test]
    fn root_with_parent_dir_is_refused() {
        assert_eq!(
            RootPath::new("a/../b").unwrap_err(),
            IntoMarPathError::ParentDir
        );
        assert_eq!(RootPath::new("..").unwrap_err(), IntoMarPathError::ParentDir);
    }

    #[test]
    fn root_dot_dot_in_name_is_fine() {
        let root = RootPath::new("a/b..c").unwrap();
        assert_eq!(root.archived.unwrap().as_bytes(), b"a/b..c");
    }

    #[test]
    fn current_dir_root_has_no_record_path() {
        let root = RootPath::new("./").unwrap();
        assert_eq!(root.fs_path, PathBuf::from("."));
        assert!(root.archived.is_none());
    }
}
