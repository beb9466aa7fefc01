//! Path helpers
//!
//! Joining of URL path segments, splitting of object paths into directory
//! and name, and parsing of CLI path arguments (`profile/bucket/key`).

use std::fmt;

use crate::error::{Error, Result};

/// Join path segments with `/`.
///
/// Each segment is trimmed of leading and trailing slashes; segments that
/// end up empty are dropped.
pub fn build_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a path at its last `/` into (parent, name).
///
/// A path without a slash has an empty parent.
pub fn cut_path_and_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Reject paths with a `.` or `..` segment.
///
/// URLs resolve such segments away, so the request would land on a
/// different resource than the one named.
pub fn check_segments(path: &str) -> Result<()> {
    match path.split('/').find(|s| matches!(*s, "." | "..")) {
        Some(segment) => Err(Error::InvalidPath(format!(
            "'{path}' contains a '{segment}' segment, which cannot be addressed"
        ))),
        None => Ok(()),
    }
}

/// Address of one object inside a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocator {
    pub bucket: String,
    pub dir_path: String,
    pub name: String,
}

impl ObjectLocator {
    /// Build a locator from a bucket and the object's full path inside it
    pub fn parse(bucket: &str, full_path: &str) -> Result<Self> {
        if bucket.is_empty() {
            return Err(Error::InvalidPath("bucket name is empty".to_string()));
        }

        let trimmed = full_path.trim_matches('/');
        check_segments(trimmed)?;
        let (dir_path, name) = cut_path_and_name(trimmed);
        if name.is_empty() {
            return Err(Error::InvalidPath(format!(
                "'{full_path}' does not name an object"
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            dir_path: dir_path.to_string(),
            name: name.to_string(),
        })
    }

    /// Reassemble the full path inside the bucket
    pub fn full_path(&self) -> String {
        build_path(&[self.dir_path.as_str(), self.name.as_str()])
    }
}

/// A remote location given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub profile: String,
    pub bucket: String,
    /// Path inside the bucket, without leading slash
    pub key: String,
}

impl RemotePath {
    pub fn new(
        profile: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Final path component of the key
    pub fn name(&self) -> &str {
        cut_path_and_name(self.key.trim_end_matches('/')).1
    }

    pub fn locator(&self) -> Result<ObjectLocator> {
        ObjectLocator::parse(&self.bucket, &self.key)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}/{}", self.profile, self.bucket)
        } else {
            write!(f, "{}/{}/{}", self.profile, self.bucket, self.key)
        }
    }
}

/// Either a local filesystem path or a remote one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    Local(std::path::PathBuf),
    Remote(RemotePath),
}

/// Parse a CLI path argument.
///
/// Paths starting with `/`, `.` or `~`, and paths with fewer than two
/// segments, are local. Everything else is `profile/bucket[/key]`.
pub fn parse_path(arg: &str) -> Result<ParsedPath> {
    if arg.is_empty() {
        return Err(Error::InvalidPath("path is empty".to_string()));
    }

    if arg.starts_with('/') || arg.starts_with('.') || arg.starts_with('~') {
        return Ok(ParsedPath::Local(arg.into()));
    }

    let mut parts = arg.splitn(3, '/');
    let profile = parts.next().unwrap_or_default();
    let bucket = parts.next().unwrap_or_default();
    let key = parts.next().unwrap_or_default();

    if bucket.is_empty() {
        return Ok(ParsedPath::Local(arg.into()));
    }

    Ok(ParsedPath::Remote(RemotePath::new(
        profile,
        bucket,
        key.trim_start_matches('/'),
    )))
}

/// Parse a CLI argument that must be remote
pub fn parse_remote(arg: &str) -> Result<RemotePath> {
    match parse_path(arg)? {
        ParsedPath::Remote(path) => Ok(path),
        ParsedPath::Local(_) => Err(Error::InvalidPath(format!(
            "'{arg}' is not a remote path (expected profile/bucket[/path])"
        ))),
    }
}
