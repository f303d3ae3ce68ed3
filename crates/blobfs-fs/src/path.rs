//! Normalized absolute paths.

use std::fmt;

/// Path separator.
pub const SEPARATOR: char = '/';

/// A normalized absolute path, the lookup key of its entry.
///
/// Normalization drops empty and `.` segments and resolves `..` against the
/// preceding segment (never above root). The result has no trailing
/// separator: `a//b/./c/` becomes `/a/b/c`. The root displays as `/`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FsPath {
    segments: Vec<String>,
}

impl FsPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize `raw`. Relative input is made absolute.
    pub fn parse(raw: &str) -> Self {
        let mut path = Self::root();
        path.push_normalized(raw);
        path
    }

    fn push_normalized(&mut self, raw: &str) {
        for segment in raw.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    self.segments.pop();
                }
                name => self.segments.push(name.to_string()),
            }
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<FsPath> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Append `name`, normalizing it the same way as [`FsPath::parse`].
    pub fn join(&self, name: &str) -> FsPath {
        let mut path = self.clone();
        path.push_normalized(name);
        path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The store key for this path.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for FsPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for FsPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}
