//! Confinement of request-supplied path fragments to a base directory.
//!
//! Two checks, both lexical, both run before the filesystem is touched:
//!
//! 1. the fragment must not contain `\0`, `$`, `@` or `../`;
//! 2. the fragment, normalized and joined to the base, must still lie under
//!    the base.
//!
//! A fragment that fails either check is never handed to `File::open`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Error;

const FORBIDDEN: [&str; 4] = ["\0", "$", "@", "../"];

/// Returns `true` if `fragment` contains any sequence that is never allowed
/// in a served path or a folder route prefix.
pub fn has_forbidden_sequence(fragment: &str) -> bool {
    FORBIDDEN.iter().any(|needle| fragment.contains(needle))
}

/// Why a fragment was refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rejection {
    Empty,
    ForbiddenSequence,
    OutsideBase,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty path",
            Self::ForbiddenSequence => "forbidden character sequence",
            Self::OutsideBase => "path escapes base directory",
        })
    }
}

/// A base directory plus the rules for resolving fragments under it.
#[derive(Clone, Debug)]
pub struct PathGuard {
    base: PathBuf,
}

impl PathGuard {
    /// Fails with [`Error::InvalidFolder`] unless `base` is absolute.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, Error> {
        let base = base.into();
        if !base.is_absolute() {
            return Err(Error::InvalidFolder(base));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolves `fragment` to an absolute path under the base.
    ///
    /// ```rust
    /// use localserve::guard::{PathGuard, Rejection};
    ///
    /// let guard = PathGuard::new("/srv/data").unwrap();
    /// assert_eq!(
    ///     guard.resolve("reports/./q1.pdf").unwrap(),
    ///     std::path::Path::new("/srv/data/reports/q1.pdf"),
    /// );
    /// assert_eq!(guard.resolve("../etc/passwd"), Err(Rejection::ForbiddenSequence));
    /// assert_eq!(guard.resolve(".."), Err(Rejection::OutsideBase));
    /// ```
    pub fn resolve(&self, fragment: &str) -> Result<PathBuf, Rejection> {
        if fragment.is_empty() {
            return Err(Rejection::Empty);
        }
        if has_forbidden_sequence(fragment) {
            return Err(Rejection::ForbiddenSequence);
        }

        let segments = normalize(fragment).ok_or(Rejection::OutsideBase)?;
        if segments.is_empty() {
            return Err(Rejection::Empty);
        }

        let mut resolved = self.base.clone();
        resolved.extend(segments);

        // Component-wise: `/srv/data2` does not start with `/srv/data`.
        if !resolved.starts_with(&self.base) {
            return Err(Rejection::OutsideBase);
        }
        Ok(resolved)
    }
}

/// Lexically normalizes a `/`-separated fragment. A leading `/` is relative
/// to the base. Returns `None` when `..` climbs above the fragment root.
fn normalize(fragment: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in fragment.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments)
}

fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}
