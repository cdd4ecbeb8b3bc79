//! Lexical path resolution and containment checks.
//!
//! Nothing in this module follows symlinks or calls `canonicalize`: the
//! targets being checked usually do not exist yet.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::security::chars::has_disallowed_chars;
use crate::types::Basedir;

/// Cleans a path lexically.
///
/// Drops `.` segments and repeated separators, and resolves `..` against the
/// preceding normal component. A `..` directly after the root is dropped;
/// leading `..` on a relative path is kept. An empty result becomes `"."`.
///
/// # Examples
///
/// ```
/// use sealpack_core::security::path::lexical_clean;
/// use std::path::Path;
///
/// assert_eq!(lexical_clean(Path::new("./a//b/../c")), Path::new("a/c"));
/// assert_eq!(lexical_clean(Path::new("../x/..")), Path::new(".."));
/// assert_eq!(lexical_clean(Path::new("a/..")), Path::new("."));
/// ```
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::with_capacity(path.components().count());

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => {
                    components.push(component);
                }
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Returns `true` if the cleaned `candidate` lies strictly below the cleaned
/// `basedir`.
///
/// This is the component-wise form of "`candidate` starts with
/// `basedir + separator`": the remainder after the root must be non-empty and
/// consist only of normal components. A root of `"."` has no components of
/// its own once cleaned, so every relative path made of normal components is
/// inside it.
///
/// # Examples
///
/// ```
/// use sealpack_core::security::path::is_within;
/// use std::path::Path;
///
/// assert!(is_within(Path::new("/out"), Path::new("/out/a")));
/// assert!(!is_within(Path::new("/out"), Path::new("/out")));
/// assert!(!is_within(Path::new("/out"), Path::new("/outside/a")));
/// assert!(is_within(Path::new("."), Path::new("a/b")));
/// assert!(!is_within(Path::new("."), Path::new("../a")));
/// ```
#[must_use]
pub fn is_within(basedir: &Path, candidate: &Path) -> bool {
    let rest = if basedir == Path::new(".") {
        Some(candidate)
    } else {
        candidate.strip_prefix(basedir).ok()
    };

    rest.is_some_and(|rest| {
        let mut components = rest.components().peekable();
        components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
    })
}

/// Converts a slash-separated wire path to a host path.
#[must_use]
pub fn host_path(wire: &str) -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(wire.replace('/', "\\"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from(wire)
    }
}

/// Returns `true` if the path is absolute or carries a root or prefix.
#[must_use]
pub fn is_rooted(path: &Path) -> bool {
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Counts the normal components of a path.
#[must_use]
pub fn path_depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

/// Resolves a record path to its extraction destination.
///
/// # Errors
///
/// - `InvalidLocation` if `name` is absolute or its cleaned join with the
///   root does not land strictly below the root
/// - `InvalidCharacters` if `name` contains control or invisible formatting
///   characters
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Basedir;
/// use sealpack_core::security::path::resolve_entry_path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let basedir = Basedir::new("/tmp/out")?;
/// let dst = resolve_entry_path(&basedir, "a/./b.txt")?;
/// assert_eq!(dst, std::path::Path::new("/tmp/out/a/b.txt"));
///
/// assert!(resolve_entry_path(&basedir, "../../etc/passwd").is_err());
/// # Ok(())
/// # }
/// ```
pub fn resolve_entry_path(basedir: &Basedir, name: &str) -> Result<PathBuf> {
    let relative = host_path(name);
    if is_rooted(&relative) {
        return Err(ArchiveError::InvalidLocation { path: relative });
    }

    let dst = lexical_clean(&basedir.as_path().join(&relative));
    if !is_within(basedir.as_path(), &dst) {
        return Err(ArchiveError::InvalidLocation { path: dst });
    }

    if has_disallowed_chars(name) {
        return Err(ArchiveError::InvalidCharacters { path: dst });
    }

    Ok(dst)
}
