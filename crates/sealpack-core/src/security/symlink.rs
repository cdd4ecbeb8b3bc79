//! Symlink target validation.

use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;
use crate::security::chars::has_disallowed_chars;
use crate::security::path::host_path;
use crate::security::path::is_rooted;
use crate::security::path::is_within;
use crate::security::path::lexical_clean;
use crate::types::Basedir;

/// Resolves where a symlink at `dst` would point, without following it.
///
/// The raw target is appended to the link's parent directory and the
/// concatenation is cleaned as a whole, so every `..` in the target is
/// counted against the link's own location rather than silently collapsed
/// before the check. `dst` must already be a cleaned destination produced by
/// [`resolve_entry_path`](crate::security::path::resolve_entry_path).
///
/// # Errors
///
/// - `AbsoluteSymlinkTarget` if the target is absolute
/// - `InvalidSymlinkTarget` if the target is empty or resolves to the root
///   itself or outside of it
/// - `InvalidSymlinkCharacters` if the target contains control or invisible
///   formatting characters
///
/// # Examples
///
/// ```no_run
/// use sealpack_core::Basedir;
/// use sealpack_core::security::symlink::resolve_link_target;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let basedir = Basedir::new("/tmp/out")?;
/// let dst = Path::new("/tmp/out/dir/link");
///
/// let resolved = resolve_link_target(&basedir, dst, "../file.txt")?;
/// assert_eq!(resolved, Path::new("/tmp/out/file.txt"));
///
/// assert!(resolve_link_target(&basedir, dst, "../../../etc/passwd").is_err());
/// assert!(resolve_link_target(&basedir, dst, "/etc/passwd").is_err());
/// # Ok(())
/// # }
/// ```
pub fn resolve_link_target(basedir: &Basedir, dst: &Path, target: &str) -> Result<PathBuf> {
    let raw = host_path(target);
    if is_rooted(&raw) {
        return Err(ArchiveError::AbsoluteSymlinkTarget {
            path: dst.to_path_buf(),
            target: raw,
        });
    }

    if target.is_empty() {
        return Err(ArchiveError::InvalidSymlinkTarget {
            path: dst.to_path_buf(),
            target: raw,
        });
    }

    let resolved = lexical_clean(&link_parent(dst).join(&raw));
    if !is_within(basedir.as_path(), &resolved) {
        return Err(ArchiveError::InvalidSymlinkTarget {
            path: dst.to_path_buf(),
            target: raw,
        });
    }

    if has_disallowed_chars(target) {
        return Err(ArchiveError::InvalidSymlinkCharacters {
            path: dst.to_path_buf(),
            target: raw,
        });
    }

    Ok(resolved)
}

/// Returns `true` if `target`, resolved from the link at `dst`, has a `..`
/// component after stepping through one of `symlinks`.
///
/// Lexical resolution assumes every component is a real directory. Descending
/// through another link stays inside the root, as that link's own target was
/// validated; a `..` after it is evaluated by the kernel relative to that
/// link's target, not relative to where the archive placed it.
#[must_use]
pub fn climbs_through_symlink(dst: &Path, target: &str, symlinks: &HashSet<PathBuf>) -> bool {
    let raw = host_path(target);
    let mut current = link_parent(dst).to_path_buf();
    let mut through_link = false;

    for component in raw.components() {
        match component {
            Component::Normal(part) => current.push(part),
            Component::ParentDir if through_link => return true,
            Component::ParentDir => current = lexical_clean(&current.join("..")),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
        if symlinks.contains(&current) {
            through_link = true;
        }
    }

    false
}

fn link_parent(dst: &Path) -> &Path {
    dst.parent().unwrap_or_else(|| Path::new(""))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_basedir() -> (TempDir, Basedir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let basedir = Basedir::new(temp.path()).expect("failed to create basedir");
        (temp, basedir)
    }

    #[test]
    fn test_sibling_target() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("link");
        let resolved = resolve_link_target(&basedir, &dst, "target.txt").expect("valid");
        assert_eq!(resolved, basedir.as_path().join("target.txt"));
    }

    #[test]
    fn test_relative_up_within_root() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("foo/link");
        let resolved = resolve_link_target(&basedir, &dst, "../bar/target.txt").expect("valid");
        assert_eq!(resolved, basedir.as_path().join("bar/target.txt"));
    }

    #[test]
    fn test_escape_rejected() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("safe/link");
        for target in ["../../etc/passwd", "../../../etc/passwd", "..", "../.."] {
            assert!(
                matches!(
                    resolve_link_target(&basedir, &dst, target),
                    Err(ArchiveError::InvalidSymlinkTarget { .. })
                ),
                "{target:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_sibling_of_root_rejected() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("link");
        let target = "../not-the-root/file";
        assert!(matches!(
            resolve_link_target(&basedir, &dst, target),
            Err(ArchiveError::InvalidSymlinkTarget { .. })
        ));
    }

    #[test]
    fn test_absolute_rejected() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("link");
        let inside = basedir.as_path().join("file");
        for target in ["/etc/passwd", inside.to_str().expect("utf-8 temp path")] {
            assert!(
                matches!(
                    resolve_link_target(&basedir, &dst, target),
                    Err(ArchiveError::AbsoluteSymlinkTarget { .. })
                ),
                "{target:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_rejected() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("dir/link");
        assert!(matches!(
            resolve_link_target(&basedir, &dst, ""),
            Err(ArchiveError::InvalidSymlinkTarget { .. })
        ));
    }

    #[test]
    fn test_characters_rejected() {
        let (_temp, basedir) = create_test_basedir();
        let dst = basedir.as_path().join("link");
        assert!(matches!(
            resolve_link_target(&basedir, &dst, "tar\u{1b}get"),
            Err(ArchiveError::InvalidSymlinkCharacters { .. })
        ));
    }

    #[test]
    fn test_climbs_through_symlink() {
        let root = Path::new("/out");
        let symlinks: HashSet<PathBuf> = [PathBuf::from("/out/a/b/l")].into_iter().collect();

        // x -> a/b/l/../.. climbs out of wherever `l` points.
        assert!(climbs_through_symlink(
            &root.join("x"),
            "a/b/l/../..",
            &symlinks
        ));
        assert!(climbs_through_symlink(
            &root.join("a/c/y"),
            "../b/l/sub/../../secret",
            &symlinks
        ));
        // Pointing at the link itself is fine.
        assert!(!climbs_through_symlink(&root.join("x"), "a/b/l", &symlinks));
        // Unrelated targets are fine.
        assert!(!climbs_through_symlink(&root.join("x"), "a/b/file", &symlinks));
        // Descending through the link, reached via `..`, is fine.
        assert!(!climbs_through_symlink(
            &root.join("a/c/y"),
            "../b/l/secret",
            &symlinks
        ));
    }

    #[test]
    fn test_descend_through_release_link() {
        let root = Path::new("/out");
        let symlinks: HashSet<PathBuf> = [PathBuf::from("/out/current"), PathBuf::from("/out/bin")]
            .into_iter()
            .collect();

        assert!(!climbs_through_symlink(&root.join("bin"), "current/bin", &symlinks));
        assert!(!climbs_through_symlink(
            &root.join("docs/readme"),
            "../current/docs/readme.md",
            &symlinks
        ));
    }
}
