//! Purpose: Filesystem ground truth for log paths.
//! Exports: `ensure_regular_file`.
//! Role: Guarantees a regular file exists at a path before a backend opens it.
//! Invariants: Never panics; every failure reports `false` and is logged.

use std::fs;
use std::path::Path;

use tracing::warn;

/// Returns true iff a regular file exists at `path` afterwards.
///
/// Creates missing parent directories, replaces a regular file standing where
/// a parent directory must go, and recursively removes a directory squatting
/// on the path itself.
pub fn ensure_regular_file(path: &Path) -> bool {
    if path.is_file() {
        return true;
    }
    if path.is_dir() {
        if let Err(err) = fs::remove_dir_all(path) {
            warn!(path = %path.display(), %err, "failed to remove directory at log path");
            return false;
        }
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !ensure_dir(parent) {
            return false;
        }
    }
    match fs::File::create_new(path) {
        Ok(_) => true,
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to create log file");
            false
        }
    }
}

fn ensure_dir(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }
    if path.is_file() {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove file blocking parent dir");
            return false;
        }
    }
    match fs::create_dir_all(path) {
        Ok(()) => true,
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to create parent dirs");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ensure_regular_file;

    #[test]
    fn creates_file_and_missing_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a").join("b").join("app.log");
        assert!(ensure_regular_file(&path));
        assert!(path.is_file());
    }

    #[test]
    fn existing_file_is_left_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"hello").expect("write");
        assert!(ensure_regular_file(&path));
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
    }

    #[test]
    fn directory_at_path_is_replaced_by_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        std::fs::create_dir_all(path.join("nested")).expect("mkdir");
        assert!(ensure_regular_file(&path));
        assert!(path.is_file());
    }

    #[test]
    fn file_blocking_a_parent_dir_is_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, b"not a dir").expect("write");
        let path = blocker.join("app.log");
        assert!(ensure_regular_file(&path));
        assert!(path.is_file());
    }
}
