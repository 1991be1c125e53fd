use std::path::{Path, PathBuf};

use log::{debug, error};
use regex::Regex;

/// Returns true if `path` exists and is a regular file.
pub fn file_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}

/// Returns true if `path` exists and is a directory.
pub fn directory_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_dir(),
        Err(_) => false,
    }
}

fn require_entries(root: &Path, names: &[&str], want_dir: bool) -> bool {
    let kind = if want_dir { "directory" } else { "file" };

    for name in names {
        debug!(
            "fsutil: testing for {} '{}' in path '{}'",
            kind,
            name,
            root.display()
        );
        let full = root.join(name);

        let ok = match std::fs::metadata(&full) {
            Ok(meta) => meta.is_dir() == want_dir,
            Err(_) => false,
        };

        if !ok {
            debug!("fsutil: required {} missing: {}", kind, name);
            return false;
        }
    }

    true
}

/// Returns true only when every named directory exists directly under `root`.
pub fn require_dirs(root: &Path, dirs: &[&str]) -> bool {
    require_entries(root, dirs, true)
}

/// Returns true only when every named regular file exists directly under `root`.
pub fn require_files(root: &Path, files: &[&str]) -> bool {
    require_entries(root, files, false)
}

fn find_matching_entry(root: &Path, pattern: &Regex, want_dir: bool) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            error!(
                "fsutil: error reading directory '{}': {}",
                root.display(),
                e
            );
            return None;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if pattern.is_match(name) && is_dir == want_dir {
            return Some(root.join(name));
        }
    }

    None
}

/// Finds the first directory under `root` whose name matches `pattern`.
pub fn find_matching_dir(root: &Path, pattern: &Regex) -> Option<PathBuf> {
    find_matching_entry(root, pattern, true)
}

/// Finds the first regular file under `root` whose name matches `pattern`.
pub fn find_matching_file(root: &Path, pattern: &Regex) -> Option<PathBuf> {
    find_matching_entry(root, pattern, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_and_directory_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.wav");
        std::fs::write(&file, b"x").unwrap();

        assert!(file_exists(&file));
        assert!(!file_exists(temp.path()));
        assert!(directory_exists(temp.path()));
        assert!(!directory_exists(&file));
        assert!(!directory_exists(&temp.path().join("missing")));
    }

    #[test]
    fn test_require_dirs_and_files() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("DCIM")).unwrap();
        std::fs::create_dir(temp.path().join("MISC")).unwrap();
        std::fs::write(temp.path().join("INDEX.MIF"), b"x").unwrap();

        assert!(require_dirs(temp.path(), &["DCIM", "MISC"]));
        assert!(!require_dirs(temp.path(), &["DCIM", "CONTENTS"]));
        // a file does not satisfy a directory requirement
        assert!(!require_dirs(temp.path(), &["INDEX.MIF"]));
        assert!(require_files(temp.path(), &["INDEX.MIF"]));
        assert!(!require_files(temp.path(), &["DCIM"]));
    }

    #[test]
    fn test_find_matching_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("100CANON")).unwrap();
        std::fs::write(temp.path().join("101CANON"), b"not a dir").unwrap();

        let pattern = Regex::new(r"(\d+)CANON").unwrap();
        let found = find_matching_dir(temp.path(), &pattern).unwrap();
        assert!(found.ends_with("100CANON"));
    }

    #[test]
    fn test_find_matching_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("M0001.CTG"), b"x").unwrap();

        let pattern = Regex::new(r"M(\d+)\.CTG").unwrap();
        let found = find_matching_file(temp.path(), &pattern).unwrap();
        assert!(found.ends_with("M0001.CTG"));

        let miss = Regex::new(r"SE_LOG\.BIN").unwrap();
        assert!(find_matching_file(temp.path(), &miss).is_none());
    }

    #[test]
    fn test_find_in_unreadable_root_is_none() {
        let pattern = Regex::new(r".*").unwrap();
        assert!(find_matching_dir(Path::new("/nonexistent/root"), &pattern).is_none());
    }
}
