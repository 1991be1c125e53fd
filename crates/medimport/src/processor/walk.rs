use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One filesystem entry that matched a processor's pattern set, with the
/// stat data every variant needs to build a `SourceFile`.
pub(crate) struct MatchedFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Name of the directory the file sits in.
    pub parent_name: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// Walk parameters for one enumeration pass.
pub(crate) struct WalkSpec<'a> {
    /// Absolute directory the walk starts at.
    pub root: &'a Path,
    /// Path prefix the patterns expect, e.g. "DCIM" when `root` is the
    /// volume's DCIM directory. Empty when patterns are volume-root relative.
    pub rel_prefix: &'a str,
    pub patterns: &'a [Regex],
    /// Limit descent; `Some(1)` scans only the root's direct entries.
    pub max_depth: Option<usize>,
    /// When set, only directories directly under `root` whose name matches
    /// are descended into. Keeps the walk out of unrelated trees on cards
    /// that mix device layouts.
    pub top_level_dirs: Option<&'a Regex>,
}

/// Walks the spec'd subtree and returns every non-directory entry whose
/// path (relative to the volume root) matches one of the patterns.
///
/// Faults are absorbed at the entry they occur on: an unreadable directory or
/// file is logged and skipped, never fatal. Zero-byte files are dropped here
/// so no variant ever emits one.
pub(crate) fn matched_files(spec: &WalkSpec<'_>) -> Vec<MatchedFile> {
    debug!(root = %spec.root.display(), "scanning for source files");

    let mut walker = WalkDir::new(spec.root).min_depth(1);
    if let Some(depth) = spec.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files = Vec::new();

    let iter = walker.into_iter().filter_entry(|entry| {
        if let Some(pattern) = spec.top_level_dirs {
            if entry.depth() == 1 && entry.file_type().is_dir() {
                let descend = entry
                    .file_name()
                    .to_str()
                    .map(|name| pattern.is_match(name))
                    .unwrap_or(false);
                if !descend {
                    debug!(
                        dir = %entry.path().display(),
                        "skipping unknown top-level directory"
                    );
                }
                return descend;
            }
        }
        true
    });

    for entry in iter {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("error while scanning directory tree: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let relative = match entry.path().strip_prefix(spec.root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let relative = relative.to_string_lossy();
        let rel_path = if spec.rel_prefix.is_empty() {
            relative.into_owned()
        } else {
            format!("{}/{}", spec.rel_prefix, relative)
        };

        if !spec.patterns.iter().any(|p| p.is_match(&rel_path)) {
            continue;
        }

        debug!(path = %entry.path().display(), "matched file");

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    path = %entry.path().display(),
                    "could not stat matched file, skipping: {}", e
                );
                continue;
            }
        };

        if metadata.len() == 0 {
            info!(path = %entry.path().display(), "skipping 0 byte file");
            continue;
        }

        let modified = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let parent_name = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        files.push(MatchedFile {
            path: entry.path().to_path_buf(),
            file_name,
            parent_name,
            size: metadata.len(),
            modified,
        });
    }

    files
}

/// Compiles a variant's built-in pattern list. The patterns are source
/// constants, so a failure here is a programming error.
pub(crate) fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in file pattern must compile"))
        .collect()
}
