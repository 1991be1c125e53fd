use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, error, info};

use crate::error::ImportError;
use crate::model::SourceFile;

/// Counters for one reconciliation pass over a job's file list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub copied: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Top-level archive bucket for a capture date, e.g. "2024 Q2".
pub fn quarter_bucket(date: NaiveDate) -> String {
    let quarter = match date.month() {
        1..=3 => 1,
        4..=6 => 2,
        7..=9 => 3,
        _ => 4,
    };

    format!("{} Q{}", date.year(), quarter)
}

/// Directory a source file lands in:
/// `<root>/<year> Q<n>/<capture date>/<media type>/<source name>`.
pub fn destination_directory(dest_root: &Path, file: &SourceFile) -> PathBuf {
    dest_root
        .join(quarter_bucket(file.capture_date))
        .join(file.capture_date.format("%Y-%m-%d").to_string())
        .join(file.media_type.as_str())
        .join(&file.source_name)
}

/// Copies every source file to its destination, skipping files that are
/// already present with a matching size.
///
/// The size comparison is the idempotence mechanism: re-importing an
/// unchanged volume copies nothing. No checksums are involved, so a
/// same-size corrupted destination is never repaired here. Faults are
/// absorbed per file and counted; the pass always reaches the end of the
/// list.
pub fn import_files(dest_root: &Path, files: &[SourceFile], dry_run: bool) -> ImportStats {
    let mut stats = ImportStats::default();

    for file in files {
        match import_one(dest_root, file, dry_run) {
            Ok(copied) => {
                if copied {
                    stats.copied += 1;
                } else {
                    stats.skipped += 1;
                }
            }
            Err(e) => {
                error!(
                    source = %file.source_path.display(),
                    "import failed: {}", e
                );
                stats.errors += 1;
            }
        }
    }

    stats
}

/// Returns true when the file was copied (or would be, in dry-run mode),
/// false when the destination was already up to date.
fn import_one(dest_root: &Path, file: &SourceFile, dry_run: bool) -> Result<bool, ImportError> {
    let dest_path = destination_directory(dest_root, file).join(&file.file_name);

    let existing = std::fs::metadata(&dest_path)
        .ok()
        .filter(|meta| meta.is_file());

    if let Some(meta) = &existing {
        if meta.len() == file.size {
            debug!(
                dest = %dest_path.display(),
                "destination already exists with the same size, not copying"
            );
            return Ok(false);
        }
        debug!(
            dest = %dest_path.display(),
            "destination exists with a different size, will copy"
        );
    }

    if dry_run {
        info!(
            source = %file.source_path.display(),
            dest = %dest_path.display(),
            "[dry run] would copy"
        );
        return Ok(true);
    }

    if let Some(dest_dir) = dest_path.parent() {
        std::fs::create_dir_all(dest_dir).map_err(|e| ImportError::CreateDirectory {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;
    }

    info!(
        source = %file.source_path.display(),
        dest = %dest_path.display(),
        "copying"
    );

    std::fs::copy(&file.source_path, &dest_path).map_err(|e| ImportError::CopyFile {
        from: file.source_path.clone(),
        to: dest_path.clone(),
        source: e,
    })?;

    // Replay the source's modification time so the archive preserves
    // recording order instead of import order.
    let dest_file = std::fs::File::options()
        .write(true)
        .open(&dest_path)
        .map_err(|e| ImportError::SetModified {
            path: dest_path.clone(),
            source: e,
        })?;
    dest_file
        .set_modified(SystemTime::from(file.file_mod_time))
        .map_err(|e| ImportError::SetModified {
            path: dest_path.clone(),
            source: e,
        })?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaType, VolumeFormat};
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn source_file(temp: &TempDir, name: &str, content: &[u8]) -> SourceFile {
        let path = temp.path().join(name);
        std::fs::write(&path, content).unwrap();

        SourceFile {
            file_name: name.to_string(),
            source_path: path,
            size: content.len() as u64,
            media_type: MediaType::Audio,
            source_name: "X32".to_string(),
            capture_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            file_mod_time: Local.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap(),
            volume_format: VolumeFormat::Fat32,
        }
    }

    #[test]
    fn test_quarter_bucketing() {
        assert_eq!(
            quarter_bucket(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            "2024 Q1"
        );
        assert_eq!(
            quarter_bucket(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()),
            "2024 Q2"
        );
        assert_eq!(
            quarter_bucket(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()),
            "2024 Q3"
        );
        assert_eq!(
            quarter_bucket(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
            "2024 Q4"
        );
    }

    #[test]
    fn test_destination_layout() {
        let source = TempDir::new().unwrap();
        let file = source_file(&source, "R_20240401-093000.wav", b"pcm");

        let dest = destination_directory(Path::new("/archive"), &file);
        assert_eq!(
            dest,
            Path::new("/archive/2024 Q2/2024-04-01/Audio/X32")
        );
    }

    #[test]
    fn test_copy_and_mtime_replay() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let file = source_file(&source, "R_20240401-093000.wav", b"pcm data");

        let stats = import_files(dest_root.path(), std::slice::from_ref(&file), false);
        assert_eq!(
            stats,
            ImportStats {
                copied: 1,
                skipped: 0,
                errors: 0
            }
        );

        let dest_path = dest_root
            .path()
            .join("2024 Q2/2024-04-01/Audio/X32/R_20240401-093000.wav");
        assert!(dest_path.is_file());
        assert_eq!(std::fs::read(&dest_path).unwrap(), b"pcm data");

        let modified = std::fs::metadata(&dest_path).unwrap().modified().unwrap();
        assert_eq!(modified, SystemTime::from(file.file_mod_time));
    }

    #[test]
    fn test_second_import_is_a_no_op() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let files = vec![
            source_file(&source, "R_20240401-093000.wav", b"pcm one"),
            source_file(&source, "R_20240401-110000.wav", b"pcm two"),
        ];

        let first = import_files(dest_root.path(), &files, false);
        assert_eq!(first.copied, 2);

        let second = import_files(dest_root.path(), &files, false);
        assert_eq!(second.copied, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.errors, 0);
    }

    #[test]
    fn test_size_mismatch_overwrites() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let file = source_file(&source, "R_20240401-093000.wav", b"longer pcm data");

        let dest_dir = dest_root.path().join("2024 Q2/2024-04-01/Audio/X32");
        std::fs::create_dir_all(&dest_dir).unwrap();
        std::fs::write(dest_dir.join("R_20240401-093000.wav"), b"stale").unwrap();

        let stats = import_files(dest_root.path(), std::slice::from_ref(&file), false);
        assert_eq!(stats.copied, 1);
        assert_eq!(
            std::fs::read(dest_dir.join("R_20240401-093000.wav")).unwrap(),
            b"longer pcm data"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let file = source_file(&source, "R_20240401-093000.wav", b"pcm");

        let stats = import_files(dest_root.path(), std::slice::from_ref(&file), true);
        assert_eq!(stats.copied, 1);

        // not even the directory tree is created
        assert_eq!(
            std::fs::read_dir(dest_root.path()).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_unreadable_source_is_counted_not_fatal() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let mut bad = source_file(&source, "R_20240401-093000.wav", b"pcm");
        bad.source_path = source.path().join("vanished.wav");
        let good = source_file(&source, "R_20240401-110000.wav", b"pcm");

        let stats = import_files(dest_root.path(), &[bad, good], false);
        assert_eq!(stats.copied, 1);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_nested_file_name_creates_subdirectory() {
        // X-LIVE session files keep their session directory in the name.
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let mut file = source_file(&source, "00000001.WAV", b"pcm");
        file.file_name = "20240401/00000001.WAV".to_string();
        file.source_name = "X-Live".to_string();

        let stats = import_files(dest_root.path(), std::slice::from_ref(&file), false);
        assert_eq!(stats.copied, 1);
        assert!(dest_root
            .path()
            .join("2024 Q2/2024-04-01/Audio/X-Live/20240401/00000001.WAV")
            .is_file());
    }
}
