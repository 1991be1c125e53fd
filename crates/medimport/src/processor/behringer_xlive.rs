use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_PREFIX: &str = "XLIVE";

/// The X-LIVE expansion card writes one 8-character session directory per
/// recording, holding numbered multichannel WAVs and a SE_LOG.BIN marker.
const FILE_MATCH_PATTERNS: &[&str] = &[
    r"X_LIVE/[A-Z0-9]{8}/[A-Z0-9]{8}\.WAV",
    r"X_LIVE/[A-Z0-9]{8}/SE_LOG\.BIN",
];

/// Behringer X-LIVE multitrack recorder card.
pub struct BehringerXLive {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    session_dir_pattern: Regex,
}

impl BehringerXLive {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            session_dir_pattern: Regex::new(r"^[A-Z0-9]{8}$")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }
}

impl Processor for BehringerXLive {
    fn name(&self) -> &'static str {
        "behringerXLIVE"
    }

    fn recognize(&mut self) -> bool {
        debug!(volume = %self.source_dir.display(), "testing volume compatibility");

        self.volume_format = self.inspector.format(&self.source_dir);

        let label = self.inspector.label(&self.source_dir);
        if !label.starts_with(EXPECTED_VOLUME_PREFIX) {
            debug!(
                label,
                expected = EXPECTED_VOLUME_PREFIX,
                "volume label does not start with expected value, disqualified"
            );
            return false;
        }

        if !fsutil::require_dirs(&self.source_dir, &["X_LIVE"]) {
            debug!("required X_LIVE directory does not exist, disqualified");
            return false;
        }

        let session_dir = match fsutil::find_matching_dir(
            &self.source_dir.join("X_LIVE"),
            &self.session_dir_pattern,
        ) {
            Some(dir) => dir,
            None => {
                debug!("no session directory found under X_LIVE, disqualified");
                return false;
            }
        };

        if !fsutil::require_files(&session_dir, &["SE_LOG.BIN"]) {
            debug!("no SE_LOG.BIN file found in session directory, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        matched_files(&WalkSpec {
            root: &self.source_dir.join("X_LIVE"),
            rel_prefix: "X_LIVE",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: None,
        })
        .into_iter()
        .map(|found| SourceFile {
            // Session WAVs are just numbered, so the session directory is
            // kept as part of the archived file name.
            file_name: format!("{}/{}", found.parent_name, found.file_name),
            source_path: found.path,
            size: found.size,
            media_type: MediaType::Audio,
            source_name: "X-Live".to_string(),
            capture_date: found.modified.date_naive(),
            file_mod_time: found.modified,
            volume_format: self.volume_format,
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticInspector;
    use tempfile::TempDir;

    fn make_volume(temp: &TempDir, session: &str) {
        let session_dir = temp.path().join("X_LIVE").join(session);
        std::fs::create_dir_all(&session_dir).unwrap();
        std::fs::write(session_dir.join("SE_LOG.BIN"), b"log").unwrap();
        std::fs::write(session_dir.join("00000001.WAV"), b"pcm").unwrap();
        std::fs::write(session_dir.join("00000002.WAV"), b"pcm").unwrap();
    }

    fn processor_for(temp: &TempDir, label: &str) -> BehringerXLive {
        let inspector: Arc<dyn VolumeInspector> =
            Arc::new(StaticInspector::new(label, VolumeFormat::Exfat));
        BehringerXLive::new(temp.path(), inspector)
    }

    #[test]
    fn test_recognize() {
        let temp = TempDir::new().unwrap();
        make_volume(&temp, "20240101");

        assert!(processor_for(&temp, "XLIVE_SD").recognize());
        assert!(!processor_for(&temp, "X32").recognize());
    }

    #[test]
    fn test_recognize_requires_session_log() {
        let temp = TempDir::new().unwrap();
        let session_dir = temp.path().join("X_LIVE").join("20240101");
        std::fs::create_dir_all(&session_dir).unwrap();
        std::fs::write(session_dir.join("00000001.WAV"), b"pcm").unwrap();

        assert!(!processor_for(&temp, "XLIVE").recognize());
    }

    #[test]
    fn test_enumerate_prefixes_session_directory() {
        let temp = TempDir::new().unwrap();
        make_volume(&temp, "20240101");

        let mut processor = processor_for(&temp, "XLIVE");
        assert!(processor.recognize());

        let mut files = processor.enumerate();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].file_name, "20240101/00000001.WAV");
        assert_eq!(files[1].file_name, "20240101/00000002.WAV");
        assert_eq!(files[2].file_name, "20240101/SE_LOG.BIN");
        assert!(files.iter().all(|f| f.source_name == "X-Live"));
        assert!(files.iter().all(|f| f.media_type == MediaType::Audio));
        assert!(files
            .iter()
            .all(|f| f.capture_date == f.file_mod_time.date_naive()));
    }
}
