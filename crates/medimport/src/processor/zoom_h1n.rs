use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_NAME: &str = "H1N_SD";

/// Stereo recordings live under `STEREO/FOLDERxx/ZOOMxxxx.WAV`.
const FILE_MATCH_PATTERNS: &[&str] = &[r"STEREO/FOLDER\d{2}/ZOOM\d{4}\.WAV"];

/// Zoom H1n handheld stereo recorder.
pub struct ZoomH1n {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    folder_pattern: Regex,
}

impl ZoomH1n {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            folder_pattern: Regex::new(r"FOLDER\d{2}")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }
}

impl Processor for ZoomH1n {
    fn name(&self) -> &'static str {
        "zoomH1n"
    }

    fn recognize(&mut self) -> bool {
        debug!(volume = %self.source_dir.display(), "testing volume compatibility");

        self.volume_format = self.inspector.format(&self.source_dir);

        let label = self.inspector.label(&self.source_dir);
        if label != EXPECTED_VOLUME_NAME {
            debug!(
                label,
                expected = EXPECTED_VOLUME_NAME,
                "volume label does not match expected value, disqualified"
            );
            return false;
        }

        if !fsutil::require_dirs(&self.source_dir, &["STEREO"]) {
            debug!("required STEREO directory does not exist, disqualified");
            return false;
        }

        if fsutil::find_matching_dir(&self.source_dir.join("STEREO"), &self.folder_pattern)
            .is_none()
        {
            debug!("no FOLDERxx directory found under STEREO, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        // The recorder has no clock worth trusting beyond the filesystem
        // timestamps, so the capture date is the file's modification day.
        matched_files(&WalkSpec {
            root: &self.source_dir.join("STEREO"),
            rel_prefix: "STEREO",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: Some(&self.folder_pattern),
        })
        .into_iter()
        .map(|found| SourceFile {
            capture_date: found.modified.date_naive(),
            file_name: found.file_name,
            source_path: found.path,
            size: found.size,
            media_type: MediaType::Audio,
            source_name: "Zoom H1n".to_string(),
            file_mod_time: found.modified,
            volume_format: self.volume_format,
        })
        .collect()
    }
}
