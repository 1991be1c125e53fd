use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, error};

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_PREFIX: &str = "X32";

/// The console names recordings `R_<yyyymmdd>-<hhmmss>.wav` at the card root.
const FILE_MATCH_PATTERNS: &[&str] = &[r"^R_(\d{8})-(\d{6})\.wav"];

/// Behringer X32 digital mixer, recording stereo WAV to SD card.
pub struct BehringerX32 {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
}

impl BehringerX32 {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    /// The recording date is embedded in the file name: `R_20240101-093000.wav`.
    fn capture_date(file_name: &str) -> NaiveDate {
        let date_part = file_name.get(2..10).unwrap_or_default();
        match NaiveDate::parse_from_str(date_part, "%Y%m%d") {
            Ok(date) => date,
            Err(e) => {
                error!(file_name, "failed to parse capture date: {}", e);
                NaiveDate::default()
            }
        }
    }
}

impl Processor for BehringerX32 {
    fn name(&self) -> &'static str {
        "behringerX32"
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

        if fsutil::find_matching_file(&self.source_dir, &self.file_patterns[0]).is_none() {
            debug!("no recorded audio file found at volume root, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        matched_files(&WalkSpec {
            root: &self.source_dir,
            rel_prefix: "",
            patterns: &self.file_patterns,
            max_depth: Some(1),
            top_level_dirs: None,
        })
        .into_iter()
        .map(|found| SourceFile {
            capture_date: Self::capture_date(&found.file_name),
            file_name: found.file_name,
            source_path: found.path,
            size: found.size,
            media_type: MediaType::Audio,
            source_name: "X32".to_string(),
            file_mod_time: found.modified,
            volume_format: self.volume_format,
        })
        .collect()
    }
}
