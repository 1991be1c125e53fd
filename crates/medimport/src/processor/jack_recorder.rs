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

/// Headless JACK capture box: `jack/<date>/<track>.wav`, one directory per
/// recording day. No volume label to go by, the layout is the signature.
const FILE_MATCH_PATTERNS: &[&str] = &[r"jack/\d{4}-\d{2}-\d{2}/([\w\d_-]+)\.wav"];

pub struct JackRecorder {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    date_dir_pattern: Regex,
}

impl JackRecorder {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            date_dir_pattern: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    /// Recording day comes from the directory the track sits in.
    fn capture_date(directory_name: &str) -> NaiveDate {
        match NaiveDate::parse_from_str(directory_name, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                error!(directory_name, "failed to parse capture date: {}", e);
                NaiveDate::default()
            }
        }
    }
}

impl Processor for JackRecorder {
    fn name(&self) -> &'static str {
        "jackRecorder"
    }

    fn recognize(&mut self) -> bool {
        debug!(volume = %self.source_dir.display(), "testing volume compatibility");

        self.volume_format = self.inspector.format(&self.source_dir);

        if !fsutil::require_dirs(&self.source_dir, &["jack"]) {
            debug!("required jack directory does not exist, disqualified");
            return false;
        }

        if fsutil::find_matching_dir(&self.source_dir.join("jack"), &self.date_dir_pattern)
            .is_none()
        {
            debug!("no dated recording directory found under jack, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        matched_files(&WalkSpec {
            root: &self.source_dir.join("jack"),
            rel_prefix: "jack",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: None,
        })
        .into_iter()
        .map(|found| SourceFile {
            capture_date: Self::capture_date(&found.parent_name),
            file_name: found.file_name,
            source_path: found.path,
            size: found.size,
            media_type: MediaType::Audio,
            source_name: "Jack".to_string(),
            file_mod_time: found.modified,
            volume_format: self.volume_format,
        })
        .collect()
    }
}
