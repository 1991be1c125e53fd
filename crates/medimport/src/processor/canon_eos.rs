use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, error, warn};

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::metadata::ExiftoolData;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_NAME: &str = "EOS_DIGITAL";

const FILE_MATCH_PATTERNS: &[&str] = &[
    r"DCIM/(\d+)CANON/IMG_(\d+)\.CR2",
    r"DCIM/(\d+)CANON/MVI_(\d+)\.MOV",
    r"DCIM/(\d+)(CANON|EOS)([\w\d]{0,})/([\w\d_]{4}(\d{4}))\.(MOV|CR2|CR3|MP4)",
];

/// Canon EOS still cameras (DSLR and mirrorless bodies).
///
/// The card layout alone is ambiguous with other DCIM writers, so
/// recognition additionally requires the Canon catalog file the firmware
/// maintains under `DCIM/EOSMISC` or `DCIM/CANONMSC`. The camera model and
/// capture date are read per file from embedded metadata; raw stills and
/// QuickTime clips both go through `exiftool`.
pub struct CanonEos {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    catalog_pattern: Regex,
    image_dir_pattern: Regex,
}

impl CanonEos {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            catalog_pattern: Regex::new(r"M(\d+)\.CTG")
                .expect("built-in file pattern must compile"),
            image_dir_pattern: Regex::new(r"(\d+)(CANON|EOS)([\w\d]{0,})")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    fn has_catalog_file(&self) -> bool {
        for misc_dir in ["EOSMISC", "CANONMSC"] {
            let dir = self.source_dir.join("DCIM").join(misc_dir);
            if !fsutil::directory_exists(&dir) {
                continue;
            }

            debug!(dir = %dir.display(), "testing for Mxxxx.CTG catalog file");
            if fsutil::find_matching_file(&dir, &self.catalog_pattern).is_some() {
                return true;
            }
        }

        false
    }

    /// "2024:12:01 11:45:31" -> 2024-12-01.
    fn capture_date(timestamp: Option<&str>) -> NaiveDate {
        let date_part = timestamp.and_then(|t| t.get(0..10)).unwrap_or_default();
        match NaiveDate::parse_from_str(date_part, "%Y:%m:%d") {
            Ok(date) => date,
            Err(e) => {
                error!(date_part, "failed to parse capture date: {}", e);
                NaiveDate::default()
            }
        }
    }

    fn media_type(file_name: &str) -> MediaType {
        if file_name.ends_with("MOV") || file_name.ends_with("MP4") {
            MediaType::Video
        } else {
            MediaType::Photo
        }
    }
}

impl Processor for CanonEos {
    fn name(&self) -> &'static str {
        "canonEOS"
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

        if !fsutil::require_dirs(&self.source_dir, &["DCIM", "MISC"]) {
            debug!("one or more required directories missing, disqualified");
            return false;
        }

        if !self.has_catalog_file() {
            debug!("no DCIM/(EOSMISC|CANONMSC)/Mxxxx.CTG file found, disqualified");
            return false;
        }

        if fsutil::find_matching_dir(&self.source_dir.join("DCIM"), &self.image_dir_pattern)
            .is_none()
        {
            debug!("no Canon image directory found under DCIM, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        matched_files(&WalkSpec {
            root: &self.source_dir.join("DCIM"),
            rel_prefix: "DCIM",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: None,
        })
        .into_iter()
        .filter_map(|found| {
            let metadata = match ExiftoolData::read(&found.path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        path = %found.path.display(),
                        "could not read embedded metadata, skipping: {}", e
                    );
                    return None;
                }
            };

            Some(SourceFile {
                media_type: Self::media_type(&found.file_name),
                capture_date: Self::capture_date(metadata.date_time_original.as_deref()),
                source_name: metadata.model.unwrap_or_else(|| "Unknown".to_string()),
                file_name: found.file_name,
                source_path: found.path,
                size: found.size,
                file_mod_time: found.modified,
                volume_format: self.volume_format,
            })
        })
        .collect()
    }
}
