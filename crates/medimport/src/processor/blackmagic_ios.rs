use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, error};

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::metadata::ExiftoolData;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_SOFTWARE_PREFIX: &str = "Blackmagic Cam";

/// The app names clips `A001_20241201_C001.mov` in whatever directory the
/// recording was exported into.
const FILE_MATCH_PATTERNS: &[&str] = &[r"^(\w)(\d{3})_(\d{8})_C(\d{3})\.mov"];

/// Blackmagic Camera running on an iPhone.
///
/// The export directory has no label or layout of its own, so a clip's
/// QuickTime "software" tag is the only reliable signature. That makes this
/// the one detector whose recognition must open a file; the cheap name check
/// runs first so foreign volumes never get that far.
pub struct BlackmagicIos {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
}

impl BlackmagicIos {
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

    /// The container's creation stamp is wall-clock UTC; convert to the local
    /// calendar day the clip was shot.
    fn capture_date(clip_path: &Path) -> NaiveDate {
        let create_date = match ExiftoolData::read(clip_path) {
            Ok(metadata) => metadata.create_date,
            Err(e) => {
                error!(
                    path = %clip_path.display(),
                    "failed to read container metadata: {}", e
                );
                return NaiveDate::default();
            }
        };

        let Some(create_date) = create_date else {
            error!(path = %clip_path.display(), "container has no creation date");
            return NaiveDate::default();
        };

        match NaiveDateTime::parse_from_str(&create_date, "%Y:%m:%d %H:%M:%S") {
            Ok(naive) => DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
                .with_timezone(&chrono::Local)
                .date_naive(),
            Err(e) => {
                error!(create_date, "failed to parse container creation date: {}", e);
                NaiveDate::default()
            }
        }
    }
}

impl Processor for BlackmagicIos {
    fn name(&self) -> &'static str {
        "blackmagicIOS"
    }

    fn recognize(&mut self) -> bool {
        debug!(volume = %self.source_dir.display(), "testing volume compatibility");

        self.volume_format = self.inspector.format(&self.source_dir);

        let clip = match fsutil::find_matching_file(&self.source_dir, &self.file_patterns[0]) {
            Some(clip) => clip,
            None => {
                debug!("no clip file matching the app's naming found, disqualified");
                return false;
            }
        };

        let software = match ExiftoolData::read(&clip) {
            Ok(metadata) => metadata.software.unwrap_or_default(),
            Err(e) => {
                debug!(
                    clip = %clip.display(),
                    "could not read container metadata: {}, disqualified", e
                );
                return false;
            }
        };

        if !software.starts_with(EXPECTED_SOFTWARE_PREFIX) {
            debug!(
                software,
                expected = EXPECTED_SOFTWARE_PREFIX,
                "recording software does not match, disqualified"
            );
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
            capture_date: Self::capture_date(&found.path),
            source_name: found.parent_name,
            file_name: found.file_name,
            source_path: found.path,
            size: found.size,
            media_type: MediaType::Video,
            file_mod_time: found.modified,
            volume_format: self.volume_format,
        })
        .collect()
    }
}
