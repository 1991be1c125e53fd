use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error};

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::metadata::exif;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_NAME: &str = "NIKON D3300";

const FILE_MATCH_PATTERNS: &[&str] = &[r"DCIM/\d{3}D3300/DSC_\d{4}\.(NEF|MOV)"];

/// Nikon D3300 DSLR.
///
/// The camera model is read once from the first file's EXIF block and cached
/// for the rest of the enumeration; every file on one card comes from the
/// same body. (A card swapped between bodies mid-event without a format
/// would defeat the cache, which has never happened in practice.)
pub struct NikonD3300 {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    source_name: Option<String>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    image_dir_pattern: Regex,
}

impl NikonD3300 {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            source_name: None,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            image_dir_pattern: Regex::new(r"\d{3}D3300")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    fn camera_model(&mut self, image_path: &Path) -> String {
        if let Some(name) = &self.source_name {
            return name.clone();
        }

        debug!(path = %image_path.display(), "reading camera model from embedded metadata");

        match exif::read_summary(image_path) {
            Ok(summary) => {
                let model = summary
                    .camera_model
                    .unwrap_or_default()
                    .replace("NIKON", "Nikon");
                if !model.is_empty() {
                    self.source_name = Some(model.clone());
                }
                model
            }
            Err(e) => {
                error!(
                    path = %image_path.display(),
                    "failed to read embedded metadata: {}", e
                );
                String::new()
            }
        }
    }

    fn media_type(file_name: &str) -> MediaType {
        if file_name.ends_with("MOV") {
            MediaType::Video
        } else {
            MediaType::Photo
        }
    }
}

impl Processor for NikonD3300 {
    fn name(&self) -> &'static str {
        "nikonD3300"
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

        if !fsutil::require_dirs(&self.source_dir, &["DCIM"]) {
            debug!("required DCIM directory does not exist, disqualified");
            return false;
        }

        if fsutil::find_matching_dir(&self.source_dir.join("DCIM"), &self.image_dir_pattern)
            .is_none()
        {
            debug!("no DCIM/xxxD3300 directory found, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        let found = matched_files(&WalkSpec {
            root: &self.source_dir.join("DCIM"),
            rel_prefix: "DCIM",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: None,
        });

        found
            .into_iter()
            .map(|found| SourceFile {
                media_type: Self::media_type(&found.file_name),
                source_name: self.camera_model(&found.path),
                capture_date: found.modified.date_naive(),
                file_name: found.file_name,
                source_path: found.path,
                size: found.size,
                file_mod_time: found.modified,
                volume_format: self.volume_format,
            })
            .collect()
    }
}
