use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, error};

use crate::device::VolumeInspector;
use crate::fsutil;
use crate::metadata::sidecar;
use crate::model::{MediaType, SourceFile, VolumeFormat};
use crate::processor::walk::{compile_patterns, matched_files, WalkSpec};
use crate::processor::Processor;

const EXPECTED_VOLUME_NAME: &str = "CANON";

/// Clips are MXF with a same-named XML sidecar, e.g.
/// `CONTENTS/CLIPS001/A001C002_241201AB_CANON.MXF`.
const FILE_MATCH_PATTERNS: &[&str] =
    &[r"CONTENTS/CLIPS(\d+)/(\w)(\d+)(\w)(\d+)_(\d{6})(\w{2})_CANON\.(MXF|XML)"];

/// Canon XA professional camcorders.
pub struct CanonXa {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    clips_dir_pattern: Regex,
}

impl CanonXa {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            clips_dir_pattern: Regex::new(r"CLIPS(\d+)")
                .expect("built-in directory pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    /// The camera model is recorded in the per-clip XML sidecar; for an MXF
    /// clip that is the same path with the extension swapped.
    fn source_name(media_path: &Path) -> String {
        let sidecar_path = if media_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("MXF"))
            .unwrap_or(false)
        {
            media_path.with_extension("XML")
        } else {
            media_path.to_path_buf()
        };

        debug!(sidecar = %sidecar_path.display(), "reading source name from clip sidecar");

        match sidecar::clip_model_name(&sidecar_path) {
            Ok(model) => model,
            Err(e) => {
                error!(
                    sidecar = %sidecar_path.display(),
                    "failed to read model name from sidecar: {}", e
                );
                "Unknown".to_string()
            }
        }
    }

    /// Clip names carry a `yymmdd` stamp in their second underscore field.
    fn capture_date(file_name: &str) -> NaiveDate {
        let date_part = file_name
            .split('_')
            .nth(1)
            .and_then(|part| part.get(0..6))
            .unwrap_or_default();

        match NaiveDate::parse_from_str(date_part, "%y%m%d") {
            Ok(date) => date,
            Err(e) => {
                error!(file_name, "failed to parse capture date: {}", e);
                NaiveDate::default()
            }
        }
    }
}

impl Processor for CanonXa {
    fn name(&self) -> &'static str {
        "canonXA"
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

        if !fsutil::require_dirs(&self.source_dir, &["CONTENTS", "DCIM"]) {
            debug!("one or more required directories missing, disqualified");
            return false;
        }

        let clips_dir = match fsutil::find_matching_dir(
            &self.source_dir.join("CONTENTS"),
            &self.clips_dir_pattern,
        ) {
            Some(dir) => dir,
            None => {
                debug!("no CONTENTS/CLIPSxxx directory found, disqualified");
                return false;
            }
        };

        if !fsutil::require_files(&clips_dir, &["INDEX.MIF"]) {
            debug!("INDEX.MIF not found in CLIPS directory, disqualified");
            return false;
        }

        debug!(volume = %self.source_dir.display(), "volume is compatible");
        true
    }

    fn enumerate(&mut self) -> Vec<SourceFile> {
        matched_files(&WalkSpec {
            root: &self.source_dir.join("CONTENTS"),
            rel_prefix: "CONTENTS",
            patterns: &self.file_patterns,
            max_depth: None,
            top_level_dirs: None,
        })
        .into_iter()
        .map(|found| SourceFile {
            capture_date: Self::capture_date(&found.file_name),
            source_name: Self::source_name(&found.path),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticInspector;
    use tempfile::TempDir;

    const SIDECAR_XML: &str = r#"<?xml version="1.0"?>
<ClipContent><Device><ModelName>Canon XA60</ModelName></Device></ClipContent>"#;

    fn make_volume(temp: &TempDir) -> PathBuf {
        let clips = temp.path().join("CONTENTS").join("CLIPS001");
        std::fs::create_dir_all(&clips).unwrap();
        std::fs::create_dir_all(temp.path().join("DCIM")).unwrap();
        std::fs::write(clips.join("INDEX.MIF"), b"index").unwrap();
        std::fs::write(clips.join("A001C002_241201AB_CANON.MXF"), b"mxf essence").unwrap();
        std::fs::write(clips.join("A001C002_241201AB_CANON.XML"), SIDECAR_XML).unwrap();
        clips
    }

    fn processor_for(temp: &TempDir, label: &str) -> CanonXa {
        let inspector: Arc<dyn VolumeInspector> =
            Arc::new(StaticInspector::new(label, VolumeFormat::Exfat));
        CanonXa::new(temp.path(), inspector)
    }

    #[test]
    fn test_recognize() {
        let temp = TempDir::new().unwrap();
        make_volume(&temp);

        assert!(processor_for(&temp, "CANON").recognize());
        assert!(!processor_for(&temp, "EOS_DIGITAL").recognize());
    }

    #[test]
    fn test_recognize_requires_clip_index() {
        let temp = TempDir::new().unwrap();
        let clips = make_volume(&temp);
        std::fs::remove_file(clips.join("INDEX.MIF")).unwrap();

        assert!(!processor_for(&temp, "CANON").recognize());
    }

    #[test]
    fn test_enumerate_reads_model_from_sidecar() {
        let temp = TempDir::new().unwrap();
        make_volume(&temp);

        let mut processor = processor_for(&temp, "CANON");
        assert!(processor.recognize());

        let mut files = processor.enumerate();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        // both the MXF clip and its XML sidecar are archived
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "A001C002_241201AB_CANON.MXF");
        assert_eq!(files[1].file_name, "A001C002_241201AB_CANON.XML");
        assert!(files.iter().all(|f| f.source_name == "Canon XA60"));
        assert!(files.iter().all(|f| f.media_type == MediaType::Video));
        assert!(files
            .iter()
            .all(|f| f.capture_date == NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()));
    }

    #[test]
    fn test_missing_sidecar_yields_unknown_model() {
        let temp = TempDir::new().unwrap();
        let clips = make_volume(&temp);
        std::fs::remove_file(clips.join("A001C002_241201AB_CANON.XML")).unwrap();

        let mut processor = processor_for(&temp, "CANON");
        let files = processor.enumerate();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source_name, "Unknown");
    }

    #[test]
    fn test_capture_date_from_clip_name() {
        assert_eq!(
            CanonXa::capture_date("A001C002_241201AB_CANON.MXF"),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
        assert_eq!(CanonXa::capture_date("badname"), NaiveDate::default());
    }
}
