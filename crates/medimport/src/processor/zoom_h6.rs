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

/// Project trees look like `FOLDER01/ZOOM0003/ZOOM0003_Tr1.WAV`, with backup
/// takes carrying a `-0001` style suffix.
const FILE_MATCH_PATTERNS: &[&str] =
    &[r"FOLDER\d{2}/ZOOM\d{4}/ZOOM\d{4}_(BU|LR|Tr1|Tr2|Tr3|Tr4)(-\d{4})?\.WAV"];

const PROJECT_SIDECAR_PATTERN: &str = r"\d{6}-\d{6}\.hprj";

/// Zoom H6 multitrack recorder. The card has no distinctive label, so the
/// project directory shape plus the `.hprj` project file is the signature.
pub struct ZoomH6 {
    source_dir: PathBuf,
    inspector: Arc<dyn VolumeInspector>,
    volume_format: VolumeFormat,
    file_patterns: Vec<Regex>,
    folder_pattern: Regex,
    project_dir_pattern: Regex,
    sidecar_pattern: Regex,
}

impl ZoomH6 {
    pub fn new(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            inspector,
            volume_format: VolumeFormat::Unknown,
            file_patterns: compile_patterns(FILE_MATCH_PATTERNS),
            folder_pattern: Regex::new(r"FOLDER\d{2}")
                .expect("built-in directory pattern must compile"),
            project_dir_pattern: Regex::new(r"ZOOM\d{4}")
                .expect("built-in directory pattern must compile"),
            sidecar_pattern: Regex::new(PROJECT_SIDECAR_PATTERN)
                .expect("built-in file pattern must compile"),
        }
    }

    pub fn boxed(source_dir: &Path, inspector: Arc<dyn VolumeInspector>) -> Box<dyn Processor> {
        Box::new(Self::new(source_dir, inspector))
    }

    /// The project sidecar is named `yymmdd-hhmmss.hprj`; its date stamps
    /// every take in the project directory.
    fn capture_date(&self, project_dir: &Path) -> NaiveDate {
        let sidecar = match fsutil::find_matching_file(project_dir, &self.sidecar_pattern) {
            Some(sidecar) => sidecar,
            None => {
                error!(
                    project_dir = %project_dir.display(),
                    "no project sidecar found, cannot derive capture date"
                );
                return NaiveDate::default();
            }
        };

        let basename = sidecar
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let date_part = basename.get(0..6).unwrap_or_default();

        match NaiveDate::parse_from_str(date_part, "%y%m%d") {
            Ok(date) => date,
            Err(e) => {
                error!(basename, "failed to parse capture date: {}", e);
                NaiveDate::default()
            }
        }
    }
}

impl Processor for ZoomH6 {
    fn name(&self) -> &'static str {
        "zoomH6"
    }

    fn recognize(&mut self) -> bool {
        debug!(volume = %self.source_dir.display(), "testing volume compatibility");

        self.volume_format = self.inspector.format(&self.source_dir);

        let folder = match fsutil::find_matching_dir(&self.source_dir, &self.folder_pattern) {
            Some(folder) => folder,
            None => {
                debug!("no FOLDERxx directory found at volume root, disqualified");
                return false;
            }
        };

        let project = match fsutil::find_matching_dir(&folder, &self.project_dir_pattern) {
            Some(project) => project,
            None => {
                debug!("no ZOOMxxxx project directory found, disqualified");
                return false;
            }
        };

        if fsutil::find_matching_file(&project, &self.sidecar_pattern).is_none() {
            debug!("no .hprj project file found, disqualified");
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
            max_depth: None,
            top_level_dirs: Some(&self.folder_pattern),
        })
        .into_iter()
        .map(|found| {
            let project_dir = found.path.parent().unwrap_or(&self.source_dir).to_path_buf();
            SourceFile {
                capture_date: self.capture_date(&project_dir),
                file_name: found.file_name,
                source_path: found.path,
                size: found.size,
                media_type: MediaType::Audio,
                source_name: "Zoom H6".to_string(),
                file_mod_time: found.modified,
                volume_format: self.volume_format,
            }
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticInspector;
    use tempfile::TempDir;

    fn processor_for(temp: &TempDir) -> ZoomH6 {
        let inspector: Arc<dyn VolumeInspector> = Arc::new(StaticInspector::unlabeled());
        ZoomH6::new(temp.path(), inspector)
    }

    fn make_project(temp: &TempDir, folder: &str, project: &str, sidecar: &str) -> PathBuf {
        let project_dir = temp.path().join(folder).join(project);
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join(sidecar), b"prj").unwrap();
        project_dir
    }

    #[test]
    fn test_recognize() {
        let temp = TempDir::new().unwrap();
        make_project(&temp, "FOLDER01", "ZOOM0001", "240401-183000.hprj");

        assert!(processor_for(&temp).recognize());
    }

    #[test]
    fn test_recognize_requires_project_sidecar() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("FOLDER01").join("ZOOM0001");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("ZOOM0001_LR.WAV"), b"pcm").unwrap();

        assert!(!processor_for(&temp).recognize());
    }

    #[test]
    fn test_enumerate_takes_date_from_sidecar() {
        let temp = TempDir::new().unwrap();
        let project_dir = make_project(&temp, "FOLDER01", "ZOOM0001", "240401-183000.hprj");
        std::fs::write(project_dir.join("ZOOM0001_LR.WAV"), b"pcm").unwrap();
        std::fs::write(project_dir.join("ZOOM0001_Tr1.WAV"), b"pcm").unwrap();
        std::fs::write(project_dir.join("ZOOM0001_Tr1-0001.WAV"), b"pcm").unwrap();
        // a stray file that matches no take pattern
        std::fs::write(project_dir.join("ZOOM0001.hprj.bak"), b"x").unwrap();

        let mut processor = processor_for(&temp);
        assert!(processor.recognize());

        let files = processor.enumerate();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.source_name == "Zoom H6"));
        assert!(files
            .iter()
            .all(|f| f.capture_date == NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    #[test]
    fn test_missing_sidecar_yields_default_date() {
        let temp = TempDir::new().unwrap();
        let processor = processor_for(&temp);
        let empty = temp.path().join("FOLDER01").join("ZOOM0002");
        std::fs::create_dir_all(&empty).unwrap();

        assert_eq!(processor.capture_date(&empty), NaiveDate::default());
    }
}
