use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of media a source file holds. Used verbatim as a destination path
/// segment, so the rendered names are part of the archive layout contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Audio,
    Video,
    Photo,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "Audio",
            MediaType::Video => "Video",
            MediaType::Photo => "Photo",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem format of the volume a file was enumerated from. Only consulted
/// for the FAT-family modification-time correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeFormat {
    Fat32,
    Exfat,
    #[default]
    Unknown,
}

impl VolumeFormat {
    /// FAT-family on-disk formats store timestamps without timezone
    /// information; those are the ones that need reinterpretation.
    pub fn is_fat_family(&self) -> bool {
        matches!(self, VolumeFormat::Fat32 | VolumeFormat::Exfat)
    }
}

/// One media file discovered on a source volume, as reported by a processor.
///
/// `file_name` is usually a bare name but may carry a directory component for
/// devices whose session directory is part of the file's identity (Behringer
/// X-LIVE). `capture_date` is calendar precision and drives archive
/// bucketing; `file_mod_time` keeps full precision and is replayed onto the
/// destination copy.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub file_name: String,
    pub source_path: PathBuf,
    pub size: u64,
    pub media_type: MediaType,
    pub source_name: String,
    pub capture_date: NaiveDate,
    pub file_mod_time: DateTime<Local>,
    pub volume_format: VolumeFormat,
}

/// Parameters of one import trigger, as accepted by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub volume_path: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub dump: bool,
}

impl ImportRequest {
    pub fn new<P: Into<PathBuf>>(volume_path: P) -> Self {
        Self {
            volume_path: volume_path.into(),
            dry_run: false,
            dump: false,
        }
    }
}

/// Linear job state machine: Pending -> Scanning -> Importing -> terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    Pending,
    Scanning,
    Importing,
    Completed,
    Failed,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStatus::Pending => "Pending",
            ImportStatus::Scanning => "Scanning",
            ImportStatus::Importing => "Importing",
            ImportStatus::Completed => "Completed",
            ImportStatus::Failed => "Failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_as_path_segment() {
        assert_eq!(MediaType::Audio.as_str(), "Audio");
        assert_eq!(MediaType::Video.to_string(), "Video");
        assert_eq!(MediaType::Photo.to_string(), "Photo");
    }

    #[test]
    fn test_fat_family() {
        assert!(VolumeFormat::Fat32.is_fat_family());
        assert!(VolumeFormat::Exfat.is_fat_family());
        assert!(!VolumeFormat::Unknown.is_fat_family());
    }

    #[test]
    fn test_import_request_flag_defaults() {
        let request: ImportRequest =
            serde_json::from_str(r#"{"volume_path": "/media/EOS_DIGITAL"}"#).unwrap();
        assert_eq!(request.volume_path, PathBuf::from("/media/EOS_DIGITAL"));
        assert!(!request.dry_run);
        assert!(!request.dump);
    }
}
