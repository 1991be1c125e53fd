use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::warn;

use crate::error::MetadataError;

/// Fields extracted from one `exiftool -json` invocation.
///
/// `exiftool` is the only reader that handles every container the supported
/// cameras produce (CR2/CR3 raw, QuickTime MOV/MP4), so formats the native
/// EXIF reader cannot open go through here.
#[derive(Debug, Default, Deserialize)]
pub struct ExiftoolData {
    #[serde(rename = "Model")]
    pub model: Option<String>,

    #[serde(rename = "DateTimeOriginal")]
    pub date_time_original: Option<String>,

    /// Writing application. QuickTime recordings expose
    /// `com.apple.quicktime.software` under this name.
    #[serde(rename = "Software")]
    pub software: Option<String>,

    /// Container creation timestamp, e.g. "2024:12:01 17:45:31".
    #[serde(rename = "CreateDate")]
    pub create_date: Option<String>,
}

impl ExiftoolData {
    pub fn read(path: &Path) -> Result<ExiftoolData, MetadataError> {
        let output = Command::new("exiftool")
            .arg("-json")
            .arg(path)
            .output()
            .map_err(|e| MetadataError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(MetadataError::ExiftoolFailed {
                path: path.to_path_buf(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        let mut entries = serde_json::from_slice::<VecDeque<ExiftoolData>>(&output.stdout)?;
        let first = entries.pop_front();
        if !entries.is_empty() {
            warn!(
                path = %path.display(),
                "exiftool returned multiple entries, ignoring all but the first"
            );
        }

        first.ok_or_else(|| MetadataError::Missing(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_is_an_error() {
        // Fails with Io when exiftool is not installed, ExiftoolFailed when it
        // is. Either way the caller sees an error and skips the file.
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("IMG_0001.CR2");
        std::fs::write(&path, b"garbage").unwrap();

        assert!(ExiftoolData::read(&path).is_err());
    }

    #[test]
    fn test_field_names_match_exiftool_output() {
        let json = r#"[{
            "SourceFile": "clip.mov",
            "Model": "Canon EOS R6",
            "DateTimeOriginal": "2024:12:01 11:45:31",
            "Software": "Blackmagic Cam 2.1",
            "CreateDate": "2024:12:01 17:45:31"
        }]"#;

        let mut entries: VecDeque<ExiftoolData> = serde_json::from_str(json).unwrap();
        let data = entries.pop_front().unwrap();
        assert_eq!(data.model.as_deref(), Some("Canon EOS R6"));
        assert_eq!(data.date_time_original.as_deref(), Some("2024:12:01 11:45:31"));
        assert_eq!(data.software.as_deref(), Some("Blackmagic Cam 2.1"));
        assert_eq!(data.create_date.as_deref(), Some("2024:12:01 17:45:31"));
    }
}
