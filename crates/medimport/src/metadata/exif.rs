use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag};

use crate::error::MetadataError;

/// The two EXIF fields the import pipeline cares about.
#[derive(Debug, Default)]
pub struct ExifSummary {
    /// Camera model string, e.g. "NIKON D3300".
    pub camera_model: Option<String>,
    /// Capture timestamp as written by the camera, e.g. "2024:12:01 11:45:31".
    pub captured_at: Option<String>,
}

/// Reads camera model and capture timestamp from a file's embedded EXIF
/// block. Works for JPEG, TIFF and TIFF-derived raw formats (NEF, CR2).
pub fn read_summary(path: &Path) -> Result<ExifSummary, MetadataError> {
    let file = File::open(path).map_err(|e| MetadataError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let exif = Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| MetadataError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(ExifSummary {
        camera_model: get_string(&exif, Tag::Model),
        captured_at: get_string(&exif, Tag::DateTimeOriginal)
            .or_else(|| get_string(&exif, Tag::DateTime)),
    })
}

fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).map(|f| {
        let s = f.display_value().to_string();
        s.trim_matches('"').to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = read_summary(Path::new("/nonexistent/file.nef"));
        assert!(matches!(result, Err(MetadataError::Io { .. })));
    }

    #[test]
    fn test_garbage_file_fails_to_decode() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("DSC_0001.NEF");
        std::fs::write(&path, b"not an image at all").unwrap();

        let result = read_summary(&path);
        assert!(matches!(result, Err(MetadataError::Decode { .. })));
    }
}
