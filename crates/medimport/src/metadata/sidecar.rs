use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::MetadataError;

/// Reads the recording device's model name out of a Canon XA clip sidecar.
///
/// The camera writes one XML file per clip with the shape
/// `<ClipContent><Device><ModelName>Canon XA60</ModelName>...`. Only the
/// model name is of interest here.
pub fn clip_model_name(path: &Path) -> Result<String, MetadataError> {
    let content = std::fs::read_to_string(path).map_err(|e| MetadataError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut in_device = false;
    let mut in_model_name = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"Device" => in_device = true,
                b"ModelName" if in_device => in_model_name = true,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"Device" => in_device = false,
                b"ModelName" => in_model_name = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_model_name {
                    let decoded = e.decode().unwrap_or_default();
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| decoded.into_owned());
                    return Ok(unescaped);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MetadataError::Sidecar {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
            _ => {}
        }
    }

    Err(MetadataError::Missing(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_model_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("A001C002_241201AB_CANON.XML");
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ClipContent>
  <Device>
    <Manufacturer>Canon</Manufacturer>
    <ModelName>Canon XA60</ModelName>
  </Device>
  <Duration>00:12:31</Duration>
</ClipContent>"#,
        )
        .unwrap();

        assert_eq!(clip_model_name(&path).unwrap(), "Canon XA60");
    }

    #[test]
    fn test_model_name_outside_device_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clip.xml");
        std::fs::write(
            &path,
            "<ClipContent><ModelName>Wrong</ModelName><Device><ModelName>Right</ModelName></Device></ClipContent>",
        )
        .unwrap();

        assert_eq!(clip_model_name(&path).unwrap(), "Right");
    }

    #[test]
    fn test_missing_model_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clip.xml");
        std::fs::write(&path, "<ClipContent><Device/></ClipContent>").unwrap();

        assert!(matches!(
            clip_model_name(&path),
            Err(MetadataError::Missing(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            clip_model_name(Path::new("/nonexistent/clip.xml")),
            Err(MetadataError::Io { .. })
        ));
    }
}
