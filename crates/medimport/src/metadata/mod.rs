//! Embedded-metadata readers used during recognition and enumeration.
//!
//! Three sources, matching what the supported devices actually write:
//! in-container EXIF (`exif`), the external `exiftool` binary for formats the
//! native reader cannot open (Canon raw video, QuickTime), and per-clip XML
//! sidecar files (Canon XA).

pub mod exif;
pub mod exiftool;
pub mod sidecar;

pub use exif::ExifSummary;
pub use exiftool::ExiftoolData;
