//! Device detection and file enumeration.
//!
//! Each supported recorder gets one processor: a detector that decides
//! whether a mounted volume was written by that device, and an enumerator
//! that lists the device's media files. Several processors may claim the same
//! volume; recordings legitimately interleave device layouts on one card, so
//! every match contributes files.

pub mod behringer_x32;
pub mod behringer_xlive;
pub mod blackmagic_ios;
pub mod canon_eos;
pub mod canon_xa;
pub mod jack_recorder;
pub mod nikon_d3300;
mod walk;
pub mod zoom_h1n;
pub mod zoom_h6;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, LocalResult, Offset, TimeZone};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::device::VolumeInspector;
use crate::model::SourceFile;

pub trait Processor: Send {
    /// Stable identifier, also the name used in the config allow-list.
    fn name(&self) -> &'static str;

    /// Decides whether the volume this processor was constructed for was
    /// written by its device. Checks run cheapest-first and short-circuit,
    /// so a wrong volume label disqualifies before any metadata is read.
    fn recognize(&mut self) -> bool;

    /// Lists the device's media files on the volume. Only meaningful after
    /// `recognize` returned true.
    fn enumerate(&mut self) -> Vec<SourceFile>;
}

type Constructor = fn(&Path, Arc<dyn VolumeInspector>) -> Box<dyn Processor>;

/// Name -> constructor table of every compiled-in processor. Adding a device
/// means adding one row here plus its module.
pub const PROCESSOR_TABLE: &[(&str, Constructor)] = &[
    ("behringerX32", behringer_x32::BehringerX32::boxed),
    ("behringerXLIVE", behringer_xlive::BehringerXLive::boxed),
    ("blackmagicIOS", blackmagic_ios::BlackmagicIos::boxed),
    ("canonEOS", canon_eos::CanonEos::boxed),
    ("canonXA", canon_xa::CanonXa::boxed),
    ("jackRecorder", jack_recorder::JackRecorder::boxed),
    ("nikonD3300", nikon_d3300::NikonD3300::boxed),
    ("zoomH1n", zoom_h1n::ZoomH1n::boxed),
    ("zoomH6", zoom_h6::ZoomH6::boxed),
];

/// Returns true if the processor names a known table entry.
pub fn is_known_processor(name: &str) -> bool {
    PROCESSOR_TABLE.iter().any(|(n, _)| *n == name)
}

fn processor_enabled(enabled: &[String], name: &str) -> bool {
    enabled.is_empty() || enabled.iter().any(|n| n == name)
}

/// Instantiates the configured subset of processors for one volume. An empty
/// allow-list enables everything.
pub fn init_processors(
    enabled: &[String],
    volume_path: &Path,
    inspector: &Arc<dyn VolumeInspector>,
) -> Vec<Box<dyn Processor>> {
    PROCESSOR_TABLE
        .iter()
        .filter(|(name, _)| processor_enabled(enabled, name))
        .map(|(_, constructor)| constructor(volume_path, Arc::clone(inspector)))
        .collect()
}

/// Runs recognition across the configured processors and returns those that
/// claimed the volume. An empty result is an expected outcome for foreign
/// volumes, not a fault.
pub fn find_processors(
    config: &Config,
    volume_path: &Path,
    inspector: &Arc<dyn VolumeInspector>,
) -> Vec<Box<dyn Processor>> {
    info!(
        volume = %volume_path.display(),
        "looking for processors to handle volume"
    );

    let mut found: Vec<Box<dyn Processor>> = Vec::new();
    for mut processor in init_processors(&config.enabled_processors, volume_path, inspector) {
        if processor.recognize() {
            found.push(processor);
        }
    }

    if found.is_empty() {
        warn!(
            volume = %volume_path.display(),
            "no processor found for volume, skipping"
        );
        return found;
    }

    for processor in &found {
        info!(
            processor = processor.name(),
            volume = %volume_path.display(),
            "found processor to handle volume"
        );
    }

    found
}

/// Enumerates files across all matched processors and concatenates the
/// results in registry order; order within one processor is traversal order.
///
/// Afterwards runs the one correctness-critical timezone fix in the system:
/// FAT-family volumes store modification times without zone information and
/// the kernel reports them as if they were UTC, so on a non-UTC host each
/// FAT-sourced timestamp is reinterpreted as local wall-clock time. When
/// `dump` is set, the aggregated list is printed as JSON for inspection.
pub fn enumerate_sources(processors: &mut [Box<dyn Processor>], dump: bool) -> Vec<SourceFile> {
    let mut all_files = Vec::new();

    for processor in processors.iter_mut() {
        let mut files = processor.enumerate();
        debug!(
            processor = processor.name(),
            count = files.len(),
            "enumerated source files"
        );
        all_files.append(&mut files);
    }

    if local_offset_seconds() != 0 {
        for file in &mut all_files {
            if file.volume_format.is_fat_family() {
                file.file_mod_time = reinterpret_utc_as_local(&file.file_mod_time);
            }
        }
    }

    if dump {
        match serde_json::to_string_pretty(&all_files) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("failed to serialize source file dump: {}", e),
        }
    }

    all_files
}

fn local_offset_seconds() -> i32 {
    Local::now().offset().fix().local_minus_utc()
}

/// Takes the wall-clock digits of `dtm`'s UTC rendering and re-reads them as
/// local time. Undoes the kernel's "FAT timestamps are UTC" assumption.
pub(crate) fn reinterpret_utc_as_local(dtm: &DateTime<Local>) -> DateTime<Local> {
    let naive = dtm.naive_utc();
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(patched) => patched,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // The wall-clock time fell in a DST gap; leave it untouched.
        LocalResult::None => *dtm,
    }
}
