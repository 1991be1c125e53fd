//! Volume metadata lookups.
//!
//! Mount, unmount and power-off of block devices belong to the surrounding
//! system; the import core only ever needs two facts about an already-mounted
//! volume: its label and its filesystem format. Both are behind a trait so
//! processors can be exercised against synthetic directory trees in tests.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};

use crate::error::DeviceError;
use crate::model::VolumeFormat;

pub trait VolumeInspector: Send + Sync {
    /// Label of the filesystem mounted at `mount_path`, empty when unknown.
    fn label(&self, mount_path: &Path) -> String;

    /// Filesystem format of the volume mounted at `mount_path`.
    fn format(&self, mount_path: &Path) -> VolumeFormat;
}

/// Production inspector backed by `findmnt` and `lsblk`.
pub struct FindmntInspector;

impl FindmntInspector {
    fn run(command: &str, args: &[&str]) -> Result<String, DeviceError> {
        debug!("device: running '{}' with args {:?}", command, args);

        let output = Command::new(command)
            .args(args)
            .output()
            .map_err(|e| DeviceError::CommandFailed {
                command: command.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(DeviceError::CommandStatus {
                command: command.to_string(),
                code: output.status.code().unwrap_or(-1),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VolumeInspector for FindmntInspector {
    fn label(&self, mount_path: &Path) -> String {
        let mount = mount_path.to_string_lossy();
        match Self::run("findmnt", &["-n", "--output", "label", "--mountpoint", &mount]) {
            Ok(label) => label,
            Err(e) => {
                debug!(
                    "device: could not get volume label for '{}': {}",
                    mount_path.display(),
                    e
                );
                String::new()
            }
        }
    }

    fn format(&self, mount_path: &Path) -> VolumeFormat {
        let mount = mount_path.to_string_lossy();

        let device = match Self::run("findmnt", &["-o", "source", "-n", &mount]) {
            Ok(device) => device,
            Err(e) => {
                warn!(
                    "device: no device mounted at '{}': {}",
                    mount_path.display(),
                    e
                );
                return VolumeFormat::Unknown;
            }
        };

        let output = match Self::run("lsblk", &["-o", "FSTYPE,FSVER", "-n", "-r", &device]) {
            Ok(output) => output,
            Err(e) => {
                warn!("device: could not query filesystem of '{}': {}", device, e);
                return VolumeFormat::Unknown;
            }
        };

        let mut parts = output.split_whitespace();
        let fstype = parts.next().unwrap_or("");
        let fsver = parts.next().unwrap_or("");

        match (fstype, fsver) {
            ("vfat", "FAT32") => VolumeFormat::Fat32,
            ("exfat", _) => VolumeFormat::Exfat,
            _ => {
                warn!("device: unknown filesystem type: '{}'", output);
                VolumeFormat::Unknown
            }
        }
    }
}

/// Inspector returning fixed answers. Used by tests and by import paths where
/// the volume arrived over the network and has no block device behind it.
pub struct StaticInspector {
    label: String,
    format: VolumeFormat,
}

impl StaticInspector {
    pub fn new<S: Into<String>>(label: S, format: VolumeFormat) -> Self {
        Self {
            label: label.into(),
            format,
        }
    }

    /// Inspector for volumes with no meaningful label or format.
    pub fn unlabeled() -> Self {
        Self::new("", VolumeFormat::Unknown)
    }
}

impl VolumeInspector for StaticInspector {
    fn label(&self, _mount_path: &Path) -> String {
        self.label.clone()
    }

    fn format(&self, _mount_path: &Path) -> VolumeFormat {
        self.format
    }
}
