use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedimportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to run '{command}': {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code}")]
    CommandStatus { command: String, code: i32 },
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("exiftool exited with status {code} for '{path}'")]
    ExiftoolFailed { path: PathBuf, code: i32 },

    #[error("Failed to parse exiftool output: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("No metadata found in '{0}'")]
    Missing(PathBuf),

    #[error("Failed to decode embedded metadata in '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    #[error("Failed to parse sidecar '{path}': {message}")]
    Sidecar { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Volume path does not exist or is not a directory: {0}")]
    VolumeNotFound(PathBuf),

    #[error("Import queue is shutting down, no new jobs accepted")]
    ShuttingDown,

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set modification time on '{path}': {source}")]
    SetModified {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MedimportError>;
