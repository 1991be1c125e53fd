pub mod config;
pub mod device;
pub mod error;
pub mod fsutil;
pub mod import;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod processor;

pub use config::{load_config, Config};
pub use device::{FindmntInspector, StaticInspector, VolumeInspector};
pub use error::{
    ConfigError, DeviceError, ImportError, MedimportError, MetadataError, Result,
};
pub use import::{ImportQueue, ImportStats, JobOutcome};
pub use model::{ImportRequest, ImportStatus, MediaType, SourceFile, VolumeFormat};
pub use processor::{enumerate_sources, find_processors, Processor};
