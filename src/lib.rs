pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use adapters::{FileDevice, LocalStorage, MemoryDevice};
pub use config::{toml_config::TomlConfig, Overrides, Settings};
pub use core::{
    repair::{RepairOutcome, SuperblockRepairer},
    report::OutputFormat,
    scanner::{MirrorReport, SuperblockScanner},
};
pub use domain::model::{CsumType, Superblock};
pub use utils::error::{Result, SbError};
