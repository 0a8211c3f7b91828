use crate::domain::model::CsumType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SbError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Superblock decoding failed: {0}")]
    DecodeError(#[from] binrw::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Bad superblock magic at offset {offset:#x}: {found:02x?}")]
    BadMagic { offset: u64, found: [u8; 8] },

    #[error("size does not match: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Unsupported checksum type {0}")]
    UnsupportedCsumType(u16),

    #[error("csum_type is not {expected:?} (found {actual:?})")]
    CsumTypeMismatch { expected: CsumType, actual: CsumType },

    #[error("Invalid superblock mirror {0}: only mirrors 0..=2 exist")]
    InvalidMirror(u32),

    #[error("Mirror {mirror} at offset {offset:#x} lies beyond the device end ({device_size} bytes)")]
    MirrorOutOfRange {
        mirror: u32,
        offset: u64,
        device_size: u64,
    },

    #[error("No valid superblock found on the device")]
    NoValidSuperblock,

    #[error("Refusing to repair: {reason}")]
    UnsafeRepair { reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Format,
    Integrity,
    Configuration,
    Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SbError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SbError::IoError(_) => ErrorCategory::Io,
            SbError::DecodeError(_)
            | SbError::SizeMismatch { .. }
            | SbError::UnsupportedCsumType(_)
            | SbError::CsumTypeMismatch { .. }
            | SbError::SerializationError(_)
            | SbError::CsvError(_) => ErrorCategory::Format,
            SbError::BadMagic { .. } | SbError::NoValidSuperblock | SbError::UnsafeRepair { .. } => {
                ErrorCategory::Integrity
            }
            SbError::ConfigError { .. }
            | SbError::InvalidConfigValueError { .. }
            | SbError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SbError::InvalidMirror(_) | SbError::MirrorOutOfRange { .. } => ErrorCategory::Usage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Usage => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Format => ErrorSeverity::High,
            ErrorCategory::Integrity | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SbError::IoError(_) => "Check that the device or image exists and that you have read/write permission",
            SbError::BadMagic { .. } => "The device may not be btrfs; try another mirror with `scan`",
            SbError::NoValidSuperblock => "No mirror passed magic and checksum checks; restore from a saved backup",
            SbError::UnsafeRepair { .. } => "Pick a mirror that passes `verify` as the repair source",
            SbError::UnsupportedCsumType(_) => "This checksum algorithm is not known to this tool",
            SbError::InvalidMirror(_) | SbError::MirrorOutOfRange { .. } => {
                "Run `scan` to list the mirrors that fit on this device"
            }
            SbError::ConfigError { .. }
            | SbError::InvalidConfigValueError { .. }
            | SbError::MissingConfigError { .. } => "Review the command line arguments and the TOML config file",
            _ => "Re-run with --verbose for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not access the device: {}", self),
            ErrorCategory::Format => format!("Superblock data could not be processed: {}", self),
            ErrorCategory::Integrity => format!("Superblock integrity problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Usage => format!("Invalid request: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SbError>;
