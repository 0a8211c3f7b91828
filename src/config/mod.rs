#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::report::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;
use toml_config::TomlConfig;

pub const DEFAULT_BACKUP_DIR: &str = "./sb-backups";

/// Effective settings after layering CLI flags over the TOML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device: Option<String>,
    pub format: OutputFormat,
    pub dry_run: bool,
    /// `None` when backups are disabled.
    pub backup_dir: Option<PathBuf>,
}

/// CLI values that may override the file. Kept separate from clap so the
/// library builds without the `cli` feature.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device: Option<String>,
    pub format: Option<OutputFormat>,
    pub dry_run: bool,
    pub no_backup: bool,
    pub backup_dir: Option<String>,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<&TomlConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();
        file.validate()?;

        let device = overrides
            .device
            .or_else(|| file.device_path().map(str::to_string));

        let backups_enabled = !overrides.no_backup && file.backups_enabled();
        let backup_dir = backups_enabled.then(|| {
            PathBuf::from(
                overrides
                    .backup_dir
                    .as_deref()
                    .or(file.backup_dir())
                    .unwrap_or(DEFAULT_BACKUP_DIR),
            )
        });

        let settings = Self {
            device,
            format: overrides.format.or(file.output_format()).unwrap_or_default(),
            dry_run: overrides.dry_run || file.dry_run(),
            backup_dir,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn device_path(&self) -> Result<&str> {
        validation::validate_required_field("device.path", &self.device).map(String::as_str)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if let Some(device) = &self.device {
            validation::validate_path("device", device)?;
        }
        if let Some(dir) = &self.backup_dir {
            validation::validate_path("backup_dir", &dir.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl From<&cli::CliConfig> for Overrides {
    fn from(cli: &cli::CliConfig) -> Self {
        Self {
            device: cli.device.clone(),
            format: cli.format,
            dry_run: cli.dry_run,
            no_backup: cli.no_backup,
            backup_dir: cli.backup_dir.clone(),
        }
    }
}
