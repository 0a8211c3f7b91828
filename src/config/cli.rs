use crate::core::report::OutputFormat;
use crate::domain::model::BTRFS_SUPER_MIRROR_MAX;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "btrfs-sb")]
#[command(about = "Inspect, verify and repair btrfs superblocks")]
#[command(version)]
pub struct CliConfig {
    /// Block device or filesystem image
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Show what would be written without touching the device
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Do not save previous superblock contents before writing
    #[arg(long, global = true)]
    pub no_backup: bool,

    #[arg(long, global = true)]
    pub backup_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every field of one superblock copy
    Dump {
        #[arg(short, long, default_value_t = 0)]
        mirror: u32,
    },
    /// List all copies with magic, checksum and sanity status
    Scan,
    /// Exit non-zero unless every copy is valid
    Verify,
    /// Print the tree root backups of one copy
    Backups {
        #[arg(short, long, default_value_t = 0)]
        mirror: u32,
    },
    /// Recompute and rewrite the checksum of one copy
    FixCsum {
        #[arg(short, long, default_value_t = 0)]
        mirror: u32,
    },
    /// Copy one valid superblock over all others (newest valid copy by default)
    Restore {
        #[arg(long)]
        from: Option<u32>,
    },
    /// Change the filesystem label offline
    Label { label: String },
}

impl Command {
    pub fn writes_device(&self) -> bool {
        matches!(
            self,
            Command::FixCsum { .. } | Command::Restore { .. } | Command::Label { .. }
        )
    }

    /// The mirror index named on the command line, if any.
    pub fn mirror(&self) -> Option<u32> {
        match self {
            Command::Dump { mirror } | Command::Backups { mirror } | Command::FixCsum { mirror } => {
                Some(*mirror)
            }
            Command::Restore { from } => *from,
            Command::Scan | Command::Verify | Command::Label { .. } => None,
        }
    }
}

impl Validate for Command {
    fn validate(&self) -> Result<()> {
        if let Some(mirror) = self.mirror() {
            validate_range("mirror", mirror, 0, BTRFS_SUPER_MIRROR_MAX - 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = CliConfig::parse_from(["btrfs-sb", "dump", "-d", "fs.img", "--mirror", "1"]);
        assert_eq!(cli.device.as_deref(), Some("fs.img"));
        assert!(matches!(cli.command, Command::Dump { mirror: 1 }));
        assert!(!cli.command.writes_device());

        let cli = CliConfig::parse_from(["btrfs-sb", "--format", "json", "restore", "--from", "2", "--dry-run"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Command::Restore { from: Some(2) }));
        assert!(cli.command.writes_device());

        let cli = CliConfig::parse_from(["btrfs-sb", "label", "tank"]);
        assert!(matches!(cli.command, Command::Label { ref label } if label == "tank"));
    }

    #[test]
    fn test_command_is_required() {
        assert!(CliConfig::try_parse_from(["btrfs-sb"]).is_err());
    }

    #[test]
    fn test_mirror_argument_is_range_checked() {
        let cli = CliConfig::parse_from(["btrfs-sb", "fix-csum", "--mirror", "2"]);
        assert_eq!(cli.command.mirror(), Some(2));
        assert!(cli.command.validate().is_ok());

        let cli = CliConfig::parse_from(["btrfs-sb", "dump", "--mirror", "3"]);
        assert!(matches!(
            cli.command.validate(),
            Err(crate::utils::error::SbError::InvalidConfigValueError { ref field, .. }) if field == "mirror"
        ));

        let cli = CliConfig::parse_from(["btrfs-sb", "restore", "--from", "7"]);
        assert!(cli.command.validate().is_err());

        let cli = CliConfig::parse_from(["btrfs-sb", "restore"]);
        assert_eq!(cli.command.mirror(), None);
        assert!(cli.command.validate().is_ok());
    }
}
