use btrfs_sb::utils::validation::Validate;
use btrfs_sb::{OutputFormat, Overrides, SbError, Settings, TomlConfig};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_settings_from_config_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[device]
path = "/srv/images/pool.img"

[output]
format = "csv"

[repair]
backup_dir = "/srv/sb-backups"
dry_run = true
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();

    let config = TomlConfig::from_file(temp_file.path()).unwrap();
    assert!(config.validate().is_ok());

    let settings = Settings::resolve(Overrides::default(), Some(&config)).unwrap();
    assert_eq!(settings.device_path().unwrap(), "/srv/images/pool.img");
    assert_eq!(settings.format, OutputFormat::Csv);
    assert!(settings.dry_run);
    assert_eq!(settings.backup_dir, Some(PathBuf::from("/srv/sb-backups")));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let err = TomlConfig::from_file("/nonexistent/btrfs-sb.toml").unwrap_err();
    assert!(matches!(err, SbError::IoError(_)));
    assert_eq!(err.severity(), btrfs_sb::utils::error::ErrorSeverity::Critical);
}

#[test]
fn test_invalid_device_path_rejected() {
    let config = TomlConfig::from_toml_str("[device]\npath = \"\"\n").unwrap();
    let err = Settings::resolve(Overrides::default(), Some(&config)).unwrap_err();
    assert!(matches!(err, SbError::InvalidConfigValueError { ref field, .. } if field == "device.path"));
    assert!(err.user_friendly_message().starts_with("Configuration problem"));
}

#[cfg(feature = "cli")]
#[test]
fn test_cli_flags_layer_over_file() {
    use btrfs_sb::CliConfig;
    use clap::Parser;

    let config = TomlConfig::from_toml_str("[device]\npath = \"file.img\"\n[output]\nformat = \"json\"\n").unwrap();
    let cli = CliConfig::parse_from(["btrfs-sb", "scan", "--device", "cli.img", "--no-backup"]);

    let settings = Settings::resolve(Overrides::from(&cli), Some(&config)).unwrap();
    assert_eq!(settings.device_path().unwrap(), "cli.img");
    assert_eq!(settings.format, OutputFormat::Json);
    assert_eq!(settings.backup_dir, None);
}
