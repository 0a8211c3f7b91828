use crate::core::report::OutputFormat;
use crate::utils::error::{Result, SbError};
use crate::utils::validation::{self, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").ok());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub device: Option<DeviceConfig>,
    pub output: Option<OutputConfig>,
    pub repair: Option<RepairConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Directory receiving the previous contents of every overwritten copy.
    pub backup_dir: Option<String>,
    pub backups: Option<bool>,
    pub dry_run: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SbError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SbError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BTRFS_DEVICE})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let Some(re) = ENV_VAR.as_ref() else {
            return content.to_string();
        };

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn device_path(&self) -> Option<&str> {
        self.device.as_ref().map(|d| d.path.as_str())
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|o| o.format)
    }

    pub fn backup_dir(&self) -> Option<&str> {
        self.repair.as_ref().and_then(|r| r.backup_dir.as_deref())
    }

    pub fn backups_enabled(&self) -> bool {
        self.repair.as_ref().and_then(|r| r.backups).unwrap_or(true)
    }

    pub fn dry_run(&self) -> bool {
        self.repair.as_ref().and_then(|r| r.dry_run).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = self.device_path() {
            validation::validate_path("device.path", path)?;
        }
        if let Some(dir) = self.backup_dir() {
            validation::validate_path("repair.backup_dir", dir)?;
        }
        Ok(())
    }
}
