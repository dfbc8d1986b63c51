use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// pear 可执行文件，作为命令前缀按空白切分后直接启动（不经过 shell）。
    ///
    /// 路径本身不能包含空格；可以带参数，例如 `"php /opt/pear/pearcmd.php"`。
    pub executable: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: "pear".to_string(),
        }
    }
}

impl Config {
    /// 配置文件路径：PEAR_STATE_CONFIG > ~/.config/pear-state/config.toml
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("PEAR_STATE_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/pear-state/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}
