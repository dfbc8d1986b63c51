//! 模块参数：命令行参数与 JSON 参数文件，校验后得到 DesiredState

use crate::error::ReconcileError;
use crate::package_manager::{DesiredState, Presence, Target};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for Presence {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => Presence::Present,
            StateArg::Absent => Presence::Absent,
        }
    }
}

/// Manage PHP PEAR packages and channels
#[derive(Debug, Parser)]
#[command(name = "pear-state")]
pub struct Cli {
    /// JSON file with module arguments (name, version, channel, state, executable)
    pub args_file: Option<PathBuf>,

    /// Name of the PEAR package
    #[arg(long)]
    pub name: Option<String>,

    /// Version of the package; newest when omitted
    #[arg(long)]
    pub version: Option<String>,

    /// URL of the PEAR channel
    #[arg(long)]
    pub channel: Option<String>,

    /// Desired state [default: present]
    #[arg(long, value_enum)]
    pub state: Option<StateArg>,

    /// Path of the pear binary, split on whitespace (may carry arguments, no spaces in the path)
    #[arg(long)]
    pub executable: Option<String>,

    /// Only report what would change
    #[arg(long)]
    pub check: bool,
}

/// 参数文件内容
#[derive(Debug, Default, Deserialize)]
pub struct ModuleArgs {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub channel: Option<String>,
    #[serde(default)]
    pub state: Option<StateArg>,
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default, rename = "_ansible_check_mode")]
    pub check_mode: bool,
}

/// 宿主工具按 YAML 原样传入标量，`version: 1.2` 会是数字，统一转成字符串
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!("expected a scalar, got {}", other))),
    }
}

impl ModuleArgs {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read args file {}", path.display()))?;
        let args = serde_json::from_str(&content)
            .with_context(|| format!("invalid args file {}", path.display()))?;
        Ok(args)
    }

    /// 命令行参数优先于参数文件
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        fn pick(cli: &Option<String>, file: Option<String>) -> Option<String> {
            cli.clone().or(file)
        }
        self.name = pick(&cli.name, self.name);
        self.version = pick(&cli.version, self.version);
        self.channel = pick(&cli.channel, self.channel);
        self.executable = pick(&cli.executable, self.executable);
        self.state = cli.state.or(self.state);
        self.check_mode = cli.check || self.check_mode;
        self
    }

    /// name / channel 必须且只能提供一个；空字符串视为未提供
    pub fn desired_state(&self) -> Result<DesiredState, ReconcileError> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        let name = non_empty(&self.name);
        let channel = non_empty(&self.channel);
        let version = non_empty(&self.version);

        let target = match (name, channel) {
            (Some(_), Some(_)) => {
                return Err(ReconcileError::Validation(
                    "parameters are mutually exclusive: name|channel".to_string(),
                ))
            }
            (None, None) => {
                return Err(ReconcileError::Validation(
                    "one of the following is required: name, channel".to_string(),
                ))
            }
            (Some(name), None) => Target::Package { name, version },
            (None, Some(url)) => {
                if let Some(version) = version {
                    log::warn!("频道不支持 version 参数，忽略 {}", version);
                }
                Target::Channel { url }
            }
        };

        Ok(DesiredState {
            target,
            presence: self.state.unwrap_or(StateArg::Present).into(),
        })
    }
}
