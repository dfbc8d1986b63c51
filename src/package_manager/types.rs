//! PearManager 相关数据类型定义

use serde::Serialize;
use std::fmt;

/// 命令输出结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// 期望状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Present => "present",
            Presence::Absent => "absent",
        }
    }

    /// 当前状态是否已满足期望
    pub fn is_satisfied_by(&self, installed: bool) -> bool {
        match self {
            Presence::Present => installed,
            Presence::Absent => !installed,
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 管理目标：包或频道，二者互斥
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Package {
        name: String,
        version: Option<String>,
    },
    Channel {
        url: String,
    },
}

impl Target {
    /// 包的完整标识：`name` 或 `name-version`
    pub fn specifier(&self) -> String {
        match self {
            Target::Package {
                name,
                version: Some(version),
            } => format!("{}-{}", name, version),
            Target::Package { name, version: None } => name.clone(),
            Target::Channel { url } => url.clone(),
        }
    }

    /// 期望状态对应的 pear 子命令
    pub fn verb(&self, presence: Presence) -> &'static str {
        match (self, presence) {
            (Target::Package { .. }, Presence::Present) => "install",
            (Target::Package { .. }, Presence::Absent) => "uninstall",
            (Target::Channel { .. }, Presence::Present) => "channel-discover",
            (Target::Channel { .. }, Presence::Absent) => "channel-delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub target: Target,
    pub presence: Presence,
}

/// `pear list` 中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub status: String,
}

/// `pear list-channels` 中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledChannel {
    pub url: String,
    pub alias: String,
    pub description: String,
}

/// 一次变更命令的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub changed: bool,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
}

impl ActionOutcome {
    /// 未执行任何命令时的结果（已满足或 dry-run）
    pub fn skipped(changed: bool, command: String) -> Self {
        Self {
            changed,
            command,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
        }
    }
}
