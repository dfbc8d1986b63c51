//! 结果记录：成功输出 ModuleResult，失败输出 ModuleFailure，均为单个 JSON 对象

use crate::error::ReconcileError;
use crate::package_manager::{ActionOutcome, DesiredState, Presence, Target};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    pub cmd: String,
    pub name: Option<String>,
    pub version: Option<String>,
    pub state: Presence,
    pub channel: Option<String>,
    pub stdout: String,
    pub stderr: String,
    /// 仅在实际执行了变更命令时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
}

impl ModuleResult {
    pub fn new(desired: &DesiredState, outcome: ActionOutcome) -> Self {
        let (name, version, channel) = match &desired.target {
            Target::Package { name, version } => (Some(name.clone()), version.clone(), None),
            Target::Channel { url } => (None, None, Some(url.clone())),
        };
        Self {
            changed: outcome.changed,
            cmd: outcome.command,
            name,
            version,
            state: desired.presence,
            channel,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            rc: outcome.return_code,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleFailure {
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    pub msg: String,
}

impl From<&ReconcileError> for ModuleFailure {
    fn from(err: &ReconcileError) -> Self {
        Self {
            failed: true,
            cmd: err.command().map(String::from),
            msg: err.to_string(),
        }
    }
}

impl ModuleFailure {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        Self {
            failed: true,
            cmd: None,
            msg: format!("{:#}", err),
        }
    }
}
