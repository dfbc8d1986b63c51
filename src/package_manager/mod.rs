//! 包管理器模块 — 对 pear 命令行的封装

pub mod executor;
pub mod parser;
pub mod types;

pub use executor::{CommandExecutor, DuctExecutor};
pub use types::{
    ActionOutcome, CommandOutput, DesiredState, InstalledChannel, InstalledPackage, Presence,
    Target,
};

use crate::error::ReconcileError;
use parser::{parse_channel_list, parse_package_list};

pub struct PearManager<'a> {
    pub command: String,
    executor: &'a dyn CommandExecutor,
}

impl<'a> PearManager<'a> {
    pub fn new(command: impl Into<String>, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            command: command.into(),
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.command
    }

    /// 执行命令；只有启动失败才算错误，退出码交给调用方判断
    pub fn exec(&self, command: &str) -> Result<CommandOutput, ReconcileError> {
        self.executor
            .run(command)
            .map_err(|source| ReconcileError::Spawn {
                command: command.to_string(),
                source,
            })
    }

    fn query(&self, subcommand: &str) -> Result<String, ReconcileError> {
        let command = format!("{} {}", self.command, subcommand);
        let output = self.exec(&command)?;
        if !output.success() {
            return Err(ReconcileError::QueryFailure {
                command,
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    // ===== 查询 =====

    /// 已安装包 (pear list)
    pub fn query_packages(&self) -> Result<Vec<InstalledPackage>, ReconcileError> {
        Ok(parse_package_list(&self.query("list")?))
    }

    /// 已注册频道 (pear list-channels)
    pub fn query_channels(&self) -> Result<Vec<InstalledChannel>, ReconcileError> {
        Ok(parse_channel_list(&self.query("list-channels")?))
    }

    /// 未指定 version 时匹配任意已安装版本
    pub fn is_package_present(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<bool, ReconcileError> {
        let packages = self.query_packages()?;
        let found = packages
            .iter()
            .find(|pkg| pkg.name == name && version.map_or(true, |v| v == pkg.version));
        if let Some(pkg) = found {
            log::debug!("已安装 {} {} ({})", pkg.name, pkg.version, pkg.status);
        }
        Ok(found.is_some())
    }

    pub fn is_channel_present(&self, url: &str) -> Result<bool, ReconcileError> {
        let channels = self.query_channels()?;
        let found = channels.iter().find(|ch| ch.url == url);
        if let Some(ch) = found {
            log::debug!("已注册频道 {} [{}] {}", ch.url, ch.alias, ch.description);
        }
        Ok(found.is_some())
    }

    /// 目标当前是否存在，按目标类型选择查询命令
    pub fn is_present(&self, target: &Target) -> Result<bool, ReconcileError> {
        match target {
            Target::Package { name, version } => self.is_package_present(name, version.as_deref()),
            Target::Channel { url } => self.is_channel_present(url),
        }
    }

    /// 收敛到期望状态所需的变更命令
    pub fn action_command(&self, desired: &DesiredState) -> String {
        format!(
            "{} {} {}",
            self.command,
            desired.target.verb(desired.presence),
            desired.target.specifier()
        )
    }
}
