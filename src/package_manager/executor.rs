//! 命令执行抽象
//!
//! `CommandExecutor` 是核心逻辑唯一的进程入口；生产环境用 `DuctExecutor`，
//! 测试用 `MockExecutor` 记录命令并按顺序回放预设输出。

use super::types::CommandOutput;
use anyhow::{anyhow, Context, Result};

pub trait CommandExecutor {
    /// 同步执行命令字符串，返回退出码与 stdout/stderr
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// 通过 duct 启动子进程（不经过 shell）
#[derive(Debug, Clone, Default)]
pub struct DuctExecutor;

impl CommandExecutor for DuctExecutor {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?;
        let args: Vec<&str> = parts.collect();

        log::debug!("执行: {}", command);
        let output = duct::cmd(program, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("failed to execute `{}`", command))?;

        // 被信号终止时没有退出码
        let code = output.status.code().unwrap_or(-1);
        log::debug!("`{}` 退出码 {}", command, code);

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub use mock::MockExecutor;
