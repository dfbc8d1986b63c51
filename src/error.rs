use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// `pear list` / `pear list-channels` 返回非零
    #[error("`{command}` failed with exit code {code}: {stderr}")]
    QueryFailure {
        command: String,
        code: i32,
        stderr: String,
    },

    /// 变更命令返回了无法识别的非零退出码
    #[error("{}", execution_message(.stdout, .stderr, .code))]
    Execution {
        command: String,
        stdout: String,
        stderr: String,
        code: Option<i32>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ReconcileError {
    /// 失败记录里的 cmd 字段
    pub fn command(&self) -> Option<&str> {
        match self {
            ReconcileError::QueryFailure { command, .. }
            | ReconcileError::Execution { command, .. }
            | ReconcileError::Spawn { command, .. } => Some(command),
            ReconcileError::Validation(_) => None,
        }
    }
}

fn execution_message(stdout: &str, stderr: &str, code: &Option<i32>) -> String {
    let mut parts = Vec::new();
    if !stdout.is_empty() {
        parts.push(format!("stdout: {}", stdout));
    }
    if !stderr.is_empty() {
        parts.push(format!("stderr: {}", stderr));
    }
    if let Some(code) = code {
        parts.push(format!("rc: {}", code));
    }
    parts.join("\n")
}
