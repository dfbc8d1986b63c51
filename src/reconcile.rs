//! 收敛逻辑：查询当前状态 → 判断 → 执行变更 → 分类结果
//!
//! 每次调用最多启动两个子进程：一次查询，加上一次变更命令。
//! 结果分类依赖 pear 输出中的固定文本，与 pear 实际的输出约定保持一致。

use crate::error::ReconcileError;
use crate::package_manager::{
    ActionOutcome, CommandOutput, DesiredState, PearManager, Presence, Target,
};

/// 收敛到期望状态。`dry_run` 时只查询，不执行变更命令。
pub fn run(
    desired: &DesiredState,
    pear: &PearManager<'_>,
    dry_run: bool,
) -> Result<ActionOutcome, ReconcileError> {
    let command = pear.action_command(desired);
    let present = pear.is_present(&desired.target)?;

    if desired.presence.is_satisfied_by(present) {
        log::info!(
            "{} 已处于 {} 状态，无需变更",
            desired.target.specifier(),
            desired.presence
        );
        return Ok(ActionOutcome::skipped(false, command));
    }

    if dry_run {
        log::info!("dry-run: 将执行 `{}`", command);
        return Ok(ActionOutcome::skipped(true, command));
    }

    log::info!("执行 `{}` (via {})", command, pear.name());
    let output = pear.exec(&command)?;
    let changed = match desired.target {
        Target::Package { .. } => classify_package(&command, desired.presence, &output)?,
        Target::Channel { .. } => classify_channel(&command, desired.presence, &output)?,
    };

    Ok(ActionOutcome {
        changed,
        command,
        stdout: output.stdout,
        stderr: output.stderr,
        return_code: Some(output.code),
    })
}

/// install / uninstall 的结果
fn classify_package(
    command: &str,
    presence: Presence,
    output: &CommandOutput,
) -> Result<bool, ReconcileError> {
    let out = output.stdout.as_str();
    let tolerated = match (output.code, presence) {
        (0, _) => true,
        (1, Presence::Present) => out.contains("already installed"),
        _ => false,
    };
    if !tolerated {
        return Err(ReconcileError::Execution {
            command: command.to_string(),
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            code: None,
        });
    }

    let changed = match presence {
        Presence::Absent => out.contains("uninstall ok"),
        Presence::Present => out.contains("install ok"),
    };
    if !changed
        && output.code == 0
        && presence == Presence::Absent
        && out.contains("not installed")
    {
        log::debug!("`{}`: 包本来就未安装", command);
    }
    Ok(changed)
}

/// channel-discover / channel-delete 的结果
fn classify_channel(
    command: &str,
    presence: Presence,
    output: &CommandOutput,
) -> Result<bool, ReconcileError> {
    let out = output.stdout.as_str();
    match (output.code, presence) {
        (1, Presence::Present) if out.contains("is already initialized") => Ok(false),
        (1, Presence::Absent) if out.contains("does not exist") => Ok(false),
        (0, Presence::Present) if out.contains("succeeded") => Ok(true),
        (0, Presence::Absent) if out.contains("deleted") => Ok(true),
        (0, _) => {
            log::warn!(
                "`{}` 成功退出但输出无法识别，视为未变更: {}",
                command,
                out.trim()
            );
            Ok(false)
        }
        (code, _) => Err(ReconcileError::Execution {
            command: command.to_string(),
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            code: Some(code),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::executor::MockExecutor;

    const HEADER: &str = "header\nheader\nheader\n";

    fn listing(body: &str) -> CommandOutput {
        CommandOutput::new(0, format!("{}{}", HEADER, body), "")
    }

    fn package(name: &str, version: Option<&str>, presence: Presence) -> DesiredState {
        DesiredState {
            target: Target::Package {
                name: name.into(),
                version: version.map(String::from),
            },
            presence,
        }
    }

    fn channel(url: &str, presence: Presence) -> DesiredState {
        DesiredState {
            target: Target::Channel { url: url.into() },
            presence,
        }
    }

    fn reconcile(
        desired: &DesiredState,
        responses: Vec<CommandOutput>,
        dry_run: bool,
    ) -> (Result<ActionOutcome, ReconcileError>, Vec<String>) {
        let exec = MockExecutor::with_responses(responses);
        let pear = PearManager::new("pear", &exec);
        let result = run(desired, &pear, dry_run);
        (result, exec.executed_commands())
    }

    #[test]
    fn installed_package_is_left_alone() {
        let desired = package("Log", None, Presence::Present);
        let (result, commands) = reconcile(&desired, vec![listing("Log 1.2 stable")], false);
        let outcome = result.unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.command, "pear install Log");
        assert_eq!(outcome.return_code, None);
        assert_eq!(commands, vec!["pear list"]);
    }

    #[test]
    fn listed_package_is_uninstalled() {
        let desired = package("Net_DNS2", None, Presence::Absent);
        let (result, commands) = reconcile(
            &desired,
            vec![
                listing("Net_DNS2 1.5.3 stable"),
                CommandOutput::new(0, "uninstall ok: channel://pear.php.net/Net_DNS2-1.5.3\n", ""),
            ],
            false,
        );
        let outcome = result.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.return_code, Some(0));
        assert_eq!(commands, vec!["pear list", "pear uninstall Net_DNS2"]);
    }

    #[test]
    fn missing_package_needs_no_uninstall() {
        let desired = package("Net_DNS2", None, Presence::Absent);
        let (result, commands) = reconcile(&desired, vec![listing("Log 1.2 stable")], false);
        assert!(!result.unwrap().changed);
        assert_eq!(commands, vec!["pear list"]);
    }

    #[test]
    fn versioned_install_uses_full_specifier() {
        let desired = package("Log", Some("1.13.3"), Presence::Present);
        let (result, commands) = reconcile(
            &desired,
            vec![
                listing("Log 1.2 stable"),
                CommandOutput::new(0, "install ok: channel://pear.php.net/Log-1.13.3\n", ""),
            ],
            false,
        );
        assert!(result.unwrap().changed);
        assert_eq!(commands[1], "pear install Log-1.13.3");
    }

    #[test]
    fn already_installed_exit_one_is_not_an_error() {
        let desired = package("Log", None, Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![
                listing(""),
                CommandOutput::new(
                    1,
                    "Ignoring installed package pear/Log\nNothing to install, already installed",
                    "",
                ),
            ],
            false,
        );
        assert!(!result.unwrap().changed);
    }

    #[test]
    fn not_installed_on_uninstall_is_not_an_error() {
        let desired = package("Log", None, Presence::Absent);
        let (result, _) = reconcile(
            &desired,
            vec![
                listing("Log 1.2 stable"),
                CommandOutput::new(0, "Package \"pear/Log\" is not installed", ""),
            ],
            false,
        );
        assert!(!result.unwrap().changed);
    }

    #[test]
    fn install_without_ok_marker_reports_unchanged() {
        let desired = package("Log", None, Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![listing(""), CommandOutput::new(0, "downloading Log-1.13.3.tgz ...", "")],
            false,
        );
        assert!(!result.unwrap().changed);
    }

    #[test]
    fn package_failure_carries_output_without_rc() {
        let desired = package("Nope", None, Presence::Present);
        let (result, commands) = reconcile(
            &desired,
            vec![
                listing(""),
                CommandOutput::new(
                    1,
                    "No releases available for package \"pear.php.net/Nope\"",
                    "install failed",
                ),
            ],
            false,
        );
        match result.unwrap_err() {
            ReconcileError::Execution {
                command,
                stdout,
                stderr,
                code,
            } => {
                assert_eq!(command, "pear install Nope");
                assert!(stdout.contains("No releases available"));
                assert_eq!(stderr, "install failed");
                assert_eq!(code, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn already_installed_text_with_other_code_still_fails() {
        let desired = package("Log", None, Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![listing(""), CommandOutput::new(2, "already installed", "")],
            false,
        );
        assert!(matches!(result, Err(ReconcileError::Execution { .. })));
    }

    #[test]
    fn channel_is_discovered() {
        let desired = channel("pear.symfony.com", Presence::Present);
        let (result, commands) = reconcile(
            &desired,
            vec![
                listing("pear.php.net pear PHP Extension and Application Repository"),
                CommandOutput::new(
                    0,
                    concat!(
                        "Adding Channel \"pear.symfony.com\" succeeded\n",
                        "Discovery of channel \"pear.symfony.com\" succeeded",
                    ),
                    "",
                ),
            ],
            false,
        );
        assert!(result.unwrap().changed);
        assert_eq!(
            commands,
            vec!["pear list-channels", "pear channel-discover pear.symfony.com"]
        );
    }

    #[test]
    fn channel_already_initialized_is_unchanged() {
        let desired = channel("pear.symfony.com", Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![
                listing(""),
                CommandOutput::new(1, "Channel \"pear.symfony.com\" is already initialized", ""),
            ],
            false,
        );
        let outcome = result.unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.return_code, Some(1));
    }

    #[test]
    fn channel_delete_paths() {
        let desired = channel("pear.symfony.com", Presence::Absent);
        let registered = || listing("pear.symfony.com symfony2 Symfony2 PEAR Channel");

        let (result, commands) = reconcile(
            &desired,
            vec![registered(), CommandOutput::new(0, "Channel \"pear.symfony.com\" deleted", "")],
            false,
        );
        assert!(result.unwrap().changed);
        assert_eq!(commands[1], "pear channel-delete pear.symfony.com");

        let (result, _) = reconcile(
            &desired,
            vec![
                registered(),
                CommandOutput::new(
                    1,
                    "channel-delete: channel \"pear.symfony.com\" does not exist",
                    "",
                ),
            ],
            false,
        );
        assert!(!result.unwrap().changed);
    }

    #[test]
    fn channel_failure_includes_return_code() {
        let desired = channel("pear.example.invalid", Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![listing(""), CommandOutput::new(1, "Discovery of channel failed", "")],
            false,
        );
        let err = result.unwrap_err();
        assert_eq!(err.command(), Some("pear channel-discover pear.example.invalid"));
        assert_eq!(err.to_string(), "stdout: Discovery of channel failed\nrc: 1");
    }

    #[test]
    fn channel_other_nonzero_code_fails() {
        let desired = channel("pear.symfony.com", Presence::Absent);
        let (result, _) = reconcile(
            &desired,
            vec![listing("pear.symfony.com symfony2 x"), CommandOutput::new(255, "", "fatal")],
            false,
        );
        assert!(matches!(
            result,
            Err(ReconcileError::Execution { code: Some(255), .. })
        ));
    }

    #[test]
    fn channel_success_without_marker_is_unchanged() {
        let desired = channel("pear.symfony.com", Presence::Present);
        let (result, _) = reconcile(
            &desired,
            vec![listing(""), CommandOutput::new(0, "something unexpected", "")],
            false,
        );
        assert!(!result.unwrap().changed);
    }

    #[test]
    fn dry_run_never_mutates() {
        let cases = vec![
            (package("Log", None, Presence::Present), listing("")),
            (package("Log", None, Presence::Absent), listing("Log 1.2 stable")),
            (channel("pear.symfony.com", Presence::Present), listing("")),
            (channel("pear.symfony.com", Presence::Absent), listing("pear.symfony.com symfony2 x")),
        ];
        for (desired, query) in cases {
            let (result, commands) = reconcile(&desired, vec![query], true);
            let outcome = result.unwrap();
            assert!(outcome.changed, "{:?}", desired);
            assert!(outcome.stdout.is_empty());
            assert_eq!(commands.len(), 1, "{:?}", commands);
            assert!(commands[0].starts_with("pear list"));
        }
    }

    #[test]
    fn dry_run_reports_no_change_when_satisfied() {
        let desired = channel("pear.php.net", Presence::Present);
        let (result, commands) = reconcile(&desired, vec![listing("pear.php.net pear x")], true);
        assert!(!result.unwrap().changed);
        assert_eq!(commands, vec!["pear list-channels"]);
    }

    #[test]
    fn second_run_is_idempotent() {
        let desired = package("Log", None, Presence::Present);
        let exec = MockExecutor::with_responses(vec![
            listing(""),
            CommandOutput::new(0, "install ok: channel://pear.php.net/Log-1.13.3", ""),
            listing("Log 1.13.3 stable"),
        ]);
        let pear = PearManager::new("pear", &exec);
        assert!(run(&desired, &pear, false).unwrap().changed);
        assert!(!run(&desired, &pear, false).unwrap().changed);
        assert_eq!(exec.executed_commands().len(), 3);
    }

    #[test]
    fn query_failure_stops_the_run() {
        let desired = package("Log", None, Presence::Present);
        let (result, commands) = reconcile(&desired, vec![CommandOutput::new(2, "", "")], false);
        assert!(matches!(
            result,
            Err(ReconcileError::QueryFailure { code: 2, .. })
        ));
        assert_eq!(commands, vec!["pear list"]);
    }
}
