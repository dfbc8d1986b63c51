mod config;
mod error;
mod package_manager;
mod params;
mod reconcile;
mod report;

use anyhow::Result;
use clap::Parser;
use package_manager::{DuctExecutor, PearManager};
use params::{Cli, ModuleArgs};
use report::{ModuleFailure, ModuleResult};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(result) => {
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string(&failure)?);
            std::process::exit(1);
        }
    }
}

fn execute(cli: &Cli) -> Result<ModuleResult, ModuleFailure> {
    // 参数文件 + 命令行参数，命令行优先
    let file_args = match &cli.args_file {
        Some(path) => ModuleArgs::load(path).map_err(|e| ModuleFailure::from_anyhow(&e))?,
        None => ModuleArgs::default(),
    };
    let args = file_args.merge_cli(cli);
    let desired = args.desired_state().map_err(|e| ModuleFailure::from(&e))?;

    // pear 路径优先级：参数 > 配置文件 > 默认值
    let config = config::Config::load_or_default().map_err(|e| ModuleFailure::from_anyhow(&e))?;
    let executable = args.executable.clone().unwrap_or(config.executable);

    let executor = DuctExecutor;
    let pear = PearManager::new(executable, &executor);
    let outcome = reconcile::run(&desired, &pear, args.check_mode).map_err(|e| {
        log::error!("{}", e);
        ModuleFailure::from(&e)
    })?;

    Ok(ModuleResult::new(&desired, outcome))
}
