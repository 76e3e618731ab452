use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::startup::Application;
use crate::utils::logger::{init_logger, init_tracing};
use anyhow::Context;
use clap::Parser;

mod cli;
mod config;
mod errors;
mod infrastructure;
mod models;
mod services;
mod startup;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();
    // 初始化日志（全局只需调用一次）
    init_logger();
    init_tracing();

    let cli = Cli::parse();
    log_info!("Starting application initialization...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 构建应用实例（RPC / 桥接 API / 开关来源）
    let application = Application::build(config)
        .await
        .context("Application building failed (provider/bridge api initialization)")?;

    log_info!("Application build complete.");

    // 3. 执行子命令
    match cli.command {
        Command::Quote(args) => application
            .run_quotes(args)
            .await
            .context("Quote polling failed"),
        Command::Send(args) => application.send(args).await.context("Send failed"),
        Command::Balance(args) => application.balance(args).await.context("Balance read failed"),
    }
}
