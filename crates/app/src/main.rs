mod settings;

use std::path::Path;
use std::sync::Arc;

use crossbot_broker::oanda::OandaClient;
use crossbot_core::common::time::RealTimeProvider;
use crossbot_engine::controller::StrategyLoop;
use crossbot_engine::gateway::Gateway;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// # Summary
/// 应用启动入口，负责装配并运行策略循环。
///
/// # Logic
/// 1. 读取配置，缺少凭据时直接以错误退出。
/// 2. 初始化日志。
/// 3. 实例化 OANDA 通道并注入网关门面。
/// 4. 运行策略循环直到止盈、止损或 Ctrl-C。
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 读取配置
    let settings = settings::load()?;

    // 2. 初始化日志 (guard 必须存活到进程结束以刷新文件日志)
    let _guard = init_logging(settings.log_dir.as_deref());

    let strategy = &settings.strategy;
    info!("Starting OANDA trading bot for {}", strategy.instrument);
    info!(
        "Daily targets: max loss {}, profit target {} | units {} | window {}-{} {}",
        strategy.max_loss,
        strategy.profit_target,
        strategy.units,
        strategy.window.start.format("%H:%M"),
        strategy.window.end.format("%H:%M"),
        strategy.window.timezone
    );

    // 3. 实例化券商通道
    let client = Arc::new(OandaClient::new(&settings.broker)?);
    info!("Using account {}", client.account_id().0);

    let config = Arc::new(settings.strategy);
    let gateway = Gateway::new(config.clone(), client.clone(), client.clone(), client);
    let mut strategy_loop = StrategyLoop::new(config, gateway, Arc::new(RealTimeProvider));

    // 4. 运行主循环
    let reason = strategy_loop.run(shutdown_signal()).await;
    info!("Strategy loop finished: {}", reason);

    Ok(())
}

/// # Summary
/// 初始化全局日志：终端输出，若配置了目录则额外写入按日滚动的文件。
///
/// # Returns
/// 文件日志的后台写线程守卫；未配置目录时为 None。
fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "crossbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Ctrl-C 完成时返回；无法监听信号时永不返回
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt signal: {}", e);
        std::future::pending::<()>().await;
    }
}
