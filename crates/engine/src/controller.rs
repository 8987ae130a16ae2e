use crate::gateway::Gateway;
use crate::signal;
use crossbot_core::common::time::TimeProvider;
use crossbot_core::config::StrategyConfig;
use crossbot_core::engine::entity::{Decision, LoopState, Step, StopReason};
use crossbot_core::engine::error::EngineError;
use crossbot_core::market::entity::closed_prices;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// 均线交叉策略的主循环控制器。
///
/// # Invariants
/// - 同一时刻只执行一轮迭代，所有调用严格串行。
/// - 三种终止原因之外，任何失败都只导致一次固定时长的退避，循环不会退出。
/// - 每条终止路径在退出前都会尝试平掉全部持仓。
pub struct StrategyLoop {
    config: Arc<StrategyConfig>,
    gateway: Gateway,
    clock: Arc<dyn TimeProvider>,
    state: LoopState,
}

impl StrategyLoop {
    pub fn new(config: Arc<StrategyConfig>, gateway: Gateway, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            config,
            gateway,
            clock,
            state: LoopState::WaitingForWindow,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// # Summary
    /// 持续运行直到满足终止条件。
    ///
    /// # Logic
    /// 1. 执行一轮 `tick`，按返回的 `Step` 休眠或终止。
    /// 2. `shutdown` 在任意等待点完成时，放弃当前迭代，平掉全部持仓并以 `UserInterrupt` 结束。
    ///
    /// # Arguments
    /// * `shutdown`: 外部中断信号，例如 `tokio::signal::ctrl_c`。
    ///
    /// # Returns
    /// 循环终止原因。
    pub async fn run<F>(&mut self, shutdown: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let step = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                step = self.tick() => step,
            };

            match step {
                Step::Stop(reason) => return reason,
                Step::Pause(pause) => {
                    debug!("Sleeping {}s before next iteration", pause.as_secs());
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
            }
        }

        info!("Bot stopped by user");
        let report = self.gateway.close_all_trades().await;
        info!("Closed {} trade(s), {} failed", report.closed, report.failed);
        self.state = LoopState::Stopped(StopReason::UserInterrupt);
        StopReason::UserInterrupt
    }

    /// # Summary
    /// 执行一轮状态机迭代。
    ///
    /// # Logic
    /// 1. 不在交易时段内：进入 `WaitingForWindow`，按时段轮询间隔休眠。
    /// 2. 否则进入 `Evaluating` 执行一次评估。
    /// 3. 评估失败记录日志，按重试间隔休眠。
    pub async fn tick(&mut self) -> Step {
        let now = self.clock.now();
        let window = self.config.window;
        debug!(
            "Current time: {}",
            window.local_time(now).format("%H:%M:%S %Z")
        );

        if !window.contains(now) {
            self.state = LoopState::WaitingForWindow;
            info!(
                "Outside trading hours ({}-{} {}). Waiting...",
                window.start.format("%H:%M"),
                window.end.format("%H:%M"),
                window.timezone
            );
            return Step::Pause(self.config.window_poll_interval());
        }

        self.state = LoopState::Evaluating;
        match self.evaluate().await {
            Ok(step) => {
                if let Step::Stop(reason) = step {
                    self.state = LoopState::Stopped(reason);
                }
                step
            }
            Err(e) => {
                warn!("Iteration failed: {}", e);
                Step::Pause(self.config.retry_interval())
            }
        }
    }

    /// # Summary
    /// 交易时段内的一次完整评估。
    ///
    /// # Logic
    /// 1. 读取账户未实现盈亏，触及最大亏损或止盈目标则全部平仓并终止。账户快照缺失时跳过该检查。
    /// 2. 拉取 K 线，为空则退避。
    /// 3. 取已收盘 K 线的收盘价，不足长周期则退避。
    /// 4. 计算信号，结合未平仓交易执行决策。
    /// 5. 按评估间隔休眠。
    async fn evaluate(&mut self) -> Result<Step, EngineError> {
        let config = Arc::clone(&self.config);

        let pnl = self
            .gateway
            .account_summary()
            .await?
            .map(|summary| summary.unrealized_pl);

        if let Some(pnl) = pnl {
            if pnl <= -config.max_loss {
                warn!("Daily max loss hit: {:.2}", pnl);
                self.gateway.close_all_trades().await;
                return Ok(Step::Stop(StopReason::MaxLossHit));
            }
            if pnl >= config.profit_target {
                info!("Daily profit target reached: {:.2}", pnl);
                self.gateway.close_all_trades().await;
                return Ok(Step::Stop(StopReason::ProfitTargetHit));
            }
        }

        let candles = self.gateway.candles().await?;
        if candles.is_empty() {
            return Ok(Step::Pause(config.retry_interval()));
        }

        let prices = closed_prices(&candles);
        let Some(signal) = signal::evaluate(&prices, config.short_period, config.long_period)
        else {
            info!(
                "Not enough data for analysis ({} closed candles, need {})",
                prices.len(),
                config.long_period
            );
            return Ok(Step::Pause(config.retry_interval()));
        };

        info!(
            "Price: {:.5} | SMA{}: {:.5} | SMA{}: {:.5} | P&L: {}",
            signal.current_price,
            config.short_period,
            signal.sma_short,
            config.long_period,
            signal.sma_long,
            pnl.map_or_else(|| "n/a".to_string(), |p| format!("{:.2}", p))
        );

        let open_trades = self.gateway.open_trades().await?;
        match signal::decide(&signal, &open_trades, config.units) {
            Decision::Enter(units) if units > 0 => {
                info!("Bullish signal detected - placing BUY order");
                self.gateway.place_order(units).await?;
            }
            Decision::Enter(units) => {
                info!("Bearish signal detected - placing SELL order");
                self.gateway.place_order(units).await?;
            }
            Decision::CloseAll => {
                info!("Signal reversed against open position - closing all trades");
                let report = self.gateway.close_all_trades().await;
                debug!("Closed {} trade(s), {} failed", report.closed, report.failed);
            }
            Decision::Hold => {}
        }

        Ok(Step::Pause(config.evaluation_interval()))
    }
}
