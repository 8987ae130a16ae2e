use crossbot_core::config::StrategyConfig;
use crossbot_core::engine::entity::CloseReport;
use crossbot_core::engine::error::EngineError;
use crossbot_core::market::entity::Candle;
use crossbot_core::market::error::MarketError;
use crossbot_core::market::port::MarketDataProvider;
use crossbot_core::trade::entity::{AccountSummary, MarketOrder, Trade};
use crossbot_core::trade::error::TradeError;
use crossbot_core::trade::port::{AccountPort, OrderPort};
use std::sync::Arc;
use tracing::{error, info, warn};

/// # Summary
/// 券商三端口之上的门面，供循环控制器调用。
///
/// # Invariants
/// - 券商返回非成功状态码时记录响应体并返回哨兵值 (空列表、None、false)，不向上抛错。
/// - 网络与解析错误原样上抛，由控制器按一次失败的迭代处理。
/// - `close_all_trades` 从不失败，用于所有终止路径。
pub struct Gateway {
    config: Arc<StrategyConfig>,
    market: Arc<dyn MarketDataProvider>,
    account: Arc<dyn AccountPort>,
    orders: Arc<dyn OrderPort>,
}

impl Gateway {
    pub fn new(
        config: Arc<StrategyConfig>,
        market: Arc<dyn MarketDataProvider>,
        account: Arc<dyn AccountPort>,
        orders: Arc<dyn OrderPort>,
    ) -> Self {
        Self {
            config,
            market,
            account,
            orders,
        }
    }

    /// # Summary
    /// 拉取配置标的最近 `candle_count` 根 K 线。
    ///
    /// # Returns
    /// 券商拒绝时返回空序列。
    pub async fn candles(&self) -> Result<Vec<Candle>, EngineError> {
        match self
            .market
            .fetch_candles(
                &self.config.instrument,
                self.config.granularity,
                self.config.candle_count,
            )
            .await
        {
            Ok(candles) => Ok(candles),
            Err(MarketError::Api { status, body }) => {
                error!("Error fetching candles (HTTP {}): {}", status, body);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 账户快照，券商拒绝时返回 None
    pub async fn account_summary(&self) -> Result<Option<AccountSummary>, EngineError> {
        match self.account.get_account_summary().await {
            Ok(summary) => Ok(Some(summary)),
            Err(TradeError::Api { status, body }) => {
                error!("Error getting account summary (HTTP {}): {}", status, body);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 未平仓交易，券商拒绝时返回空列表
    pub async fn open_trades(&self) -> Result<Vec<Trade>, EngineError> {
        match self.account.get_open_trades().await {
            Ok(trades) => Ok(trades),
            Err(TradeError::Api { status, body }) => {
                error!("Error getting open trades (HTTP {}): {}", status, body);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Summary
    /// 以带符号数量下达 FOK 市价单。
    ///
    /// # Logic
    /// 1. 组装配置标的的市价单并提交。
    /// 2. 受理但被撤销 (FOK 未成交) 仍视为提交成功，记录撤单原因。
    /// 3. 券商拒绝或本地校验失败返回 false。
    ///
    /// # Returns
    /// 订单是否被券商受理。
    pub async fn place_order(&self, units: i64) -> Result<bool, EngineError> {
        let order = MarketOrder::new(self.config.instrument.clone(), units);
        let side = if order.is_buy() { "BUY" } else { "SELL" };

        match self.orders.place_market_order(order).await {
            Ok(receipt) => {
                let filled = receipt.is_filled();
                match receipt.cancel_reason {
                    Some(reason) if !filled => {
                        warn!("Order {} {} units was not filled: {}", side, units.abs(), reason);
                    }
                    _ => info!("Order placed: {} {} units", side, units.abs()),
                }
                Ok(true)
            }
            Err(TradeError::Api { status, body }) => {
                error!("Order failed (HTTP {}): {}", status, body);
                Ok(false)
            }
            Err(TradeError::InvalidRequest(reason)) => {
                error!("Order rejected locally: {}", reason);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Summary
    /// 平掉账户内全部未平仓交易。
    ///
    /// # Logic
    /// 1. 重新拉取未平仓列表；拉取失败记录日志并返回空统计。
    /// 2. 逐笔发起平仓，单笔失败记录日志后继续处理其余交易。
    pub async fn close_all_trades(&self) -> CloseReport {
        let trades = match self.account.get_open_trades().await {
            Ok(trades) => trades,
            Err(e) => {
                error!("Error getting open trades before closing: {}", e);
                return CloseReport::default();
            }
        };

        let mut report = CloseReport::default();
        for trade in trades {
            match self.orders.close_trade(&trade.id).await {
                Ok(()) => {
                    info!("Closed trade {}", trade.id);
                    report.closed += 1;
                }
                Err(e) => {
                    warn!("Failed to close trade {}: {}", trade.id, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
