use super::entity::{AccountSummary, MarketOrder, OrderReceipt, Trade, TradeId};
use super::error::TradeError;
use async_trait::async_trait;

/// # Summary
/// 账户查询端口。账户身份在实现者内部固定，调用方不传入。
///
/// # Invariants
/// - 返回的数据都是券商侧的实时快照，实现者不得缓存。
#[async_trait]
pub trait AccountPort: Send + Sync {
    /// 查询账户资金概况
    async fn get_account_summary(&self) -> Result<AccountSummary, TradeError>;

    /// 查询账户全部未平仓交易
    async fn get_open_trades(&self) -> Result<Vec<Trade>, TradeError>;
}

/// # Summary
/// 下单与平仓端口，是策略向券商发送交易意图的唯一门户。
#[async_trait]
pub trait OrderPort: Send + Sync {
    /// 提交一笔市价单
    ///
    /// # Arguments
    /// * `order` - 方向由 `units` 符号决定的 FOK 市价单
    ///
    /// # Returns
    /// * `Ok(OrderReceipt)` - 券商已受理；是否成交见回执
    /// * `Err(TradeError)` - 本地校验失败、网络错误或券商拒绝
    async fn place_market_order(&self, order: MarketOrder) -> Result<OrderReceipt, TradeError>;

    /// 全部平掉一笔交易
    ///
    /// # Arguments
    /// * `trade_id` - 券商交易 ID
    async fn close_trade(&self, trade_id: &TradeId) -> Result<(), TradeError>;
}
