use crate::common::{Granularity, Instrument};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 返回序列按时间升序排列，最旧的在前。
/// - 只提供中间价 (mid)。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取指定标的最近 `count` 根 K 线。
    ///
    /// # Logic
    /// 1. 校验 `count > 0`。
    /// 2. 以 `granularity` 和中间价构建请求。
    /// 3. 执行网络请求并解析响应数据。
    ///
    /// # Arguments
    /// * `instrument`: 交易标的。
    /// * `granularity`: K 线周期。
    /// * `count`: 请求根数。
    ///
    /// # Returns
    /// 成功返回 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        granularity: Granularity,
        count: u32,
    ) -> Result<Vec<Candle>, MarketError>;
}
