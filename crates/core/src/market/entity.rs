use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根 K 线数据实体，价格均为买卖中间价 (mid)。
///
/// # Invariants
/// - `high` 必须大于或等于 `low`, `open`, `close`。
/// - 仅 `complete == true` 的 K 线参与信号计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间
    pub time: DateTime<Utc>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 报价跳动次数
    pub volume: u64,
    // 该周期是否已走完
    pub complete: bool,
}

/// # Summary
/// 提取已收盘 K 线的收盘价，保持原有时间顺序。
pub fn closed_prices(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .filter(|c| c.complete)
        .map(|c| c.close)
        .collect()
}
