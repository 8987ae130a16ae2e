use crate::common::Instrument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// # Summary
/// 券商侧的账户标识。
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountId(pub String);

/// # Summary
/// 券商分配的持仓交易 (trade) 标识。
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TradeId(pub String);

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Summary
/// 持仓方向，由 `current_units` 的符号决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// 多头
    Long,
    /// 空头
    Short,
    /// 已被部分平仓至零，仍未从券商列表中移除
    Flat,
}

/// # Summary
/// 一笔未平仓交易。由券商持有，客户端只读取与请求平仓。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub instrument: Instrument,
    /// 开仓均价
    pub price: f64,
    /// 当前剩余数量 (正数表示多头，负数表示空头)
    pub current_units: i64,
    /// 未实现盈亏 (账户币种)
    pub unrealized_pl: Decimal,
}

impl Trade {
    pub fn direction(&self) -> TradeDirection {
        match self.current_units {
            u if u > 0 => TradeDirection::Long,
            u if u < 0 => TradeDirection::Short,
            _ => TradeDirection::Flat,
        }
    }
}

/// # Summary
/// 账户资金快照，每轮循环重新拉取。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub currency: String,
    pub balance: Decimal,
    /// 净资产 (余额 + 未实现盈亏)
    pub nav: Decimal,
    /// 全部持仓的未实现盈亏，用于日内止盈止损
    pub unrealized_pl: Decimal,
    pub open_trade_count: u32,
}

/// # Summary
/// 订单有效期。本系统仅下达 FOK 市价单。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// 全部立即成交，否则整单撤销
    FillOrKill,
}

/// # Summary
/// 下单对现有持仓的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionFill {
    /// 使用账户默认规则
    Default,
}

/// # Summary
/// 市价委托意图。
///
/// # Invariants
/// - `units != 0`；正数买入、负数卖出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub instrument: Instrument,
    pub units: i64,
    pub time_in_force: TimeInForce,
    pub position_fill: PositionFill,
}

impl MarketOrder {
    /// # Logic
    /// 创建一笔 FOK、默认持仓规则的市价单。
    pub fn new(instrument: Instrument, units: i64) -> Self {
        Self {
            instrument,
            units,
            time_in_force: TimeInForce::FillOrKill,
            position_fill: PositionFill::Default,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.units > 0
    }
}

/// # Summary
/// 下单请求被券商受理后的回执。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// 订单创建流水号
    pub order_id: Option<String>,
    /// 成交流水号，FOK 未成交时为空
    pub fill_id: Option<String>,
    /// 撤单原因，例如流动性不足
    pub cancel_reason: Option<String>,
}

impl OrderReceipt {
    pub fn is_filled(&self) -> bool {
        self.fill_id.is_some()
    }
}
