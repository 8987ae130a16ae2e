//! OANDA v20 JSON 报文结构。数值字段在报文中均为十进制字符串。

use chrono::{DateTime, Utc};
use crossbot_core::common::Instrument;
use crossbot_core::market::entity::Candle;
use crossbot_core::trade::entity::{
    AccountId, AccountSummary, MarketOrder, OrderReceipt, PositionFill, TimeInForce, Trade,
    TradeId,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// `GET /v3/instruments/{instrument}/candles` 响应。
#[derive(Deserialize, Debug)]
pub(crate) struct CandlesResponse {
    #[serde(default)]
    pub candles: Vec<WireCandle>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct WireCandle {
    time: DateTime<Utc>,
    #[serde(default)]
    volume: u64,
    complete: bool,
    // 仅在请求 price=M 时出现
    mid: Option<WireOhlc>,
}

#[derive(Deserialize, Debug)]
struct WireOhlc {
    o: String,
    h: String,
    l: String,
    c: String,
}

impl WireCandle {
    pub fn into_candle(self) -> Result<Candle, String> {
        let mid = self
            .mid
            .ok_or_else(|| format!("candle at {} has no mid prices", self.time))?;
        Ok(Candle {
            time: self.time,
            open: parse_price("mid.o", &mid.o)?,
            high: parse_price("mid.h", &mid.h)?,
            low: parse_price("mid.l", &mid.l)?,
            close: parse_price("mid.c", &mid.c)?,
            volume: self.volume,
            complete: self.complete,
        })
    }
}

/// # Summary
/// `GET /v3/accounts/{account}/summary` 响应。
#[derive(Deserialize, Debug)]
pub(crate) struct AccountSummaryResponse {
    pub account: WireAccount,
}

#[derive(Deserialize, Debug)]
pub(crate) struct WireAccount {
    id: String,
    currency: String,
    balance: String,
    #[serde(rename = "NAV")]
    nav: String,
    #[serde(rename = "unrealizedPL")]
    unrealized_pl: String,
    #[serde(rename = "openTradeCount", default)]
    open_trade_count: u32,
}

impl WireAccount {
    pub fn into_summary(self) -> Result<AccountSummary, String> {
        Ok(AccountSummary {
            balance: parse_decimal("balance", &self.balance)?,
            nav: parse_decimal("NAV", &self.nav)?,
            unrealized_pl: parse_decimal("unrealizedPL", &self.unrealized_pl)?,
            id: AccountId(self.id),
            currency: self.currency,
            open_trade_count: self.open_trade_count,
        })
    }
}

/// # Summary
/// `GET /v3/accounts/{account}/openTrades` 响应。
#[derive(Deserialize, Debug)]
pub(crate) struct OpenTradesResponse {
    #[serde(default)]
    pub trades: Vec<WireTrade>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct WireTrade {
    id: String,
    instrument: String,
    price: String,
    #[serde(rename = "currentUnits")]
    current_units: String,
    #[serde(rename = "unrealizedPL", default)]
    unrealized_pl: Option<String>,
}

impl WireTrade {
    pub fn into_trade(self) -> Result<Trade, String> {
        let unrealized_pl = match self.unrealized_pl.as_deref() {
            Some(raw) => parse_decimal("unrealizedPL", raw)?,
            None => Decimal::ZERO,
        };
        Ok(Trade {
            instrument: Instrument::new(self.instrument)?,
            price: parse_price("price", &self.price)?,
            current_units: parse_units(&self.current_units)?,
            unrealized_pl,
            id: TradeId(self.id),
        })
    }
}

/// # Summary
/// `POST /v3/accounts/{account}/orders` 请求体。
#[derive(Serialize, Debug)]
pub(crate) struct OrderRequest {
    order: WireMarketOrder,
}

#[derive(Serialize, Debug)]
struct WireMarketOrder {
    units: String,
    instrument: String,
    #[serde(rename = "timeInForce")]
    time_in_force: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "positionFill")]
    position_fill: &'static str,
}

impl From<&MarketOrder> for OrderRequest {
    fn from(order: &MarketOrder) -> Self {
        Self {
            order: WireMarketOrder {
                units: order.units.to_string(),
                instrument: order.instrument.to_string(),
                time_in_force: match order.time_in_force {
                    TimeInForce::FillOrKill => "FOK",
                },
                kind: "MARKET",
                position_fill: match order.position_fill {
                    PositionFill::Default => "DEFAULT",
                },
            },
        }
    }
}

/// # Summary
/// 下单响应中与回执相关的交易流水。
#[derive(Deserialize, Debug, Default)]
pub(crate) struct OrderResponse {
    #[serde(rename = "orderCreateTransaction")]
    create: Option<WireTransaction>,
    #[serde(rename = "orderFillTransaction")]
    fill: Option<WireTransaction>,
    #[serde(rename = "orderCancelTransaction")]
    cancel: Option<WireTransaction>,
}

#[derive(Deserialize, Debug)]
struct WireTransaction {
    id: String,
    #[serde(default)]
    reason: Option<String>,
}

impl From<OrderResponse> for OrderReceipt {
    fn from(resp: OrderResponse) -> Self {
        Self {
            order_id: resp.create.map(|t| t.id),
            fill_id: resp.fill.map(|t| t.id),
            cancel_reason: resp
                .cancel
                .map(|t| t.reason.unwrap_or_else(|| format!("cancelled by {}", t.id))),
        }
    }
}

fn parse_price(field: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| format!("{} is not a number ({:?}): {}", field, raw, e))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim())
        .map_err(|e| format!("{} is not a decimal ({:?}): {}", field, raw, e))
}

// 单位数量可能带小数部分 (例如 "1000.0")，按整数截断。
fn parse_units(raw: &str) -> Result<i64, String> {
    parse_decimal("currentUnits", raw)?
        .trunc()
        .to_i64()
        .ok_or_else(|| format!("currentUnits out of range: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_parsing() {
        assert_eq!(parse_units("1000"), Ok(1000));
        assert_eq!(parse_units("-250.0"), Ok(-250));
        assert!(parse_units("lots").is_err());
    }

    #[test]
    fn test_cancel_reason_falls_back_to_transaction_id() {
        let resp = OrderResponse {
            create: Some(WireTransaction {
                id: "10".into(),
                reason: None,
            }),
            fill: None,
            cancel: Some(WireTransaction {
                id: "11".into(),
                reason: None,
            }),
        };
        let receipt = OrderReceipt::from(resp);
        assert!(!receipt.is_filled());
        assert_eq!(receipt.cancel_reason.as_deref(), Some("cancelled by 11"));
    }
}
