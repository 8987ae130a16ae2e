//! 内存版券商替身，供各 crate 的集成测试使用。

use crate::common::{Granularity, Instrument};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use crate::market::port::MarketDataProvider;
use crate::trade::entity::{AccountId, AccountSummary, MarketOrder, OrderReceipt, Trade, TradeId};
use crate::trade::error::TradeError;
use crate::trade::port::{AccountPort, OrderPort};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// # Summary
/// 模拟的调用失败方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    // 券商返回非成功状态码
    Api(u16),
    // 连接层错误
    Network,
}

impl Failure {
    fn market(self) -> MarketError {
        match self {
            Failure::Api(status) => MarketError::Api {
                status,
                body: "{\"errorMessage\":\"simulated\"}".to_string(),
            },
            Failure::Network => MarketError::Network("connection reset".to_string()),
        }
    }

    fn trade(self) -> TradeError {
        match self {
            Failure::Api(status) => TradeError::Api {
                status,
                body: "{\"errorMessage\":\"simulated\"}".to_string(),
            },
            Failure::Network => TradeError::Network("connection reset".to_string()),
        }
    }
}

/// # Summary
/// 由收盘价序列生成按 5 分钟递增的 K 线，全部标记为已收盘。
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let base: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 3, 12, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    closes
        .iter()
        .zip(0i64..)
        .map(|(&close, i)| Candle {
            time: base + Duration::minutes(5 * i),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
            complete: true,
        })
        .collect()
}

/// # Summary
/// 实现全部三个网关端口的内存券商，记录每类调用次数。
///
/// # Invariants
/// - 下单成功会以 `T<n>` 为 ID 新增一笔持仓。
/// - 平仓成功会把持仓从列表中移除。
pub struct MockBroker {
    candles: Mutex<Vec<Candle>>,
    candle_failure: Mutex<Option<Failure>>,
    summary: Mutex<AccountSummary>,
    summary_failure: Mutex<Option<Failure>>,
    trades: DashMap<TradeId, Trade>,
    open_trades_failure: Mutex<Option<Failure>>,
    order_failure: Mutex<Option<Failure>>,
    // 置位时订单被受理但以该原因撤销 (FOK 未成交)
    order_cancel_reason: Mutex<Option<String>>,
    // 平仓时指定失败的交易
    failing_closes: DashMap<TradeId, Failure>,
    orders: Mutex<Vec<MarketOrder>>,
    close_requests: Mutex<Vec<TradeId>>,
    candle_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    open_trade_calls: AtomicUsize,
    next_trade: AtomicUsize,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            candles: Mutex::new(Vec::new()),
            candle_failure: Mutex::new(None),
            summary: Mutex::new(AccountSummary {
                id: AccountId("101-001-0000000-001".to_string()),
                currency: "USD".to_string(),
                balance: Decimal::new(100_000, 0),
                nav: Decimal::new(100_000, 0),
                unrealized_pl: Decimal::ZERO,
                open_trade_count: 0,
            }),
            summary_failure: Mutex::new(None),
            trades: DashMap::new(),
            open_trades_failure: Mutex::new(None),
            order_failure: Mutex::new(None),
            order_cancel_reason: Mutex::new(None),
            failing_closes: DashMap::new(),
            orders: Mutex::new(Vec::new()),
            close_requests: Mutex::new(Vec::new()),
            candle_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            open_trade_calls: AtomicUsize::new(0),
            next_trade: AtomicUsize::new(1),
        }
    }

    pub fn set_candles(&self, candles: Vec<Candle>) {
        *self.candles.lock().unwrap_or_else(|p| p.into_inner()) = candles;
    }

    pub fn fail_candles(&self, failure: Option<Failure>) {
        *self.candle_failure.lock().unwrap_or_else(|p| p.into_inner()) = failure;
    }

    pub fn set_unrealized_pl(&self, pl: Decimal) {
        self.summary.lock().unwrap_or_else(|p| p.into_inner()).unrealized_pl = pl;
    }

    pub fn fail_summary(&self, failure: Option<Failure>) {
        *self.summary_failure.lock().unwrap_or_else(|p| p.into_inner()) = failure;
    }

    pub fn fail_open_trades(&self, failure: Option<Failure>) {
        *self.open_trades_failure.lock().unwrap_or_else(|p| p.into_inner()) = failure;
    }

    pub fn fail_orders(&self, failure: Option<Failure>) {
        *self.order_failure.lock().unwrap_or_else(|p| p.into_inner()) = failure;
    }

    /// 之后的订单被受理但不成交，回执带撤单原因
    pub fn cancel_orders(&self, reason: Option<&str>) {
        *self.order_cancel_reason.lock().unwrap_or_else(|p| p.into_inner()) =
            reason.map(str::to_string);
    }

    /// 直接放入一笔持仓
    pub fn open_trade(&self, id: &str, units: i64) {
        let id = TradeId(id.to_string());
        self.trades.insert(
            id.clone(),
            Trade {
                id,
                instrument: Instrument("EUR_USD".to_string()),
                price: 1.1,
                current_units: units,
                unrealized_pl: Decimal::ZERO,
            },
        );
    }

    pub fn fail_close(&self, id: &str, failure: Failure) {
        self.failing_closes.insert(TradeId(id.to_string()), failure);
    }

    pub fn open_trade_ids(&self) -> Vec<TradeId> {
        let mut ids: Vec<TradeId> = self.trades.iter().map(|e| e.key().clone()).collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }

    pub fn orders(&self) -> Vec<MarketOrder> {
        self.orders.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn close_requests(&self) -> Vec<TradeId> {
        self.close_requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn candle_calls(&self) -> usize {
        self.candle_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn open_trade_calls(&self) -> usize {
        self.open_trade_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockBroker {
    async fn fetch_candles(
        &self,
        _instrument: &Instrument,
        _granularity: Granularity,
        count: u32,
    ) -> Result<Vec<Candle>, MarketError> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.candle_failure.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(failure.market());
        }
        let candles = self.candles.lock().unwrap_or_else(|p| p.into_inner());
        let skip = candles
            .len()
            .saturating_sub(usize::try_from(count).unwrap_or(usize::MAX));
        Ok(candles[skip..].to_vec())
    }
}

#[async_trait]
impl AccountPort for MockBroker {
    async fn get_account_summary(&self) -> Result<AccountSummary, TradeError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.summary_failure.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(failure.trade());
        }
        let mut summary = self.summary.lock().unwrap_or_else(|p| p.into_inner()).clone();
        summary.open_trade_count = u32::try_from(self.trades.len()).unwrap_or(u32::MAX);
        Ok(summary)
    }

    async fn get_open_trades(&self) -> Result<Vec<Trade>, TradeError> {
        self.open_trade_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.open_trades_failure.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(failure.trade());
        }
        let mut trades: Vec<Trade> = self.trades.iter().map(|e| e.value().clone()).collect();
        trades.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(trades)
    }
}

#[async_trait]
impl OrderPort for MockBroker {
    async fn place_market_order(&self, order: MarketOrder) -> Result<OrderReceipt, TradeError> {
        if order.units == 0 {
            return Err(TradeError::InvalidRequest("units must not be zero".into()));
        }
        if let Some(failure) = *self.order_failure.lock().unwrap_or_else(|p| p.into_inner()) {
            return Err(failure.trade());
        }
        let n = self.next_trade.fetch_add(1, Ordering::SeqCst);
        let cancel_reason = self
            .order_cancel_reason
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(reason) = cancel_reason {
            self.orders
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(order);
            return Ok(OrderReceipt {
                order_id: Some(format!("O{}", n)),
                fill_id: None,
                cancel_reason: Some(reason),
            });
        }
        self.open_trade(&format!("T{}", n), order.units);
        self.orders
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(order);
        Ok(OrderReceipt {
            order_id: Some(format!("O{}", n)),
            fill_id: Some(format!("F{}", n)),
            cancel_reason: None,
        })
    }

    async fn close_trade(&self, trade_id: &TradeId) -> Result<(), TradeError> {
        self.close_requests
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(trade_id.clone());
        if let Some(failure) = self.failing_closes.get(trade_id) {
            return Err(failure.trade());
        }
        self.trades
            .remove(trade_id)
            .map(|_| ())
            .ok_or_else(|| TradeError::Api {
                status: 404,
                body: format!("{{\"errorMessage\":\"trade {} not found\"}}", trade_id),
            })
    }
}
