use crate::wire::{AccountSummaryResponse, CandlesResponse, OpenTradesResponse, OrderRequest, OrderResponse};
use async_trait::async_trait;
use crossbot_core::common::{Granularity, Instrument};
use crossbot_core::config::BrokerConfig;
use crossbot_core::market::entity::Candle;
use crossbot_core::market::error::MarketError;
use crossbot_core::market::port::MarketDataProvider;
use crossbot_core::trade::entity::{AccountId, AccountSummary, MarketOrder, OrderReceipt, Trade, TradeId};
use crossbot_core::trade::error::TradeError;
use crossbot_core::trade::port::{AccountPort, OrderPort};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// OANDA v20 REST 通道，同时实现行情、账户与下单三个端口。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，所有请求携带 Bearer Token。
/// - `base_url` 不以 `/` 结尾。
#[derive(Clone)]
pub struct OandaClient {
    /// 内部使用的 HTTP 客户端
    client: Client,
    base_url: String,
    api_key: String,
    account_id: AccountId,
}

/// 单次请求失败的统一描述，再按端口转换为各自的错误类型。
enum HttpFailure {
    Network(String),
    Api { status: u16, body: String },
    Parse(String),
}

impl From<HttpFailure> for MarketError {
    fn from(f: HttpFailure) -> Self {
        match f {
            HttpFailure::Network(e) => MarketError::Network(e),
            HttpFailure::Api { status, body } => MarketError::Api { status, body },
            HttpFailure::Parse(e) => MarketError::Parse(e),
        }
    }
}

impl From<HttpFailure> for TradeError {
    fn from(f: HttpFailure) -> Self {
        match f {
            HttpFailure::Network(e) => TradeError::Network(e),
            HttpFailure::Api { status, body } => TradeError::Api { status, body },
            HttpFailure::Parse(e) => TradeError::Parse(e),
        }
    }
}

impl OandaClient {
    /// # Summary
    /// 根据券商配置创建客户端。
    ///
    /// # Logic
    /// 1. 安装 ring 作为进程级 TLS 加密提供者 (已安装则忽略)。
    /// 2. 按配置决定是否设置请求超时，缺省不设。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `config`: 已校验的券商配置。
    ///
    /// # Returns
    /// 客户端构建失败时返回 reqwest 错误。
    pub fn new(config: &BrokerConfig) -> Result<Self, reqwest::Error> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("TLS crypto provider already installed");
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            account_id: AccountId(config.account_id.clone()),
        })
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn account_url(&self, tail: &str) -> String {
        format!("{}/v3/accounts/{}/{}", self.base_url, self.account_id.0, tail)
    }

    /// # Summary
    /// 发送请求并返回成功响应的原始文本。
    ///
    /// # Logic
    /// 1. 附加 Bearer Token 后发送。
    /// 2. 读取完整响应体，非 2xx 时连同响应体一起返回 `Api`。
    async fn send(&self, req: RequestBuilder) -> Result<String, HttpFailure> {
        let resp = req
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| HttpFailure::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HttpFailure::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(HttpFailure::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, HttpFailure> {
        let body = self.send(req).await?;
        decode(&body)
    }
}

// 空响应体按空对象处理 (部分 PUT/POST 响应可能无内容)。
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, HttpFailure> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| HttpFailure::Parse(e.to_string()))
}

#[async_trait]
impl MarketDataProvider for OandaClient {
    /// # Summary
    /// 拉取最近 `count` 根中间价 K 线。
    ///
    /// # Logic
    /// 1. `count == 0` 直接拒绝，不发请求。
    /// 2. 请求 `GET /v3/instruments/{instrument}/candles?count&granularity&price=M`。
    /// 3. 逐根转换价格字符串，保持券商返回的时间升序。
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        granularity: Granularity,
        count: u32,
    ) -> Result<Vec<Candle>, MarketError> {
        if count == 0 {
            return Err(MarketError::InvalidRequest("candle count must be positive".into()));
        }

        let url = format!("{}/v3/instruments/{}/candles", self.base_url, instrument);
        debug!("GET {} count={} granularity={}", url, count, granularity);

        let req = self.client.get(&url).query(&[
            ("count", count.to_string().as_str()),
            ("granularity", granularity.code()),
            ("price", "M"),
        ]);
        let resp: CandlesResponse = self.send_json(req).await?;

        resp.candles
            .into_iter()
            .map(|c| c.into_candle().map_err(MarketError::Parse))
            .collect()
    }
}

#[async_trait]
impl AccountPort for OandaClient {
    async fn get_account_summary(&self) -> Result<AccountSummary, TradeError> {
        let url = self.account_url("summary");
        debug!("GET {}", url);
        let resp: AccountSummaryResponse = self.send_json(self.client.get(&url)).await?;
        resp.account.into_summary().map_err(TradeError::Parse)
    }

    async fn get_open_trades(&self) -> Result<Vec<Trade>, TradeError> {
        let url = self.account_url("openTrades");
        debug!("GET {}", url);
        let resp: OpenTradesResponse = self.send_json(self.client.get(&url)).await?;
        resp.trades
            .into_iter()
            .map(|t| t.into_trade().map_err(TradeError::Parse))
            .collect()
    }
}

#[async_trait]
impl OrderPort for OandaClient {
    /// # Summary
    /// 提交 FOK 市价单。
    ///
    /// # Logic
    /// 1. `units == 0` 直接拒绝。
    /// 2. `POST /v3/accounts/{account}/orders`，数量以带符号字符串传输。
    /// 3. 解析响应中的创建、成交、撤单流水生成回执。
    async fn place_market_order(&self, order: MarketOrder) -> Result<OrderReceipt, TradeError> {
        if order.units == 0 {
            return Err(TradeError::InvalidRequest("order units must not be zero".into()));
        }
        let url = self.account_url("orders");
        debug!("POST {} units={}", url, order.units);

        let body = OrderRequest::from(&order);
        let resp: OrderResponse = self.send_json(self.client.post(&url).json(&body)).await?;
        Ok(resp.into())
    }

    async fn close_trade(&self, trade_id: &TradeId) -> Result<(), TradeError> {
        let url = self.account_url(&format!("trades/{}/close", trade_id));
        debug!("PUT {}", url);
        self.send(self.client.put(&url)).await?;
        Ok(())
    }
}
