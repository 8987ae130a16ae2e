use crate::common::{Granularity, Instrument};
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// # Summary
/// 配置加载与校验阶段的错误。
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 缺少必填项 (通常来自环境变量)
    #[error("Missing required configuration value: {0}")]
    Missing(String),
    /// 配置值不合法
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// 配置源读取或反序列化失败
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// # Summary
/// 券商通道配置，启动时从环境变量一次性读取。
///
/// # Invariants
/// - 三个字段均非空，由 `BrokerConfig::validate` 保证。
#[derive(Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub account_id: String,
    pub api_key: String,
    // REST 根地址，例如 https://api-fxpractice.oanda.com
    pub api_url: String,
    // 单次请求超时，缺省时不设超时
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl BrokerConfig {
    /// # Summary
    /// 校验必填项。
    ///
    /// # Returns
    /// 第一个为空的字段以 `ConfigError::Missing` 返回。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("OANDA_ACCOUNT_ID", &self.account_id),
            ("OANDA_API_KEY", &self.api_key),
            ("OANDA_API_URL", &self.api_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }
        Ok(())
    }
}

/// # Summary
/// 每日允许交易的时间段，按参考时区的本地钟面时间判断。
///
/// # Invariants
/// - `start <= end`，不支持跨越午夜的时段。
/// - 起止两端均为闭区间。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub timezone: Tz,
}

impl TradingWindow {
    /// # Summary
    /// 判断给定时刻是否处于交易时段内。
    ///
    /// # Logic
    /// 1. 将 UTC 时刻换算为参考时区的本地时间。
    /// 2. 比较 `start <= local <= end`。
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone).time();
        self.start <= local && local <= self.end
    }

    /// 参考时区下的本地时间，用于日志
    pub fn local_time(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone)
    }
}

impl Default for TradingWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            timezone: chrono_tz::US::Eastern,
        }
    }
}

/// # Summary
/// 策略运行参数。所有字段都有默认值，可被配置文件或环境变量覆盖。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub instrument: Instrument,
    // 固定下单数量 (绝对值)
    pub units: i64,
    pub granularity: Granularity,
    // 每次拉取的 K 线根数
    pub candle_count: u32,
    pub short_period: usize,
    pub long_period: usize,
    // 当日最大亏损 (正数，按未实现盈亏 <= -max_loss 触发)
    pub max_loss: Decimal,
    // 当日止盈目标 (按未实现盈亏 >= profit_target 触发)
    pub profit_target: Decimal,
    pub window: TradingWindow,
    pub evaluation_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub window_poll_interval_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            instrument: Instrument("EUR_USD".to_string()),
            units: 1000,
            granularity: Granularity::Minute5,
            candle_count: 20,
            short_period: 5,
            long_period: 10,
            max_loss: Decimal::new(20, 1),
            profit_target: Decimal::new(400, 1),
            window: TradingWindow::default(),
            evaluation_interval_secs: 300,
            retry_interval_secs: 60,
            window_poll_interval_secs: 60,
        }
    }
}

impl StrategyConfig {
    /// # Summary
    /// 校验参数组合的合法性。
    ///
    /// # Logic
    /// 1. 均线周期必须为正且短周期小于长周期。
    /// 2. 拉取根数不得少于长周期。
    /// 3. 下单数量与两个阈值必须为正。
    /// 4. 交易时段起点不晚于终点。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_period == 0 || self.long_period == 0 {
            return Err(ConfigError::Invalid("SMA periods must be positive".into()));
        }
        if self.short_period >= self.long_period {
            return Err(ConfigError::Invalid(format!(
                "short_period ({}) must be less than long_period ({})",
                self.short_period, self.long_period
            )));
        }
        if usize::try_from(self.candle_count).map_or(true, |count| count < self.long_period) {
            return Err(ConfigError::Invalid(format!(
                "candle_count ({}) must cover long_period ({})",
                self.candle_count, self.long_period
            )));
        }
        if self.units <= 0 {
            return Err(ConfigError::Invalid("units must be positive".into()));
        }
        if self.max_loss <= Decimal::ZERO || self.profit_target <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "max_loss and profit_target must be positive".into(),
            ));
        }
        if self.window.start > self.window.end {
            return Err(ConfigError::Invalid(
                "trading window start must not be after its end".into(),
            ));
        }
        Ok(())
    }

    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn window_poll_interval(&self) -> Duration {
        Duration::from_secs(self.window_poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::US::Eastern;
    use rust_decimal_macros::dec;

    fn eastern(hour: u32, minute: u32) -> DateTime<Utc> {
        Eastern
            .with_ymd_and_hms(2024, 3, 12, hour, minute, 0)
            .single()
            .map(|t| t.with_timezone(&Utc))
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = StrategyConfig::default();
        assert_eq!(config.instrument.as_str(), "EUR_USD");
        assert_eq!(config.units, 1000);
        assert_eq!(config.granularity, Granularity::Minute5);
        assert_eq!(config.candle_count, 20);
        assert_eq!(config.max_loss, dec!(2.0));
        assert_eq!(config.profit_target, dec!(40.0));
        assert_eq!(config.evaluation_interval(), Duration::from_secs(300));
        assert_eq!(config.retry_interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_inclusive_bounds() {
        let window = TradingWindow::default();
        assert!(window.contains(eastern(9, 0)));
        assert!(window.contains(eastern(8, 0)));
        assert!(window.contains(eastern(10, 0)));
        assert!(!window.contains(eastern(7, 59)));
        assert!(!window.contains(eastern(10, 1)));
    }

    #[test]
    fn test_window_uses_reference_timezone() {
        let window = TradingWindow::default();
        // 13:30 UTC 在三月夏令时期间对应 09:30 EDT
        let utc = Utc.with_ymd_and_hms(2024, 3, 12, 13, 30, 0).unwrap();
        assert!(window.contains(utc));
        // 同一 UTC 钟点在一月 (EST) 对应 08:30
        let winter = Utc.with_ymd_and_hms(2024, 1, 9, 13, 30, 0).unwrap();
        assert!(window.contains(winter));
        let late = Utc.with_ymd_and_hms(2024, 1, 9, 15, 30, 0).unwrap();
        assert!(!window.contains(late));
    }

    #[test]
    fn test_validate_rejects_bad_periods() {
        let config = StrategyConfig {
            short_period: 10,
            long_period: 5,
            ..StrategyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = StrategyConfig {
            candle_count: 8,
            ..StrategyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_broker_config_requires_all_fields() {
        let config = BrokerConfig {
            account_id: "101-001-1-001".into(),
            api_key: "".into(),
            api_url: "https://api-fxpractice.oanda.com".into(),
            request_timeout_secs: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing(name)) if name == "OANDA_API_KEY"
        ));
        assert!(format!("{:?}", config).contains("api_key: \"***\""));
    }
}
