use config::{Config, Environment, File};
use crossbot_core::config::{BrokerConfig, ConfigError, StrategyConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 可选的本地配置文件 (TOML)
pub const DEFAULT_CONFIG_FILE: &str = "crossbot.toml";

/// # Summary
/// 启动时一次性装配的完整配置，之后只读。
#[derive(Debug)]
pub struct Settings {
    pub broker: BrokerConfig,
    pub strategy: StrategyConfig,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    strategy: StrategyConfig,
    log_dir: Option<PathBuf>,
}

/// # Summary
/// 从进程环境变量与可选配置文件装配配置。
pub fn load() -> Result<Settings, ConfigError> {
    load_with(None, Path::new(DEFAULT_CONFIG_FILE))
}

/// # Summary
/// 装配配置，环境变量来源可替换以便测试。
///
/// # Logic
/// 1. 券商凭据只来自 `OANDA_*` 环境变量，缺失即报 `Missing`。
/// 2. 策略参数先取默认值，再被配置文件、`CROSSBOT_*` 环境变量依次覆盖
///    (嵌套键用 `__` 分隔，例如 `CROSSBOT_STRATEGY__UNITS`)。
/// 3. 两部分分别校验。
///
/// # Arguments
/// * `env`: 替代进程环境的键值表，None 表示读取真实环境。
/// * `file`: 配置文件路径，不存在时忽略。
pub(crate) fn load_with(
    env: Option<HashMap<String, String>>,
    file: &Path,
) -> Result<Settings, ConfigError> {
    let broker = load_broker(env.clone())?;
    broker.validate()?;

    let file_settings: FileSettings = Config::builder()
        .add_source(File::from(file).required(false))
        .add_source(
            Environment::with_prefix("CROSSBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .and_then(Config::try_deserialize)
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    file_settings.strategy.validate()?;

    Ok(Settings {
        broker,
        strategy: file_settings.strategy,
        log_dir: file_settings.log_dir,
    })
}

fn load_broker(env: Option<HashMap<String, String>>) -> Result<BrokerConfig, ConfigError> {
    let source = Config::builder()
        .add_source(Environment::with_prefix("OANDA").source(env))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let required = |key: &str, var: &str| {
        source
            .get_string(key)
            .map_err(|_| ConfigError::Missing(var.to_string()))
    };

    Ok(BrokerConfig {
        account_id: required("account_id", "OANDA_ACCOUNT_ID")?,
        api_key: required("api_key", "OANDA_API_KEY")?,
        api_url: required("api_url", "OANDA_API_URL")?,
        request_timeout_secs: source.get::<u64>("request_timeout_secs").ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn broker_env() -> HashMap<String, String> {
        HashMap::from([
            ("OANDA_ACCOUNT_ID".to_string(), "101-001-1234567-001".to_string()),
            ("OANDA_API_KEY".to_string(), "secret".to_string()),
            ("OANDA_API_URL".to_string(), "https://api-fxpractice.oanda.com".to_string()),
        ])
    }

    #[test]
    fn test_defaults_with_broker_env_only() {
        let settings = load_with(Some(broker_env()), Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(settings.broker.account_id, "101-001-1234567-001");
        assert_eq!(settings.broker.api_url, "https://api-fxpractice.oanda.com");
        assert!(settings.broker.request_timeout_secs.is_none());
        assert_eq!(settings.strategy.units, 1000);
        assert_eq!(settings.strategy.instrument.as_str(), "EUR_USD");
        assert!(settings.log_dir.is_none());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let mut env = broker_env();
        env.remove("OANDA_API_KEY");
        let err = load_with(Some(env), Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref var) if var == "OANDA_API_KEY"));
    }

    #[test]
    fn test_file_and_env_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
log_dir = "logs"

[strategy]
instrument = "GBP_USD"
units = 500
max_loss = 5.5

[strategy.window]
start = "09:30:00"
end = "11:00:00"
timezone = "Europe/London"
"#
        )
        .unwrap();

        let mut env = broker_env();
        env.insert("CROSSBOT_STRATEGY__UNITS".to_string(), "250".to_string());
        env.insert("OANDA_REQUEST_TIMEOUT_SECS".to_string(), "15".to_string());

        let settings = load_with(Some(env), file.path()).unwrap();
        assert_eq!(settings.strategy.instrument.as_str(), "GBP_USD");
        assert_eq!(settings.strategy.units, 250);
        assert_eq!(settings.strategy.max_loss, dec!(5.5));
        assert_eq!(settings.strategy.profit_target, dec!(40.0));
        assert_eq!(settings.strategy.window.timezone, chrono_tz::Europe::London);
        assert_eq!(settings.broker.request_timeout_secs, Some(15));
        assert_eq!(settings.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let mut env = broker_env();
        env.insert("CROSSBOT_STRATEGY__SHORT_PERIOD".to_string(), "20".to_string());
        let err = load_with(Some(env), Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
