pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 交易标的，使用券商的原生代码表示（例如 `EUR_USD`）。
///
/// # Invariants
/// - 内部字符串非空，由 `Instrument::new` 保证。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument(pub(crate) String);

impl Instrument {
    /// # Summary
    /// 构造一个标的代码。
    ///
    /// # Arguments
    /// * `code`: 券商定义的标的代码。
    ///
    /// # Returns
    /// 代码为空时返回错误描述。
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err("Instrument code must not be empty".to_string());
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Instrument {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Instrument::new(value)
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.0
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Summary
/// K 线周期，取值与 OANDA v20 的 granularity 代码一一对应。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Granularity {
    // 5 秒
    Second5,
    // 1 分钟
    Minute1,
    // 5 分钟
    Minute5,
    // 15 分钟
    Minute15,
    // 30 分钟
    Minute30,
    // 1 小时
    Hour1,
    // 4 小时
    Hour4,
    // 1 日
    Day1,
}

impl Granularity {
    /// 券商接口使用的周期代码
    pub fn code(&self) -> &'static str {
        match self {
            Granularity::Second5 => "S5",
            Granularity::Minute1 => "M1",
            Granularity::Minute5 => "M5",
            Granularity::Minute15 => "M15",
            Granularity::Minute30 => "M30",
            Granularity::Hour1 => "H1",
            Granularity::Hour4 => "H4",
            Granularity::Day1 => "D",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "S5" => Ok(Granularity::Second5),
            "M1" => Ok(Granularity::Minute1),
            "M5" => Ok(Granularity::Minute5),
            "M15" => Ok(Granularity::Minute15),
            "M30" => Ok(Granularity::Minute30),
            "H1" => Ok(Granularity::Hour1),
            "H4" => Ok(Granularity::Hour4),
            "D" => Ok(Granularity::Day1),
            _ => Err(format!("Unknown granularity: {}", s)),
        }
    }
}

impl TryFrom<String> for Granularity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Granularity> for String {
    fn from(value: Granularity) -> Self {
        value.code().to_string()
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_codes() {
        assert_eq!(Granularity::Minute5.code(), "M5");
        assert_eq!("m5".parse::<Granularity>(), Ok(Granularity::Minute5));
        assert_eq!("D".parse::<Granularity>(), Ok(Granularity::Day1));
        assert!("M7".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_instrument_rejects_blank() {
        assert!(Instrument::new("  ").is_err());
        assert_eq!(Instrument::new("EUR_USD").map(|i| i.to_string()), Ok("EUR_USD".to_string()));
    }
}
