use crate::market::error::MarketError;
use crate::trade::error::TradeError;
use thiserror::Error;

/// # Summary
/// 策略循环域错误枚举。
///
/// # Invariants
/// - 任何从单轮迭代中逃逸的错误都会被循环捕获并转为一次退避等待。
#[derive(Error, Debug)]
pub enum EngineError {
    // 行情数据获取错误
    #[error("Market error: {0}")]
    Market(#[from] MarketError),
    // 账户或下单错误
    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),
}
