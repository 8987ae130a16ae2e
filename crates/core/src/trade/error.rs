use thiserror::Error;

/// # Summary
/// 账户查询与交易执行环节中可能发生的错误。
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Broker responded with HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
