use thiserror::Error;

/// # Summary
/// 行情数据域错误枚举，处理网络、券商拒绝及解析等问题。
///
/// # Invariants
/// - `Api` 表示券商给出了非成功响应，携带原始响应体以便记录日志。
#[derive(Error, Debug)]
pub enum MarketError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 券商返回非 2xx 状态码
    #[error("Broker responded with HTTP {status}: {body}")]
    Api { status: u16, body: String },
    // 数据解析错误，如 JSON 格式不匹配或价格不是合法数字
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求参数在本地即被拒绝
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
