use serde::{Deserialize, Serialize};
use std::time::Duration;

/// # Summary
/// 单轮循环计算出的均线信号，不跨轮保存。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    // 短周期均线
    pub sma_short: f64,
    // 长周期均线
    pub sma_long: f64,
    // 最近一根已收盘 K 线的收盘价
    pub current_price: f64,
}

impl Signal {
    /// # Logic
    /// 短均线在上为多，在下为空，相等为中性。
    pub fn bias(&self) -> Bias {
        if self.sma_short > self.sma_long {
            Bias::Bullish
        } else if self.sma_short < self.sma_long {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }
}

/// # Summary
/// 信号给出的方向性倾向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

/// # Summary
/// 决策规则的输出动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    // 开新仓，数量带符号
    Enter(i64),
    // 反转信号，平掉全部持仓
    CloseAll,
    // 不操作
    Hold,
}

/// # Summary
/// 循环终止原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    // 未实现盈亏触及当日最大亏损
    MaxLossHit,
    // 未实现盈亏触及当日止盈目标
    ProfitTargetHit,
    // 外部中断 (Ctrl-C)
    UserInterrupt,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::MaxLossHit => write!(f, "daily max loss hit"),
            StopReason::ProfitTargetHit => write!(f, "daily profit target reached"),
            StopReason::UserInterrupt => write!(f, "stopped by user"),
        }
    }
}

/// # Summary
/// 循环控制器的状态机状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    WaitingForWindow,
    Evaluating,
    Stopped(StopReason),
}

/// # Summary
/// 单轮迭代结束后控制器要执行的下一步。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    // 休眠指定时长后开始下一轮
    Pause(Duration),
    // 终止循环
    Stop(StopReason),
}

/// # Summary
/// 一次全部平仓的结果统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReport {
    pub closed: usize,
    pub failed: usize,
}
