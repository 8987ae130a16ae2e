use crossbot_core::engine::entity::{Bias, Decision, Signal};
use crossbot_core::trade::entity::{Trade, TradeDirection};

/// # Summary
/// 简单移动平均：最近 `period` 个价格的算术平均值。
///
/// # Returns
/// 价格数量不足 `period` (或 `period == 0`) 时返回 None。
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    let sum: f64 = window.iter().sum();
    let divisor = f64::from(u32::try_from(period).ok()?);
    Some(sum / divisor)
}

/// # Summary
/// 由收盘价序列计算本轮信号。
///
/// # Logic
/// 1. 分别计算短、长周期均线。
/// 2. 任一均线不可用则本轮不产生信号。
/// 3. 当前价取最后一个收盘价。
pub fn evaluate(prices: &[f64], short_period: usize, long_period: usize) -> Option<Signal> {
    let sma_short = sma(prices, short_period)?;
    let sma_long = sma(prices, long_period)?;
    let current_price = *prices.last()?;
    Some(Signal {
        sma_short,
        sma_long,
        current_price,
    })
}

/// # Summary
/// 均线交叉决策规则。
///
/// # Logic
/// 1. 无持仓时：多头倾向开多 `units`，空头倾向开空 `units`，中性不动。
/// 2. 有持仓时：只要任意一笔多单遇到空头倾向、或空单遇到多头倾向，
///    就平掉全部持仓 (只触发一次，不按单笔区分)。
/// 3. 其余情况不动。
pub fn decide(signal: &Signal, open_trades: &[Trade], units: i64) -> Decision {
    let bias = signal.bias();

    if open_trades.is_empty() {
        return match bias {
            Bias::Bullish => Decision::Enter(units),
            Bias::Bearish => Decision::Enter(-units),
            Bias::Neutral => Decision::Hold,
        };
    }

    let reversal = open_trades.iter().any(|trade| {
        matches!(
            (trade.direction(), bias),
            (TradeDirection::Long, Bias::Bearish) | (TradeDirection::Short, Bias::Bullish)
        )
    });

    if reversal {
        Decision::CloseAll
    } else {
        Decision::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbot_core::common::Instrument;
    use crossbot_core::trade::entity::TradeId;
    use rust_decimal::Decimal;

    fn trade(id: &str, units: i64) -> Trade {
        Trade {
            id: TradeId(id.to_string()),
            instrument: Instrument::new("EUR_USD").unwrap(),
            price: 1.1,
            current_units: units,
            unrealized_pl: Decimal::ZERO,
        }
    }

    fn signal(sma_short: f64, sma_long: f64) -> Signal {
        Signal {
            sma_short,
            sma_long,
            current_price: sma_short,
        }
    }

    #[test]
    fn test_sma_uses_last_period_prices() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3), Some(4.0));
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 5), Some(3.0));
    }

    #[test]
    fn test_sma_absent_when_insufficient() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[], 1), None);
        assert_eq!(sma(&[1.0], 0), None);
    }

    #[test]
    fn test_evaluate_requires_long_window() {
        let prices: Vec<f64> = (1..=9).map(f64::from).collect();
        assert!(evaluate(&prices, 5, 10).is_none());

        let prices: Vec<f64> = (1..=10).map(f64::from).collect();
        let s = evaluate(&prices, 5, 10).unwrap();
        assert_eq!(s.sma_short, 8.0);
        assert_eq!(s.sma_long, 5.5);
        assert_eq!(s.current_price, 10.0);
    }

    #[test]
    fn test_decide_entry_without_positions() {
        assert_eq!(decide(&signal(1.2100, 1.2050), &[], 1000), Decision::Enter(1000));
        assert_eq!(decide(&signal(1.2000, 1.2050), &[], 1000), Decision::Enter(-1000));
        assert_eq!(decide(&signal(1.2050, 1.2050), &[], 1000), Decision::Hold);
    }

    #[test]
    fn test_decide_reversal_closes_everything() {
        // 一笔多单逆向即全部平仓，即使另一笔空单与信号同向
        let trades = vec![trade("1", 1000), trade("2", -1000)];
        assert_eq!(decide(&signal(1.2000, 1.2050), &trades, 1000), Decision::CloseAll);
        assert_eq!(decide(&signal(1.2100, 1.2050), &trades, 1000), Decision::CloseAll);
    }

    #[test]
    fn test_decide_holds_when_aligned() {
        let trades = vec![trade("1", 1000)];
        assert_eq!(decide(&signal(1.2100, 1.2050), &trades, 1000), Decision::Hold);
        assert_eq!(decide(&signal(1.2050, 1.2050), &trades, 1000), Decision::Hold);

        // 数量为零的持仓不触发平仓
        let flat = vec![trade("3", 0)];
        assert_eq!(decide(&signal(1.2000, 1.2050), &flat, 1000), Decision::Hold);
    }
}
