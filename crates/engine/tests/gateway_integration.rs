use crossbot_core::config::StrategyConfig;
use crossbot_core::engine::entity::CloseReport;
use crossbot_core::engine::error::EngineError;
use crossbot_core::test_utils::{Failure, MockBroker};
use crossbot_core::trade::entity::TradeId;
use crossbot_engine::gateway::Gateway;
use std::sync::Arc;

fn setup() -> (Arc<MockBroker>, Gateway) {
    let broker = Arc::new(MockBroker::new());
    let gateway = Gateway::new(
        Arc::new(StrategyConfig::default()),
        broker.clone(),
        broker.clone(),
        broker.clone(),
    );
    (broker, gateway)
}

#[tokio::test]
async fn test_open_trades_rejected_returns_empty() {
    let (broker, gateway) = setup();
    broker.open_trade("A", 1000);
    broker.fail_open_trades(Some(Failure::Api(500)));

    let trades = gateway.open_trades().await.unwrap();
    assert!(trades.is_empty());
}

#[tokio::test]
async fn test_open_trades_network_failure_propagates() {
    let (broker, gateway) = setup();
    broker.fail_open_trades(Some(Failure::Network));

    let result = gateway.open_trades().await;
    assert!(matches!(result, Err(EngineError::Trade(_))));
}

#[tokio::test]
async fn test_account_summary_rejected_returns_none() {
    let (broker, gateway) = setup();
    broker.fail_summary(Some(Failure::Api(401)));

    assert!(gateway.account_summary().await.unwrap().is_none());
}

#[tokio::test]
async fn test_place_order_rejected_returns_false() {
    let (broker, gateway) = setup();
    broker.fail_orders(Some(Failure::Api(400)));

    assert!(!gateway.place_order(1000).await.unwrap());
    assert!(broker.orders().is_empty());
    assert!(broker.open_trade_ids().is_empty());
}

#[tokio::test]
async fn test_place_order_zero_units_returns_false() {
    let (broker, gateway) = setup();

    assert!(!gateway.place_order(0).await.unwrap());
    assert!(broker.orders().is_empty());
}

#[tokio::test]
async fn test_place_order_killed_counts_as_submitted() {
    let (broker, gateway) = setup();
    broker.cancel_orders(Some("INSUFFICIENT_LIQUIDITY"));

    assert!(gateway.place_order(-1000).await.unwrap());
    assert_eq!(broker.orders().len(), 1);
    assert_eq!(broker.orders()[0].units, -1000);
    // 未成交，不产生持仓
    assert!(broker.open_trade_ids().is_empty());
}

#[tokio::test]
async fn test_place_order_filled_opens_trade() {
    let (broker, gateway) = setup();

    assert!(gateway.place_order(1000).await.unwrap());
    assert_eq!(broker.open_trade_ids(), vec![TradeId("T1".into())]);
}

#[tokio::test]
async fn test_close_all_without_trade_list_is_empty_report() {
    let (broker, gateway) = setup();
    broker.open_trade("A", 1000);
    broker.fail_open_trades(Some(Failure::Api(503)));

    let report = gateway.close_all_trades().await;
    assert_eq!(report, CloseReport::default());
    assert!(broker.close_requests().is_empty());
    assert_eq!(broker.open_trade_ids(), vec![TradeId("A".into())]);
}

#[tokio::test]
async fn test_close_all_counts_each_outcome() {
    let (broker, gateway) = setup();
    broker.open_trade("A", 1000);
    broker.open_trade("B", -1000);
    broker.fail_close("B", Failure::Network);

    let report = gateway.close_all_trades().await;
    assert_eq!(report, CloseReport { closed: 1, failed: 1 });
    assert_eq!(broker.open_trade_ids(), vec![TradeId("B".into())]);
}
