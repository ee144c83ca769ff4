#![cfg(feature = "portfolio")]

use portfolio_analytics_core::portfolio::allocation::{self, AllocationInput};
use portfolio_analytics_core::portfolio::income::{self, CouponIncomeInput};
use portfolio_analytics_core::portfolio::ranking::{self, RankingInput};
use portfolio_analytics_core::portfolio::records::{InstrumentType, MetricRow};
use portfolio_analytics_core::portfolio::returns::{self, MarketComparisonInput, MonthlyReturnsInput};
use portfolio_analytics_core::portfolio::snapshot::{self, SnapshotInput, ValueForecastInput};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn metric_rows() -> Vec<MetricRow> {
    serde_json::from_str(
        r#"[
            { "date": "2024-01-30", "total_amount": "100000", "expected_yield": "0",
              "expected_yield_percent": "0.00", "index_points": "3200" },
            { "date": "2024-01-31", "total_amount": "101000", "expected_yield": "1000",
              "expected_yield_percent": "1.00", "index_points": "3232" },
            { "date": "2024-02-01", "total_amount": "100500", "expected_yield": "500",
              "expected_yield_percent": "0.50", "index_points": "3200" },
            { "date": "2024-02-02", "total_amount": "102000", "expected_yield": "2000",
              "expected_yield_percent": "2.00", "index_points": "3216" }
        ]"#,
    )
    .unwrap()
}

const POSITIONS: &str = r#"[
    { "date": "2024-02-01", "instrument_type": "share", "name": "SBER",
      "quantity": "100", "average_price": "250", "current_price": "260", "expected_yield": "1000" },
    { "date": "2024-02-01", "instrument_type": "bond", "name": "OFZ 26238",
      "quantity": "10", "average_price": "900", "current_price": "910", "expected_yield": "100" },
    { "date": "2024-02-02", "instrument_type": "share", "name": "SBER",
      "quantity": "100", "average_price": "250", "current_price": "275", "expected_yield": "2500" },
    { "date": "2024-02-02", "instrument_type": "bond", "name": "OFZ 26238",
      "quantity": "10", "average_price": "900", "current_price": "890", "expected_yield": "-100" },
    { "date": "2024-02-02", "instrument_type": "currency", "name": "Российский рубль",
      "quantity": "5000", "average_price": "1", "current_price": "1", "expected_yield": "0" }
]"#;

// ===========================================================================
// Daily metrics
// ===========================================================================

#[test]
fn test_snapshot_from_json_rows() {
    let out = snapshot::portfolio_snapshot(&SnapshotInput { rows: metric_rows() })
        .unwrap()
        .result;
    assert_eq!(out.value_today, dec!(102000));
    assert_eq!(out.invested_today, dec!(100000));
    assert_eq!(out.return_today, dec!(0.02));
    assert_eq!(out.return_yesterday, dec!(0.005));
    assert_eq!(out.delta_return, dec!(0.015));
}

#[test]
fn test_value_forecast_horizon() {
    let out = snapshot::value_forecast(&ValueForecastInput {
        rows: metric_rows(),
        horizon_days: 7,
    })
    .unwrap()
    .result;
    assert_eq!(out.axis.len(), 11);
    assert!(out.fit.slope > 0.0);
}

#[test]
fn test_monthly_and_market_views() {
    let monthly = returns::monthly_returns(&MonthlyReturnsInput { rows: metric_rows() })
        .unwrap()
        .result;
    assert_eq!(monthly.months.len(), 2);
    assert_eq!(monthly.months[0].value, dec!(1.00));
    assert_eq!(monthly.months[1].value, dec!(1.50));
    assert_eq!(monthly.mean, Some(dec!(1.25)));

    let market = returns::market_comparison(&MarketComparisonInput { rows: metric_rows() })
        .unwrap()
        .result;
    assert_eq!(market.points.len(), 3);
    // index: +1%, -0.99%, +0.5%
    assert_eq!(market.points[0].market, dec!(1.00));
    assert_eq!(market.points[1].market, dec!(0.01));
    assert_eq!(market.points[2].market, dec!(0.51));
    assert_eq!(market.points[2].portfolio, dec!(2.00));
    assert_eq!(market.portfolio_vs_market, Some(dec!(1.49)));
}

// ===========================================================================
// Holdings
// ===========================================================================

#[test]
fn test_allocation_and_ranking_from_json() {
    let input: AllocationInput =
        serde_json::from_str(&format!(r#"{{ "positions": {POSITIONS} }}"#)).unwrap();
    let alloc = allocation::allocation_by_type(&input).unwrap().result;
    assert_eq!(alloc.total, dec!(41400));
    assert_eq!(alloc.slices[0].instrument_type, InstrumentType::Share);
    assert_eq!(alloc.slices[0].amount, dec!(27500));
    assert_eq!(alloc.slices[2].amount, dec!(5000));

    let ranking_input: RankingInput =
        serde_json::from_str(&format!(r#"{{ "positions": {POSITIONS}, "top_n": 1 }}"#)).unwrap();
    let top = ranking::rank_by_total_yield(&ranking_input).unwrap().result;
    assert_eq!(top.best[0].name, "SBER");
    assert_eq!(top.best[0].yield_on_cost, dec!(0.1));
    assert_eq!(top.worst[0].name, "OFZ 26238");

    let moves = ranking::rank_by_daily_change(&ranking_input).unwrap().result;
    assert_eq!(moves.best[0].name, "SBER");
    assert_eq!(moves.best[0].change, dec!(0.06));
    assert!((moves.worst[0].change + dec!(0.0222222)).abs() < dec!(0.0000001));
}

#[test]
fn test_coupon_income_defaults() {
    let input: CouponIncomeInput = serde_json::from_str(&format!(
        r#"{{
            "positions": {POSITIONS},
            "payments": [
                {{ "payment_date": "2024-04-10", "name": "OFZ 26238", "amount": "354" }},
                {{ "payment_date": "2024-10-09", "name": "OFZ 26238", "amount": "354" }}
            ]
        }}"#
    ))
    .unwrap();
    assert_eq!(input.usd_rate, dec!(90));

    let out = income::coupon_income(&input).unwrap().result;
    assert_eq!(out.year, 2024);
    assert_eq!(out.annual_coupons, dec!(708));
    assert_eq!(out.bond_cost_basis, dec!(9000));
    assert_eq!(out.invested_capital, dec!(39000));
    let on_bonds = out.yield_on_bonds.unwrap();
    assert!((on_bonds - dec!(0.0786667)).abs() < dec!(0.0000001));
}
