//! Reading the results Excel cached in the file.

use pretty_assertions::assert_eq;
use underwrite::{evaluate_metrics, read_cached_metrics, MetricsCatalog};

use crate::proforma;

#[test]
fn test_cached_metrics_are_the_stale_values() {
    let bytes = proforma().xlsx();
    let cached = read_cached_metrics(&bytes, &MetricsCatalog::loopmagic()).unwrap();

    assert_eq!(cached.irr.unlevered, Some(0.0817));
    assert_eq!(cached.irr.levered, Some(0.09));
    assert_eq!(cached.acquisition.going_in_cap_rate, Some(0.05));
    assert_eq!(cached.year1.noi, Some(400_000.0));
    assert_eq!(cached.equity_multiple.levered, Some(1.5));
    assert_eq!(cached.acquisition.purchase_price, Some(8_000_000.0));
    assert_eq!(cached.exit.hold_period_years, Some(5));
    assert_eq!(cached.exit.net_sale_proceeds, Some(2_900_000.0));
}

#[test]
fn test_cached_and_evaluated_differ_where_inputs_changed() {
    let bytes = proforma().xlsx();
    let cached = read_cached_metrics(&bytes, &MetricsCatalog::loopmagic()).unwrap();
    let fresh = evaluate_metrics(&bytes).unwrap();

    assert_ne!(cached.acquisition.going_in_cap_rate, fresh.acquisition.going_in_cap_rate);
    assert_ne!(cached.year1.noi, fresh.year1.noi);
    assert_eq!(cached.acquisition.purchase_price, fresh.acquisition.purchase_price);
    assert_eq!(cached.year1.unlevered_cash_flow, fresh.year1.unlevered_cash_flow);
}

#[test]
fn test_levered_row_without_cached_values() {
    // Shared-formula members carry no cached value in the fixture
    let bytes = proforma().xlsx();
    let cached = read_cached_metrics(&bytes, &MetricsCatalog::loopmagic()).unwrap();

    assert_eq!(cached.year1.levered_cash_flow, None);
    assert_eq!(cached.cash_on_cash, None);
    assert_eq!(cached.average_annual_cash_flow.levered, None);
    assert_eq!(cached.average_annual_cash_flow.unlevered, Some(792_000.0));
}
