//! Full evaluations of generated proformas.

use std::io::Write;

use pretty_assertions::assert_eq;
use underwrite::{
    evaluate_metrics, evaluate_workbook, resolve_workbook, EngineConfig, Error, MetricsCatalog,
};
use underwrite_xlsx::{WorkbookLoader, XlsxError};

use crate::{proforma, workbook_without_sheets, SheetBuilder};

fn assert_close(actual: Option<f64>, expected: f64, tolerance: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {}, got None", expected));
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {} +/- {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// Root of the NPV by bisection, as a reference for the Newton solver
fn bisect_irr(cash_flows: &[f64]) -> f64 {
    let npv = |rate: f64| {
        cash_flows
            .iter()
            .enumerate()
            .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
            .sum::<f64>()
    };
    let (mut lo, mut hi) = (-0.99, 1.0);
    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        if npv(lo) * npv(mid) <= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (lo + hi) / 2.0
}

#[test]
fn test_proforma_metrics() {
    let evaluation = evaluate_workbook(&proforma().xlsx(), &EngineConfig::default()).unwrap();
    let metrics = &evaluation.metrics;

    // Recalculated, not the stale cached 0.05
    assert_close(metrics.acquisition.going_in_cap_rate, 0.055, 1e-12);
    assert_eq!(metrics.acquisition.purchase_price, Some(8_000_000.0));
    assert_close(metrics.acquisition.total_acquisition_cost, 8_160_000.0, 1e-6);
    assert_eq!(metrics.acquisition.price_per_unit, Some(200_000.0));
    assert_eq!(metrics.acquisition.price_per_sf, None);
    assert_eq!(metrics.acquisition.equity_required, Some(1_000_000.0));

    assert_eq!(metrics.year1.noi, Some(440_000.0));
    assert_close(metrics.year1.noi_margin, 0.55, 1e-12);
    assert_close(metrics.year1.dscr, 1.16, 1e-12);
    assert_eq!(metrics.year1.unlevered_cash_flow, Some(200_000.0));
    assert_eq!(metrics.year1.levered_cash_flow, Some(60_000.0));

    assert_close(metrics.equity_multiple.unlevered, 3_960_000.0 / 2_800_000.0, 1e-12);
    assert_close(metrics.equity_multiple.levered, 1.46, 1e-12);
    assert_close(metrics.profit.unlevered, 1_160_000.0, 1e-6);
    assert_close(metrics.profit.levered, 460_000.0, 1e-6);

    assert_eq!(metrics.exit.exit_cap_rate, Some(0.06));
    assert_eq!(metrics.exit.hold_period_years, Some(5));
    assert_eq!(metrics.exit.net_sale_proceeds, Some(2_900_000.0));
    assert_close(metrics.cash_on_cash, 0.06, 1e-12);
    assert_close(metrics.average_annual_cash_flow.unlevered, 792_000.0, 1e-6);
    assert_close(metrics.average_annual_cash_flow.levered, 292_000.0, 1e-6);
}

#[test]
fn test_irr_matches_reference_solver() {
    let metrics = evaluate_metrics(&proforma().xlsx()).unwrap();

    let unlevered = [-2_800_000.0, 200_000.0, 210_000.0, 220_000.0, 230_000.0, 3_100_000.0];
    let levered = [-1_000_000.0, 60_000.0, 70_000.0, 80_000.0, 90_000.0, 1_160_000.0];

    assert_close(metrics.irr.unlevered, bisect_irr(&unlevered), 1e-4);
    assert_close(metrics.irr.unlevered, 0.08165, 1e-4);
    assert_close(metrics.irr.levered, bisect_irr(&levered), 1e-4);
}

#[test]
fn test_diagnostics() {
    let evaluation = evaluate_workbook(&proforma().xlsx(), &EngineConfig::default()).unwrap();
    let diagnostics = &evaluation.diagnostics;

    assert_eq!(diagnostics.hold_period_years, 5);
    assert!(!diagnostics.hold_period_defaulted);
    assert_eq!(diagnostics.shared_formulas_resolved, 5);
    assert_eq!(diagnostics.dynamic_ranges_rewritten, 4);
    assert_eq!(diagnostics.masked_irr_formulas, 2);
    assert_eq!(diagnostics.degraded_cells(), 0);
}

#[test]
fn test_shorter_hold_period() {
    let bytes = proforma().number("B29", 3.0).number("H40", 2_500_000.0).xlsx();
    let metrics = evaluate_metrics(&bytes).unwrap();

    assert_eq!(metrics.exit.hold_period_years, Some(3));
    assert_eq!(metrics.exit.net_sale_proceeds, Some(2_500_000.0));
    // F44:H44 over E44
    assert_close(metrics.equity_multiple.unlevered, 630_000.0 / 2_800_000.0, 1e-12);
    // E44:H44
    assert_close(metrics.profit.unlevered, -2_170_000.0, 1e-6);
    assert_close(metrics.average_annual_cash_flow.unlevered, 210_000.0, 1e-6);
}

#[test]
fn test_missing_hold_period_uses_default() {
    let bytes = proforma().without("B29").xlsx();

    let evaluation = evaluate_workbook(&bytes, &EngineConfig::default()).unwrap();
    assert!(evaluation.diagnostics.hold_period_defaulted);
    assert_eq!(evaluation.metrics.exit.hold_period_years, Some(5));
    assert_close(evaluation.metrics.irr.unlevered, 0.08165, 1e-4);

    let config = EngineConfig {
        default_hold_period_years: 4,
        ..EngineConfig::default()
    };
    let evaluation = evaluate_workbook(&bytes, &config).unwrap();
    assert_eq!(evaluation.diagnostics.hold_period_years, 4);
    assert_eq!(evaluation.metrics.exit.net_sale_proceeds, None);
}

#[test]
fn test_zero_equity_has_no_cash_on_cash() {
    let bytes = proforma().number("B24", 0.0).xlsx();
    let metrics = evaluate_metrics(&bytes).unwrap();

    assert_eq!(metrics.acquisition.equity_required, Some(0.0));
    assert_eq!(metrics.cash_on_cash, None);
    assert_eq!(metrics.year1.levered_cash_flow, Some(60_000.0));
}

#[test]
fn test_dangling_shared_reference_degrades_one_cell() {
    // I45 points at a group nobody declared
    let bytes = proforma().shared_member("I45", 4).xlsx();
    let evaluation = evaluate_workbook(&bytes, &EngineConfig::default()).unwrap();

    assert_eq!(evaluation.diagnostics.dangling_shared_refs, 1);
    assert_eq!(evaluation.diagnostics.shared_formulas_resolved, 4);
    assert_eq!(evaluation.diagnostics.degraded_cells(), 1);

    // Year 4 of the levered row counts as 0 for IRR and is skipped in the average
    let metrics = &evaluation.metrics;
    assert_close(metrics.average_annual_cash_flow.levered, 1_370_000.0 / 4.0, 1e-6);
    let levered = [-1_000_000.0, 60_000.0, 70_000.0, 80_000.0, 0.0, 1_160_000.0];
    assert_close(metrics.irr.levered, bisect_irr(&levered), 1e-4);
    assert_close(metrics.irr.unlevered, 0.08165, 1e-4);
}

#[test]
fn test_unparseable_formula_degrades_one_cell() {
    let bytes = proforma().formula("B15", "B11/(40", None).xlsx();
    let evaluation = evaluate_workbook(&bytes, &EngineConfig::default()).unwrap();

    assert_eq!(evaluation.metrics.acquisition.price_per_unit, None);
    assert_eq!(evaluation.metrics.acquisition.purchase_price, Some(8_000_000.0));
    assert_eq!(evaluation.diagnostics.parse_errors, 1);
}

#[test]
fn test_custom_catalog() {
    let mut catalog = MetricsCatalog::loopmagic();
    catalog.version = "loopmagic-2-test".into();
    catalog.acquisition.price_per_sf = "B13".parse().unwrap();
    let config = EngineConfig::default().with_catalog(catalog);

    let evaluation = evaluate_workbook(&proforma().xlsx(), &config).unwrap();
    assert_close(evaluation.metrics.acquisition.price_per_sf, 8_160_000.0, 1e-6);
}

#[test]
fn test_resolve_workbook_lists_concrete_formulas() {
    let (resolved, diagnostics) =
        resolve_workbook(&proforma().xlsx(), &EngineConfig::default()).unwrap();

    let formulas: Vec<(String, String)> = resolved
        .formulas()
        .map(|(addr, text)| (addr.to_string(), text.to_string()))
        .collect();

    assert!(formulas.contains(&("G45".into(), "G44-G41".into())));
    assert!(formulas.contains(&("F51".into(), "SUM(F45:J45)/-$E$45".into())));
    assert!(formulas.contains(&("E52".into(), "SUM(E44:J44)".into())));
    assert!(!formulas.iter().any(|(_, text)| text.contains("IRR(")));
    assert!(!formulas.iter().any(|(_, text)| text.contains("OFFSET(")));
    assert_eq!(diagnostics.masked_irr_formulas, 2);
}

#[test]
fn test_json_output() {
    let evaluation = evaluate_workbook(&proforma().xlsx(), &EngineConfig::default()).unwrap();
    let json = serde_json::to_value(&evaluation).unwrap();

    assert_eq!(json["metrics"]["exit"]["holdPeriodYears"], serde_json::json!(5));
    assert_eq!(json["metrics"]["acquisition"]["pricePerSF"], serde_json::Value::Null);
    assert!(json["metrics"]["irr"]["unlevered"].is_number());
    assert_eq!(json["diagnostics"]["maskedIrrFormulas"], serde_json::json!(2));
    assert_eq!(json["diagnostics"]["holdPeriodDefaulted"], serde_json::json!(false));
}

#[test]
fn test_summary_text() {
    let metrics = evaluate_metrics(&proforma().xlsx()).unwrap();
    let text = metrics.to_string();

    assert!(text.contains("Purchase Price:       $8.00M"));
    assert!(text.contains("Going-in Cap Rate:    5.50%"));
    assert!(text.contains("NOI:                  $440,000"));
    assert!(text.contains("Equity Multiple:      1.46x"));
    assert!(text.contains("=== EXIT (Year 5) ==="));
}

#[test]
fn test_read_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&proforma().xlsx()).unwrap();
    file.flush().unwrap();

    let snapshot = WorkbookLoader::new()
        .read(std::fs::File::open(file.path()).unwrap())
        .unwrap();
    assert_eq!(snapshot.name(), "Acquisition Model");
    assert_eq!(snapshot.dimensions(), (52, 15));
}

#[test]
fn test_fatal_errors() {
    assert!(matches!(
        evaluate_metrics(b"definitely not a zip"),
        Err(Error::Xlsx(XlsxError::Zip(_)))
    ));

    assert!(matches!(
        evaluate_metrics(&workbook_without_sheets()),
        Err(Error::Xlsx(XlsxError::NoWorksheets))
    ));

    // A worksheet with no cells is not an error
    let metrics = evaluate_metrics(&SheetBuilder::new().xlsx()).unwrap();
    assert_eq!(metrics.acquisition.purchase_price, None);
    assert_eq!(metrics.irr.unlevered, None);
}
