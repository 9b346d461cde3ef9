//! Metrics from the results Excel cached in the file
//!
//! Nothing is recalculated: formula cells read their cached `<v>` value and
//! the IRR comes from the template's own `IRR` cells. Comparing this against
//! [`evaluate_workbook`](crate::evaluate_workbook) shows how stale a saved
//! workbook is.

use underwrite_core::{CellAddress, CellContent, SheetSnapshot};
use underwrite_xlsx::WorkbookLoader;

use crate::catalog::MetricsCatalog;
use crate::config::DEFAULT_HOLD_PERIOD_YEARS;
use crate::error::Result;
use crate::metrics::{FinancialMetrics, MetricsExtractor, ReturnPair};
use crate::pipeline::hold_period;
use crate::values::{literal_number, CellValues};

/// Cached formula results, falling back to literal cells
#[derive(Debug, Clone, Copy)]
pub struct CachedValues<'a> {
    snapshot: &'a SheetSnapshot,
}

impl<'a> CachedValues<'a> {
    pub fn new(snapshot: &'a SheetSnapshot) -> Self {
        Self { snapshot }
    }
}

impl CellValues for CachedValues<'_> {
    fn number_at(&self, addr: CellAddress) -> Option<f64> {
        if let Some(value) = self.snapshot.cached(addr) {
            return literal_number(value);
        }
        match self.snapshot.get(addr) {
            CellContent::Literal(value) => literal_number(value),
            _ => None,
        }
    }
}

/// Extract metrics from an already loaded snapshot without recalculating
pub fn cached_metrics(snapshot: &SheetSnapshot, catalog: &MetricsCatalog) -> FinancialMetrics {
    let (years, _) = hold_period(snapshot, catalog, DEFAULT_HOLD_PERIOD_YEARS);
    let values = CachedValues::new(snapshot);
    let irr = ReturnPair {
        unlevered: values.number_at(catalog.irr.unlevered),
        levered: values.number_at(catalog.irr.levered),
    };

    MetricsExtractor::new(catalog, years).extract(&values, irr)
}

/// Load `bytes` and extract metrics from the cached formula results
pub fn read_cached_metrics(bytes: &[u8], catalog: &MetricsCatalog) -> Result<FinancialMetrics> {
    let snapshot = WorkbookLoader::new().load(bytes)?;
    Ok(cached_metrics(&snapshot, catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use underwrite_core::LiteralValue;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_cached_values_prefer_formula_results() {
        let mut sheet = SheetSnapshot::new("Model", 60, 15);
        sheet.set(addr("B11"), CellContent::from(8_000_000.0)).unwrap();
        sheet.set(addr("B14"), CellContent::formula("F23/B11")).unwrap();
        sheet.set_cached(addr("B14"), LiteralValue::Number(0.05));
        sheet.set(addr("B15"), CellContent::formula("B11/40")).unwrap();
        sheet.set(addr("B16"), CellContent::Literal(LiteralValue::Text("$125".into()))).unwrap();

        let values = CachedValues::new(&sheet);
        assert_eq!(values.number_at(addr("B11")), Some(8_000_000.0));
        assert_eq!(values.number_at(addr("B14")), Some(0.05));
        // Formula without a cached result
        assert_eq!(values.number_at(addr("B15")), None);
        assert_eq!(values.number_at(addr("B16")), Some(125.0));
    }

    #[test]
    fn test_cached_metrics_reads_template_irr() {
        let mut sheet = SheetSnapshot::new("Model", 60, 15);
        sheet.set(addr("B29"), CellContent::from(3.0)).unwrap();
        sheet.set(addr("E50"), CellContent::formula("IRR(E44:H44)")).unwrap();
        sheet.set_cached(addr("E50"), LiteralValue::Number(0.0712));
        sheet.set(addr("F50"), CellContent::formula("IRR(E45:H45)")).unwrap();
        sheet.set_cached(addr("F50"), LiteralValue::Text("#NUM!".into()));
        sheet.set(addr("H40"), CellContent::formula("H38-H39")).unwrap();
        sheet.set_cached(addr("H40"), LiteralValue::Number(9_100_000.0));

        let metrics = cached_metrics(&sheet, &MetricsCatalog::loopmagic());
        assert_eq!(metrics.irr.unlevered, Some(0.0712));
        assert_eq!(metrics.irr.levered, None);
        assert_eq!(metrics.exit.hold_period_years, Some(3));
        assert_eq!(metrics.exit.net_sale_proceeds, Some(9_100_000.0));
    }
}
