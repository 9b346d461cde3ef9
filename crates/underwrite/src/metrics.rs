//! Investment metrics read off an evaluated proforma

use serde::{Deserialize, Serialize};
use underwrite_core::CellAddress;

use crate::catalog::{MetricsCatalog, ReturnCells};
use crate::irr::IrrSolver;
use crate::values::CellValues;

/// An unlevered/levered pair of values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnPair {
    pub unlevered: Option<f64>,
    pub levered: Option<f64>,
}

/// Year-1 operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Year1Metrics {
    pub effective_gross_income: Option<f64>,
    pub total_operating_expenses: Option<f64>,
    pub noi: Option<f64>,
    pub noi_margin: Option<f64>,
    pub yield_on_cost: Option<f64>,
    pub capex_reserves: Option<f64>,
    pub total_debt_service: Option<f64>,
    pub dscr: Option<f64>,
    pub unlevered_cash_flow: Option<f64>,
    pub levered_cash_flow: Option<f64>,
}

/// Acquisition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionMetrics {
    pub purchase_price: Option<f64>,
    pub closing_costs_pct: Option<f64>,
    pub total_acquisition_cost: Option<f64>,
    pub going_in_cap_rate: Option<f64>,
    pub price_per_unit: Option<f64>,
    #[serde(rename = "pricePerSF")]
    pub price_per_sf: Option<f64>,
    pub loan_amount: Option<f64>,
    pub equity_required: Option<f64>,
}

/// Exit at the end of the hold period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitMetrics {
    pub exit_cap_rate: Option<f64>,
    pub hold_period_years: Option<u32>,
    pub net_sale_proceeds: Option<f64>,
}

/// Everything extracted from one workbook; every leaf may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub irr: ReturnPair,
    pub equity_multiple: ReturnPair,
    pub profit: ReturnPair,
    pub year1: Year1Metrics,
    pub acquisition: AcquisitionMetrics,
    pub exit: ExitMetrics,
    /// Year-1 levered cash flow over equity required
    pub cash_on_cash: Option<f64>,
    pub average_annual_cash_flow: ReturnPair,
}

/// Maps catalog addresses of a grid to [`FinancialMetrics`]
#[derive(Debug, Clone, Copy)]
pub struct MetricsExtractor<'a> {
    catalog: &'a MetricsCatalog,
    hold_period_years: u32,
}

impl<'a> MetricsExtractor<'a> {
    pub fn new(catalog: &'a MetricsCatalog, hold_period_years: u32) -> Self {
        Self {
            catalog,
            hold_period_years,
        }
    }

    /// Year 0 through the hold period of the row anchored at `anchor`
    ///
    /// Missing and non-numeric years count as 0.
    pub fn cash_flow_series<V>(&self, values: &V, anchor: CellAddress) -> Vec<f64>
    where
        V: CellValues + ?Sized,
    {
        (0..=self.hold_period_years)
            .map(|year| {
                year_cell(anchor, year)
                    .and_then(|addr| values.number_at(addr))
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// IRR of the unlevered and levered cash-flow rows
    pub fn solve_irr<V>(&self, values: &V, solver: &IrrSolver) -> ReturnPair
    where
        V: CellValues + ?Sized,
    {
        let rows = &self.catalog.cash_flows;
        ReturnPair {
            unlevered: solver.solve(&self.cash_flow_series(values, rows.unlevered)),
            levered: solver.solve(&self.cash_flow_series(values, rows.levered)),
        }
    }

    /// Read every metric; `irr` comes from the caller
    pub fn extract<V>(&self, values: &V, irr: ReturnPair) -> FinancialMetrics
    where
        V: CellValues + ?Sized,
    {
        let catalog = self.catalog;
        let num = |addr: CellAddress| values.number_at(addr);
        let pair = |cells: &ReturnCells| ReturnPair {
            unlevered: num(cells.unlevered),
            levered: num(cells.levered),
        };

        let y1 = &catalog.year1;
        let year1 = Year1Metrics {
            effective_gross_income: num(y1.effective_gross_income),
            total_operating_expenses: num(y1.total_operating_expenses),
            noi: num(y1.noi),
            noi_margin: num(y1.noi_margin),
            yield_on_cost: num(y1.yield_on_cost),
            capex_reserves: num(y1.capex_reserves),
            total_debt_service: num(y1.total_debt_service),
            dscr: num(y1.dscr),
            unlevered_cash_flow: num(y1.unlevered_cash_flow),
            levered_cash_flow: num(y1.levered_cash_flow),
        };

        let acq = &catalog.acquisition;
        let acquisition = AcquisitionMetrics {
            purchase_price: num(acq.purchase_price),
            closing_costs_pct: num(acq.closing_costs_pct),
            total_acquisition_cost: num(acq.total_acquisition_cost),
            going_in_cap_rate: num(acq.going_in_cap_rate),
            price_per_unit: num(acq.price_per_unit),
            price_per_sf: num(acq.price_per_sf),
            loan_amount: num(acq.loan_amount),
            equity_required: num(acq.equity_required),
        };

        let exit = ExitMetrics {
            exit_cap_rate: num(catalog.exit.exit_cap_rate),
            hold_period_years: Some(self.hold_period_years),
            net_sale_proceeds: year_cell(catalog.cash_flows.net_sale_proceeds, self.hold_period_years)
                .and_then(num),
        };

        let cash_on_cash = cash_on_cash(year1.levered_cash_flow, acquisition.equity_required);
        let average_annual_cash_flow = ReturnPair {
            unlevered: self.average_annual(values, catalog.cash_flows.unlevered),
            levered: self.average_annual(values, catalog.cash_flows.levered),
        };

        FinancialMetrics {
            irr,
            equity_multiple: pair(&catalog.equity_multiple),
            profit: pair(&catalog.profit),
            year1,
            acquisition,
            exit,
            cash_on_cash,
            average_annual_cash_flow,
        }
    }

    /// Mean of years 1 through the hold period over the years that have a number
    fn average_annual<V>(&self, values: &V, anchor: CellAddress) -> Option<f64>
    where
        V: CellValues + ?Sized,
    {
        let years: Vec<f64> = (1..=self.hold_period_years)
            .filter_map(|year| year_cell(anchor, year).and_then(|addr| values.number_at(addr)))
            .collect();

        if years.is_empty() {
            None
        } else {
            Some(years.iter().sum::<f64>() / years.len() as f64)
        }
    }
}

fn year_cell(anchor: CellAddress, year: u32) -> Option<CellAddress> {
    anchor.offset_columns(i64::from(year)).ok()
}

fn cash_on_cash(levered_cash_flow: Option<f64>, equity: Option<f64>) -> Option<f64> {
    match (levered_cash_flow, equity) {
        (Some(cash_flow), Some(equity)) if equity != 0.0 => Some(cash_flow / equity),
        _ => None,
    }
}
