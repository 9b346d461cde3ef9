//! Metrics catalog: where each metric lives in the proforma template
//!
//! The catalog is the layout contract shared with whatever writes the
//! workbook. It is never mutated at runtime; a layout change means a new
//! catalog version.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use underwrite_core::CellAddress;

/// Version of the built-in catalog
pub const LOOPMAGIC_VERSION: &str = "loopmagic-2";

const fn at(col: u32, row: u32) -> CellAddress {
    CellAddress { row, col }
}

/// An unlevered/levered pair of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCells {
    pub unlevered: CellAddress,
    pub levered: CellAddress,
}

/// Acquisition block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquisitionCells {
    pub purchase_price: CellAddress,
    pub closing_costs_pct: CellAddress,
    pub total_acquisition_cost: CellAddress,
    pub going_in_cap_rate: CellAddress,
    pub price_per_unit: CellAddress,
    #[serde(rename = "pricePerSF")]
    pub price_per_sf: CellAddress,
    pub loan_amount: CellAddress,
    pub equity_required: CellAddress,
}

/// Exit assumptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitCells {
    pub exit_cap_rate: CellAddress,
    /// Plain literal; also the width parameter of the template's
    /// `OFFSET(..., 1, <cell>)` ranges
    pub hold_period_years: CellAddress,
}

/// Year-1 operating column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Year1Cells {
    pub effective_gross_income: CellAddress,
    pub total_operating_expenses: CellAddress,
    pub noi: CellAddress,
    pub noi_margin: CellAddress,
    pub yield_on_cost: CellAddress,
    pub capex_reserves: CellAddress,
    pub total_debt_service: CellAddress,
    pub dscr: CellAddress,
    pub unlevered_cash_flow: CellAddress,
    pub levered_cash_flow: CellAddress,
}

/// Year-0 cells of the rows that run across the hold period
///
/// Year `t` of a row is `t` columns to the right of its anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowCells {
    pub unlevered: CellAddress,
    pub levered: CellAddress,
    pub net_sale_proceeds: CellAddress,
}

/// Versioned mapping from metric to cell address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsCatalog {
    pub version: String,
    pub irr: ReturnCells,
    pub equity_multiple: ReturnCells,
    pub profit: ReturnCells,
    pub acquisition: AcquisitionCells,
    pub exit: ExitCells,
    pub year1: Year1Cells,
    pub cash_flows: CashFlowCells,
}

impl MetricsCatalog {
    /// The catalog of the shipped "LoopMagic 2" template
    pub fn loopmagic() -> Self {
        Self {
            version: LOOPMAGIC_VERSION.to_string(),
            irr: ReturnCells {
                unlevered: at(5, 50),
                levered: at(6, 50),
            },
            equity_multiple: ReturnCells {
                unlevered: at(5, 51),
                levered: at(6, 51),
            },
            profit: ReturnCells {
                unlevered: at(5, 52),
                levered: at(6, 52),
            },
            acquisition: AcquisitionCells {
                purchase_price: at(2, 11),
                closing_costs_pct: at(2, 12),
                total_acquisition_cost: at(2, 13),
                going_in_cap_rate: at(2, 14),
                price_per_unit: at(2, 15),
                price_per_sf: at(2, 16),
                loan_amount: at(2, 20),
                equity_required: at(2, 24),
            },
            exit: ExitCells {
                exit_cap_rate: at(2, 27),
                hold_period_years: at(2, 29),
            },
            year1: Year1Cells {
                effective_gross_income: at(6, 10),
                total_operating_expenses: at(6, 19),
                noi: at(6, 23),
                noi_margin: at(6, 24),
                yield_on_cost: at(6, 25),
                capex_reserves: at(6, 28),
                total_debt_service: at(6, 33),
                dscr: at(6, 34),
                unlevered_cash_flow: at(6, 44),
                levered_cash_flow: at(6, 45),
            },
            cash_flows: CashFlowCells {
                unlevered: at(5, 44),
                levered: at(5, 45),
                net_sale_proceeds: at(5, 40),
            },
        }
    }

    /// Load a catalog from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the extractor relies on
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidCatalog {
            version: self.version.clone(),
            reason,
        };

        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty".into()));
        }
        if self.cash_flows.unlevered.row == self.cash_flows.levered.row {
            return Err(invalid(format!(
                "unlevered and levered cash flows share row {}",
                self.cash_flows.unlevered.row
            )));
        }

        let hold = self.exit.hold_period_years;
        for (name, anchor) in [
            ("unlevered", self.cash_flows.unlevered),
            ("levered", self.cash_flows.levered),
            ("net sale proceeds", self.cash_flows.net_sale_proceeds),
        ] {
            if anchor.row == hold.row && anchor.col <= hold.col {
                return Err(invalid(format!(
                    "{} row anchored at {} runs over the hold period cell {}",
                    name, anchor, hold
                )));
            }
        }

        Ok(())
    }
}

impl Default for MetricsCatalog {
    fn default() -> Self {
        Self::loopmagic()
    }
}
