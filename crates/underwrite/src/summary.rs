//! Plain-text rendering of [`FinancialMetrics`]

use std::fmt;

use crate::metrics::FinancialMetrics;

const NA: &str = "N/A";

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{:.2}%", v * 100.0))
}

/// `$1.23M` from one million up, whole dollars with separators below
fn currency(value: Option<f64>) -> String {
    match value {
        None => NA.to_string(),
        Some(v) if v >= 1_000_000.0 => format!("${:.2}M", v / 1_000_000.0),
        Some(v) => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{}${}", sign, group_thousands(v.abs().round() as u64))
        }
    }
}

fn multiple(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{:.2}x", v))
}

fn plain(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{:.2}", v))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for FinancialMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== RETURNS SUMMARY ===")?;
        writeln!(f, "IRR (Levered):        {}", percent(self.irr.levered))?;
        writeln!(f, "IRR (Unlevered):      {}", percent(self.irr.unlevered))?;
        writeln!(f, "Equity Multiple:      {}", multiple(self.equity_multiple.levered))?;
        writeln!(f, "Cash-on-Cash (Y1):    {}", percent(self.cash_on_cash))?;
        writeln!(f, "Profit (Levered):     {}", currency(self.profit.levered))?;
        writeln!(f)?;

        let acq = &self.acquisition;
        writeln!(f, "=== ACQUISITION ===")?;
        writeln!(f, "Purchase Price:       {}", currency(acq.purchase_price))?;
        writeln!(f, "Total Acquisition:    {}", currency(acq.total_acquisition_cost))?;
        writeln!(f, "Going-in Cap Rate:    {}", percent(acq.going_in_cap_rate))?;
        writeln!(f, "Equity Required:      {}", currency(acq.equity_required))?;
        writeln!(f, "Loan Amount:          {}", currency(acq.loan_amount))?;
        writeln!(f)?;

        let y1 = &self.year1;
        writeln!(f, "=== YEAR 1 OPERATIONS ===")?;
        writeln!(f, "NOI:                  {}", currency(y1.noi))?;
        writeln!(f, "NOI Margin:           {}", percent(y1.noi_margin))?;
        writeln!(f, "DSCR:                 {}", plain(y1.dscr))?;
        writeln!(f, "Levered Cash Flow:    {}", currency(y1.levered_cash_flow))?;
        writeln!(f, "Avg Levered CF:       {}", currency(self.average_annual_cash_flow.levered))?;
        writeln!(f)?;

        let hold = self
            .exit
            .hold_period_years
            .map_or_else(|| NA.to_string(), |years| years.to_string());
        writeln!(f, "=== EXIT (Year {}) ===", hold)?;
        writeln!(f, "Exit Cap Rate:        {}", percent(self.exit.exit_cap_rate))?;
        write!(f, "Net Sale Proceeds:    {}", currency(self.exit.net_sale_proceeds))
    }
}
