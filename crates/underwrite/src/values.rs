//! Numeric cell lookups shared by the evaluated grid and the cached reader

use underwrite_core::{CellAddress, LiteralValue};

/// Read-only numeric view of a worksheet
pub trait CellValues {
    /// Numeric value of a cell; `None` for empty, error and non-numeric cells
    fn number_at(&self, addr: CellAddress) -> Option<f64>;
}

/// Number from display text such as `"$1,250,000"` or `"5.5%"`
///
/// `,` `$` and `%` are dropped before parsing; a percent sign does not scale.
pub fn number_from_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%'))
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a literal; booleans are not numbers here
pub fn literal_number(value: &LiteralValue) -> Option<f64> {
    match value {
        LiteralValue::Number(n) if n.is_finite() => Some(*n),
        LiteralValue::Text(s) => number_from_text(s),
        _ => None,
    }
}
