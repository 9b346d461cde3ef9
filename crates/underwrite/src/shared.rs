//! Shared-formula expansion
//!
//! A shared-formula group stores its text once, on the master cell. Each
//! member's formula is the master's with every relative column reference
//! moved by the member's column distance from the master. Rows are never
//! shifted: the template only shares formulas along a row.

use std::sync::OnceLock;

use ahash::AHashMap;
use regex::{Captures, Regex};
use underwrite_core::{CellAddress, SharedFormulaMaster, SheetSnapshot, MAX_COLS};

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$?)([A-Z]{1,3})(\$?)(\d+)").expect("reference pattern is valid")
    })
}

/// Shift every relative column reference in `formula` by `delta` columns
///
/// `$`-anchored columns stay put. Text inside string literals and names
/// directly followed by `(` (functions such as `LOG10`) are left alone, as is
/// any reference the shift would push off the sheet.
pub fn shift_formula_columns(formula: &str, delta: i64) -> String {
    if delta == 0 {
        return formula.to_string();
    }

    // Even segments are outside string literals; `""` escapes toggle twice
    formula
        .split('"')
        .enumerate()
        .map(|(idx, segment)| {
            if idx % 2 == 1 {
                segment.to_string()
            } else {
                shift_segment(segment, delta)
            }
        })
        .collect::<Vec<_>>()
        .join("\"")
}

fn shift_segment(segment: &str, delta: i64) -> String {
    reference_pattern()
        .replace_all(segment, |caps: &Captures| {
            let whole = &caps[0];
            let (start, end) = match caps.get(0) {
                Some(m) => (m.start(), m.end()),
                None => return whole.to_string(),
            };

            // Part of a longer name, or a function call
            let before = segment[..start].chars().next_back();
            let after = segment[end..].chars().next();
            if before.map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
                || after.map_or(false, |c| c == '(' || c.is_ascii_alphanumeric() || c == '_')
            {
                return whole.to_string();
            }

            if &caps[1] == "$" {
                return whole.to_string();
            }

            let col = match CellAddress::letters_to_column(&caps[2]) {
                Ok(col) => col as i64 + delta,
                Err(_) => return whole.to_string(),
            };
            if col < 1 || col > MAX_COLS as i64 {
                return whole.to_string();
            }

            format!(
                "{}{}{}",
                CellAddress::column_to_letters(col as u32),
                &caps[3],
                &caps[4]
            )
        })
        .into_owned()
}

/// Expands shared-formula members of one snapshot into literal formula text
#[derive(Debug)]
pub struct SharedFormulaResolver<'a> {
    masters: &'a AHashMap<u32, SharedFormulaMaster>,
}

impl<'a> SharedFormulaResolver<'a> {
    /// Collect the masters registered by the loader
    pub fn new(snapshot: &'a SheetSnapshot) -> Self {
        Self {
            masters: snapshot.shared_masters(),
        }
    }

    /// Formula text of a member of `group` located at `addr`
    ///
    /// `None` when the group has no master in this sheet.
    pub fn resolve(&self, addr: CellAddress, group: u32) -> Option<String> {
        let master = self.masters.get(&group)?;
        if !master.range.contains(&addr) {
            log::debug!(
                "Shared formula member {} lies outside its group range {}",
                addr,
                master.range
            );
        }
        let delta = addr.col as i64 - master.address.col as i64;
        Some(shift_formula_columns(&master.formula, delta))
    }
}
