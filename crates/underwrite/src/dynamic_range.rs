//! Hold-period ranges
//!
//! The template sizes its cash-flow aggregates with
//! `OFFSET(start, 0, 0, 1, <hold period cell>[+1])`. Knowing the hold period,
//! each such call is replaced by the concrete range it denotes, so the
//! evaluator never needs `OFFSET`.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use underwrite_core::CellAddress;

fn offset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"OFFSET\(\s*\$?([A-Z]{1,3})\$?(\d+)\s*,\s*0\s*,\s*0\s*,\s*1\s*,\s*(\$?[A-Z]{1,3}\$?\d+)\s*(\+\s*1\s*)?\)",
        )
        .expect("offset pattern is valid")
    })
}

/// Rewrites one-row `OFFSET` ranges whose width is the hold-period cell
#[derive(Debug, Clone, Copy)]
pub struct DynamicRangeRewriter {
    width_cell: CellAddress,
    hold_period_years: u32,
}

impl DynamicRangeRewriter {
    /// `width_cell` is the cell the template's `OFFSET` widths read
    pub fn new(width_cell: CellAddress, hold_period_years: u32) -> Self {
        Self {
            width_cell,
            hold_period_years,
        }
    }

    pub fn hold_period_years(&self) -> u32 {
        self.hold_period_years
    }

    /// Rewrite every hold-period `OFFSET` call in `formula`
    ///
    /// Formulas without one come back borrowed. `None` means a call was found
    /// but its width is not positive or its range runs off the sheet.
    pub fn rewrite<'f>(&self, formula: &'f str) -> Option<Cow<'f, str>> {
        if !formula.contains("OFFSET(") {
            return Some(Cow::Borrowed(formula));
        }

        let mut unresolved = false;
        let rewritten = offset_pattern().replace_all(formula, |caps: &Captures| {
            match CellAddress::parse(&caps[3]) {
                Ok(addr) if addr == self.width_cell => {}
                _ => return caps[0].to_string(),
            }

            let width = self.hold_period_years as i64 + i64::from(caps.get(4).is_some());
            let range = CellAddress::parse(&format!("{}{}", &caps[1], &caps[2]))
                .ok()
                .and_then(|start| concrete_range(start, width));

            match range {
                Some(range) => range,
                None => {
                    unresolved = true;
                    caps[0].to_string()
                }
            }
        });

        if unresolved {
            None
        } else {
            Some(rewritten)
        }
    }
}

/// `start:end` spanning `width` columns from `start`
fn concrete_range(start: CellAddress, width: i64) -> Option<String> {
    if width <= 0 {
        return None;
    }
    let end = start.offset_columns(width - 1).ok()?;
    Some(format!("{}:{}", start, end))
}
