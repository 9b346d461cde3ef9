//! Loader output: one worksheet as a rectangular grid of raw cell content

use crate::cell::{CellAddress, CellContent, CellRange, LiteralValue};
use crate::error::{Error, Result};
use ahash::AHashMap;
use std::collections::BTreeMap;

static EMPTY: CellContent = CellContent::Empty;

/// The master cell of a shared-formula group
///
/// Only the master carries formula text; members reference it by group id.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFormulaMaster {
    /// Address of the master cell
    pub address: CellAddress,
    /// Formula text as written in the master, without a leading `=`
    pub formula: String,
    /// Range the group covers (the `ref` attribute)
    pub range: CellRange,
}

impl SharedFormulaMaster {
    /// Create a master, checking that it lies within its declared range
    pub fn new(address: CellAddress, formula: impl Into<String>, range: CellRange) -> Result<Self> {
        if !range.contains(&address) {
            return Err(Error::MasterOutsideRange {
                master: address.to_string(),
                range: range.to_string(),
            });
        }
        Ok(Self {
            address,
            formula: formula.into(),
            range,
        })
    }
}

/// Immutable snapshot of a worksheet
///
/// Addresses are 1-based within a declared `rows x cols` grid. Only cells
/// with content are stored, keyed in row-major order, so a sheet whose used
/// range reaches row 1048576 costs no more than its populated cells.
/// Formula cells may also carry the result Excel cached for them.
#[derive(Debug, Clone)]
pub struct SheetSnapshot {
    name: String,
    rows: u32,
    cols: u32,
    cells: BTreeMap<CellAddress, CellContent>,
    shared_masters: AHashMap<u32, SharedFormulaMaster>,
    cached: AHashMap<CellAddress, LiteralValue>,
}

impl SheetSnapshot {
    /// Create an empty snapshot with the given dimensions
    pub fn new(name: impl Into<String>, rows: u32, cols: u32) -> Self {
        Self {
            name: name.into(),
            rows,
            cols,
            cells: BTreeMap::new(),
            shared_masters: AHashMap::new(),
            cached: AHashMap::new(),
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid dimensions as (rows, cols)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    fn in_grid(&self, addr: CellAddress) -> bool {
        addr.row <= self.rows && addr.col <= self.cols
    }

    /// Set a cell's content; setting [`CellContent::Empty`] clears it
    pub fn set(&mut self, addr: CellAddress, content: CellContent) -> Result<()> {
        if !self.in_grid(addr) {
            return Err(Error::OutsideGrid {
                address: addr.to_string(),
                rows: self.rows,
                cols: self.cols,
            });
        }
        if content.is_empty() {
            self.cells.remove(&addr);
        } else {
            self.cells.insert(addr, content);
        }
        Ok(())
    }

    /// Get a cell's content; unset addresses and those outside the grid read as empty
    pub fn get(&self, addr: CellAddress) -> &CellContent {
        self.cells.get(&addr).unwrap_or(&EMPTY)
    }

    /// Iterate over all non-empty cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellContent)> + '_ {
        self.cells.iter().map(|(addr, content)| (*addr, content))
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Register a shared-formula master under its group id
    pub fn insert_shared_master(&mut self, group: u32, master: SharedFormulaMaster) {
        self.shared_masters.insert(group, master);
    }

    /// Look up a shared-formula master by group id
    pub fn shared_master(&self, group: u32) -> Option<&SharedFormulaMaster> {
        self.shared_masters.get(&group)
    }

    /// All shared-formula masters keyed by group id
    pub fn shared_masters(&self) -> &AHashMap<u32, SharedFormulaMaster> {
        &self.shared_masters
    }

    /// Record the cached result of a formula cell
    pub fn set_cached(&mut self, addr: CellAddress, value: LiteralValue) {
        self.cached.insert(addr, value);
    }

    /// Cached result of a formula cell, if the file carried one
    pub fn cached(&self, addr: CellAddress) -> Option<&LiteralValue> {
        self.cached.get(&addr)
    }

    /// Number stored directly in a cell
    ///
    /// Formulas are not evaluated and text is not parsed: a cell typed as
    /// text stays text even when it spells a number.
    pub fn literal_number(&self, addr: CellAddress) -> Option<f64> {
        match self.get(addr) {
            CellContent::Literal(LiteralValue::Number(n)) => Some(*n),
            _ => None,
        }
    }
}
