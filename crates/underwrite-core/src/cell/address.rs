//! A1 addresses and rectangular ranges

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A cell position, 1-based in both axes (`A1` is column 1, row 1)
///
/// `$` markers are accepted by [`parse`](Self::parse) and dropped; the formula
/// AST keeps track of which parts were absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(col: u32, row: u32) -> Result<Self> {
        if !(1..=MAX_COLS).contains(&col) {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }
        if !(1..=MAX_ROWS).contains(&row) {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        Ok(Self { row, col })
    }

    /// Parse `F44`, `$B$29`, `f$45` and the like
    ///
    /// ```
    /// use underwrite_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B$29").unwrap();
    /// assert_eq!((addr.col, addr.row), (2, 29));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || Error::InvalidAddress(text.to_string());

        let body = text.strip_prefix('$').unwrap_or(text);
        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (letters, digits) = body.split_at(split);
        let digits = digits.strip_prefix('$').unwrap_or(digits);

        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let row = digits.parse::<u32>().map_err(|_| invalid())?;
        Self::new(Self::letters_to_column(letters)?, row)
    }

    /// 1 -> `A`, 27 -> `AA`, 16384 -> `XFD`
    pub fn column_to_letters(col: u32) -> String {
        let mut letters = Vec::new();
        let mut n = col;
        while n > 0 {
            let digit = (n - 1) % 26;
            letters.push(b'A' + digit as u8);
            n = (n - 1) / 26;
        }
        letters.iter().rev().map(|&b| char::from(b)).collect()
    }

    /// Inverse of [`column_to_letters`](Self::column_to_letters), case-insensitive
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::InvalidAddress(letters.to_string()));
        }
        letters
            .bytes()
            .try_fold(0u32, |acc, b| {
                let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
                acc.checked_mul(26)?.checked_add(digit).filter(|&col| col <= MAX_COLS)
            })
            .ok_or(Error::ColumnOutOfBounds(u32::MAX, MAX_COLS))
    }

    /// Same row, `delta` columns over
    pub fn offset_columns(&self, delta: i64) -> Result<Self> {
        let col = i64::from(self.col) + delta;
        let col = u32::try_from(col).map_err(|_| Error::ColumnOutOfBounds(0, MAX_COLS))?;
        Self::new(col, self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_to_letters(self.col), self.row)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CellAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CellAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        CellAddress::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// An inclusive rectangle, always stored top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Any two opposite corners
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress {
                row: a.row.min(b.row),
                col: a.col.min(b.col),
            },
            end: CellAddress {
                row: a.row.max(b.row),
                col: a.col.max(b.col),
            },
        }
    }

    /// `E45:J45`; a lone address is a one-cell range
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let corner = |part: &str| {
            CellAddress::parse(part).map_err(|_| Error::InvalidRange(text.to_string()))
        };
        match text.split_once(':') {
            Some((a, b)) => Ok(Self::new(corner(a)?, corner(b)?)),
            None => {
                let only = corner(text)?;
                Ok(Self::new(only, only))
            }
        }
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    /// Width in columns
    pub fn columns(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Entries of `cells` inside this range, row-major
    ///
    /// Walks the populated addresses between the corners, never the empty
    /// ones, so `A1:XFD1048576` over a handful of cells is cheap.
    pub fn occupied<'a, V>(
        &self,
        cells: &'a BTreeMap<CellAddress, V>,
    ) -> impl Iterator<Item = (CellAddress, &'a V)> + 'a {
        let range = *self;
        cells
            .range(range.start..=range.end)
            .filter(move |(addr, _)| range.contains(addr))
            .map(|(addr, value)| (*addr, value))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
