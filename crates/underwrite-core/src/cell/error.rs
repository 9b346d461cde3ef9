//! Excel error values

use std::fmt;

/// An error value held by a cell, like `#DIV/0!`
///
/// `Ref` doubles as the marker for circular chains and `Name` for formulas
/// that could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    Na,
}

const SPELLINGS: [(CellError, &str); 7] = [
    (CellError::Null, "#NULL!"),
    (CellError::Div0, "#DIV/0!"),
    (CellError::Value, "#VALUE!"),
    (CellError::Ref, "#REF!"),
    (CellError::Name, "#NAME?"),
    (CellError::Num, "#NUM!"),
    (CellError::Na, "#N/A"),
];

impl CellError {
    /// Spelling as shown in a worksheet
    pub fn as_str(&self) -> &'static str {
        SPELLINGS
            .iter()
            .find(|(err, _)| err == self)
            .map_or("#VALUE!", |(_, text)| text)
    }

    /// Case-insensitive inverse of [`as_str`](Self::as_str)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        SPELLINGS
            .iter()
            .find(|(_, text)| text.eq_ignore_ascii_case(s))
            .map(|(err, _)| *err)
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellings_round_trip() {
        for (err, text) in SPELLINGS {
            assert_eq!(err.to_string(), text);
            assert_eq!(CellError::parse(text), Some(err));
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_space() {
        assert_eq!(CellError::parse(" #div/0! "), Some(CellError::Div0));
        assert_eq!(CellError::parse("#n/a"), Some(CellError::Na));
        assert_eq!(CellError::parse("#BOGUS"), None);
        assert_eq!(CellError::parse("DIV/0!"), None);
    }
}
