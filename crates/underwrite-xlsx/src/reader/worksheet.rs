//! Worksheet part parsing
//!
//! Cells are collected before the grid is built because the grid size is only
//! known once the whole part has been read.

use std::io::BufRead;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use underwrite_core::{
    CellAddress, CellContent, CellRange, LiteralValue, SharedFormulaMaster, SheetSnapshot,
};

use super::strings::decode_excel_escapes;
use crate::error::{XlsxError, XlsxResult};

/// The `<f>` element of a cell
#[derive(Debug, Default)]
struct FormulaElement {
    text: String,
    shared: bool,
    group: Option<u32>,
    range: Option<String>,
}

impl FormulaElement {
    fn from_start(e: &BytesStart) -> Self {
        Self {
            text: String::new(),
            shared: attribute(e, b"t").as_deref() == Some("shared"),
            group: attribute(e, b"si").and_then(|s| s.parse().ok()),
            range: attribute(e, b"ref"),
        }
    }
}

/// Everything read from one worksheet part
#[derive(Debug, Default)]
pub(super) struct ParsedSheet {
    cells: Vec<(CellAddress, CellContent)>,
    cached: Vec<(CellAddress, LiteralValue)>,
    masters: Vec<(u32, SharedFormulaMaster)>,
    max_row: u32,
    max_col: u32,
}

impl ParsedSheet {
    fn observe(&mut self, addr: CellAddress) {
        self.max_row = self.max_row.max(addr.row);
        self.max_col = self.max_col.max(addr.col);
    }

    /// Build the grid: `max_row` rows by `max(max_col, min_columns)` columns
    pub(super) fn into_snapshot(self, name: String, min_columns: u32) -> XlsxResult<SheetSnapshot> {
        let cols = self.max_col.max(min_columns);
        let mut snapshot = SheetSnapshot::new(name, self.max_row, cols);

        for (addr, content) in self.cells {
            snapshot.set(addr, content)?;
        }
        for (addr, value) in self.cached {
            snapshot.set_cached(addr, value);
        }
        for (group, master) in self.masters {
            snapshot.insert_shared_master(group, master);
        }

        Ok(snapshot)
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn row_number(e: &BytesStart, previous: u32) -> XlsxResult<u32> {
    match attribute(e, b"r") {
        Some(r) => r
            .parse()
            .map_err(|_| XlsxError::Parse(format!("Invalid row number '{}'", r))),
        None => Ok(previous + 1),
    }
}

/// Address of a `<c>` element; cells without `r` follow the previous cell
fn cell_position(e: &BytesStart, row: u32, last_col: u32) -> XlsxResult<CellAddress> {
    match attribute(e, b"r") {
        Some(r) => CellAddress::parse(&r)
            .map_err(|err| XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))),
        None => Ok(CellAddress::new(last_col + 1, row.max(1))?),
    }
}

/// Read the `<sheetData>` of a worksheet part
pub(super) fn read_worksheet<B: BufRead>(
    reader: B,
    shared_strings: &[String],
) -> XlsxResult<ParsedSheet> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheet = ParsedSheet::default();

    let mut current_row: u32 = 0;
    let mut last_col: u32 = 0;

    // Current cell state
    let mut current_cell: Option<CellAddress> = None;
    let mut current_type: Option<String> = None;
    let mut current_value: Option<String> = None;
    let mut current_formula: Option<FormulaElement> = None;
    let mut inline_text: Option<String> = None;
    let mut in_value = false;
    let mut in_formula = false;
    let mut in_inline_str = false;
    let mut in_inline_text = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => {
                    current_row = row_number(&e, current_row)?;
                    sheet.max_row = sheet.max_row.max(current_row);
                    last_col = 0;
                }
                b"c" => {
                    let addr = cell_position(&e, current_row, last_col)?;
                    last_col = addr.col;
                    current_cell = Some(addr);
                    current_type = attribute(&e, b"t");
                    current_value = None;
                    current_formula = None;
                    inline_text = None;
                }
                b"v" if current_cell.is_some() => in_value = true,
                b"f" if current_cell.is_some() => {
                    in_formula = true;
                    current_formula = Some(FormulaElement::from_start(&e));
                }
                b"is" if current_cell.is_some() => {
                    in_inline_str = true;
                    inline_text = Some(String::new());
                }
                b"t" if in_inline_str => in_inline_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"row" => {
                    current_row = row_number(&e, current_row)?;
                    sheet.max_row = sheet.max_row.max(current_row);
                    last_col = 0;
                }
                b"c" => {
                    // Styled but valueless cell
                    let addr = cell_position(&e, current_row, last_col)?;
                    last_col = addr.col;
                    sheet.observe(addr);
                }
                b"f" if current_cell.is_some() => {
                    current_formula = Some(FormulaElement::from_start(&e));
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_value || in_formula || in_inline_text => {
                let text = e.unescape()?;
                if in_value {
                    current_value.get_or_insert_with(String::new).push_str(&text);
                } else if in_formula {
                    if let Some(formula) = current_formula.as_mut() {
                        formula.text.push_str(&text);
                    }
                } else if let Some(inline) = inline_text.as_mut() {
                    inline.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"c" => {
                    if let Some(addr) = current_cell.take() {
                        process_cell(
                            &mut sheet,
                            addr,
                            current_type.take().as_deref(),
                            current_value.take(),
                            current_formula.take(),
                            inline_text.take(),
                            shared_strings,
                        )?;
                    }
                }
                b"v" => in_value = false,
                b"f" => in_formula = false,
                b"is" => in_inline_str = false,
                b"t" if in_inline_str => in_inline_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
}

/// Record one cell's content, plus its cached result for formula cells
fn process_cell(
    sheet: &mut ParsedSheet,
    addr: CellAddress,
    cell_type: Option<&str>,
    value: Option<String>,
    formula: Option<FormulaElement>,
    inline_text: Option<String>,
    shared_strings: &[String],
) -> XlsxResult<()> {
    sheet.observe(addr);

    if let Some(formula) = formula {
        // A bad cached value never fails the load
        if let Some(cached) = value
            .as_deref()
            .and_then(|v| literal_value(cell_type, v, shared_strings).ok().flatten())
        {
            sheet.cached.push((addr, cached));
        }
        if let Some(content) = formula_content(sheet, addr, formula) {
            sheet.cells.push((addr, content));
        }
        return Ok(());
    }

    let literal = match (cell_type, value, inline_text) {
        (Some("inlineStr"), _, Some(text)) => Some(LiteralValue::Text(decode_excel_escapes(&text))),
        (_, Some(value), _) => literal_value(cell_type, &value, shared_strings)?,
        _ => None,
    };

    if let Some(literal) = literal {
        sheet.cells.push((addr, CellContent::Literal(literal)));
    }

    Ok(())
}

fn formula_content(
    sheet: &mut ParsedSheet,
    addr: CellAddress,
    formula: FormulaElement,
) -> Option<CellContent> {
    let text = formula.text.trim();

    match (formula.shared, formula.group) {
        (true, Some(group)) if text.is_empty() => Some(CellContent::SharedRef(group)),
        (true, Some(group)) => {
            match formula.range.as_deref().map(CellRange::parse) {
                Some(Ok(range)) => match SharedFormulaMaster::new(addr, text, range) {
                    Ok(master) => sheet.masters.push((group, master)),
                    Err(e) => log::warn!("Ignoring shared formula group {}: {}", group, e),
                },
                _ => log::warn!(
                    "Shared formula master {} has no usable ref; group {} ignored",
                    addr,
                    group
                ),
            }
            Some(CellContent::formula(text))
        }
        _ if text.is_empty() => {
            log::debug!("Skipping empty formula at {}", addr);
            None
        }
        _ => Some(CellContent::formula(text)),
    }
}

/// Interpret a `<v>` value according to the cell's `t` attribute
///
/// Error values (`t="e"`) yield `None`: error literals load as empty cells.
fn literal_value(
    cell_type: Option<&str>,
    value: &str,
    shared_strings: &[String],
) -> XlsxResult<Option<LiteralValue>> {
    let literal = match cell_type {
        // Shared string
        Some("s") => {
            let idx: usize = value.trim().parse().map_err(|_| {
                XlsxError::Parse(format!("Invalid shared string index: {}", value))
            })?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            LiteralValue::Text(s.clone())
        }

        Some("b") => LiteralValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),

        Some("e") => return Ok(None),

        Some("str") | Some("inlineStr") => LiteralValue::Text(decode_excel_escapes(value)),

        // ISO 8601 date
        Some("d") => match date_serial(value) {
            Some(serial) => LiteralValue::Number(serial),
            None => {
                log::debug!("Unparseable date '{}' kept as text", value);
                LiteralValue::Text(value.to_string())
            }
        },

        None | Some("n") => match value.trim().parse::<f64>() {
            Ok(n) => LiteralValue::Number(n),
            Err(_) => LiteralValue::Text(value.to_string()),
        },

        Some(_) => LiteralValue::Text(value.to_string()),
    };

    Ok(Some(literal))
}

/// Days since 1899-12-30, with the time of day as the fraction
fn date_serial(value: &str) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let trimmed = value.trim().trim_end_matches('Z');

    let datetime = trimmed.parse::<NaiveDateTime>().ok().or_else(|| {
        trimmed
            .parse::<NaiveDate>()
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })?;

    let millis = datetime.signed_duration_since(epoch).num_milliseconds();
    Some(millis as f64 / 86_400_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn parse(rows: &str, shared_strings: &[String]) -> SheetSnapshot {
        let xml = format!(
            r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            rows
        );
        read_worksheet(xml.as_bytes(), shared_strings)
            .unwrap()
            .into_snapshot("Acquisition Model".to_string(), 15)
            .unwrap()
    }

    #[test]
    fn test_literals() {
        let strings = vec!["Hold Period".to_string()];
        let sheet = parse(
            r#"<row r="29">
                 <c r="A29" t="s"><v>0</v></c>
                 <c r="B29"><v>5</v></c>
                 <c r="C29" t="b"><v>1</v></c>
                 <c r="D29" t="inlineStr"><is><t>years</t></is></c>
                 <c r="E29" t="str"><v>note_x000a_two</v></c>
                 <c r="F29" t="e"><v>#DIV/0!</v></c>
                 <c r="G29" s="3"/>
               </row>"#,
            &strings,
        );

        assert_eq!(sheet.dimensions(), (29, 15));
        assert_eq!(
            sheet.get(addr("A29")),
            &CellContent::Literal(LiteralValue::Text("Hold Period".into()))
        );
        assert_eq!(sheet.literal_number(addr("B29")), Some(5.0));
        assert_eq!(
            sheet.get(addr("C29")),
            &CellContent::Literal(LiteralValue::Boolean(true))
        );
        assert_eq!(
            sheet.get(addr("D29")),
            &CellContent::Literal(LiteralValue::Text("years".into()))
        );
        assert_eq!(
            sheet.get(addr("E29")),
            &CellContent::Literal(LiteralValue::Text("note\ntwo".into()))
        );
        assert!(sheet.get(addr("F29")).is_empty());
        assert!(sheet.get(addr("G29")).is_empty());
    }

    #[test]
    fn test_date_cells_become_serials() {
        let sheet = parse(
            r#"<row r="1"><c r="A1" t="d"><v>2024-01-01T00:00:00</v></c><c r="B1" t="d"><v>1900-01-01T12:00:00Z</v></c><c r="C1" t="d"><v>2024-03-15</v></c></row>"#,
            &[],
        );

        assert_eq!(sheet.literal_number(addr("A1")), Some(45292.0));
        assert_eq!(sheet.literal_number(addr("B1")), Some(2.5));
        assert_eq!(sheet.literal_number(addr("C1")), Some(45366.0));
    }

    #[test]
    fn test_formulas_and_cached_values() {
        let sheet = parse(
            r#"<row r="14"><c r="B14"><f>F23/B11</f><v>0.055</v></c><c r="C14" t="str"><f>"Cap"&amp;" Rate"</f><v>Cap Rate</v></c></row>"#,
            &[],
        );

        assert_eq!(sheet.get(addr("B14")), &CellContent::Formula("F23/B11".into()));
        assert_eq!(sheet.cached(addr("B14")), Some(&LiteralValue::Number(0.055)));
        assert_eq!(
            sheet.get(addr("C14")),
            &CellContent::Formula(r#""Cap"&" Rate""#.into())
        );
        assert_eq!(sheet.cached(addr("C14")), Some(&LiteralValue::Text("Cap Rate".into())));
    }

    #[test]
    fn test_shared_formula_master_and_members() {
        let sheet = parse(
            r#"<row r="45">
                 <c r="F45"><f t="shared" ref="F45:J45" si="0">F44-F41</f><v>150</v></c>
                 <c r="G45"><f t="shared" si="0"/><v>160</v></c>
                 <c r="H45"><f t="shared" si="0"></f></c>
               </row>"#,
            &[],
        );

        assert_eq!(sheet.get(addr("F45")), &CellContent::Formula("F44-F41".into()));
        assert_eq!(sheet.get(addr("G45")), &CellContent::SharedRef(0));
        assert_eq!(sheet.get(addr("H45")), &CellContent::SharedRef(0));
        assert_eq!(sheet.cached(addr("G45")), Some(&LiteralValue::Number(160.0)));

        let master = sheet.shared_master(0).unwrap();
        assert_eq!(master.address, addr("F45"));
        assert_eq!(master.formula, "F44-F41");
        assert_eq!(master.range, CellRange::parse("F45:J45").unwrap());
    }

    #[test]
    fn test_master_outside_its_range_is_rejected() {
        let sheet = parse(
            r#"<row r="45"><c r="E45"><f t="shared" ref="F45:J45" si="2">E44-E41</f></c><c r="F45"><f t="shared" si="2"/></c></row>"#,
            &[],
        );

        // The master cell keeps its own formula but registers no group
        assert_eq!(sheet.get(addr("E45")), &CellContent::Formula("E44-E41".into()));
        assert!(sheet.shared_master(2).is_none());
        assert_eq!(sheet.get(addr("F45")), &CellContent::SharedRef(2));
    }

    #[test]
    fn test_cells_without_references() {
        let sheet = parse(
            r#"<row r="3"><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row>"#,
            &[],
        );

        assert_eq!(sheet.literal_number(addr("A3")), Some(1.0));
        assert_eq!(sheet.literal_number(addr("B3")), Some(2.0));
        assert_eq!(sheet.literal_number(addr("A4")), Some(3.0));
        assert_eq!(sheet.dimensions(), (4, 15));
    }

    #[test]
    fn test_far_formatted_row_stays_sparse() {
        let sheet = parse(
            r#"<row r="29"><c r="B29"><v>5</v></c></row>
               <row r="1048576" customFormat="1" s="2"><c r="XFD1048576" s="2"/></row>"#,
            &[],
        );

        assert_eq!(sheet.dimensions(), (1_048_576, 16_384));
        assert_eq!(sheet.iter().count(), 1);
        assert_eq!(sheet.literal_number(addr("B29")), Some(5.0));
        assert!(sheet.get(addr("XFD1048576")).is_empty());
    }

    #[test]
    fn test_bad_shared_string_index_fails() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let err = read_worksheet(xml.as_bytes(), &[]).unwrap_err();
        assert!(matches!(err, XlsxError::Parse(_)));
    }
}
