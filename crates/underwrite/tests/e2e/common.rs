//! In-memory XLSX fixtures.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use underwrite::CellAddress;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Acquisition Model" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builds `sheet1.xml` cell by cell.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    cells: BTreeMap<(u32, u32), String>,
}

impl SheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(mut self, a1: &str, inner: String, cell_type: Option<&str>) -> Self {
        let addr = CellAddress::parse(a1).unwrap();
        let t = cell_type.map(|t| format!(r#" t="{}""#, t)).unwrap_or_default();
        self.cells.insert(
            (addr.row, addr.col),
            format!(r#"<c r="{}"{}>{}</c>"#, a1, t, inner),
        );
        self
    }

    pub fn number(self, a1: &str, value: f64) -> Self {
        self.put(a1, format!("<v>{}</v>", value), None)
    }

    pub fn text(self, a1: &str, value: &str) -> Self {
        self.put(a1, format!("<is><t>{}</t></is>", escape(value)), Some("inlineStr"))
    }

    pub fn formula(self, a1: &str, text: &str, cached: Option<f64>) -> Self {
        let value = cached.map(|v| format!("<v>{}</v>", v)).unwrap_or_default();
        self.put(a1, format!("<f>{}</f>{}", escape(text), value), None)
    }

    pub fn shared_master(self, a1: &str, group: u32, range: &str, text: &str) -> Self {
        self.put(
            a1,
            format!(
                r#"<f t="shared" ref="{}" si="{}">{}</f>"#,
                range,
                group,
                escape(text)
            ),
            None,
        )
    }

    pub fn shared_member(self, a1: &str, group: u32) -> Self {
        self.put(a1, format!(r#"<f t="shared" si="{}"/>"#, group), None)
    }

    pub fn without(mut self, a1: &str) -> Self {
        let addr = CellAddress::parse(a1).unwrap();
        self.cells.remove(&(addr.row, addr.col));
        self
    }

    pub fn sheet_xml(&self) -> String {
        let mut rows: BTreeMap<u32, String> = BTreeMap::new();
        for ((row, _), cell) in &self.cells {
            rows.entry(*row).or_default().push_str(cell);
        }

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (row, cells) in rows {
            xml.push_str(&format!(r#"<row r="{}">{}</row>"#, row, cells));
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    pub fn xlsx(&self) -> Vec<u8> {
        let sheet = self.sheet_xml();
        zip_parts(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", sheet.as_str()),
        ])
    }
}

fn zip_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

/// A well-formed container whose workbook lists no sheets
pub fn workbook_without_sheets() -> Vec<u8> {
    zip_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets/></workbook>"#,
        ),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
    ])
}

/// A populated five-year proforma in the shipped template layout.
///
/// Cached values are what a stale save would carry, not what the inputs
/// evaluate to.
pub fn proforma() -> SheetBuilder {
    let unlevered = [-2_800_000.0, 200_000.0, 210_000.0, 220_000.0, 230_000.0, 3_100_000.0];
    let debt = [-1_800_000.0, 140_000.0, 140_000.0, 140_000.0, 140_000.0, 1_940_000.0];
    let years = ["E", "F", "G", "H", "I", "J"];

    let mut sheet = SheetBuilder::new()
        .text("A11", "Purchase Price")
        .number("B11", 8_000_000.0)
        .number("B12", 0.02)
        .formula("B13", "B11*(1+B12)", Some(8_160_000.0))
        .formula("B14", "F23/B11", Some(0.05))
        .formula("B15", "B11/40", Some(200_000.0))
        .number("B20", 7_000_000.0)
        .number("B24", 1_000_000.0)
        .number("B27", 0.06)
        .text("A29", "Hold Period (Years)")
        .number("B29", 5.0)
        .number("F10", 800_000.0)
        .number("F19", 360_000.0)
        .formula("F23", "F10-F19", Some(400_000.0))
        .formula("F24", "F23/F10", Some(0.5))
        .number("F33", 380_000.0)
        .formula("F34", "ROUND(F23/F33,2)", Some(1.05))
        .number("J40", 2_900_000.0)
        .formula("E50", "IRR(E44:J44)", Some(0.0817))
        .formula("F50", "IRR(E45:J45)", Some(0.09))
        .formula("E51", "SUM(OFFSET($F$44,0,0,1,$B$29))/-$E$44", Some(1.4))
        .formula("F51", "SUM(OFFSET($F$45,0,0,1,$B$29))/-$E$45", Some(1.5))
        .formula("E52", "SUM(OFFSET($E$44,0,0,1,$B$29+1))", Some(1_000_000.0))
        .formula("F52", "SUM(OFFSET($E$45,0,0,1,$B$29+1))", Some(400_000.0))
        .shared_master("E45", 0, "E45:J45", "E44-E41");

    for ((col, flow), debt) in years.iter().zip(unlevered).zip(debt) {
        sheet = sheet
            .number(&format!("{}44", col), flow)
            .number(&format!("{}41", col), debt);
    }
    for col in &years[1..] {
        sheet = sheet.shared_member(&format!("{}45", col), 0);
    }
    sheet
}
