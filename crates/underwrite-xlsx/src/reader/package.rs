//! The OPC zip container: content types, workbook sheet list, relationships

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

pub(crate) struct Package<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

/// A worksheet as listed in `workbook.xml`, resolved to its part path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub path: String,
}

impl<R: Read + Seek> Package<R> {
    pub fn open(reader: R) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat("no [Content_Types].xml".into()));
        }
        Ok(Self { archive })
    }

    /// Open a part that must exist
    pub fn part(&mut self, path: &str) -> XlsxResult<impl BufRead + '_> {
        self.archive
            .by_name(path)
            .map(BufReader::new)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))
    }

    /// Shared strings, or an empty table when the part is absent
    pub fn shared_strings(&mut self) -> XlsxResult<Vec<String>> {
        match self.archive.by_name(SHARED_STRINGS) {
            Ok(file) => super::strings::read_shared_strings(BufReader::new(file)),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Worksheets in workbook order
    pub fn sheets(&mut self) -> XlsxResult<Vec<SheetEntry>> {
        let mut listed = Vec::new();
        scan_elements(self.part(WORKBOOK)?, b"sheet", |attrs| {
            if let (Some(name), Some(id)) = (attrs.remove("name"), attrs.remove("r:id")) {
                listed.push((name, id));
            }
        })?;

        let mut targets = HashMap::new();
        scan_elements(self.part(WORKBOOK_RELS)?, b"Relationship", |attrs| {
            let is_sheet = attrs
                .get("Type")
                .is_some_and(|kind| kind.ends_with("/worksheet"));
            if let (true, Some(id), Some(target)) = (is_sheet, attrs.remove("Id"), attrs.remove("Target")) {
                targets.insert(id, part_path(&target));
            }
        })?;

        listed
            .into_iter()
            .map(|(name, id)| {
                let path = targets
                    .remove(&id)
                    .ok_or_else(|| XlsxError::MissingPart(format!("worksheet relationship {}", id)))?;
                Ok(SheetEntry { name, path })
            })
            .collect()
    }
}

/// Relationship targets are relative to `xl/` unless rooted
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Call `visit` with the attributes of every `<tag>` element
fn scan_elements<B: BufRead>(
    source: B,
    tag: &[u8],
    mut visit: impl FnMut(&mut HashMap<String, String>),
) -> XlsxResult<()> {
    let mut xml = Reader::from_reader(source);
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == tag => {
                visit(&mut attributes(&e));
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
        buf.clear();
    }
}

fn attributes(element: &BytesStart) -> HashMap<String, String> {
    element
        .attributes()
        .flatten()
        .filter_map(|attr| {
            let key = String::from_utf8(attr.key.as_ref().to_vec()).ok()?;
            let value = attr.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}
