//! The shared string table (`xl/sharedStrings.xml`)

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::XlsxResult;

/// Every `<si>` entry, rich-text runs concatenated
///
/// Phonetic guides (`<rPh>`) are skipped since they repeat the text in
/// another script.
pub(crate) fn read_shared_strings<B: BufRead>(source: B) -> XlsxResult<Vec<String>> {
    let mut xml = Reader::from_reader(source);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut entry: Option<String> = None;
    let mut depth_phonetic = 0usize;
    let mut in_text = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => entry = Some(String::new()),
                b"rPh" => depth_phonetic += 1,
                b"t" => in_text = entry.is_some() && depth_phonetic == 0,
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(text) if in_text => {
                if let Some(entry) = entry.as_mut() {
                    entry.push_str(&text.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"si" => {
                    if let Some(done) = entry.take() {
                        strings.push(decode_excel_escapes(&done));
                    }
                }
                b"rPh" => depth_phonetic = depth_phonetic.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Undo Excel's `_xHHHH_` escaping (`_x000d_` is CR, `_x005f_` an underscore)
///
/// Anything that is not a complete four-digit escape is kept as written.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(at) = rest.find("_x") {
        out.push_str(&rest[..at]);
        let candidate = &rest[at..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    out.push_str(rest);
    out
}
