use std::path::Path;

/// A table as read from a file, before any interpretation of its columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// The width of the header, or of the widest row when there is no header.
    pub columns: usize,
    /// The line number of the first row, starting at 1.
    pub row_offset: usize,
}

impl Table {
    /// Splits off the header if there is one. Returns None if there is no line at all.
    pub fn from_lines(mut lines: Vec<Vec<String>>, has_header: bool) -> Option<Table> {
        if lines.is_empty() {
            return None;
        }
        let header = if has_header {
            Some(lines.remove(0))
        } else {
            None
        };
        let columns = match &header {
            Some(h) => h.len(),
            None => lines.iter().map(|r| r.len()).max().unwrap_or(0),
        };
        Some(Table {
            row_offset: if header.is_some() { 2 } else { 1 },
            header,
            rows: lines,
            columns,
        })
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Decodes a text file: UTF-8 first (a byte order mark is dropped), then CP949.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_string());
    }
    // The WHATWG euc-kr decoder covers the whole CP949 (UHC) range.
    let (text, had_errors) = encoding_rs::EUC_KR.decode_without_bom_handling(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Spreadsheets store integers as floats: 3.0 is written back as "3".
pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
