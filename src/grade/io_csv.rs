// Primitives for reading CSV files.

use crate::grade::{io_common::decode_text, io_common::Table, *};

pub fn read_csv_table(path: &str, cfs: &FileSource) -> GradeResult<Table> {
    let bytes = fs::read(path).context(OpeningFileSnafu { path })?;
    let text = decode_text(&bytes).context(EncodingSnafu { path })?;
    let lines = parse_csv_lines(&text).context(CsvParseSnafu { path })?;
    debug!("read_csv_table: {:?}: {} lines", path, lines.len());
    Table::from_lines(lines, cfs.has_header()).context(EmptyFileSnafu { path })
}

fn parse_csv_lines(text: &str) -> Result<Vec<Vec<String>>, csv::Error> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        // Answer sheets often have ragged lines.
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut lines: Vec<Vec<String>> = Vec::new();
    for record in rdr.into_records() {
        let record = record?;
        lines.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(lines)
}
