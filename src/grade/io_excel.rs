use crate::grade::{io_common::format_number, io_common::Table, *};

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

pub fn read_excel_table(path: &str, cfs: &FileSource) -> GradeResult<Table> {
    let wrange = get_range(path, cfs)?;
    let (height, width) = wrange.get_size();
    debug!("read_excel_table: {:?}: {} x {}", path, height, width);
    let lines: Vec<Vec<String>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    let mut table = Table::from_lines(lines, cfs.has_header()).context(EmptyFileSnafu { path })?;
    // The used range is rectangular: its width is the table width even without a header.
    table.columns = table.columns.max(width);
    Ok(table)
}

fn get_range(path: &str, cfs: &FileSource) -> GradeResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyFileSnafu { path })?,
    };
    wrange.context(OpeningExcelSnafu { path })
}

fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => format_number(*f),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        // Dates have no meaning in an answer sheet, keep the serial number.
        DataType::DateTime(f) => format_number(*f),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(3.0)), "3");
        assert_eq!(read_cell(&DataType::Float(0.5)), "0.5");
        assert_eq!(read_cell(&DataType::Int(12)), "12");
        assert_eq!(read_cell(&DataType::String("A".to_string())), "A");
        assert_eq!(read_cell(&DataType::Empty), "");
    }

    fn workbook_path() -> String {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/xlsx_students/answers.xlsx")
            .display()
            .to_string()
    }

    fn source(sheet: Option<&str>) -> FileSource {
        FileSource {
            excel_worksheet_name: sheet.map(|s| s.to_string()),
            ..FileSource::from_path(&workbook_path(), None)
        }
    }

    #[test]
    fn named_worksheet() {
        let table = read_excel_table(&workbook_path(), &source(Some("Answers"))).unwrap();
        assert_eq!(
            table.header,
            Some(vec![
                "student id".to_string(),
                "subject code".to_string(),
                "1".to_string(),
                "2".to_string()
            ])
        );
        assert_eq!(table.columns, 4);
        assert_eq!(table.row_offset, 2);
        assert_eq!(table.rows[0], vec!["2024001", "MATH01", "3", "1"]);
        // The missing last cell is padded to the width of the sheet.
        assert_eq!(table.rows[1], vec!["2024002", "MATH01", "3", ""]);
    }

    #[test]
    fn first_worksheet_by_default() {
        let table = read_excel_table(&workbook_path(), &source(None)).unwrap();
        assert_eq!(
            table.header,
            Some(vec!["answers are on the next sheet".to_string()])
        );
        assert!(table.rows.is_empty());
    }

    #[test]
    fn without_header_the_sheet_sets_the_width() {
        let cfs = FileSource {
            has_header: Some(false),
            ..source(Some("Answers"))
        };
        let table = read_excel_table(&workbook_path(), &cfs).unwrap();
        assert_eq!(table.header, None);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.columns, 4);
    }

    #[test]
    fn missing_worksheet() {
        let e = read_excel_table(&workbook_path(), &source(Some("Sheet9"))).unwrap_err();
        assert!(matches!(e, GradeError::MissingWorksheet { .. }));
        let e = read_excel_table("/nonexistent/answers.xlsx", &source(None)).unwrap_err();
        assert!(matches!(e, GradeError::OpeningExcel { .. }));
    }
}
