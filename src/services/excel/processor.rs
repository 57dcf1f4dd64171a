use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use super::normalizer::normalize_row;
use super::utils::{format_number, header_name};
use crate::error::AppError;
use crate::models::{CellValue, RawRow, SheetResult};

/// A decoded sheet before normalization.
#[derive(Debug)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

pub struct ExcelProcessor;

impl ExcelProcessor {
    /// Decodes every sheet of the workbook and normalizes its rows.
    pub fn process_file(&self, file_data: Bytes) -> Result<Vec<SheetResult>, AppError> {
        let start = std::time::Instant::now();
        let sheets = self.read_workbook(file_data)?;

        let results: Vec<SheetResult> = sheets
            .into_iter()
            .map(|sheet| SheetResult {
                rows: sheet.rows.iter().map(normalize_row).collect(),
                sheet_name: sheet.name,
            })
            .collect();

        tracing::info!(
            "Normalized {} rows across {} sheets in {:?}",
            results.iter().map(|s| s.rows.len()).sum::<usize>(),
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    /// Decodes the workbook into raw rows, in sheet order.
    pub fn read_workbook(&self, file_data: Bytes) -> Result<Vec<RawSheet>, AppError> {
        tracing::info!("Opening workbook ({} bytes)", file_data.len());
        let cursor = Cursor::new(file_data);

        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| AppError::FileProcessingError(format!("Failed to open workbook: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                AppError::FileProcessingError(format!("Failed to read worksheet {}: {}", sheet_name, e))
            })?;

            let rows = self.sheet_rows(&range);
            tracing::debug!("Sheet {} has {} data rows", sheet_name, rows.len());
            sheets.push(RawSheet { name: sheet_name, rows });
        }

        Ok(sheets)
    }

    /// First row is the header; rows with no cells are skipped.
    fn sheet_rows(&self, range: &Range<Data>) -> Vec<RawRow> {
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Vec::new();
        };

        let mut existing_names = HashSet::new();
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| header_name(&header_text(cell), &mut existing_names))
            .collect();

        rows.map(|row| {
            row.iter()
                .zip(&headers)
                .filter_map(|(cell, header)| cell_value(cell).map(|value| (header.clone(), value)))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect()
    }
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Some(CellValue::Text(s)) => s,
        Some(CellValue::Number(n)) => format_number(n),
        Some(CellValue::Bool(b)) => b.to_string().to_uppercase(),
        None => String::new(),
    }
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Excel serial number, matching what an un-styled reader sees
        Data::DateTime(d) => Some(CellValue::Number(d.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        // error cells carry no value
        Data::Error(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Formula, Workbook};

    fn two_sheet_workbook() -> Bytes {
        let mut workbook = Workbook::new();

        let first = workbook.add_worksheet();
        first.set_name("Sheet1").unwrap();
        first.write_string(0, 0, " Release ").unwrap();
        first.write_string(0, 1, "Pass Rate").unwrap();
        first.write_string(0, 2, "Test Case Count").unwrap();
        first.write_string(1, 0, "  v1.2  ").unwrap();
        first.write_number(1, 1, 0.8532).unwrap();
        first.write_string(1, 2, "42").unwrap();
        // row 2 left blank
        first.write_string(3, 0, "v1.3").unwrap();
        first.write_number(3, 1, 97.0).unwrap();
        first.write_number(3, 2, 10.0).unwrap();

        let second = workbook.add_worksheet();
        second.set_name("Sheet2").unwrap();
        second.write_string(0, 0, "Release").unwrap();

        Bytes::from(workbook.save_to_buffer().unwrap())
    }

    #[test]
    fn test_read_workbook_keeps_sheet_order_and_raw_headers() {
        let sheets = ExcelProcessor.read_workbook(two_sheet_workbook()).unwrap();

        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sheet1", "Sheet2"]);

        let first = &sheets[0];
        assert_eq!(first.rows.len(), 2);
        let cells: Vec<(&str, &CellValue)> = first.rows[0].iter().collect();
        assert_eq!(
            cells,
            vec![
                (" Release ", &CellValue::text("  v1.2  ")),
                ("Pass Rate", &CellValue::Number(0.8532)),
                ("Test Case Count", &CellValue::text("42")),
            ]
        );

        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_process_file_normalizes_rows() {
        let results = ExcelProcessor.process_file(two_sheet_workbook()).unwrap();

        assert_eq!(results.len(), 2);
        let rows = &results[0].rows;
        assert_eq!(rows[0].release, "v1.2");
        assert_eq!(rows[0].pass_rate, Some(85.32));
        assert_eq!(rows[0].total_count, 42);
        assert_eq!(rows[1].release, "v1.3");
        assert_eq!(rows[1].pass_rate, Some(97.0));
        assert_eq!(rows[1].total_count, 10);
        assert_eq!(results[1].sheet_name, "Sheet2");
        assert!(results[1].rows.is_empty());
    }

    #[test]
    fn test_duplicate_and_empty_headers_are_named() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Runtime").unwrap();
        sheet.write_string(0, 2, "Runtime").unwrap();
        sheet.write_string(1, 0, "5m").unwrap();
        sheet.write_string(1, 1, "x").unwrap();
        sheet.write_string(1, 2, "7m").unwrap();
        let bytes = Bytes::from(workbook.save_to_buffer().unwrap());

        let sheets = ExcelProcessor.read_workbook(bytes).unwrap();
        let headers: Vec<&str> = sheets[0].rows[0].iter().map(|(k, _)| k).collect();
        assert_eq!(headers, vec!["Runtime", "__EMPTY", "Runtime_1"]);
    }

    #[test]
    fn test_error_cells_are_dropped() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Release").unwrap();
        sheet.write_string(0, 1, "Server URL").unwrap();
        sheet.write_string(0, 2, "Runtime").unwrap();
        sheet.write_formula(1, 0, Formula::new("=NA()").set_result("#N/A")).unwrap();
        sheet.write_formula(1, 1, Formula::new("=1/0").set_result("#DIV/0!")).unwrap();
        sheet.write_string(1, 2, "5m").unwrap();
        // a row of nothing but errors is an empty row
        sheet.write_formula(2, 0, Formula::new("=NA()").set_result("#N/A")).unwrap();
        sheet.write_string(3, 0, "v2").unwrap();
        let bytes = Bytes::from(workbook.save_to_buffer().unwrap());

        let sheets = ExcelProcessor.read_workbook(bytes.clone()).unwrap();
        let rows = &sheets[0].rows;
        assert_eq!(rows.len(), 2);
        let cells: Vec<(&str, &CellValue)> = rows[0].iter().collect();
        assert_eq!(cells, vec![("Runtime", &CellValue::text("5m"))]);

        let results = ExcelProcessor.process_file(bytes).unwrap();
        let record = &results[0].rows[0];
        assert_eq!(record.release, "");
        assert_eq!(record.server_url, "#");
        assert_eq!(record.runtime, "5m");
        assert_eq!(results[0].rows[1].release, "v2");
    }

    #[test]
    fn test_corrupt_bytes_are_rejected() {
        let result = ExcelProcessor.process_file(Bytes::from_static(b"definitely not a workbook"));
        assert!(matches!(result, Err(AppError::FileProcessingError(_))));
    }
}
