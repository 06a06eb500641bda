//! Workbook loader - spreadsheet bytes → one RawTable per sheet

use crate::error::{ReportError, ReportResult};
use crate::types::{Cell, RawTable};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// All sheets of one workbook, in workbook order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedWorkbook {
    pub sheet_names: Vec<String>,
    pub sheets: HashMap<String, RawTable>,
}

impl LoadedWorkbook {
    pub fn sheet(&self, name: &str) -> Option<&RawTable> {
        self.sheets.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.sheet_names.is_empty()
    }
}

/// Loads xlsx/xlsm/xlsb/xls/ods workbooks with a size cap
pub struct WorkbookLoader {
    max_bytes: u64,
}

impl WorkbookLoader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Read a workbook from disk, rejecting files above the cap before reading them
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> ReportResult<LoadedWorkbook> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.check_size(size)?;
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), size, "workbook read from disk");
        self.load_bytes(bytes)
    }

    /// Parse a workbook held in memory. Nothing is returned unless every sheet loads.
    pub fn load_bytes(&self, bytes: Vec<u8>) -> ReportResult<LoadedWorkbook> {
        self.check_size(bytes.len() as u64)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
            warn!(error = %e, "workbook could not be opened");
            ReportError::Load(e.to_string())
        })?;

        let sheet_names = workbook.sheet_names();
        let mut sheets = HashMap::with_capacity(sheet_names.len());

        for name in &sheet_names {
            let range = workbook.worksheet_range(name).map_err(|e| {
                warn!(sheet = %name, error = %e, "sheet could not be read");
                ReportError::Load(format!("sheet '{}': {}", name, e))
            })?;
            let table = sheet_to_table(name, &range);
            debug!(
                sheet = %name,
                rows = table.height(),
                columns = table.width(),
                "sheet loaded"
            );
            sheets.insert(name.clone(), table);
        }

        info!(sheets = sheet_names.len(), "workbook loaded");
        Ok(LoadedWorkbook {
            sheet_names,
            sheets,
        })
    }

    fn check_size(&self, size: u64) -> ReportResult<()> {
        if size > self.max_bytes {
            warn!(size, limit = self.max_bytes, "workbook rejected: too large");
            return Err(ReportError::UploadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Convert a calamine range to a RawTable (header promotion and empty trimming)
fn sheet_to_table(name: &str, range: &Range<Data>) -> RawTable {
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    RawTable::from_grid(name, grid)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return Cell::Number(dt.as_f64());
            }
            // calamine resolves the serial against the workbook's 1900 or 1904 epoch
            dt.as_datetime()
                .map_or(Cell::Number(dt.as_f64()), |d| Cell::Date(d.date()))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_convert_cell_types() {
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(convert_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(2.5)), Cell::Number(2.5));
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(
            convert_cell(&Data::String("Rent".to_string())),
            Cell::Text("Rent".to_string())
        );
    }

    fn date_cell(serial: f64, is_1904: bool) -> Cell {
        convert_cell(&Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        )))
    }

    #[test]
    fn test_date_serials_1900_system() {
        // 45658 = 2025-01-01
        assert_eq!(date_cell(45658.0, false), Cell::Date(ymd(2025, 1, 1)));
        assert_eq!(date_cell(45658.75, false), Cell::Date(ymd(2025, 1, 1)));
        assert_eq!(date_cell(1.0, false), Cell::Date(ymd(1900, 1, 1)));
    }

    #[test]
    fn test_date_serials_1904_system() {
        // 44196 in the 1904 system = 2025-01-01
        let cell = date_cell(44196.0, true);
        assert_eq!(cell, Cell::Date(ymd(2025, 1, 1)));
        assert_eq!(cell.to_string(), "Jan-25");
    }

    #[test]
    fn test_duration_stays_numeric() {
        let cell = convert_cell(&Data::DateTime(ExcelDateTime::new(
            1.5,
            ExcelDateTimeType::TimeDelta,
            false,
        )));
        assert_eq!(cell, Cell::Number(1.5));
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let loader = WorkbookLoader::new(1024);
        let result = loader.load_bytes(b"definitely not a workbook".to_vec());
        assert!(matches!(result, Err(ReportError::Load(_))));
    }

    #[test]
    fn test_size_cap() {
        let loader = WorkbookLoader::new(4);
        let result = loader.load_bytes(vec![0u8; 5]);
        assert!(matches!(
            result,
            Err(ReportError::UploadTooLarge { size: 5, limit: 4 })
        ));
    }
}
