//! Report exporter - tidy tables → .xlsx, one worksheet per table

use crate::error::{ReportError, ReportResult};
use crate::types::{ColumnValue, TidyTable};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Excel caps worksheet names at 31 characters
const MAX_SHEET_NAME_LEN: usize = 31;

const NUMBER_FORMAT: &str = "#,##0.00";

pub struct ReportExporter {
    tables: Vec<TidyTable>,
}

impl ReportExporter {
    pub fn new(tables: Vec<TidyTable>) -> Self {
        Self { tables }
    }

    /// Export the tables to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> ReportResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| ReportError::Export(format!("Failed to save Excel file: {}", e)))?;
        debug!(path = %output_path.display(), tables = self.tables.len(), "report exported");
        Ok(())
    }

    /// Export the tables to an in-memory .xlsx
    pub fn to_buffer(&self) -> ReportResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| ReportError::Export(format!("Failed to build Excel file: {}", e)))
    }

    fn build(&self) -> ReportResult<Workbook> {
        let mut workbook = Workbook::new();
        let mut used_names = HashSet::new();

        for table in &self.tables {
            if let Err(message) = table.validate_lengths() {
                return Err(ReportError::Export(format!("table '{}': {}", table.name, message)));
            }
            let sheet_name = unique_sheet_name(&table.name, &mut used_names);
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name)
                .map_err(|e| ReportError::Export(format!("Failed to set worksheet name: {}", e)))?;
            write_table(worksheet, table)?;
        }

        // An .xlsx needs at least one worksheet
        if self.tables.is_empty() {
            workbook.add_worksheet();
        }

        Ok(workbook)
    }
}

fn write_table(worksheet: &mut Worksheet, table: &TidyTable) -> ReportResult<()> {
    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(NUMBER_FORMAT);

    for (col_idx, column) in table.columns.iter().enumerate() {
        let col = col_idx as u16;
        let header = match &column.currency {
            Some(currency) => format!("{} ({})", column.name, currency),
            None => column.name.clone(),
        };
        worksheet
            .write_string_with_format(0, col, &header, &header_format)
            .map_err(export_err)?;
        worksheet
            .set_column_width(col, (header.len().max(12) + 2) as f64)
            .map_err(export_err)?;

        match &column.values {
            ColumnValue::Number(values) => {
                // Blank cells of raw sheets are NaN; leave them empty
                for (row_idx, value) in values.iter().enumerate().filter(|(_, v)| v.is_finite()) {
                    worksheet
                        .write_number_with_format(row_idx as u32 + 1, col, *value, &number_format)
                        .map_err(export_err)?;
                }
            }
            ColumnValue::Text(values) => {
                for (row_idx, value) in values.iter().enumerate() {
                    worksheet
                        .write_string(row_idx as u32 + 1, col, value)
                        .map_err(export_err)?;
                }
            }
        }
    }

    Ok(())
}

fn export_err(e: rust_xlsxwriter::XlsxError) -> ReportError {
    ReportError::Export(e.to_string())
}

/// Strip characters Excel forbids in sheet names, cap the length, and keep names unique
fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME_LEN).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    #[test]
    fn test_unique_sheet_name_sanitizes() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("P&L Per Customer", &mut used), "P&L Per Customer");
        assert_eq!(unique_sheet_name("Q1/Q2 [draft]", &mut used), "Q1Q2 draft");
        assert_eq!(unique_sheet_name("***", &mut used), "Sheet");
    }

    #[test]
    fn test_unique_sheet_name_truncates_and_dedupes() {
        let mut used = HashSet::new();
        let long = "A very long worksheet name that Excel would reject";
        let first = unique_sheet_name(long, &mut used);
        let second = unique_sheet_name(long, &mut used);

        assert_eq!(first.chars().count(), 31);
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with(" (2)"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_to_buffer_produces_zip() {
        let mut table = TidyTable::new("OPEX Group Analysis");
        table.add_column(Column::text("Account Name", vec!["Rent".into()]));
        table.add_column(Column::numbers("Amount", vec![100.0]));

        let bytes = ReportExporter::new(vec![table]).to_buffer().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_empty_export_still_writes_a_sheet() {
        let bytes = ReportExporter::new(Vec::new()).to_buffer().unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_ragged_table_rejected() {
        let mut table = TidyTable::new("Broken");
        table.add_column(Column::numbers("a", vec![1.0, 2.0]));
        table.add_column(Column::numbers("b", vec![1.0]));

        let result = ReportExporter::new(vec![table]).to_buffer();
        assert!(matches!(result, Err(ReportError::Export(_))));
    }
}
