//! Workbook import/export
//!
//! - Import: spreadsheet bytes → [`RawTable`](crate::types::RawTable) per sheet
//! - Export: processed [`TidyTable`](crate::types::TidyTable)s → .xlsx

mod exporter;
mod loader;

pub use exporter::ReportExporter;
pub use loader::{LoadedWorkbook, WorkbookLoader};
