//! finreport - monthly group financial report parser
//!
//! Loads a multi-sheet report workbook and reshapes its known sheets into tidy
//! tables ready for charting:
//!
//! - `Budget VS Actual`: Budget / Forecast / Actual sections → one record per
//!   month and section
//! - `OPEX Group Analysis`: wide month columns → one record per account and month
//! - `P&L Per Customer`: per-customer blocks → one record per customer and month
//!
//! Numeric columns can be converted to USD with a configurable rate table, and
//! processed sheets can be exported back to .xlsx.
//!
//! # Example
//!
//! ```no_run
//! use finreport::config::ReportConfig;
//! use finreport::session::{Session, SheetView};
//!
//! let mut session = Session::new(ReportConfig::default())?;
//! session.load_path("report.xlsx")?;
//!
//! if let SheetView::BudgetVsActual(outcome) = session.view("Budget VS Actual")? {
//!     println!("Records: {}", outcome.records().len());
//! }
//!
//! let mut table = session.tidy_table("OPEX Group Analysis")?;
//! session.convert(&mut table, "Amount", "EUR")?;
//! # Ok::<(), finreport::error::ReportError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod currency;
pub mod error;
pub mod parser;
pub mod session;
pub mod types;
pub mod workbook;

// Re-export commonly used types
pub use config::ReportConfig;
pub use currency::{ConversionOutcome, ExchangeRateTable};
pub use error::{ReportError, ReportResult};
pub use parser::{ParseIssue, ParseOutcome, SheetKind};
pub use session::{Session, SheetView};
pub use types::{Cell, Column, ColumnValue, RawTable, TidyTable};
