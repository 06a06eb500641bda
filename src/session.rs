//! Session state: the loaded workbook and the exchange-rate table.
//!
//! A [`Session`] is created at start-up, passed by reference to every handler,
//! and closed at the end. Loading a new workbook replaces the previous one only
//! when the load succeeds.

use crate::config::ReportConfig;
use crate::currency::{ConversionOutcome, ExchangeRateTable};
use crate::error::{ReportError, ReportResult};
use crate::parser::{
    self, budget, customer, opex, CustomerRecord, OpexRecord, ParseIssue, ParseOutcome,
    SheetKind, SheetLayout, TidyRecord,
};
use crate::types::{RawTable, TidyTable};
use crate::workbook::{LoadedWorkbook, WorkbookLoader};
use std::path::Path;
use tracing::{info, warn};

/// What a sheet turns into once its name has picked a parser
#[derive(Debug, Clone, PartialEq)]
pub enum SheetView<'a> {
    BudgetVsActual(ParseOutcome<TidyRecord>),
    Opex(ParseOutcome<OpexRecord>),
    CustomerPnl(ParseOutcome<CustomerRecord>),
    /// Sheets without a reshaper are shown as loaded
    Raw { kind: SheetKind, table: &'a RawTable },
}

impl SheetView<'_> {
    pub fn kind(&self) -> SheetKind {
        match self {
            SheetView::BudgetVsActual(_) => SheetKind::BudgetVsActual,
            SheetView::Opex(_) => SheetKind::OpexAnalysis,
            SheetView::CustomerPnl(_) => SheetKind::PlPerCustomer,
            SheetView::Raw { kind, .. } => *kind,
        }
    }

    /// Tidy table of the parsed records; `None` for raw sheets
    pub fn to_table(&self) -> Option<TidyTable> {
        match self {
            SheetView::BudgetVsActual(outcome) => Some(budget::records_to_table(outcome.records())),
            SheetView::Opex(outcome) => Some(opex::records_to_table(outcome.records())),
            SheetView::CustomerPnl(outcome) => Some(customer::records_to_table(outcome.records())),
            SheetView::Raw { .. } => None,
        }
    }

    pub fn issues(&self) -> &[ParseIssue] {
        match self {
            SheetView::BudgetVsActual(outcome) => outcome.issues(),
            SheetView::Opex(outcome) => outcome.issues(),
            SheetView::CustomerPnl(outcome) => outcome.issues(),
            SheetView::Raw { .. } => &[],
        }
    }

    /// Reason the parser found nothing, if it found nothing
    pub fn no_match_reason(&self) -> Option<&str> {
        match self {
            SheetView::BudgetVsActual(ParseOutcome::NoMatch { reason })
            | SheetView::Opex(ParseOutcome::NoMatch { reason })
            | SheetView::CustomerPnl(ParseOutcome::NoMatch { reason }) => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Dispatch a raw table to the parser its sheet name selects
pub fn process_sheet<'a>(table: &'a RawTable, layout: &SheetLayout) -> SheetView<'a> {
    match SheetKind::from_name(&table.name) {
        SheetKind::BudgetVsActual => {
            SheetView::BudgetVsActual(parser::parse_budget_vs_actual(table, layout))
        }
        SheetKind::OpexAnalysis => SheetView::Opex(parser::parse_opex_analysis(table, layout)),
        SheetKind::PlPerCustomer => {
            SheetView::CustomerPnl(parser::parse_pl_per_customer(table, layout))
        }
        kind => SheetView::Raw { kind, table },
    }
}

#[derive(Debug)]
pub struct Session {
    config: ReportConfig,
    rates: ExchangeRateTable,
    workbook: LoadedWorkbook,
}

impl Session {
    /// Start a session: validate the config and seed the exchange rates
    pub fn new(config: ReportConfig) -> ReportResult<Self> {
        config.validate()?;
        let rates = config.exchange_rates()?;
        Ok(Self {
            config,
            rates,
            workbook: LoadedWorkbook::default(),
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn loader(&self) -> WorkbookLoader {
        WorkbookLoader::new(self.config.max_upload_bytes)
    }

    /// Load a workbook file, replacing the current one on success
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> ReportResult<&[String]> {
        let loaded = self.loader().load_path(path.as_ref());
        self.replace_workbook(loaded)
    }

    /// Load workbook bytes, replacing the current one on success
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> ReportResult<&[String]> {
        let loaded = self.loader().load_bytes(bytes);
        self.replace_workbook(loaded)
    }

    fn replace_workbook(
        &mut self,
        loaded: ReportResult<LoadedWorkbook>,
    ) -> ReportResult<&[String]> {
        match loaded {
            Ok(workbook) => {
                info!(sheets = workbook.sheet_names.len(), "session workbook replaced");
                self.workbook = workbook;
                Ok(&self.workbook.sheet_names)
            }
            Err(e) => {
                warn!(error = %e, "load failed, keeping previous workbook");
                Err(e)
            }
        }
    }

    pub fn has_workbook(&self) -> bool {
        !self.workbook.is_empty()
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.workbook.sheet_names
    }

    pub fn raw(&self, sheet: &str) -> ReportResult<&RawTable> {
        self.workbook
            .sheet(sheet)
            .ok_or_else(|| ReportError::SheetNotFound(sheet.to_string()))
    }

    /// Parse one sheet according to its name
    pub fn view(&self, sheet: &str) -> ReportResult<SheetView<'_>> {
        let table = self.raw(sheet)?;
        Ok(process_sheet(table, &self.config.layout))
    }

    /// The sheet as a tidy table: parsed records for processed sheets, the raw
    /// grid otherwise
    pub fn tidy_table(&self, sheet: &str) -> ReportResult<TidyTable> {
        let table = self.raw(sheet)?;
        Ok(process_sheet(table, &self.config.layout)
            .to_table()
            .unwrap_or_else(|| TidyTable::from(table)))
    }

    /// Tidy tables of every processed sheet, in workbook order
    pub fn processed_tables(&self) -> Vec<TidyTable> {
        self.workbook
            .sheet_names
            .iter()
            .filter_map(|name| self.workbook.sheet(name))
            .filter_map(|table| process_sheet(table, &self.config.layout).to_table())
            .collect()
    }

    pub fn rates(&self) -> &ExchangeRateTable {
        &self.rates
    }

    pub fn update_rate(&mut self, currency: &str, rate: f64) -> ReportResult<()> {
        self.rates.set_rate(currency, rate)
    }

    /// Convert `column` of `table` from `from` to USD with the session's rates
    pub fn convert(
        &self,
        table: &mut TidyTable,
        column: &str,
        from: &str,
    ) -> ReportResult<ConversionOutcome> {
        self.rates.convert_column(table, column, from)
    }

    /// End the session: drop the workbook and restore the configured rates
    pub fn close(&mut self) -> ReportResult<()> {
        self.workbook = LoadedWorkbook::default();
        self.rates = self.config.exchange_rates()?;
        info!("session closed");
        Ok(())
    }
}
