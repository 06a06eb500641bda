//! OPEX Group Analysis sheet: one row per account, one column per month.
//! Reshaped wide-to-long into one record per (account, month).

use super::layout::{SheetLayout, OPEX_SHEET};
use super::ParseOutcome;
use crate::types::{Column, RawTable, TidyTable};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpexRecord {
    #[serde(rename = "Account Name")]
    pub account_name: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
}

/// Melt the OPEX sheet.
///
/// Body row 0 holds the real header and is promoted; the sheet's own header row
/// is ignored. Month columns are those whose label contains the layout's month
/// marker. Records without an account or with a non-numeric amount are dropped.
pub fn parse_opex_analysis(table: &RawTable, layout: &SheetLayout) -> ParseOutcome<OpexRecord> {
    let Some(header) = table.row(0) else {
        warn!(sheet = %table.name, "OPEX sheet has no rows");
        return ParseOutcome::no_match("sheet has no header row to promote");
    };
    let labels: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();

    let Some(account_col) = labels.iter().position(|l| *l == layout.opex_account_column) else {
        warn!(
            sheet = %table.name,
            column = %layout.opex_account_column,
            "account column not found in promoted header"
        );
        return ParseOutcome::no_match(format!(
            "no '{}' column in header",
            layout.opex_account_column
        ));
    };

    let month_cols: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| label.contains(layout.opex_month_marker.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    if month_cols.is_empty() {
        warn!(
            sheet = %table.name,
            marker = %layout.opex_month_marker,
            "no month columns matched"
        );
        return ParseOutcome::no_match(format!(
            "no column label contains '{}'",
            layout.opex_month_marker
        ));
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for &col in &month_cols {
        for row in 1..table.height() {
            let account = table.cell(row, account_col);
            let amount = table.cell(row, col).as_strict_number();
            match (account.is_empty(), amount) {
                (false, Some(amount)) => records.push(OpexRecord {
                    account_name: account.to_string(),
                    month: labels[col].clone(),
                    amount,
                }),
                _ => dropped += 1,
            }
        }
    }

    debug!(
        sheet = %table.name,
        months = month_cols.len(),
        records = records.len(),
        dropped,
        "OPEX sheet melted"
    );

    ParseOutcome::from_parts(records, Vec::new())
}

/// Tidy table with columns Account Name, Month, Amount
pub fn records_to_table(records: &[OpexRecord]) -> TidyTable {
    let mut table = TidyTable::new(OPEX_SHEET);
    table.add_column(Column::text(
        "Account Name",
        records.iter().map(|r| r.account_name.clone()).collect(),
    ));
    table.add_column(Column::text(
        "Month",
        records.iter().map(|r| r.month.clone()).collect(),
    ));
    table.add_column(Column::numbers(
        "Amount",
        records.iter().map(|r| r.amount).collect(),
    ));
    table
}
