//! P&L Per Customer sheet: a customer name row followed by its revenue row and
//! its cost-of-sales row, month values read positionally.

use super::layout::{SheetLayout, CUSTOMER_SHEET};
use super::{ParseIssue, ParseOutcome};
use crate::types::{Cell, Column, RawTable, TidyTable};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Cost of Sales")]
    pub cost_of_sales: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
}

impl CustomerRecord {
    pub fn new(
        customer: impl Into<String>,
        month: impl Into<String>,
        revenue: f64,
        cost_of_sales: f64,
    ) -> Self {
        Self {
            customer: customer.into(),
            month: month.into(),
            revenue,
            cost_of_sales,
            gross_profit: revenue - cost_of_sales,
        }
    }

    /// Gross profit as a percentage of revenue; `None` when there is no revenue
    pub fn gp_margin_pct(&self) -> Option<f64> {
        if self.revenue == 0.0 {
            None
        } else {
            Some(self.gross_profit / self.revenue * 100.0)
        }
    }
}

/// A text first cell that is not one of the excluded label prefixes.
///
/// Label rows such as "Revenue" also pass; their blocks come out degenerate
/// rather than being filtered here.
fn customer_marker<'a>(cell: &'a Cell, layout: &SheetLayout) -> Option<&'a str> {
    let name = cell.as_text()?;
    if layout
        .customer_excluded_prefixes
        .iter()
        .any(|prefix| name.starts_with(prefix.as_str()))
    {
        return None;
    }
    Some(name)
}

/// Parse the P&L Per Customer sheet.
///
/// For a marker at row `i`, row `i + 1` is taken as revenue and `i + 2` as cost
/// of sales without checking their labels.
pub fn parse_pl_per_customer(
    table: &RawTable,
    layout: &SheetLayout,
) -> ParseOutcome<CustomerRecord> {
    let needed_width = layout.customer_last_month_col() + 1;
    let mut records = Vec::new();
    let mut issues = Vec::new();
    let mut customers = 0usize;

    for row in 0..table.height() {
        let Some(customer) = customer_marker(table.cell(row, 0), layout) else {
            continue;
        };
        customers += 1;

        if row + 2 >= table.height() {
            warn!(customer, row, "customer block runs past the end of the sheet");
            issues.push(ParseIssue::CustomerSkipped {
                customer: customer.to_string(),
                row,
                reason: "revenue and cost rows missing".to_string(),
            });
            continue;
        }

        if table.width() < needed_width {
            warn!(
                customer,
                row,
                width = table.width(),
                needed = needed_width,
                "revenue row too narrow"
            );
            issues.push(ParseIssue::CustomerSkipped {
                customer: customer.to_string(),
                row,
                reason: format!(
                    "revenue row has {} columns, {} needed",
                    table.width(),
                    needed_width
                ),
            });
            continue;
        }

        let (revenue_row, cost_row) = (row + 1, row + 2);
        for (offset, month) in layout.customer_months.iter().enumerate() {
            let col = layout.customer_first_month_col + offset;
            records.push(CustomerRecord::new(
                customer,
                month.as_str(),
                table.cell(revenue_row, col).amount(),
                table.cell(cost_row, col).amount(),
            ));
        }
    }

    if customers == 0 {
        warn!(sheet = %table.name, "no customer rows found");
        return ParseOutcome::no_match("no customer name rows in the first column");
    }

    debug!(sheet = %table.name, customers, records = records.len(), "customer sheet parsed");
    ParseOutcome::from_parts(records, issues)
}

/// Tidy table with columns Customer, Month, Revenue, Cost of Sales, Gross Profit
pub fn records_to_table(records: &[CustomerRecord]) -> TidyTable {
    let mut table = TidyTable::new(CUSTOMER_SHEET);
    table.add_column(Column::text(
        "Customer",
        records.iter().map(|r| r.customer.clone()).collect(),
    ));
    table.add_column(Column::text(
        "Month",
        records.iter().map(|r| r.month.clone()).collect(),
    ));
    table.add_column(Column::numbers(
        "Revenue",
        records.iter().map(|r| r.revenue).collect(),
    ));
    table.add_column(Column::numbers(
        "Cost of Sales",
        records.iter().map(|r| r.cost_of_sales).collect(),
    ));
    table.add_column(Column::numbers(
        "Gross Profit",
        records.iter().map(|r| r.gross_profit).collect(),
    ));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn values(first: Cell, nums: &[f64]) -> Vec<Cell> {
        std::iter::once(first)
            .chain(nums.iter().map(|n| Cell::Number(*n)))
            .collect()
    }

    fn sheet(rows: Vec<Vec<Cell>>) -> RawTable {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..width).map(|i| format!("c{}", i)).collect();
        RawTable::new(CUSTOMER_SHEET, columns, rows)
    }

    fn acme_sheet() -> RawTable {
        sheet(vec![
            values(Cell::Empty, &[0.0; 7]),
            values(Cell::Empty, &[0.0; 7]),
            values(Cell::Empty, &[0.0; 7]),
            vec![text("Acme")],
            values(Cell::Empty, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]),
            values(Cell::Empty, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
            values(text("GP margin %"), &[90.0; 7]),
        ])
    }

    #[test]
    fn test_customer_block_extraction() {
        let outcome = parse_pl_per_customer(&acme_sheet(), &SheetLayout::default());

        assert!(outcome.is_complete());
        let records = outcome.records();
        assert_eq!(records.len(), 7);
        assert_eq!(
            records[0],
            CustomerRecord {
                customer: "Acme".to_string(),
                month: "Jan-25".to_string(),
                revenue: 10.0,
                cost_of_sales: 1.0,
                gross_profit: 9.0,
            }
        );
        assert_eq!(records[6].month, "Jul-25");
        assert_eq!(records[6].gross_profit, 63.0);
    }

    #[test]
    fn test_gross_profit_is_recomputed() {
        // A "Gross Profit" figure in the sheet is never read
        let table = sheet(vec![
            vec![text("Beta")],
            values(Cell::Empty, &[100.0; 7]),
            values(text("Cost of Sales"), &[30.0; 7]),
            values(text("GP margin"), &[999.0; 7]),
        ]);

        let records = parse_pl_per_customer(&table, &SheetLayout::default()).into_records();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.gross_profit == 70.0));
    }

    #[test]
    fn test_excluded_prefixes_are_not_customers() {
        let table = sheet(vec![
            values(text("Cost of Sales"), &[1.0; 7]),
            values(text("GP margin"), &[1.0; 7]),
        ]);

        assert!(parse_pl_per_customer(&table, &SheetLayout::default()).is_no_match());
    }

    #[test]
    fn test_block_past_end_is_skipped() {
        let table = sheet(vec![
            vec![text("Acme")],
            values(Cell::Empty, &[10.0; 7]),
            values(Cell::Empty, &[1.0; 7]),
            vec![text("Late Corp")],
            values(Cell::Empty, &[5.0; 7]),
        ]);

        let outcome = parse_pl_per_customer(&table, &SheetLayout::default());
        assert_eq!(outcome.records().len(), 7);
        assert_eq!(
            outcome.issues(),
            &[ParseIssue::CustomerSkipped {
                customer: "Late Corp".to_string(),
                row: 3,
                reason: "revenue and cost rows missing".to_string(),
            }]
        );
    }

    #[test]
    fn test_narrow_sheet_skips_customer() {
        let table = sheet(vec![
            vec![text("Acme")],
            values(Cell::Empty, &[10.0, 20.0, 30.0]),
            values(Cell::Empty, &[1.0, 2.0, 3.0]),
        ]);

        let outcome = parse_pl_per_customer(&table, &SheetLayout::default());
        assert!(outcome.records().is_empty());
        assert_eq!(outcome.issues().len(), 1);
    }

    #[test]
    fn test_gp_margin_pct() {
        let record = CustomerRecord::new("Acme", "Jan-25", 200.0, 50.0);
        assert_eq!(record.gp_margin_pct(), Some(75.0));

        let zero = CustomerRecord::new("Acme", "Feb-25", 0.0, 10.0);
        assert_eq!(zero.gp_margin_pct(), None);
        assert_eq!(zero.gross_profit, -10.0);
    }

    #[test]
    fn test_parse_is_deterministic_and_leaves_input_untouched() {
        let input = acme_sheet();
        let before = input.clone();

        let first = parse_pl_per_customer(&input, &SheetLayout::default());
        let second = parse_pl_per_customer(&input, &SheetLayout::default());

        assert_eq!(first, second);
        assert_eq!(first.records().len(), 7);
        assert_eq!(input, before);
    }

    #[test]
    fn test_records_to_table() {
        let records = parse_pl_per_customer(&acme_sheet(), &SheetLayout::default()).into_records();
        let table = records_to_table(&records);

        assert_eq!(
            table.column_names(),
            vec!["Customer", "Month", "Revenue", "Cost of Sales", "Gross Profit"]
        );
        assert_eq!(table.row_count(), 7);
    }
}
