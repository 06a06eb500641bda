//! Budget VS Actual sheet: three stacked sections (Budget, Forecast, Actual),
//! each holding Revenue / Direct Costs / Gross Profit rows across twelve month
//! columns.

use super::layout::{SheetLayout, BUDGET_SHEET, MONTHS};
use super::{ParseIssue, ParseOutcome};
use crate::types::{Column, RawTable, TidyTable};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

const REVENUE_LABEL: &str = "Revenue";
const DIRECT_COSTS_LABEL: &str = "Direct Costs";
const GROSS_PROFIT_LABEL: &str = "Gross Profit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    Budget,
    Forecast,
    Actual,
}

impl SectionKind {
    /// Marker order doubles as the tie-break when a label holds several markers
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Budget,
        SectionKind::Forecast,
        SectionKind::Actual,
    ];

    pub fn marker(&self) -> &'static str {
        match self {
            SectionKind::Budget => "BUDGET",
            SectionKind::Forecast => "FORECAST",
            SectionKind::Actual => "ACTUAL",
        }
    }

    /// Case-sensitive substring match on a first-column label
    pub fn detect(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| label.contains(kind.marker()))
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Budget => "Budget",
            SectionKind::Forecast => "Forecast",
            SectionKind::Actual => "Actual",
        };
        f.write_str(name)
    }
}

/// Row span of one section; `end` stays `None` until a populated row follows the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub start: usize,
    pub end: Option<usize>,
}

/// One month of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRecord {
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Direct Costs")]
    pub direct_costs: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Type")]
    pub kind: SectionKind,
}

/// Rows of the three figures inside one section
struct LabelRows {
    revenue: Option<usize>,
    direct_costs: Option<usize>,
    gross_profit: Option<usize>,
}

impl LabelRows {
    fn missing(&self) -> Vec<String> {
        [
            (self.revenue, REVENUE_LABEL),
            (self.direct_costs, DIRECT_COSTS_LABEL),
            (self.gross_profit, GROSS_PROFIT_LABEL),
        ]
        .iter()
        .filter(|(row, _)| row.is_none())
        .map(|(_, label)| label.to_string())
        .collect()
    }
}

/// Scan the first column top to bottom and record each section's span.
///
/// A marker row opens a section and implicitly closes the previous one. Every
/// later row with a non-empty first cell extends the open section. A category
/// seen twice keeps its first position but takes the newer span.
pub fn segment_sections(table: &RawTable) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<usize> = None;

    for row in 0..table.height() {
        let label = table.first_cell_text(row);

        if let Some(kind) = SectionKind::detect(&label) {
            let section = Section {
                kind,
                start: row,
                end: None,
            };
            let index = match sections.iter().position(|s| s.kind == kind) {
                Some(i) => {
                    sections[i] = section;
                    i
                }
                None => {
                    sections.push(section);
                    sections.len() - 1
                }
            };
            current = Some(index);
        } else if let Some(index) = current {
            if !table.cell(row, 0).is_empty() {
                sections[index].end = Some(row);
            }
        }
    }

    sections
}

/// First row per label inside `[start, end]`
fn locate_label_rows(table: &RawTable, start: usize, end: usize) -> LabelRows {
    let mut rows = LabelRows {
        revenue: None,
        direct_costs: None,
        gross_profit: None,
    };

    for row in start..=end {
        let label = table.first_cell_text(row);
        if label.contains(REVENUE_LABEL) {
            rows.revenue.get_or_insert(row);
        } else if label.contains(DIRECT_COSTS_LABEL) {
            rows.direct_costs.get_or_insert(row);
        } else if label.contains(GROSS_PROFIT_LABEL) {
            rows.gross_profit.get_or_insert(row);
        }
    }

    rows
}

/// Parse the Budget VS Actual sheet into one record per (section, month)
pub fn parse_budget_vs_actual(table: &RawTable, layout: &SheetLayout) -> ParseOutcome<TidyRecord> {
    let sections = segment_sections(table);
    if sections.is_empty() {
        warn!(sheet = %table.name, "no BUDGET, FORECAST or ACTUAL marker found");
        return ParseOutcome::no_match("no BUDGET, FORECAST or ACTUAL marker in the first column");
    }

    let needed_width = layout.budget_last_month_col() + 1;
    let mut records = Vec::new();
    let mut issues = Vec::new();

    for section in sections {
        let Some(end) = section.end else {
            warn!(section = %section.kind, "section has no rows after its marker");
            issues.push(ParseIssue::SectionEmpty {
                section: section.kind,
            });
            continue;
        };

        let rows = locate_label_rows(table, section.start, end);
        let (Some(revenue), Some(direct_costs), Some(gross_profit)) =
            (rows.revenue, rows.direct_costs, rows.gross_profit)
        else {
            let missing = rows.missing();
            warn!(section = %section.kind, missing = ?missing, "section skipped");
            issues.push(ParseIssue::SectionIncomplete {
                section: section.kind,
                missing,
            });
            continue;
        };

        if table.width() < needed_width {
            warn!(
                section = %section.kind,
                width = table.width(),
                needed = needed_width,
                "section rows too narrow for twelve months"
            );
            issues.push(ParseIssue::SectionTooNarrow {
                section: section.kind,
                needed: needed_width,
                found: table.width(),
            });
            continue;
        }

        debug!(
            section = %section.kind,
            start = section.start,
            end,
            "section parsed"
        );

        for (offset, month) in MONTHS.iter().enumerate() {
            let col = layout.budget_first_month_col + offset;
            records.push(TidyRecord {
                month: month.to_string(),
                revenue: table.cell(revenue, col).amount(),
                direct_costs: table.cell(direct_costs, col).amount(),
                gross_profit: table.cell(gross_profit, col).amount(),
                kind: section.kind,
            });
        }
    }

    ParseOutcome::from_parts(records, issues)
}

/// Tidy table with columns Month, Revenue, Direct Costs, Gross Profit, Type
pub fn records_to_table(records: &[TidyRecord]) -> TidyTable {
    let mut table = TidyTable::new(BUDGET_SHEET);
    table.add_column(Column::text(
        "Month",
        records.iter().map(|r| r.month.clone()).collect(),
    ));
    table.add_column(Column::numbers(
        "Revenue",
        records.iter().map(|r| r.revenue).collect(),
    ));
    table.add_column(Column::numbers(
        "Direct Costs",
        records.iter().map(|r| r.direct_costs).collect(),
    ));
    table.add_column(Column::numbers(
        "Gross Profit",
        records.iter().map(|r| r.gross_profit).collect(),
    ));
    table.add_column(Column::text(
        "Type",
        records.iter().map(|r| r.kind.to_string()).collect(),
    ));
    table
}
