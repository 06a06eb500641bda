//! Sheet parsers for the monthly group report
//!
//! Each parser takes a [`RawTable`](crate::types::RawTable) and returns a tagged
//! [`ParseOutcome`] instead of silently producing an empty table:
//! - `budget`: Budget / Forecast / Actual sections → [`TidyRecord`]
//! - `opex`: wide month columns → [`OpexRecord`]
//! - `customer`: per-customer blocks → [`CustomerRecord`]

pub mod budget;
pub mod customer;
pub mod layout;
pub mod opex;

pub use budget::{parse_budget_vs_actual, SectionKind, TidyRecord};
pub use customer::{parse_pl_per_customer, CustomerRecord};
pub use layout::{SheetLayout, LAYOUT_VERSION, MONTHS};
pub use opex::{parse_opex_analysis, OpexRecord};

use serde::Serialize;
use std::fmt;

/// Result of running a parser over one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome<T> {
    /// Every detected block parsed
    Complete { records: Vec<T> },
    /// Some blocks were skipped; `records` holds what did parse
    Incomplete {
        records: Vec<T>,
        issues: Vec<ParseIssue>,
    },
    /// The sheet has none of the structure the parser looks for
    NoMatch { reason: String },
}

impl<T> ParseOutcome<T> {
    pub fn from_parts(records: Vec<T>, issues: Vec<ParseIssue>) -> Self {
        if issues.is_empty() {
            ParseOutcome::Complete { records }
        } else {
            ParseOutcome::Incomplete { records, issues }
        }
    }

    pub fn no_match(reason: impl Into<String>) -> Self {
        ParseOutcome::NoMatch {
            reason: reason.into(),
        }
    }

    pub fn records(&self) -> &[T] {
        match self {
            ParseOutcome::Complete { records } | ParseOutcome::Incomplete { records, .. } => {
                records
            }
            ParseOutcome::NoMatch { .. } => &[],
        }
    }

    pub fn into_records(self) -> Vec<T> {
        match self {
            ParseOutcome::Complete { records } | ParseOutcome::Incomplete { records, .. } => {
                records
            }
            ParseOutcome::NoMatch { .. } => Vec::new(),
        }
    }

    pub fn issues(&self) -> &[ParseIssue] {
        match self {
            ParseOutcome::Incomplete { issues, .. } => issues,
            _ => &[],
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ParseOutcome::Complete { .. })
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, ParseOutcome::NoMatch { .. })
    }
}

/// A block that was detected but could not be turned into records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    /// A Budget/Forecast/Actual section lacks one of its label rows
    SectionIncomplete {
        section: SectionKind,
        missing: Vec<String>,
    },
    /// A section marker with no populated rows after it
    SectionEmpty { section: SectionKind },
    /// The sheet has fewer columns than the section's month range needs
    SectionTooNarrow {
        section: SectionKind,
        needed: usize,
        found: usize,
    },
    CustomerSkipped {
        customer: String,
        row: usize,
        reason: String,
    },
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::SectionIncomplete { section, missing } => write!(
                f,
                "{} section skipped: missing {} row(s)",
                section,
                missing.join(", ")
            ),
            ParseIssue::SectionEmpty { section } => {
                write!(f, "{} section skipped: no rows after marker", section)
            }
            ParseIssue::SectionTooNarrow {
                section,
                needed,
                found,
            } => write!(
                f,
                "{} section skipped: sheet has {} columns, {} needed",
                section, found, needed
            ),
            ParseIssue::CustomerSkipped {
                customer,
                row,
                reason,
            } => write!(f, "customer '{}' at row {} skipped: {}", customer, row, reason),
        }
    }
}

/// How a sheet is processed, decided by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    BudgetVsActual,
    OpexAnalysis,
    PlPerCustomer,
    /// Known report sheets without a dedicated parser
    BalanceSheet,
    SalesAccruals,
    AccountsReceivable,
    Other,
}

impl SheetKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            layout::BUDGET_SHEET => SheetKind::BudgetVsActual,
            layout::OPEX_SHEET => SheetKind::OpexAnalysis,
            layout::CUSTOMER_SHEET => SheetKind::PlPerCustomer,
            "Balance Sheet" => SheetKind::BalanceSheet,
            "Sales Accruals" => SheetKind::SalesAccruals,
            "Accounts Receivable" => SheetKind::AccountsReceivable,
            _ => SheetKind::Other,
        }
    }

    /// Whether a reshaper exists for this kind
    pub fn is_processed(&self) -> bool {
        matches!(
            self,
            SheetKind::BudgetVsActual | SheetKind::OpexAnalysis | SheetKind::PlPerCustomer
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SheetKind::BudgetVsActual => "Budget vs Forecast vs Actual",
            SheetKind::OpexAnalysis => "OPEX analysis",
            SheetKind::PlPerCustomer => "Profitability per customer",
            SheetKind::BalanceSheet => "Balance sheet",
            SheetKind::SalesAccruals => "Sales accruals",
            SheetKind::AccountsReceivable => "Accounts receivable",
            SheetKind::Other => "Raw table",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_parts() {
        let complete: ParseOutcome<u8> = ParseOutcome::from_parts(vec![1, 2], Vec::new());
        assert!(complete.is_complete());
        assert_eq!(complete.records(), &[1, 2]);

        let issue = ParseIssue::SectionEmpty {
            section: SectionKind::Actual,
        };
        let partial: ParseOutcome<u8> = ParseOutcome::from_parts(vec![1], vec![issue.clone()]);
        assert!(!partial.is_complete());
        assert_eq!(partial.issues(), &[issue]);
        assert_eq!(partial.into_records(), vec![1]);
    }

    #[test]
    fn test_no_match_has_no_records() {
        let outcome: ParseOutcome<u8> = ParseOutcome::no_match("nothing here");
        assert!(outcome.is_no_match());
        assert!(outcome.records().is_empty());
        assert!(outcome.issues().is_empty());
    }

    #[test]
    fn test_issue_display() {
        let issue = ParseIssue::SectionIncomplete {
            section: SectionKind::Forecast,
            missing: vec!["Gross Profit".to_string()],
        };
        assert_eq!(
            issue.to_string(),
            "Forecast section skipped: missing Gross Profit row(s)"
        );
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome: ParseOutcome<u8> = ParseOutcome::no_match("no months");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"no_match\""));
        assert!(json.contains("\"reason\":\"no months\""));
    }

    #[test]
    fn test_sheet_kind_from_name() {
        assert_eq!(
            SheetKind::from_name("Budget VS Actual"),
            SheetKind::BudgetVsActual
        );
        assert_eq!(
            SheetKind::from_name("OPEX Group Analysis"),
            SheetKind::OpexAnalysis
        );
        assert_eq!(
            SheetKind::from_name("P&L Per Customer"),
            SheetKind::PlPerCustomer
        );
        assert_eq!(SheetKind::from_name("Balance Sheet"), SheetKind::BalanceSheet);
        assert_eq!(SheetKind::from_name("budget vs actual"), SheetKind::Other);
        assert!(!SheetKind::BalanceSheet.is_processed());
        assert!(SheetKind::OpexAnalysis.is_processed());
    }
}
