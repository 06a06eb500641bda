//! Positional layout of the monthly group report.
//!
//! The report sheets are parsed by fixed offsets and label markers rather than a
//! declared schema. Those offsets live here, versioned, so a reshuffled report
//! only needs a new layout rather than parser edits.

use serde::{Deserialize, Serialize};

/// Current layout version understood by the parsers
pub const LAYOUT_VERSION: u32 = 1;

/// Calendar months of the Budget VS Actual sheet, in column order
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Sheet names that get specialised processing
pub const BUDGET_SHEET: &str = "Budget VS Actual";
pub const OPEX_SHEET: &str = "OPEX Group Analysis";
pub const CUSTOMER_SHEET: &str = "P&L Per Customer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub version: u32,
    /// Column of January in the Budget/Forecast/Actual rows (zero-based)
    pub budget_first_month_col: usize,
    /// Column of the first month in a customer's revenue/cost rows
    pub customer_first_month_col: usize,
    pub customer_months: Vec<String>,
    /// Substring that marks an OPEX header as a month column
    pub opex_month_marker: String,
    pub opex_account_column: String,
    /// First-column prefixes that are never customer names
    pub customer_excluded_prefixes: Vec<String>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            budget_first_month_col: 2,
            customer_first_month_col: 1,
            customer_months: ["Jan-25", "Feb-25", "Mar-25", "Apr-25", "May-25", "Jun-25", "Jul-25"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            opex_month_marker: "25".to_string(),
            opex_account_column: "Account Name".to_string(),
            customer_excluded_prefixes: vec!["GP margin".to_string(), "Cost of Sales".to_string()],
        }
    }
}

impl SheetLayout {
    /// Last column index read for the twelve budget months
    pub fn budget_last_month_col(&self) -> usize {
        self.budget_first_month_col + MONTHS.len() - 1
    }

    /// Last column index read for the customer month window
    pub fn customer_last_month_col(&self) -> usize {
        self.customer_first_month_col + self.customer_months.len().saturating_sub(1)
    }

    pub fn is_supported(&self) -> bool {
        self.version == LAYOUT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_offsets() {
        let layout = SheetLayout::default();
        assert_eq!(layout.version, LAYOUT_VERSION);
        assert_eq!(layout.budget_first_month_col, 2);
        assert_eq!(layout.budget_last_month_col(), 13);
        assert_eq!(layout.customer_months.len(), 7);
        assert_eq!(layout.customer_months[0], "Jan-25");
        assert_eq!(layout.customer_months[6], "Jul-25");
        assert_eq!(layout.customer_last_month_col(), 7);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let layout: SheetLayout = serde_yaml::from_str("opex_month_marker: \"26\"").unwrap();
        assert_eq!(layout.opex_month_marker, "26");
        assert_eq!(layout.budget_first_month_col, 2);
        assert!(layout.is_supported());
    }

    #[test]
    fn test_unsupported_version() {
        let layout = SheetLayout {
            version: 99,
            ..SheetLayout::default()
        };
        assert!(!layout.is_supported());
    }
}
