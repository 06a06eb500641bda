//! Aggregations over parsed report records
//!
//! These are the summaries shown next to each processed sheet: the Budget /
//! Forecast / Actual comparison pivot, OPEX monthly totals and top accounts,
//! and per-customer margins for a month.

use crate::parser::{CustomerRecord, OpexRecord, SectionKind, TidyRecord, MONTHS};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Revenue and gross profit of each section for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub month: String,
    pub revenue: HashMap<SectionKind, f64>,
    pub gross_profit: HashMap<SectionKind, f64>,
}

impl ComparisonRow {
    pub fn revenue_of(&self, kind: SectionKind) -> Option<f64> {
        self.revenue.get(&kind).copied()
    }

    pub fn gross_profit_of(&self, kind: SectionKind) -> Option<f64> {
        self.gross_profit.get(&kind).copied()
    }
}

/// Pivot Budget/Forecast/Actual records by month.
///
/// Months follow calendar order; a (month, section) pair seen more than once is
/// averaged. Months with no records are left out.
pub fn budget_comparison(records: &[TidyRecord]) -> Vec<ComparisonRow> {
    // (month, kind) -> (revenue sum, gross profit sum, count)
    let mut sums: HashMap<(&str, SectionKind), (f64, f64, usize)> = HashMap::new();
    for record in records {
        let entry = sums
            .entry((record.month.as_str(), record.kind))
            .or_insert((0.0, 0.0, 0));
        entry.0 += record.revenue;
        entry.1 += record.gross_profit;
        entry.2 += 1;
    }

    MONTHS
        .iter()
        .filter_map(|month| {
            let mut row = ComparisonRow {
                month: month.to_string(),
                revenue: HashMap::new(),
                gross_profit: HashMap::new(),
            };
            for kind in SectionKind::ALL {
                if let Some((revenue, profit, count)) = sums.get(&(*month, kind)) {
                    row.revenue.insert(kind, revenue / *count as f64);
                    row.gross_profit.insert(kind, profit / *count as f64);
                }
            }
            (!row.revenue.is_empty()).then_some(row)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub month: String,
    pub amount: f64,
}

fn month_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?i)(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[-\s/]?(\d{2}|\d{4})$",
        )
        .expect("month label pattern is valid")
    })
}

/// Parse labels like "Jan-25", "Sept 2025" or "dec/24" to the first day of that month
pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
    let caps = month_label_pattern().captures(label.trim())?;
    let month = MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(&caps[1]))? as u32
        + 1;
    let year_text = &caps[2];
    let year: i32 = year_text.parse().ok()?;
    let year = if year_text.len() == 2 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Sum OPEX amounts per month.
///
/// Output is chronological when every label parses as a month, otherwise in
/// order of first appearance.
pub fn opex_monthly_totals(records: &[OpexRecord]) -> Vec<MonthlyTotal> {
    let mut totals: Vec<MonthlyTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.month.as_str()) {
            Some(&i) => totals[i].amount += record.amount,
            None => {
                index.insert(record.month.as_str(), totals.len());
                totals.push(MonthlyTotal {
                    month: record.month.clone(),
                    amount: record.amount,
                });
            }
        }
    }

    let dates: Option<Vec<NaiveDate>> = totals
        .iter()
        .map(|t| parse_month_label(&t.month))
        .collect();
    if let Some(dates) = dates {
        let mut keyed: Vec<(NaiveDate, MonthlyTotal)> = dates.into_iter().zip(totals).collect();
        keyed.sort_by_key(|(date, _)| *date);
        return keyed.into_iter().map(|(_, total)| total).collect();
    }

    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTotal {
    pub account_name: String,
    pub amount: f64,
}

/// The `n` accounts with the largest summed amount, largest first
pub fn top_accounts(records: &[OpexRecord], n: usize) -> Vec<AccountTotal> {
    let mut totals: Vec<AccountTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.account_name.as_str()) {
            Some(&i) => totals[i].amount += record.amount,
            None => {
                index.insert(record.account_name.as_str(), totals.len());
                totals.push(AccountTotal {
                    account_name: record.account_name.clone(),
                    amount: record.amount,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal totals
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    totals.truncate(n);
    totals
}

/// Distinct months of the customer records, in order of first appearance
pub fn customer_months(records: &[CustomerRecord]) -> Vec<String> {
    let mut months: Vec<String> = Vec::new();
    for record in records {
        if !months.contains(&record.month) {
            months.push(record.month.clone());
        }
    }
    months
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerMargin {
    pub customer: String,
    pub revenue: f64,
    pub cost_of_sales: f64,
    pub gross_profit: f64,
    /// `None` when the customer had no revenue that month
    pub gp_margin_pct: Option<f64>,
}

/// Customer rows for one month, most profitable first
pub fn customer_margins(records: &[CustomerRecord], month: &str) -> Vec<CustomerMargin> {
    let mut rows: Vec<CustomerMargin> = records
        .iter()
        .filter(|r| r.month == month)
        .map(|r| CustomerMargin {
            customer: r.customer.clone(),
            revenue: r.revenue,
            cost_of_sales: r.cost_of_sales,
            gross_profit: r.gross_profit,
            gp_margin_pct: r.gp_margin_pct(),
        })
        .collect();
    rows.sort_by(|a, b| b.gross_profit.total_cmp(&a.gross_profit));
    rows
}
