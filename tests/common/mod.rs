//! Report workbook fixtures built in memory with rust_xlsxwriter

#![allow(dead_code)]

use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::{Path, PathBuf};

pub enum Fx {
    T(&'static str),
    N(f64),
    Blank,
}

pub fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Fx>]) {
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Fx::T(s) => {
                    worksheet.write_string(r as u32, c as u16, *s).unwrap();
                }
                Fx::N(n) => {
                    worksheet.write_number(r as u32, c as u16, *n).unwrap();
                }
                Fx::Blank => {}
            }
        }
    }
}

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label, unit, then `base * month` for months 1..=12
fn figure_row(label: &'static str, base: f64) -> Vec<Fx> {
    let mut row = vec![Fx::T(label), Fx::T("USD")];
    row.extend((1..=12).map(|m| Fx::N(base * m as f64)));
    row
}

/// Budget 1000/400/600, Forecast 1100/450/650, Actual 1200/500/700 per month index
pub fn budget_rows(with_forecast_gross_profit: bool) -> Vec<Vec<Fx>> {
    let mut header = vec![Fx::T("Group P&L"), Fx::T("Unit")];
    header.extend(MONTH_LABELS.into_iter().map(Fx::T));

    let mut rows = vec![header];
    rows.push(vec![Fx::T("BUDGET 2025")]);
    rows.push(figure_row("Revenue", 1000.0));
    rows.push(figure_row("Direct Costs", 400.0));
    rows.push(figure_row("Gross Profit", 600.0));
    rows.push(vec![]);
    rows.push(vec![Fx::T("FORECAST 2025")]);
    rows.push(figure_row("Revenue", 1100.0));
    rows.push(figure_row("Direct Costs", 450.0));
    if with_forecast_gross_profit {
        rows.push(figure_row("Gross Profit", 650.0));
    }
    rows.push(vec![]);
    rows.push(vec![Fx::T("ACTUAL 2025")]);
    rows.push(figure_row("Revenue", 1200.0));
    rows.push(figure_row("Direct Costs", 500.0));
    rows.push(figure_row("Gross Profit", 700.0));
    rows
}

pub fn opex_rows() -> Vec<Vec<Fx>> {
    vec![
        vec![Fx::T("OPEX Group Analysis")],
        vec![
            Fx::T("Account Name"),
            Fx::T("Jan-25"),
            Fx::T("Feb-25"),
            Fx::T("Mar-25"),
            Fx::T("Total"),
        ],
        vec![Fx::T("Rent"), Fx::N(100.0), Fx::N(100.0), Fx::N(120.0), Fx::N(320.0)],
        vec![Fx::T("Travel"), Fx::N(50.0), Fx::T("n/a"), Fx::N(30.0), Fx::N(80.0)],
        vec![Fx::T("Software"), Fx::N(20.0), Fx::N(20.0), Fx::N(20.0), Fx::N(60.0)],
    ]
}

/// Acme revenue 100..700 / cost 40..280; Beta revenue 50 flat / cost 45 flat
pub fn customer_rows() -> Vec<Vec<Fx>> {
    let mut header = vec![Fx::T("Customer")];
    header.extend(
        ["Jan-25", "Feb-25", "Mar-25", "Apr-25", "May-25", "Jun-25", "Jul-25"]
            .into_iter()
            .map(Fx::T),
    );

    let series = |first: Fx, f: &dyn Fn(f64) -> f64| {
        let mut row = vec![first];
        row.extend((1..=7).map(|m| Fx::N(f(m as f64))));
        row
    };

    vec![
        header,
        vec![Fx::T("Acme Ltd")],
        series(Fx::Blank, &|m| 100.0 * m),
        series(Fx::Blank, &|m| 40.0 * m),
        series(Fx::T("GP margin %"), &|_| 60.0),
        vec![Fx::T("Beta Corp")],
        series(Fx::Blank, &|_| 50.0),
        series(Fx::Blank, &|_| 45.0),
        series(Fx::T("GP margin %"), &|_| 10.0),
    ]
}

/// Raw sheet with a blank row and a header-only column, both trimmed on load
pub fn balance_rows() -> Vec<Vec<Fx>> {
    vec![
        vec![Fx::T("Item"), Fx::T("Amount"), Fx::T("Notes")],
        vec![Fx::T("Cash"), Fx::N(1500.0)],
        vec![],
        vec![Fx::T("Debt"), Fx::N(700.0)],
    ]
}

pub fn workbook_bytes(sheets: &[(&str, Vec<Vec<Fx>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        write_rows(worksheet, rows);
    }
    workbook.save_to_buffer().unwrap()
}

/// The full monthly report: three processed sheets plus a balance sheet
pub fn report_bytes() -> Vec<u8> {
    workbook_bytes(&[
        ("Budget VS Actual", budget_rows(true)),
        ("OPEX Group Analysis", opex_rows()),
        ("P&L Per Customer", customer_rows()),
        ("Balance Sheet", balance_rows()),
    ])
}

pub fn write_report(dir: &Path) -> PathBuf {
    let path = dir.join("report.xlsx");
    std::fs::write(&path, report_bytes()).unwrap();
    path
}
