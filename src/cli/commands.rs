use crate::analysis::{self, CustomerMargin};
use crate::config::ReportConfig;
use crate::currency::ConversionOutcome;
use crate::error::{ReportError, ReportResult};
use crate::parser::{
    CustomerRecord, OpexRecord, ParseIssue, ParseOutcome, SectionKind, SheetKind, TidyRecord,
};
use crate::session::{Session, SheetView};
use crate::types::{ColumnValue, RawTable, TidyTable};
use crate::workbook::ReportExporter;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Options of the `show` command
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    pub sheet: String,
    /// Print the loaded grid as well as the processed view
    pub raw: bool,
    pub json: bool,
    /// Month for the per-customer margin table (defaults to the first one found)
    pub month: Option<String>,
    pub top: usize,
}

/// Install the stderr subscriber. `RUST_LOG` wins over the `-v` count.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "finreport=warn",
        1 => "finreport=info",
        _ => "finreport=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Build a session from an optional config file plus `CODE=VALUE` rate overrides
pub fn open_session(
    config: Option<&Path>,
    rate_overrides: &[(String, f64)],
) -> ReportResult<Session> {
    let config = match config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    let mut session = Session::new(config)?;
    for (currency, rate) in rate_overrides {
        session.update_rate(currency, *rate)?;
    }
    Ok(session)
}

/// Parse a `--rate` argument such as `EUR=0.92`
pub fn parse_rate_override(arg: &str) -> Result<(String, f64), String> {
    let (code, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=VALUE, got '{}'", arg))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("missing currency code in '{}'", arg));
    }
    let rate: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((code.to_uppercase(), rate))
}

/// Format an amount with thousands separators and two decimals
fn format_amount(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    let fixed = format!("{:.2}", n.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn format_optional(n: Option<f64>) -> String {
    n.map_or_else(|| "-".to_string(), format_amount)
}

fn load_workbook(session: &mut Session, file: &Path) -> ReportResult<()> {
    session.load_path(file)?;
    Ok(())
}

/// Execute the sheets command
pub fn sheets(session: &mut Session, file: PathBuf) -> ReportResult<()> {
    load_workbook(session, &file)?;

    println!("{}", "📒 finreport - Workbook sheets".bold().green());
    println!("   File: {}\n", file.display());

    println!(
        "   {:<32} {:>6} {:>8}   {}",
        "Sheet".bold(),
        "Rows".bold(),
        "Columns".bold(),
        "View".bold()
    );
    println!("   {}", "─".repeat(76));

    for name in session.sheet_names() {
        let table = session.raw(name)?;
        let kind = SheetKind::from_name(name);
        let label = if kind.is_processed() {
            kind.label().cyan()
        } else {
            kind.label().normal()
        };
        println!(
            "   {:<32} {:>6} {:>8}   {}",
            name.bright_blue(),
            table.height(),
            table.width(),
            label
        );
    }
    println!();

    Ok(())
}

/// Execute the show command
pub fn show(session: &mut Session, file: PathBuf, options: ShowOptions) -> ReportResult<()> {
    load_workbook(session, &file)?;
    let view = session.view(&options.sheet)?;

    if options.json {
        let value = if options.raw {
            raw_table_json(session.raw(&options.sheet)?)
        } else {
            view_json(&view)
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("📊 {} - {}", options.sheet, view.kind().label())
            .bold()
            .green()
    );
    println!("   File: {}\n", file.display());

    if let Some(reason) = view.no_match_reason() {
        println!("{} {}\n", "⚠️ ".yellow(), reason.yellow());
    }
    print_issues(view.issues());

    match &view {
        SheetView::BudgetVsActual(outcome) => print_budget(outcome),
        SheetView::Opex(outcome) => print_opex(outcome, options.top),
        SheetView::CustomerPnl(outcome) => print_customers(outcome, options.month.as_deref())?,
        SheetView::Raw { table, .. } => print_raw_table(table),
    }

    if options.raw && !matches!(view, SheetView::Raw { .. }) {
        println!("\n{}", "📄 Raw data:".bold().cyan());
        print_raw_table(session.raw(&options.sheet)?);
    }

    Ok(())
}

fn view_json(view: &SheetView<'_>) -> serde_json::Value {
    match view {
        SheetView::BudgetVsActual(outcome) => serde_json::json!({
            "outcome": outcome,
            "comparison": analysis::budget_comparison(outcome.records()),
        }),
        SheetView::Opex(outcome) => serde_json::json!({
            "outcome": outcome,
            "monthly_totals": analysis::opex_monthly_totals(outcome.records()),
        }),
        SheetView::CustomerPnl(outcome) => serde_json::json!({
            "outcome": outcome,
            "months": analysis::customer_months(outcome.records()),
        }),
        SheetView::Raw { table, .. } => raw_table_json(table),
    }
}

fn raw_table_json(table: &RawTable) -> serde_json::Value {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    serde_json::json!({
        "sheet": table.name,
        "columns": table.columns,
        "rows": rows,
    })
}

fn print_issues(issues: &[ParseIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("{}", "⚠️  Incomplete sheet:".bold().yellow());
    for issue in issues {
        println!("   - {}", issue.to_string().yellow());
    }
    println!();
}

fn print_budget(outcome: &ParseOutcome<TidyRecord>) {
    let rows = analysis::budget_comparison(outcome.records());
    if rows.is_empty() {
        println!("{}", "No Budget/Forecast/Actual records".yellow());
        return;
    }

    println!("{}", "Revenue".bold().cyan());
    print_comparison(&rows, |row, kind| row.revenue_of(kind));
    println!("\n{}", "Gross Profit".bold().cyan());
    print_comparison(&rows, |row, kind| row.gross_profit_of(kind));
}

fn print_comparison<F>(rows: &[analysis::ComparisonRow], figure: F)
where
    F: Fn(&analysis::ComparisonRow, SectionKind) -> Option<f64>,
{
    println!(
        "   {:<8} {:>16} {:>16} {:>16}",
        "Month".bold(),
        "Budget".bold(),
        "Forecast".bold(),
        "Actual".bold()
    );
    println!("   {}", "─".repeat(59));
    for row in rows {
        println!(
            "   {:<8} {:>16} {:>16} {:>16}",
            row.month.bright_blue(),
            format_optional(figure(row, SectionKind::Budget)),
            format_optional(figure(row, SectionKind::Forecast)),
            format_optional(figure(row, SectionKind::Actual)),
        );
    }
}

fn print_opex(outcome: &ParseOutcome<OpexRecord>, top: usize) {
    let records = outcome.records();
    println!("   {} records\n", records.len().to_string().bold());
    if records.is_empty() {
        return;
    }

    println!("{}", "📅 Monthly totals:".bold().cyan());
    for total in analysis::opex_monthly_totals(records) {
        println!(
            "   {:<12} {:>16}",
            total.month.bright_blue(),
            format_amount(total.amount)
        );
    }

    println!("\n{}", format!("🏆 Top {} accounts:", top).bold().cyan());
    for (rank, account) in analysis::top_accounts(records, top).iter().enumerate() {
        println!(
            "   {:>2}. {:<40} {:>16}",
            rank + 1,
            account.account_name.bright_blue(),
            format_amount(account.amount)
        );
    }
}

fn print_customers(
    outcome: &ParseOutcome<CustomerRecord>,
    month: Option<&str>,
) -> ReportResult<()> {
    let records = outcome.records();
    let months = analysis::customer_months(records);
    let Some(first) = months.first() else {
        println!("{}", "No customer records".yellow());
        return Ok(());
    };

    let month = month.unwrap_or(first);
    if !months.iter().any(|m| m == month) {
        return Err(ReportError::MonthNotFound {
            month: month.to_string(),
            available: months.join(", "),
        });
    }

    println!("{}", format!("👥 Gross profit by customer - {}", month).bold().cyan());
    println!(
        "   {:<32} {:>14} {:>14} {:>14} {:>8}",
        "Customer".bold(),
        "Revenue".bold(),
        "Cost of Sales".bold(),
        "Gross Profit".bold(),
        "GP %".bold()
    );
    println!("   {}", "─".repeat(86));
    for margin in analysis::customer_margins(records, month) {
        print_margin(&margin);
    }
    Ok(())
}

fn print_margin(margin: &CustomerMargin) {
    let gp = format_amount(margin.gross_profit);
    let gp = if margin.gross_profit < 0.0 { gp.red() } else { gp.green() };
    let pct = margin
        .gp_margin_pct
        .map_or_else(|| "-".to_string(), |p| format!("{:.1}%", p));
    println!(
        "   {:<32} {:>14} {:>14} {:>14} {:>8}",
        margin.customer.bright_blue(),
        format_amount(margin.revenue),
        format_amount(margin.cost_of_sales),
        gp,
        pct
    );
}

fn print_raw_table(table: &RawTable) {
    println!("   {}", table.columns.join(" | ").bold());
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        println!("   {}", cells.join(" | "));
    }
    println!(
        "\n   {} rows × {} columns",
        table.height(),
        table.width()
    );
}

/// Execute the convert command
pub fn convert(
    session: &mut Session,
    file: PathBuf,
    sheet: String,
    column: String,
    from: String,
    json: bool,
) -> ReportResult<()> {
    load_workbook(session, &file)?;
    let mut table = session.tidy_table(&sheet)?;
    let outcome = session.convert(&mut table, &column, &from)?;

    if json {
        let value = serde_json::json!({
            "outcome": outcome,
            "table": table,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        ConversionOutcome::Converted { rate } => println!(
            "{} {} → USD at {}",
            "✅ Converted".bold().green(),
            from.to_uppercase(),
            rate
        ),
        ConversionOutcome::AlreadyUsd => {
            println!("{}", "ℹ️  Column is already in USD".cyan())
        }
        ConversionOutcome::UnknownCurrency => println!(
            "{} no rate for {}, values left unchanged",
            "⚠️ ".yellow(),
            from.to_uppercase().yellow()
        ),
    }
    println!();
    print_column(&table, &column);

    Ok(())
}

fn print_column(table: &TidyTable, column: &str) {
    let Some(col) = table.column(column) else {
        return;
    };
    let header = match &col.currency {
        Some(currency) => format!("{} ({})", col.name, currency),
        None => col.name.clone(),
    };
    println!("   {}", header.bold());
    if let ColumnValue::Number(values) = &col.values {
        for value in values {
            println!("   {:>16}", format_amount(*value));
        }
    }
}

/// Execute the rates command
pub fn rates(session: &Session) -> ReportResult<()> {
    println!("{}", "💱 Exchange rates (1 unit → USD)".bold().green());
    for (currency, rate) in session.rates().iter() {
        println!("   {:<6} {}", currency.bright_blue(), rate);
    }
    Ok(())
}

/// Execute the export command
pub fn export(session: &mut Session, input: PathBuf, output: PathBuf) -> ReportResult<()> {
    println!("{}", "📤 finreport - Exporting processed sheets".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", output.display());

    load_workbook(session, &input)?;
    let tables = session.processed_tables();
    if tables.is_empty() {
        println!("{}", "⚠️  No processed sheets found, writing an empty workbook".yellow());
    }
    for table in &tables {
        println!(
            "   📊 {} ({} rows)",
            table.name.bright_blue(),
            table.row_count()
        );
    }

    ReportExporter::new(tables).export(&output)?;

    println!("\n{}", "✅ Export complete".bold().green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1500.0), "-1,500.00");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(f64::NAN), "");
    }

    #[test]
    fn test_parse_rate_override() {
        assert_eq!(parse_rate_override("eur=0.92"), Ok(("EUR".to_string(), 0.92)));
        assert_eq!(parse_rate_override(" CHF = 1.1 "), Ok(("CHF".to_string(), 1.1)));
        assert!(parse_rate_override("EUR").is_err());
        assert!(parse_rate_override("=1.0").is_err());
        assert!(parse_rate_override("EUR=abc").is_err());
    }

    #[test]
    fn test_open_session_applies_overrides() {
        let session = open_session(None, &[("EUR".to_string(), 0.5)]).unwrap();
        assert_eq!(session.rates().get("EUR"), Some(0.5));
        assert_eq!(session.rates().get("GBP"), Some(1.14175652188951));
    }

    #[test]
    fn test_open_session_rejects_bad_override() {
        let result = open_session(None, &[("EUR".to_string(), -1.0)]);
        assert!(matches!(result, Err(ReportError::InvalidRate { .. })));
    }
}
