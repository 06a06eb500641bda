use anyhow::Context;
use clap::{Parser, Subcommand};
use finreport::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "finreport")]
#[command(about = "Parse monthly group financial reports into tidy tables")]
#[command(long_about = "finreport - Monthly group financial report parser

Reads the report workbook (.xlsx/.xls/.ods) and reshapes the known sheets:

  Budget VS Actual     - Budget / Forecast / Actual by month
  OPEX Group Analysis  - Operating expenses per account and month
  P&L Per Customer     - Revenue, cost of sales and gross profit per customer

Other sheets are shown as loaded.

COMMANDS:
  sheets   - List the sheets of a workbook
  show     - Print the processed view of one sheet
  convert  - Convert a numeric column to USD
  rates    - Print the effective exchange rates
  export   - Write every processed sheet to a new .xlsx

EXAMPLES:
  finreport sheets report.xlsx
  finreport show report.xlsx --sheet \"P&L Per Customer\" --month Mar-25
  finreport convert report.xlsx --sheet \"OPEX Group Analysis\" --column Amount --from EUR
  finreport --rate EUR=0.92 rates
  finreport export report.xlsx tidy.xlsx

LOGGING:
  Warnings go to stderr. Use -v / -vv or RUST_LOG=finreport=debug for more.")]
#[command(version)]
struct Cli {
    /// YAML config file (upload cap, extra rates, sheet layout)
    #[arg(short, long, global = true, env = "FINREPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Exchange-rate override, e.g. --rate EUR=0.92 (repeatable)
    #[arg(
        long = "rate",
        value_name = "CODE=VALUE",
        global = true,
        value_parser = cli::parse_rate_override
    )]
    rates: Vec<(String, f64)>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook with their size and view
    Sheets {
        /// Path to the report workbook
        file: PathBuf,
    },

    #[command(long_about = "Print the processed view of one sheet.

  Budget VS Actual     - revenue and gross profit per month, Budget / Forecast / Actual
  OPEX Group Analysis  - monthly totals and the top accounts
  P&L Per Customer     - gross profit and GP margin % per customer for one month

Sheets without a parser are printed as loaded. Incomplete sections are listed
as warnings above the figures.

EXAMPLES:
  finreport show report.xlsx --sheet \"Budget VS Actual\"
  finreport show report.xlsx --sheet \"OPEX Group Analysis\" --top 5
  finreport show report.xlsx --sheet \"P&L Per Customer\" --json")]
    /// Print the processed view of one sheet
    Show {
        /// Path to the report workbook
        file: PathBuf,

        /// Sheet name
        #[arg(short, long)]
        sheet: String,

        /// Also print the sheet as loaded (with --json: print only the loaded grid)
        #[arg(long)]
        raw: bool,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Month for the customer table (default: first month in the sheet)
        #[arg(short, long)]
        month: Option<String>,

        /// Number of OPEX accounts to rank
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Convert a numeric column of a sheet to USD
    Convert {
        /// Path to the report workbook
        file: PathBuf,

        /// Sheet name
        #[arg(short, long)]
        sheet: String,

        /// Column to convert
        #[arg(long)]
        column: String,

        /// Source currency code (e.g. EUR)
        #[arg(long)]
        from: String,

        /// Print JSON instead of a column listing
        #[arg(long)]
        json: bool,
    },

    /// Print the effective exchange-rate table
    Rates,

    /// Export every processed sheet to an .xlsx workbook
    Export {
        /// Path to the report workbook
        input: PathBuf,

        /// Output .xlsx file
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    let mut session = cli::open_session(cli.config.as_deref(), &cli.rates)
        .context("could not start a report session")?;

    let result = match cli.command {
        Commands::Sheets { file } => cli::sheets(&mut session, file),

        Commands::Show {
            file,
            sheet,
            raw,
            json,
            month,
            top,
        } => cli::show(
            &mut session,
            file,
            cli::ShowOptions {
                sheet,
                raw,
                json,
                month,
                top,
            },
        ),

        Commands::Convert {
            file,
            sheet,
            column,
            from,
            json,
        } => cli::convert(&mut session, file, sheet, column, from, json),

        Commands::Rates => cli::rates(&session),

        Commands::Export { input, output } => cli::export(&mut session, input, output),
    };

    session.close()?;
    result?;
    Ok(())
}
