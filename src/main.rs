//! Lease Cash Flow CLI
//!
//! Command-line interface for projecting term and reversion rent cash flows

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use lease_cashflow::lease::{load_leases, load_leases_from_sheet, write_sample};
use lease_cashflow::output::{format_table, write_table, OutputFormat};
use lease_cashflow::projection::{CashFlowProjector, ProjectionConfig, DEFAULT_HORIZON_YEARS};
use log::warn;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "lease_cashflow",
    version,
    about = "10-year term & reversion rent cash flow for multi-tenant property"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project rent cash flows from a lease schedule
    Project {
        /// Lease schedule (.csv, .xlsx, .xls, .ods)
        #[arg(short, long)]
        input: PathBuf,

        /// Valuation date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        valuation_date: Option<NaiveDate>,

        /// Write the cash flow here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format, inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Years to project from the valuation year
        #[arg(long, default_value_t = DEFAULT_HORIZON_YEARS)]
        horizon_years: u32,

        /// Worksheet to read from a workbook (first sheet by default)
        #[arg(long)]
        sheet: Option<String>,

        /// Include the rent basis of each cell (JSON output only)
        #[arg(long)]
        detailed: bool,
    },
    /// Write a sample lease schedule to fill in
    Sample {
        /// Destination (.xlsx or .csv)
        #[arg(short, long, default_value = "sample_lease_data.xlsx")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Xlsx,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Xlsx => OutputFormat::Xlsx,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

struct ProjectArgs {
    input: PathBuf,
    valuation_date: Option<NaiveDate>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    sheet: Option<String>,
    config: ProjectionConfig,
}

fn run_project(args: ProjectArgs) -> Result<()> {
    let valuation_date = args.valuation_date.unwrap_or_else(|| Local::now().date_naive());

    let leases = match &args.sheet {
        Some(sheet) => load_leases_from_sheet(&args.input, Some(sheet.as_str())),
        None => load_leases(&args.input),
    }
    .with_context(|| format!("failed to load leases from {}", args.input.display()))?;

    let projector = CashFlowProjector::new(args.config);
    let cash_flow = projector.project(&leases, valuation_date)?;

    match &args.output {
        Some(path) => {
            let format = args.format.or_else(|| OutputFormat::from_path(path));
            if projector.config().detailed_output && format != Some(OutputFormat::Json) {
                warn!("--detailed only affects JSON output");
            }
            write_table(&cash_flow, path, format)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Cash flow written to: {}", path.display());
        }
        None => {
            println!("10-Year Term & Reversion Cash Flow (valuation date {})", valuation_date);
            println!();
            print!("{}", format_table(&cash_flow));

            let summary = cash_flow.summary();
            println!();
            println!("Summary:");
            println!("  Tenants: {}", summary.tenant_count);
            println!("  Years projected: {}", summary.year_count);
            println!("  Total rent: {:.2}", summary.total_rent);
            if let Some(year) = summary.peak_year {
                println!("  Peak year: {} ({:.2})", year, summary.peak_rent);
            }
        }
    }

    Ok(())
}

fn run_sample(output: &Path) -> Result<()> {
    write_sample(output).with_context(|| format!("failed to write {}", output.display()))?;
    println!("Sample lease schedule written to: {}", output.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Project {
            input,
            valuation_date,
            output,
            format,
            horizon_years,
            sheet,
            detailed,
        } => run_project(ProjectArgs {
            input,
            valuation_date,
            output,
            format: format.map(OutputFormat::from),
            sheet,
            config: ProjectionConfig {
                horizon_years,
                detailed_output: detailed,
            },
        }),
        Commands::Sample { output } => run_sample(&output),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
