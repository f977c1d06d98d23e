//! Run projections for every lease schedule in a directory
//!
//! Outputs yearly rent totals per property plus the portfolio total

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use lease_cashflow::portfolio::{aggregate_totals, load_portfolio_dir, PortfolioRunner};
use lease_cashflow::projection::{ProjectionConfig, DEFAULT_HORIZON_YEARS};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(about = "Project every lease schedule in a directory and aggregate yearly totals")]
struct Args {
    /// Directory of lease schedules (.csv, .xlsx, .xls, .ods)
    dir: PathBuf,

    /// Valuation date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    valuation_date: Option<NaiveDate>,

    /// Years to project from the valuation year
    #[arg(long, default_value_t = DEFAULT_HORIZON_YEARS)]
    horizon_years: u32,

    /// Output CSV of yearly totals
    #[arg(short, long, default_value = "portfolio_cash_flow.csv")]
    output: PathBuf,
}

fn run(args: Args) -> Result<()> {
    let start = Instant::now();
    let valuation_date = args.valuation_date.unwrap_or_else(|| Local::now().date_naive());

    println!("Loading lease schedules from {}...", args.dir.display());
    let properties = load_portfolio_dir(&args.dir)
        .with_context(|| format!("failed to load lease schedules from {}", args.dir.display()))?;
    println!("Loaded {} properties in {:?}", properties.len(), start.elapsed());

    let runner = PortfolioRunner::with_config(ProjectionConfig {
        horizon_years: args.horizon_years,
        ..Default::default()
    });

    println!("Running projections...");
    let proj_start = Instant::now();
    let results = runner.run_batch(&properties, valuation_date)?;
    println!("Projections complete in {:?}", proj_start.elapsed());

    let totals = aggregate_totals(results.iter().map(|p| &p.cash_flow));
    let years: Vec<i32> = totals.keys().copied().collect();

    // One row per property, then the portfolio total
    let mut writer = csv::Writer::from_writer(
        File::create(&args.output).with_context(|| format!("failed to create {}", args.output.display()))?,
    );
    let mut header = vec!["Property".to_string()];
    header.extend(years.iter().map(|y| y.to_string()));
    writer.write_record(&header)?;

    for property in &results {
        let property_totals = property.cash_flow.year_totals();
        let mut record = vec![property.name.clone()];
        for year in &years {
            let total = property_totals
                .iter()
                .find(|(y, _)| y == year)
                .map(|(_, t)| *t)
                .unwrap_or(0.0);
            record.push(format!("{:.2}", total));
        }
        writer.write_record(&record)?;
    }

    let mut record = vec!["Portfolio".to_string()];
    record.extend(totals.values().map(|t| format!("{:.2}", t)));
    writer.write_record(&record)?;
    writer.flush()?;

    println!("Output written to {}", args.output.display());

    println!("\nPortfolio Summary (valuation date {}):", valuation_date);
    for (year, total) in &totals {
        println!("  {}: {:>16.2}", year, total);
    }
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
