use sales_report::{
    catalog::HttpCatalogSource,
    config::Config,
    logging::init_logging,
    pipeline::{Pipeline, PipelineResult},
    report::format_currency,
};

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sales-report")]
#[command(about = "Validate sales transactions, enrich them from a product catalog and write a report")]
#[command(version)]
struct Cli {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sales data file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Report destination
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enriched transactions destination
    #[arg(long)]
    enriched_output: Option<PathBuf>,

    /// Do not write the enriched transactions file
    #[arg(long)]
    no_enriched: bool,

    /// Field delimiter of the input file
    #[arg(long)]
    delimiter: Option<char>,

    /// Input file has no header row
    #[arg(long)]
    no_header: bool,

    /// Product catalog endpoint
    #[arg(long)]
    catalog_url: Option<String>,

    /// Products requested per catalog page
    #[arg(long)]
    page_size: Option<usize>,

    /// Skip the catalog fetch and run with degraded enrichment
    #[arg(long)]
    offline: bool,

    /// Keep only these regions (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Keep only transactions with at least this amount
    #[arg(long)]
    min_amount: Option<Decimal>,

    /// Keep only transactions with at most this amount
    #[arg(long)]
    max_amount: Option<Decimal>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(enriched_output) = self.enriched_output {
            config.enriched_output = enriched_output;
        }
        if self.no_enriched {
            config.write_enriched = false;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if self.no_header {
            config.has_header = false;
        }
        if let Some(url) = self.catalog_url {
            config.catalog.url = url;
        }
        if let Some(page_size) = self.page_size {
            config.catalog.page_size = page_size;
        }
        if self.offline {
            config.catalog.offline = true;
        }
        if !self.regions.is_empty() {
            config.filter.regions = self.regions;
        }
        if self.min_amount.is_some() {
            config.filter.min_amount = self.min_amount;
        }
        if self.max_amount.is_some() {
            config.filter.max_amount = self.max_amount;
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_result(config: &Config, result: &PipelineResult) {
    let s = &result.summary;
    println!("Processed {} lines from {}", s.raw_lines, config.input.display());
    println!("  Parsed:        {} ({} skipped)", s.parsed, s.skipped);
    println!("  Valid:         {} ({} invalid)", s.valid, s.invalid);
    println!("  Final:         {} ({} filtered out)", s.kept, s.filtered_out);
    println!("  Enrichment:    {}", s.enrichment_status());
    println!("  Matched:       {} ({} unmatched)", s.matched, s.unmatched);
    println!(
        "  Total revenue: {}",
        format_currency(result.report.total_revenue, &config.currency_symbol)
    );
    if config.write_enriched {
        println!("Enriched data: {}", config.enriched_output.display());
    }
    println!("Report:        {}", config.output.display());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config().context("invalid configuration")?;
    let source = HttpCatalogSource::new();

    let result = Pipeline::new(&config, &source)
        .run()
        .context("sales report pipeline failed")?;

    print_result(&config, &result);
    Ok(())
}
