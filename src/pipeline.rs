use crate::catalog::{CatalogFetcher, CatalogSource, ProductCatalog};
use crate::config::Config;
use crate::enrich::{enrich, EnrichedTransaction};
use crate::error::{Error, FetchError};
use crate::export::save_enriched;
use crate::filter::{validate_and_filter, Partition};
use crate::read_sales_lines;
use crate::report::SalesReport;
use crate::summary::RunSummary;
use crate::transaction::{parse_transactions, ParsedBatch};

use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument, warn};

/// Everything a run produced, for callers that want more than the files.
#[derive(Debug)]
pub struct PipelineResult {
    pub summary: RunSummary,
    pub parsed: ParsedBatch,
    pub partition: Partition,
    pub enriched: Vec<EnrichedTransaction>,
    pub report: SalesReport,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn CatalogSource,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, source: &'a dyn CatalogSource) -> Self {
        Self { config, source }
    }

    /// Fetches the catalog, falling back to an empty one on failure. The
    /// second value carries the failure reason when degraded.
    fn load_catalog(&self) -> (ProductCatalog, Option<String>) {
        let catalog = &self.config.catalog;
        if catalog.offline {
            return (ProductCatalog::empty(), Some(FetchError::Offline.to_string()));
        }

        let fetcher = CatalogFetcher {
            max_pages: catalog.max_pages,
            ..CatalogFetcher::new(&catalog.url, catalog.page_size)
        };
        match fetcher.fetch_catalog(self.source) {
            Ok(products) => (products, None),
            Err(e) => {
                warn!(error = %e, "Catalog fetch failed, continuing with degraded enrichment");
                (ProductCatalog::empty(), Some(e.to_string()))
            }
        }
    }

    pub fn run(&self) -> Result<PipelineResult, Error> {
        self.run_at(Local::now().naive_local())
    }

    /// Runs every stage with an explicit report timestamp. Only I/O on the
    /// input, report or enriched dump paths returns an error.
    #[instrument(skip(self), fields(input = %self.config.input.display()))]
    pub fn run_at(&self, generated_at: NaiveDateTime) -> Result<PipelineResult, Error> {
        let config = self.config;
        config.validate()?;
        let delimiter = config.delimiter_byte()?;
        let criteria = config.filter_criteria()?;

        let lines = read_sales_lines(&config.input, config.has_header)?;
        info!(count = lines.len(), "Read raw lines");

        let parsed = parse_transactions(&lines, delimiter);
        info!(
            parsed = parsed.transactions.len(),
            skipped = parsed.skipped.len(),
            "Parsed transactions"
        );

        let partition = validate_and_filter(&parsed.transactions, &criteria);
        let regions: Vec<String> = partition.regions().iter().map(|r| r.to_string()).collect();
        match partition.amount_range() {
            Some((min, max)) => info!(?regions, %min, %max, "Validated transactions"),
            None => info!(?regions, "Validated transactions"),
        }
        if !criteria.is_empty() {
            info!(
                kept = partition.kept.len(),
                filtered_out = partition.filtered_out.len(),
                "Applied filter"
            );
        }

        let (catalog, degraded) = self.load_catalog();
        let enriched = enrich(&partition.kept, &catalog);
        let matched = enriched.iter().filter(|e| e.is_matched()).count();

        let summary = RunSummary {
            raw_lines: lines.len(),
            parsed: parsed.transactions.len(),
            skipped: parsed.skipped.len(),
            valid: partition.valid.len(),
            invalid: partition.invalid.len(),
            filtered_out: partition.filtered_out.len(),
            kept: partition.kept.len(),
            products_fetched: catalog.len(),
            matched,
            unmatched: enriched.len() - matched,
            degraded,
        };

        if config.write_enriched {
            save_enriched(&config.enriched_output, &enriched, delimiter)?;
            info!(path = %config.enriched_output.display(), "Saved enriched transactions");
        }

        let report = SalesReport::build(&partition.kept, &enriched, &summary, &config.currency_symbol);
        report.save(&config.output, generated_at)?;
        info!(path = %config.output.display(), "Saved report");

        summary.log();

        Ok(PipelineResult {
            summary,
            parsed,
            partition,
            enriched,
            report,
        })
    }
}
