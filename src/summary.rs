use tracing::{info, warn};

/// Counts for every stage of a run, plus whether enrichment was degraded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub raw_lines: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub valid: usize,
    pub invalid: usize,
    pub filtered_out: usize,
    pub kept: usize,
    pub products_fetched: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Set when the catalog could not be fetched and enrichment ran against
    /// an empty catalog.
    pub degraded: Option<String>,
}

impl RunSummary {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn enrichment_status(&self) -> String {
        match &self.degraded {
            Some(reason) => format!("DEGRADED ({})", reason),
            None => format!("complete ({} products fetched)", self.products_fetched),
        }
    }

    pub fn log(&self) {
        info!(
            raw_lines = self.raw_lines,
            parsed = self.parsed,
            skipped = self.skipped,
            valid = self.valid,
            invalid = self.invalid,
            filtered_out = self.filtered_out,
            kept = self.kept,
            matched = self.matched,
            unmatched = self.unmatched,
            "Run summary"
        );
        if let Some(reason) = &self.degraded {
            warn!(%reason, "Enrichment was degraded; all transactions are unmatched");
        }
    }
}
