use crate::enrich::EnrichedTransaction;
use crate::error::Error;
use crate::summary::RunSummary;
use crate::transaction::{Region, Transaction};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
pub const GENERATED_PREFIX: &str = "        Generated: ";

const TOP_PRODUCTS: usize = 5;
const TREND_DAYS: usize = 12;
const UNMATCHED_LISTED: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub region: Region,
    pub sales: Decimal,
    pub share_pct: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub revenue: Decimal,
    pub share_pct: Decimal,
    pub count: usize,
    pub margin: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductStats {
    pub product_ref: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub count: usize,
}

/// Aggregates behind the text report. Building it is deterministic; only
/// rendering takes a timestamp.
#[derive(Debug, Clone)]
pub struct SalesReport {
    pub summary: RunSummary,
    pub total_revenue: Decimal,
    pub transaction_count: usize,
    pub average_order_value: Decimal,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub regions: Vec<RegionStats>,
    pub categories: Vec<CategoryStats>,
    pub top_products: Vec<ProductStats>,
    pub daily: Vec<DailyStats>,
    pub enriched_count: usize,
    pub matched_count: usize,
    pub unmatched_refs: Vec<String>,
    pub currency_symbol: String,
}

pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to minor units, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `1234567.5` -> `₹1,234,567.50`
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = round_money(amount);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}{}.{}", sign, symbol, grouped, frac_part)
}

/// Sums amounts without panicking on overflow.
fn total(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount))
}

fn region_breakdown(transactions: &[Transaction], total: Decimal) -> Vec<RegionStats> {
    let mut by_region: BTreeMap<Region, (Decimal, usize)> = BTreeMap::new();
    for tx in transactions {
        let entry = by_region.entry(tx.region.clone()).or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(tx.amount);
        entry.1 += 1;
    }

    let mut regions: Vec<RegionStats> = by_region
        .into_iter()
        .map(|(region, (sales, count))| RegionStats {
            region,
            sales,
            share_pct: percentage(sales, total),
            count,
        })
        .collect();
    regions.sort_by(|a, b| {
        b.sales
            .cmp(&a.sales)
            .then_with(|| a.region.to_string().cmp(&b.region.to_string()))
    });
    regions
}

fn category_breakdown(enriched: &[EnrichedTransaction]) -> Vec<CategoryStats> {
    let mut by_category: BTreeMap<String, (Decimal, usize, Decimal)> = BTreeMap::new();
    for e in enriched {
        let Some(matched) = e.matched() else {
            continue;
        };
        let entry = by_category
            .entry(matched.product.category.clone())
            .or_insert((Decimal::ZERO, 0, Decimal::ZERO));
        entry.0 = entry.0.saturating_add(e.revenue());
        entry.1 += 1;
        entry.2 = entry.2.saturating_add(matched.margin);
    }

    let matched_total = by_category
        .values()
        .fold(Decimal::ZERO, |acc, (revenue, _, _)| acc.saturating_add(*revenue));
    let mut categories: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, (revenue, count, margin))| CategoryStats {
            share_pct: percentage(revenue, matched_total),
            category,
            revenue,
            count,
            margin,
        })
        .collect();
    categories.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.category.cmp(&b.category)));
    categories
}

fn product_breakdown(transactions: &[Transaction]) -> Vec<ProductStats> {
    let mut by_product: BTreeMap<&str, (i64, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let entry = by_product
            .entry(tx.product_ref.as_str())
            .or_insert((0, Decimal::ZERO));
        entry.0 = entry.0.saturating_add(tx.quantity);
        entry.1 = entry.1.saturating_add(tx.amount);
    }

    let mut products: Vec<ProductStats> = by_product
        .into_iter()
        .map(|(product_ref, (quantity, revenue))| ProductStats {
            product_ref: product_ref.to_string(),
            quantity,
            revenue,
        })
        .collect();
    // Stable sort keeps the BTreeMap's alphabetical order for ties.
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(TOP_PRODUCTS);
    products
}

fn daily_breakdown(transactions: &[Transaction]) -> Vec<DailyStats> {
    let mut by_day: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for tx in transactions {
        let entry = by_day.entry(tx.date).or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(tx.amount);
        entry.1 += 1;
    }
    by_day
        .into_iter()
        .map(|(date, (revenue, count))| DailyStats {
            date,
            revenue,
            count,
        })
        .collect()
}

impl SalesReport {
    pub fn build(
        transactions: &[Transaction],
        enriched: &[EnrichedTransaction],
        summary: &RunSummary,
        currency_symbol: &str,
    ) -> Self {
        let total_revenue = total(transactions);
        let transaction_count = transactions.len();
        let average_order_value = if transaction_count == 0 {
            Decimal::ZERO
        } else {
            round_money(total_revenue / Decimal::from(transaction_count))
        };

        let date_range = transactions
            .iter()
            .map(|tx| tx.date)
            .min()
            .zip(transactions.iter().map(|tx| tx.date).max());

        let unmatched_refs: BTreeSet<&str> = enriched
            .iter()
            .filter(|e| !e.is_matched())
            .map(|e| e.transaction.product_ref.as_str())
            .collect();

        Self {
            summary: summary.clone(),
            total_revenue,
            transaction_count,
            average_order_value,
            date_range,
            regions: region_breakdown(transactions, total_revenue),
            categories: category_breakdown(enriched),
            top_products: product_breakdown(transactions),
            daily: daily_breakdown(transactions),
            enriched_count: enriched.len(),
            matched_count: enriched.iter().filter(|e| e.is_matched()).count(),
            unmatched_refs: unmatched_refs.into_iter().map(str::to_string).collect(),
            currency_symbol: currency_symbol.to_string(),
        }
    }

    pub fn unmatched_count(&self) -> usize {
        self.enriched_count - self.matched_count
    }

    fn money(&self, amount: Decimal) -> String {
        format_currency(amount, &self.currency_symbol)
    }

    /// Writes the report. The `Generated:` line is the only one that depends
    /// on anything other than the report's own data.
    pub fn write_report<W: Write>(&self, mut w: W, generated_at: NaiveDateTime) -> std::io::Result<()> {
        let rule = "-".repeat(44);
        let banner = "=".repeat(47);

        // Header
        writeln!(w, "{}", banner)?;
        writeln!(w, "          SALES ANALYTICS REPORT")?;
        writeln!(w, "{}{}", GENERATED_PREFIX, generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(w, "        Records Processed: {}", self.transaction_count)?;
        writeln!(w, "{}", banner)?;
        writeln!(w)?;

        let s = &self.summary;
        writeln!(w, "RUN SUMMARY")?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "Raw Lines Read:        {}", s.raw_lines)?;
        writeln!(w, "Lines Parsed:          {}", s.parsed)?;
        writeln!(w, "Lines Skipped:         {}", s.skipped)?;
        writeln!(w, "Valid Transactions:    {}", s.valid)?;
        writeln!(w, "Invalid Transactions:  {}", s.invalid)?;
        writeln!(w, "Filtered Out:          {}", s.filtered_out)?;
        writeln!(w, "Final Transactions:    {}", s.kept)?;
        writeln!(w, "Enrichment:            {}", s.enrichment_status())?;
        writeln!(w)?;

        writeln!(w, "OVERALL SUMMARY")?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "Total Revenue:         {}", self.money(self.total_revenue))?;
        writeln!(w, "Total Transactions:    {}", self.transaction_count)?;
        writeln!(w, "Average Order Value:   {}", self.money(self.average_order_value))?;
        match self.date_range {
            Some((first, last)) => writeln!(w, "Date Range:            {} to {}", first, last)?,
            None => writeln!(w, "Date Range:            N/A")?,
        }
        writeln!(w)?;

        writeln!(w, "REGION-WISE PERFORMANCE")?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "{:<10}{:>15}{:>13}{:>15}", "Region", "Sales", "% of Total", "Transactions")?;
        writeln!(w, "{}", rule)?;
        for r in &self.regions {
            writeln!(
                w,
                "{:<10}{:>15}{:>12.1}%{:>15}",
                r.region,
                self.money(r.sales),
                r.share_pct,
                r.count
            )?;
        }
        if self.regions.is_empty() {
            writeln!(w, "  None")?;
        }
        writeln!(w)?;

        writeln!(w, "CATEGORY-WISE PERFORMANCE")?;
        writeln!(w, "{}", rule)?;
        writeln!(
            w,
            "{:<20}{:>15}{:>13}{:>15}{:>15}",
            "Category", "Revenue", "% of Matched", "Transactions", "Margin"
        )?;
        writeln!(w, "{}", rule)?;
        for c in &self.categories {
            writeln!(
                w,
                "{:<20}{:>15}{:>12.1}%{:>15}{:>15}",
                truncate(&c.category, 19),
                self.money(c.revenue),
                c.share_pct,
                c.count,
                self.money(c.margin)
            )?;
        }
        if self.categories.is_empty() {
            writeln!(w, "  None")?;
        }
        writeln!(w)?;

        writeln!(w, "TOP {} PRODUCTS", TOP_PRODUCTS)?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "{:<6}{:<25}{:>15}{:>15}", "Rank", "Product", "Quantity Sold", "Revenue")?;
        writeln!(w, "{}", rule)?;
        for (rank, p) in self.top_products.iter().enumerate() {
            writeln!(
                w,
                "{:<6}{:<25}{:>15}{:>15}",
                rank + 1,
                truncate(&p.product_ref, 24),
                p.quantity,
                self.money(p.revenue)
            )?;
        }
        if self.top_products.is_empty() {
            writeln!(w, "  None")?;
        }
        writeln!(w)?;

        writeln!(w, "DAILY SALES TREND")?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "{:<12}{:>15}{:>15}", "Date", "Revenue", "Transactions")?;
        writeln!(w, "{}", rule)?;
        for d in self.daily.iter().take(TREND_DAYS) {
            writeln!(w, "{:<12}{:>15}{:>15}", d.date.to_string(), self.money(d.revenue), d.count)?;
        }
        if self.daily.len() > TREND_DAYS {
            writeln!(w, "... and {} more days", self.daily.len() - TREND_DAYS)?;
        }
        // First day with the highest revenue.
        let peak = self
            .daily
            .iter()
            .fold(None::<&DailyStats>, |best, d| match best {
                Some(b) if b.revenue >= d.revenue => Some(b),
                _ => Some(d),
            });
        match peak {
            Some(d) => writeln!(
                w,
                "Best Selling Day: {} ({} | {} transactions)",
                d.date,
                self.money(d.revenue),
                d.count
            )?,
            None => writeln!(w, "Best Selling Day: N/A")?,
        }
        writeln!(w)?;

        writeln!(w, "API ENRICHMENT SUMMARY")?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "Total Transactions Enriched: {}", self.enriched_count)?;
        writeln!(w, "Matched:                     {}", self.matched_count)?;
        writeln!(
            w,
            "Unmatched:                   {} ({:.1}%)",
            self.unmatched_count(),
            percentage(
                Decimal::from(self.unmatched_count()),
                Decimal::from(self.enriched_count)
            )
        )?;
        if s.is_degraded() {
            writeln!(w, "Note: product catalog unavailable; enrichment was degraded.")?;
        }
        writeln!(w, "Products that couldn't be enriched:")?;
        for product_ref in self.unmatched_refs.iter().take(UNMATCHED_LISTED) {
            writeln!(w, "  - {}", product_ref)?;
        }
        if self.unmatched_refs.len() > UNMATCHED_LISTED {
            writeln!(w, "  ... and {} more", self.unmatched_refs.len() - UNMATCHED_LISTED)?;
        }
        if self.unmatched_refs.is_empty() {
            writeln!(w, "  - None")?;
        }

        Ok(())
    }

    pub fn render(&self, generated_at: NaiveDateTime) -> std::io::Result<String> {
        let mut buf = Vec::new();
        self.write_report(&mut buf, generated_at)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the report to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path, generated_at: NaiveDateTime) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_report(&mut writer, generated_at)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(path, e))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
