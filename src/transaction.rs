use crate::error::ParseError;
use crate::RawLine;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const FIELD_COUNT: usize = 6;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Largest accepted amount magnitude, in whole currency units. Keeps report
/// totals well inside `Decimal`'s range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
/// Largest accepted quantity magnitude.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    East,
    North,
    South,
    West,
    Unknown(String),
}

impl Region {
    pub fn is_known(&self) -> bool {
        !matches!(self, Region::Unknown(_))
    }
}

impl From<&str> for Region {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "east" => Region::East,
            "north" => Region::North,
            "south" => Region::South,
            "west" => Region::West,
            _ => Region::Unknown(s.trim().to_string()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::East => "East",
            Region::North => "North",
            Region::South => "South",
            Region::West => "West",
            Region::Unknown(raw) => raw.as_str(),
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub region: Region,
    pub product_ref: String,
    pub amount: Decimal,
    pub quantity: i64,
}

/// One input line split into its untyped fields, in file order.
#[derive(Debug, Deserialize)]
pub struct CsvTransaction {
    pub id: String,
    pub date: String,
    pub region: String,
    pub product_ref: String,
    pub amount: String,
    pub quantity: String,
}

impl TryFrom<CsvTransaction> for Transaction {
    type Error = ParseError;

    fn try_from(csv: CsvTransaction) -> Result<Self, Self::Error> {
        if csv.id.is_empty() {
            return Err(ParseError::MissingField("id"));
        }
        if csv.product_ref.is_empty() {
            return Err(ParseError::MissingField("product_ref"));
        }

        Ok(Transaction {
            date: parse_date(&csv.date)?,
            region: Region::from(csv.region.as_str()),
            amount: parse_amount(&csv.amount)?,
            quantity: parse_quantity(&csv.quantity)?,
            id: csv.id,
            product_ref: csv.product_ref,
        })
    }
}

impl Transaction {
    pub fn new(
        id: &str,
        date: NaiveDate,
        region: Region,
        product_ref: &str,
        amount: Decimal,
        quantity: i64,
    ) -> Self {
        Self {
            id: id.to_string(),
            date,
            region,
            product_ref: product_ref.to_string(),
            amount,
            quantity,
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ParseError::InvalidDate(raw.to_string()))
}

/// Parses a currency amount with at most two fractional digits. Thousands
/// separators are ignored.
pub fn parse_amount(raw: &str) -> Result<Decimal, ParseError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let amount = Decimal::from_str(cleaned.trim())
        .map_err(|_| ParseError::InvalidAmount(raw.to_string()))?;

    if amount.normalize().scale() > 2 || amount.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(ParseError::InvalidAmount(raw.to_string()));
    }

    Ok(amount)
}

pub fn parse_quantity(raw: &str) -> Result<i64, ParseError> {
    raw.parse::<i64>()
        .ok()
        .filter(|q| (-MAX_QUANTITY..=MAX_QUANTITY).contains(q))
        .ok_or_else(|| ParseError::InvalidQuantity(raw.to_string()))
}

/// A line the parser could not turn into a [`Transaction`].
#[derive(Debug, PartialEq)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: ParseError,
}

#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedLine>,
}

pub fn parse_line(text: &str, delimiter: u8) -> Result<Transaction, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut record = StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => {}
        Ok(false) => return Err(ParseError::FieldCount { expected: FIELD_COUNT, found: 0 }),
        Err(e) => return Err(ParseError::Csv(e.to_string())),
    }

    if record.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            found: record.len(),
        });
    }

    let csv: CsvTransaction = record
        .deserialize(None)
        .map_err(|e| ParseError::Csv(e.to_string()))?;

    csv.try_into()
}

/// Parses every raw line, keeping the ones that fail as [`SkippedLine`]s.
/// `transactions.len() + skipped.len()` always equals `lines.len()`.
pub fn parse_transactions(lines: &[RawLine], delimiter: u8) -> ParsedBatch {
    let mut batch = ParsedBatch::default();

    for line in lines {
        match parse_line(&line.text, delimiter) {
            Ok(tx) => batch.transactions.push(tx),
            Err(reason) => {
                tracing::warn!(line = line.number, %reason, "Skipping malformed line");
                batch.skipped.push(SkippedLine {
                    line: line.number,
                    reason,
                });
            }
        }
    }

    batch
}
