use crate::enrich::EnrichedTransaction;
use crate::error::Error;

use csv::WriterBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Column names, in the field order of [`EnrichedRow`].
pub const HEADER: [&str; 14] = [
    "id",
    "date",
    "region",
    "product_ref",
    "amount",
    "quantity",
    "product_id",
    "product_name",
    "category",
    "brand",
    "unit_price",
    "rating",
    "margin",
    "matched",
];

/// One output row: the input columns followed by the catalog columns, which
/// are left empty for unmatched transactions.
#[derive(Debug, Serialize)]
struct EnrichedRow<'a> {
    id: &'a str,
    date: String,
    region: String,
    product_ref: &'a str,
    amount: Decimal,
    quantity: i64,
    product_id: Option<String>,
    product_name: Option<&'a str>,
    category: Option<&'a str>,
    brand: Option<&'a str>,
    unit_price: Option<Decimal>,
    rating: Option<Decimal>,
    margin: Option<Decimal>,
    matched: bool,
}

impl<'a> From<&'a EnrichedTransaction> for EnrichedRow<'a> {
    fn from(e: &'a EnrichedTransaction) -> Self {
        let tx = &e.transaction;
        let matched = e.matched();
        Self {
            id: &tx.id,
            date: tx.date.to_string(),
            region: tx.region.to_string(),
            product_ref: &tx.product_ref,
            amount: tx.amount,
            quantity: tx.quantity,
            product_id: matched.map(|m| m.product.id.to_string()),
            product_name: matched.map(|m| m.product.name.as_str()),
            category: matched.map(|m| m.product.category.as_str()),
            brand: matched.and_then(|m| m.product.brand.as_deref()),
            unit_price: matched.map(|m| m.product.price),
            rating: matched.and_then(|m| m.product.rating),
            margin: matched.map(|m| m.margin),
            matched: matched.is_some(),
        }
    }
}

pub fn write_enriched<W: Write>(
    writer: W,
    enriched: &[EnrichedTransaction],
    delimiter: u8,
) -> Result<(), csv::Error> {
    // serde only emits headers alongside the first row, so an empty dump
    // would otherwise have none.
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    for e in enriched {
        wtr.serialize(EnrichedRow::from(e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the enriched dump to `path`, creating the parent directory if needed.
pub fn save_enriched(path: &Path, enriched: &[EnrichedTransaction], delimiter: u8) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    write_enriched(file, enriched, delimiter).map_err(|source| Error::CsvWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, ProductCatalog, ProductId};
    use crate::enrich::enrich;
    use crate::transaction::parse_line;

    #[test]
    fn test_write_enriched_rows() {
        let txs = vec![
            parse_line("T1,2024-01-05,East,SKU123,1500.00,3", b',').unwrap(),
            parse_line("T2,2024-01-06,West,SKU404,20.00,1", b',').unwrap(),
        ];
        let catalog = ProductCatalog::from_products(vec![Product {
            id: ProductId::Text("SKU123".into()),
            name: "Laptop".into(),
            category: "Electronics".into(),
            price: Decimal::from(400),
            brand: Some("Acme".into()),
            rating: Some(Decimal::new(45, 1)),
        }]);
        let enriched = enrich(&txs, &catalog);

        let mut buf = Vec::new();
        write_enriched(&mut buf, &enriched, b'|').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id|date|region|product_ref|amount|quantity|product_id|product_name|category|brand|unit_price|rating|margin|matched"
        );
        assert_eq!(
            lines[1],
            "T1|2024-01-05|East|SKU123|1500.00|3|SKU123|Laptop|Electronics|Acme|400|4.5|300.00|true"
        );
        assert_eq!(lines[2], "T2|2024-01-06|West|SKU404|20.00|1||||||||false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_enriched_empty_has_header() {
        let mut buf = Vec::new();
        write_enriched(&mut buf, &[], b',').unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, format!("{}\n", HEADER.join(",")));
    }
}
