use crate::catalog::{Product, ProductCatalog};
use crate::transaction::Transaction;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedProduct {
    pub product: Product,
    /// Catalog unit price times the transaction quantity.
    pub catalog_value: Decimal,
    /// Transaction amount minus `catalog_value`.
    pub margin: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductMatch {
    Matched(MatchedProduct),
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub product: ProductMatch,
}

impl EnrichedTransaction {
    pub fn is_matched(&self) -> bool {
        matches!(self.product, ProductMatch::Matched(_))
    }

    pub fn matched(&self) -> Option<&MatchedProduct> {
        match &self.product {
            ProductMatch::Matched(m) => Some(m),
            ProductMatch::Unmatched => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.matched().map(|m| m.product.category.as_str())
    }

    pub fn revenue(&self) -> Decimal {
        self.transaction.amount
    }
}

pub fn enrich_transaction(tx: &Transaction, catalog: &ProductCatalog) -> EnrichedTransaction {
    let product = match catalog.lookup(&tx.product_ref) {
        Some(product) => {
            // Catalog prices are unbounded, so saturate instead of overflowing.
            let catalog_value = product.price.saturating_mul(Decimal::from(tx.quantity));
            ProductMatch::Matched(MatchedProduct {
                product: product.clone(),
                catalog_value,
                margin: tx.amount.saturating_sub(catalog_value),
            })
        }
        None => {
            tracing::debug!(id = %tx.id, product_ref = %tx.product_ref, "No catalog entry");
            ProductMatch::Unmatched
        }
    };

    EnrichedTransaction {
        transaction: tx.clone(),
        product,
    }
}

/// Joins each transaction against the catalog. The output has the same
/// length and order as the input.
pub fn enrich(transactions: &[Transaction], catalog: &ProductCatalog) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .map(|tx| enrich_transaction(tx, catalog))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductId;
    use crate::transaction::{parse_line, Region};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn laptop() -> Product {
        Product {
            id: ProductId::Text("SKU123".to_string()),
            name: "Laptop".to_string(),
            category: "Electronics".to_string(),
            price: Decimal::from(500),
            brand: Some("Acme".to_string()),
            rating: None,
        }
    }

    #[test]
    fn test_enrich_matched() {
        let tx = parse_line("T1,2024-01-05,East,SKU123,1500.00,3", b',').unwrap();
        let catalog = ProductCatalog::from_products(vec![laptop()]);

        let enriched = enrich_transaction(&tx, &catalog);

        assert!(enriched.is_matched());
        assert_eq!(enriched.category(), Some("Electronics"));
        assert_eq!(enriched.revenue(), Decimal::from_str("1500.00").unwrap());
        let matched = enriched.matched().unwrap();
        assert_eq!(matched.catalog_value, Decimal::from(1500));
        assert_eq!(matched.margin, Decimal::ZERO);
        assert_eq!(enriched.transaction, tx);
    }

    #[test]
    fn test_enrich_unmatched_keeps_fields() {
        let tx = parse_line("T1,2024-01-05,East,SKU123,1500.00,3", b',').unwrap();
        let catalog = ProductCatalog::from_products(vec![Product {
            id: ProductId::Text("SKU999".to_string()),
            ..laptop()
        }]);

        let enriched = enrich_transaction(&tx, &catalog);

        assert_eq!(enriched.product, ProductMatch::Unmatched);
        assert_eq!(enriched.category(), None);
        assert_eq!(enriched.transaction, tx);
    }

    #[test]
    fn test_margin_can_be_negative() {
        let tx = Transaction::new(
            "T2",
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            Region::West,
            "SKU123",
            Decimal::from(900),
            2,
        );
        let catalog = ProductCatalog::from_products(vec![laptop()]);

        let matched = enrich_transaction(&tx, &catalog).matched().cloned().unwrap();

        assert_eq!(matched.catalog_value, Decimal::from(1000));
        assert_eq!(matched.margin, Decimal::from(-100));
    }

    #[test]
    fn test_enrich_saturates_on_huge_catalog_price() {
        let tx = parse_line("T1,2024-01-05,East,SKU123,10.00,1000", b',').unwrap();
        let catalog = ProductCatalog::from_products(vec![Product {
            price: Decimal::MAX,
            ..laptop()
        }]);

        let matched = enrich_transaction(&tx, &catalog).matched().cloned().unwrap();

        assert_eq!(matched.catalog_value, Decimal::MAX);
        assert!(matched.margin < Decimal::ZERO);
    }

    #[test]
    fn test_enrich_preserves_length_and_order() {
        let lines = [
            "T1,2024-01-05,East,SKU123,1500.00,3",
            "T2,2024-01-05,West,SKU404,10.00,1",
            "T3,2024-01-06,North,Laptop,500.00,1",
        ];
        let txs: Vec<_> = lines.iter().map(|l| parse_line(l, b',').unwrap()).collect();
        let catalog = ProductCatalog::from_products(vec![laptop()]);

        let enriched = enrich(&txs, &catalog);

        assert_eq!(enriched.len(), txs.len());
        let ids: Vec<_> = enriched.iter().map(|e| e.transaction.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
        let matched: Vec<_> = enriched.iter().map(|e| e.is_matched()).collect();
        assert_eq!(matched, vec![true, false, true]);
    }

    #[test]
    fn test_enrich_with_empty_catalog_marks_everything_unmatched() {
        let txs = vec![parse_line("T1,2024-01-05,East,SKU123,1500.00,3", b',').unwrap()];

        let enriched = enrich(&txs, &ProductCatalog::empty());

        assert!(enriched.iter().all(|e| !e.is_matched()));
        assert_eq!(enriched.len(), 1);
    }
}
