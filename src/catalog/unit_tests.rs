use crate::catalog::fetcher::{CatalogFetcher, CatalogSource};
use crate::catalog::product::{normalize_name, numeric_id, Product, ProductCatalog, ProductId};
use crate::error::FetchError;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::str::FromStr;

struct StubSource {
    responses: RefCell<VecDeque<Result<String, FetchError>>>,
    requested: RefCell<Vec<String>>,
}

impl StubSource {
    fn new(responses: Vec<Result<String, FetchError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl CatalogSource for StubSource {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"products": [], "total": 0}"#.to_string()))
    }
}

fn product(id: u64, name: &str, category: &str, price: &str) -> Product {
    Product {
        id: ProductId::Number(id),
        name: name.to_string(),
        category: category.to_string(),
        price: Decimal::from_str(price).unwrap(),
        brand: None,
        rating: None,
    }
}

#[cfg(test)]
mod lookup_tests {
    use super::*;

    #[test]
    fn test_lookup_by_exact_id() {
        let catalog = ProductCatalog::from_products(vec![Product {
            id: ProductId::Text("SKU123".to_string()),
            ..product(0, "Laptop", "Electronics", "500")
        }]);

        let found = catalog.lookup("SKU123").unwrap();
        assert_eq!(found.category, "Electronics");
        assert_eq!(found.price, Decimal::from(500));
    }

    #[test]
    fn test_lookup_by_numeric_part_of_reference() {
        let catalog = ProductCatalog::from_products(vec![product(101, "Phone", "smartphones", "9.99")]);

        assert_eq!(catalog.lookup("P101").unwrap().name, "Phone");
        assert_eq!(catalog.lookup("101").unwrap().name, "Phone");
        assert!(catalog.lookup("P102").is_none());
        assert!(catalog.lookup("SKU101").is_none());
    }

    #[test]
    fn test_lookup_by_normalized_name() {
        let catalog =
            ProductCatalog::from_products(vec![product(1, "Essence  Mascara Lash", "beauty", "9.99")]);

        assert_eq!(catalog.lookup("  essence mascara LASH ").unwrap().id, ProductId::Number(1));
        assert!(catalog.lookup("mascara").is_none());
    }

    #[test]
    fn test_duplicate_ids_first_write_wins() {
        let catalog = ProductCatalog::from_products(vec![
            product(7, "First", "a", "1.00"),
            product(7, "Second", "b", "2.00"),
            product(8, "first", "c", "3.00"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("7").unwrap().name, "First");
        // Name collision keeps the earlier product for name lookups.
        assert_eq!(catalog.lookup("FIRST").unwrap().id, ProductId::Number(7));
        assert_eq!(catalog.lookup("8").unwrap().category, "c");
    }

    #[test]
    fn test_text_and_number_ids_share_keys() {
        let catalog = ProductCatalog::from_products(vec![
            Product {
                id: ProductId::Text("5".to_string()),
                ..product(0, "Text", "a", "1.00")
            },
            product(5, "Number", "b", "1.00"),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("P5").unwrap().name, "Text");
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let catalog = ProductCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.lookup("SKU123").is_none());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(normalize_name("  Red   Nail\tPolish "), "red nail polish");
        assert_eq!(numeric_id("P101"), Some("101".to_string()));
        assert_eq!(numeric_id("P007"), Some("7".to_string()));
        assert_eq!(numeric_id("SKU007"), None);
        assert_eq!(numeric_id("101"), None);
        assert_eq!(numeric_id("P10A"), None);
        assert_eq!(numeric_id("P"), None);
    }
}

#[cfg(test)]
mod fetch_tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let fetcher = CatalogFetcher::new("https://example.test/products", 30);
        assert_eq!(
            fetcher.page_url(60),
            "https://example.test/products?limit=30&skip=60"
        );

        let fetcher = CatalogFetcher::new("https://example.test/products?select=title", 10);
        assert_eq!(
            fetcher.page_url(0),
            "https://example.test/products?select=title&limit=10&skip=0"
        );
    }

    #[test]
    fn test_fetch_follows_pagination() {
        let source = StubSource::new(vec![
            Ok(r#"{"products": [
                {"id": 1, "title": "A", "category": "x", "price": 1.5, "brand": "B", "rating": 4.5},
                {"id": 2, "title": "B", "category": "y", "price": 2}
            ], "total": 3, "skip": 0, "limit": 2}"#
                .to_string()),
            Ok(r#"{"products": [
                {"id": 3, "title": "C", "category": "x", "price": 3}
            ], "total": 3, "skip": 2, "limit": 2}"#
                .to_string()),
        ]);
        let fetcher = CatalogFetcher::new("http://catalog.test/products", 2);

        let products = fetcher.fetch_all(&source).unwrap();

        assert_eq!(products.len(), 3);
        assert_eq!(products[0].brand.as_deref(), Some("B"));
        assert_eq!(products[0].price, Decimal::from_str("1.5").unwrap());
        assert_eq!(products[2].name, "C");
        assert_eq!(
            *source.requested.borrow(),
            vec![
                "http://catalog.test/products?limit=2&skip=0".to_string(),
                "http://catalog.test/products?limit=2&skip=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_fetch_accepts_bulk_array() {
        let source = StubSource::new(vec![Ok(
            r#"[{"id": "SKU123", "name": "Laptop", "category": "Electronics", "price": 500}]"#.to_string(),
        )]);

        let catalog = CatalogFetcher::default().fetch_catalog(&source).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("SKU123").unwrap().category, "Electronics");
        assert_eq!(source.requested.borrow().len(), 1);
    }

    #[test]
    fn test_fetch_stops_on_empty_page() {
        let source = StubSource::new(vec![
            Ok(r#"{"products": [{"id": 1, "title": "A", "category": "x", "price": 1}], "total": 10}"#.to_string()),
            Ok(r#"{"products": [], "total": 10}"#.to_string()),
        ]);

        let products = CatalogFetcher::new("http://catalog.test", 1).fetch_all(&source).unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(source.requested.borrow().len(), 2);
    }

    #[test]
    fn test_fetch_page_without_total_is_single_call() {
        let source = StubSource::new(vec![Ok(
            r#"{"products": [{"id": 1, "title": "A", "category": "x", "price": 1}]}"#.to_string(),
        )]);

        let products = CatalogFetcher::default().fetch_all(&source).unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(source.requested.borrow().len(), 1);
    }

    #[test]
    fn test_fetch_propagates_transport_error() {
        let source = StubSource::new(vec![Err(FetchError::Status {
            status: 503,
            url: "http://catalog.test".to_string(),
        })]);

        let result = CatalogFetcher::default().fetch_catalog(&source);

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }

    #[test]
    fn test_fetch_rejects_malformed_json() {
        let source = StubSource::new(vec![Ok("<html>oops</html>".to_string())]);

        let result = CatalogFetcher::default().fetch_all(&source);

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_fetch_gives_up_after_max_pages() {
        let page = r#"{"products": [{"id": 1, "title": "A", "category": "x", "price": 1}], "total": 1000000}"#;
        let source = StubSource::new((0..5).map(|_| Ok(page.to_string())).collect());
        let fetcher = CatalogFetcher {
            max_pages: 3,
            ..CatalogFetcher::new("http://catalog.test", 1)
        };

        let result = fetcher.fetch_all(&source);

        assert!(matches!(result, Err(FetchError::TooManyPages(3))));
        assert_eq!(source.requested.borrow().len(), 3);
    }
}
