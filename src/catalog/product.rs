use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Catalog ids come back as numbers from some APIs and as strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(n) => write!(f, "{}", n),
            ProductId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<Decimal>,
}

/// Product lookup keyed by id and by normalized name.
///
/// When two products share an id (or a normalized name) the first one seen
/// wins and later ones are ignored.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl ProductCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        let mut catalog = ProductCatalog::default();

        for product in products {
            let idx = catalog.products.len();
            let id_key = product.id.to_string();

            if catalog.by_id.contains_key(&id_key) {
                tracing::warn!(id = %id_key, name = %product.name, "Ignoring duplicate product id");
                continue;
            }
            catalog.by_id.insert(id_key, idx);

            let name_key = normalize_name(&product.name);
            if !name_key.is_empty() {
                if catalog.by_name.contains_key(&name_key) {
                    tracing::warn!(name = %product.name, "Duplicate product name, keeping first");
                } else {
                    catalog.by_name.insert(name_key, idx);
                }
            }

            catalog.products.push(product);
        }

        catalog
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Resolves a transaction's product reference: exact id first, then the
    /// numeric part of references like `P101`, then the normalized name.
    pub fn lookup(&self, reference: &str) -> Option<&Product> {
        let reference = reference.trim();

        let idx = self
            .by_id
            .get(reference)
            .or_else(|| numeric_id(reference).and_then(|id| self.by_id.get(&id)))
            .or_else(|| self.by_name.get(&normalize_name(reference)))?;

        self.products.get(*idx)
    }
}

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `P101` -> `101`, `P007` -> `7`. Only a `P` prefix is recognized, so
/// `SKU123` never falls through to catalog product `123`.
pub fn numeric_id(reference: &str) -> Option<String> {
    let digits = reference.strip_prefix(['P', 'p'])?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok().map(|n| n.to_string())
}
