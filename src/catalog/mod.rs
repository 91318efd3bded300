pub mod fetcher;
pub mod product;

pub use fetcher::{CatalogFetcher, CatalogSource, HttpCatalogSource};
pub use product::{Product, ProductCatalog, ProductId};

#[cfg(test)]
mod unit_tests;
