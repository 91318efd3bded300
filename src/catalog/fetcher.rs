use crate::catalog::product::{Product, ProductCatalog};
use crate::error::FetchError;

use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Transport for catalog requests: returns the body of a successful GET.
pub trait CatalogSource {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpCatalogSource {
    client: reqwest::blocking::Client,
}

impl Default for HttpCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCatalogSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl CatalogSource for HttpCatalogSource {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }
}

/// Accepted response shapes: a bare array of products, or a paginated
/// object in the `{"products": [...], "total": N, "skip": S, "limit": L}` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    Bulk(Vec<Product>),
    Page(CatalogPage),
}

#[derive(Debug, Deserialize)]
struct CatalogPage {
    products: Vec<Product>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    pub base_url: String,
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for CatalogFetcher {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl CatalogFetcher {
    pub fn new(base_url: &str, page_size: usize) -> Self {
        Self {
            base_url: base_url.to_string(),
            page_size,
            ..Default::default()
        }
    }

    pub fn page_url(&self, skip: usize) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}limit={}&skip={}",
            self.base_url, separator, self.page_size, skip
        )
    }

    /// Retrieves every product, following pagination until the reported
    /// total is reached or a page comes back empty.
    pub fn fetch_all(&self, source: &dyn CatalogSource) -> Result<Vec<Product>, FetchError> {
        let mut products: Vec<Product> = Vec::new();

        for page_no in 0..self.max_pages {
            let url = self.page_url(products.len());
            debug!(page = page_no, %url, "Requesting catalog page");

            let body = source.get(&url)?;
            match serde_json::from_str::<CatalogResponse>(&body)? {
                CatalogResponse::Bulk(items) => {
                    products.extend(items);
                    return Ok(products);
                }
                CatalogResponse::Page(page) => {
                    let received = page.products.len();
                    products.extend(page.products);

                    let Some(total) = page.total else {
                        return Ok(products);
                    };
                    if received == 0 || products.len() >= total {
                        return Ok(products);
                    }
                }
            }
        }

        Err(FetchError::TooManyPages(self.max_pages))
    }

    pub fn fetch_catalog(&self, source: &dyn CatalogSource) -> Result<ProductCatalog, FetchError> {
        let products = self.fetch_all(source)?;
        info!(count = products.len(), url = %self.base_url, "Fetched product catalog");
        Ok(ProductCatalog::from_products(products))
    }
}
