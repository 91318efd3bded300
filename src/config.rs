use crate::catalog::fetcher::{DEFAULT_CATALOG_URL, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::error::ConfigError;
use crate::filter::FilterCriteria;
use crate::report::DEFAULT_CURRENCY_SYMBOL;
use crate::transaction::Region;

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub enriched_output: PathBuf,
    pub write_enriched: bool,
    pub delimiter: char,
    pub has_header: bool,
    pub currency_symbol: String,
    pub catalog: CatalogConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub url: String,
    pub page_size: usize,
    pub max_pages: usize,
    /// Skip the fetch entirely and run with an empty catalog.
    pub offline: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub regions: Vec<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("sales_data.txt"),
            output: PathBuf::from("output/sales_report.txt"),
            enriched_output: PathBuf::from("data/enriched_sales_data.txt"),
            write_enriched: true,
            delimiter: ',',
            has_header: true,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            catalog: CatalogConfig::default(),
            filter: FilterConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            offline: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' || self.delimiter == '\n' {
            return Err(ConfigError::Invalid {
                message: format!("unsupported delimiter {:?}", self.delimiter),
            });
        }
        Ok(self.delimiter as u8)
    }

    /// Checks every setting that cannot be expressed in the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        self.filter_criteria()?;
        if self.catalog.page_size == 0 || self.catalog.max_pages == 0 {
            return Err(ConfigError::Invalid {
                message: "catalog page_size and max_pages must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn filter_criteria(&self) -> Result<FilterCriteria, ConfigError> {
        let mut criteria = FilterCriteria {
            min_amount: self.filter.min_amount,
            max_amount: self.filter.max_amount,
            ..Default::default()
        };

        for name in &self.filter.regions {
            let region = Region::from(name.as_str());
            if !region.is_known() {
                return Err(ConfigError::Invalid {
                    message: format!("unknown region '{}' in filter", name),
                });
            }
            criteria.regions.insert(region);
        }

        if let (Some(min), Some(max)) = (criteria.min_amount, criteria.max_amount) {
            if min > max {
                return Err(ConfigError::Invalid {
                    message: format!("min_amount {} is greater than max_amount {}", min, max),
                });
            }
        }

        Ok(criteria)
    }
}
