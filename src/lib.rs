pub mod catalog;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod transaction;

use crate::error::Error;
use std::fs;
use std::path::Path;

/// A non-blank line of the input file together with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub text: String,
}

/// Reads the input file into raw lines, dropping blank lines and, when
/// `has_header` is set, the first non-blank line.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read.
pub fn read_sales_lines(path: impl AsRef<Path>, has_header: bool) -> Result<Vec<RawLine>, Error> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let content = String::from_utf8_lossy(&bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(content.as_ref());

    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| RawLine {
            number: idx + 1,
            text: line.trim().to_string(),
        });

    if has_header {
        if let Some(header) = lines.next() {
            tracing::debug!(header = %header.text, "Skipping header row");
        }
    }

    Ok(lines.collect())
}
