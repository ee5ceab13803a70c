//! Country rows from multi-country PDF tables.
//!
//! The documents carry no table structure. Text fragments are clustered into
//! visual rows, the target country's row is located by name and numeric
//! density, and its counts are assigned to fuel slots by position.

pub mod layout;
pub mod slots;
pub mod text;

pub use layout::{cluster_rows, TextRow};
pub use slots::SlotPolicy;
pub use text::{extract_pages, TextFragment};

use crate::error::CollectError;
use crate::model::FuelTotals;

/// Which row to look for and how to read it.
#[derive(Debug, Clone)]
pub struct CountryRowQuery {
    /// Used in error messages
    pub country: String,
    /// Spellings of the country as printed in the table
    pub names: Vec<String>,
    /// Counts a row needs before it is taken as a data row
    pub min_row_integers: usize,
}

impl CountryRowQuery {
    fn matches(&self, row: &TextRow) -> bool {
        let text = row.text().to_lowercase();
        self.names
            .iter()
            .any(|name| text.contains(&name.to_lowercase()))
    }
}

/// Counts of the first qualifying row, scanning pages in order.
pub fn find_country_row(
    pages: &[Vec<TextFragment>],
    query: &CountryRowQuery,
) -> Result<Vec<u64>, CollectError> {
    for (page, fragments) in pages.iter().enumerate() {
        for row in cluster_rows(fragments) {
            if !query.matches(&row) {
                continue;
            }
            let integers = row.integers();
            if integers.len() >= query.min_row_integers {
                tracing::trace!(page, y = row.y, counts = integers.len(), "Country row found");
                return Ok(integers);
            }
            tracing::trace!(page, y = row.y, "Row mentions country but holds too few counts");
        }
    }
    Err(CollectError::country_not_found(&query.country))
}

/// Extracts the country's current-period totals from already-read pages.
pub fn extract_country(
    pages: &[Vec<TextFragment>],
    query: &CountryRowQuery,
    policy: &SlotPolicy,
) -> Result<FuelTotals, CollectError> {
    let values = find_country_row(pages, query)?;
    let layout = policy.select(values.len())?;
    tracing::debug!(
        country = %query.country,
        layout = layout.version(),
        counts = values.len(),
        "Assigning country row"
    );
    Ok(layout.assign(&values))
}

/// Reads `bytes` as a PDF and extracts the country's totals.
pub fn extract_country_from_pdf(
    bytes: &[u8],
    query: &CountryRowQuery,
    policy: &SlotPolicy,
) -> Result<FuelTotals, CollectError> {
    let pages = extract_pages(bytes)?;
    extract_country(&pages, query, policy)
}
