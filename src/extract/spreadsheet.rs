//! Tabular spreadsheet extraction.
//!
//! The header row is found by content rather than index because publishers
//! insert titles and notes above the table from one year to the next.

use super::tokens::parse_count;
use crate::error::CollectError;
use crate::model::{FuelCode, FuelTotals, MonthKey, PeriodFormat};
use crate::taxonomy::{normalize_label, AliasTable};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use std::io::Cursor;

/// Cell text of the first worksheet, row by row.
pub type Grid = Vec<Vec<String>>;

/// How the data rows of a sheet are laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetMode {
    /// One row per period, keyed by the date column
    PeriodRows { period_format: PeriodFormat },
    /// A single grand-total row for the whole document
    GrandTotal {
        /// Row marker and total column header, e.g. `"i alt"`
        total_labels: Vec<String>,
        /// Bucket receiving `total - sum(known)` when not published
        residual: FuelCode,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct HeaderMap {
    row: usize,
    fuel_columns: Vec<(usize, FuelCode)>,
    date_column: usize,
}

/// Reads the first worksheet of an xlsx/xls/ods document into a [`Grid`].
///
/// Date cells are rendered as `YYYY-MM` so they match [`PeriodFormat::Iso`].
pub fn load_grid(bytes: &[u8]) -> Result<Grid, CollectError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| CollectError::structure(format!("unreadable spreadsheet: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CollectError::structure("spreadsheet has no worksheet"))?
        .map_err(|e| CollectError::structure(format!("unreadable worksheet: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

fn find_header(grid: &Grid, table: &AliasTable) -> Option<HeaderMap> {
    let aliases: Vec<&str> = table.aliases().map(|(text, _)| text).collect();

    let row = grid.iter().position(|cells| {
        cells
            .iter()
            .any(|cell| aliases.contains(&normalize_label(cell).as_str()))
    })?;

    let fuel_columns: Vec<(usize, FuelCode)> = grid[row]
        .iter()
        .enumerate()
        .filter(|(_, cell)| !cell.trim().is_empty())
        .map(|(index, cell)| (index, table.normalize(cell)))
        .filter(|(_, code)| code.is_resolved())
        .collect();

    let width = grid[row].len();
    let date_column = (0..width).find(|i| !fuel_columns.iter().any(|(c, _)| c == i))?;

    Some(HeaderMap {
        row,
        fuel_columns,
        date_column,
    })
}

fn row_totals(cells: &[String], header: &HeaderMap) -> FuelTotals {
    let mut totals = FuelTotals::new();
    for (column, code) in &header.fuel_columns {
        // negative and non-numeric cells parse to None and are dropped
        if let Some(value) = cells.get(*column).and_then(|c| parse_count(c)) {
            totals.add(*code, value);
        }
    }
    totals
}

/// Extracts one [`FuelTotals`] per row whose date cell matches `period_format`.
///
/// Rows are returned in sheet order; a period appearing twice is summed.
pub fn extract_period_rows(
    grid: &Grid,
    table: &AliasTable,
    period_format: PeriodFormat,
) -> Result<Vec<(MonthKey, FuelTotals)>, CollectError> {
    let header = find_header(grid, table)
        .ok_or_else(|| CollectError::structure("no header row with a known fuel label"))?;
    tracing::trace!(row = header.row, columns = header.fuel_columns.len(), "Header row found");

    let mut periods: Vec<(MonthKey, FuelTotals)> = Vec::new();
    for cells in grid.iter().skip(header.row + 1) {
        let Some(key) = cells
            .get(header.date_column)
            .and_then(|c| period_format.parse(c))
        else {
            continue;
        };
        let totals = row_totals(cells, &header);
        match periods.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => totals.iter().for_each(|(code, v)| existing.add(code, v)),
            None => periods.push((key, totals)),
        }
    }

    if periods.is_empty() {
        return Err(CollectError::structure(format!(
            "no row in column {} matches the period format",
            header.date_column
        )));
    }
    Ok(periods)
}

/// Extracts the grand-total row and derives the residual bucket.
pub fn extract_grand_total(
    grid: &Grid,
    table: &AliasTable,
    total_labels: &[String],
    residual: FuelCode,
) -> Result<FuelTotals, CollectError> {
    let header = find_header(grid, table)
        .ok_or_else(|| CollectError::structure("no header row with a known fuel label"))?;
    let labels: Vec<String> = total_labels.iter().map(|l| normalize_label(l)).collect();
    let is_total = |cell: &String| labels.contains(&normalize_label(cell));
    let is_fuel_column = |index: usize| header.fuel_columns.iter().any(|(c, _)| *c == index);

    let total_column = grid[header.row]
        .iter()
        .enumerate()
        .find(|(index, cell)| !is_fuel_column(*index) && is_total(cell))
        .map(|(index, _)| index);

    let cells = grid
        .iter()
        .skip(header.row + 1)
        .find(|cells| {
            cells
                .iter()
                .enumerate()
                .any(|(index, cell)| !is_fuel_column(index) && is_total(cell))
        })
        .ok_or_else(|| CollectError::structure("no grand-total row"))?;

    let mut totals = row_totals(cells, &header);
    let reported = total_column
        .and_then(|c| cells.get(c))
        .and_then(|c| parse_count(c));

    if let Some(total) = reported {
        let known = totals.sum();
        if totals.get(residual).is_some() {
            tracing::trace!(%residual, "Residual bucket already published");
        } else if total > known {
            totals.add(residual, total - known);
        } else if total < known {
            tracing::warn!(total, known, %residual, "Reported total below known buckets, residual dropped");
        }
    }
    Ok(totals)
}
