//! Delimited text (CSV and friends) in long format: one row per
//! (region, period, fuel) observation.

use super::tokens::parse_count;
use crate::error::CollectError;
use crate::model::{FuelTotals, MonthKey, PeriodFormat};
use crate::taxonomy::AliasTable;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;

/// Field names and encodings of a delimited source.
#[derive(Debug, Clone)]
pub struct DelimitedLayout {
    pub delimiter: u8,
    pub period_field: String,
    pub period_format: PeriodFormat,
    pub fuel_field: String,
    pub value_field: String,
    /// Field holding the region; `None` when the file is national only
    pub region_field: Option<String>,
    /// Region values that denote the national aggregate
    pub national_values: Vec<String>,
}

struct Columns {
    period: usize,
    fuel: usize,
    value: usize,
    region: Option<usize>,
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, CollectError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CollectError::structure(format!("missing field '{}'", name)))
}

impl DelimitedLayout {
    fn columns(&self, headers: &StringRecord) -> Result<Columns, CollectError> {
        Ok(Columns {
            period: column(headers, &self.period_field)?,
            fuel: column(headers, &self.fuel_field)?,
            value: column(headers, &self.value_field)?,
            region: self
                .region_field
                .as_deref()
                .map(|name| column(headers, name))
                .transpose()?,
        })
    }

    fn is_national(&self, region: &str) -> bool {
        self.national_values
            .iter()
            .any(|n| n.trim().eq_ignore_ascii_case(region.trim()))
    }
}

/// Accumulates national totals by period and canonical fuel code.
///
/// Rows with an unparseable period or value are skipped. Fields that are not
/// valid UTF-8 are decoded lossily, so a Latin-1 region name only affects its
/// own row. The result is ordered by period.
pub fn extract(
    bytes: &[u8],
    layout: &DelimitedLayout,
    table: &AliasTable,
) -> Result<Vec<(MonthKey, FuelTotals)>, CollectError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader
        .byte_headers()
        .map_err(|e| CollectError::structure(format!("unreadable header: {}", e)))?
        .clone();
    let columns = layout.columns(&StringRecord::from_byte_record_lossy(headers))?;

    let mut periods: BTreeMap<MonthKey, FuelTotals> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in reader.byte_records() {
        let row = row.map_err(|e| CollectError::structure(format!("malformed row: {}", e)))?;
        let row = StringRecord::from_byte_record_lossy(row);

        if let Some(region) = columns.region {
            if !layout.is_national(row.get(region).unwrap_or_default()) {
                continue;
            }
        }
        let Some(key) = row
            .get(columns.period)
            .and_then(|p| layout.period_format.parse(p))
        else {
            skipped += 1;
            continue;
        };
        let Some(value) = row.get(columns.value).and_then(parse_count) else {
            skipped += 1;
            continue;
        };

        let code = table.normalize(row.get(columns.fuel).unwrap_or_default());
        periods.entry(key).or_default().add(code, value);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped rows with unparseable period or value");
    }
    Ok(periods.into_iter().collect())
}
