use super::fuel::FuelCode;
use super::month_key::MonthKey;
use serde_derive::{Deserialize, Serialize};

/// Brand/model value used when a source only publishes aggregates.
pub const AGGREGATE_MARKER: &str = "ALL";

/// Record type tag written to every canonical file.
pub const RECORD_TYPE: &str = "all";

/// One count line of a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelEntry {
    #[serde(rename = "marque")]
    pub brand: String,
    #[serde(rename = "modele")]
    pub model: String,
    pub total: u64,
    #[serde(rename = "energie")]
    pub fuel_code: FuelCode,
}

impl FuelEntry {
    /// Aggregate entry with no brand/model breakdown.
    pub fn aggregate(fuel_code: FuelCode, total: u64) -> Self {
        Self {
            brand: AGGREGATE_MARKER.to_string(),
            model: AGGREGATE_MARKER.to_string(),
            total,
            fuel_code,
        }
    }
}

/// Normalized monthly registration counts for one country.
///
/// Serialized as `{year, month, region, type, data: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub year: i32,
    pub month: u32,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "data")]
    pub entries: Vec<FuelEntry>,
}

impl CanonicalRecord {
    pub fn new(region: impl Into<String>, key: MonthKey) -> Self {
        Self {
            year: key.year(),
            month: key.month(),
            region: region.into(),
            kind: RECORD_TYPE.to_string(),
            entries: Vec::new(),
        }
    }

    /// Builds an aggregate-only record, one entry per fuel code.
    pub fn from_totals(region: impl Into<String>, key: MonthKey, totals: FuelTotals) -> Self {
        let mut record = Self::new(region, key);
        record.entries = totals.into_entries();
        record
    }

    pub fn month_key(&self) -> Option<MonthKey> {
        MonthKey::new(self.year, self.month)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entries carrying `code`.
    pub fn total_for(&self, code: FuelCode) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.fuel_code == code)
            .map(|e| e.total)
            .sum()
    }

    pub fn has_fuel(&self, code: FuelCode) -> bool {
        self.entries.iter().any(|e| e.fuel_code == code)
    }
}

/// Per-fuel accumulator preserving first-insertion order.
///
/// Zero additions are ignored so a bucket only appears once it holds a
/// positive count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuelTotals {
    buckets: Vec<(FuelCode, u64)>,
}

impl FuelTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, code: FuelCode, value: u64) {
        if value == 0 {
            return;
        }
        match self.buckets.iter_mut().find(|(c, _)| *c == code) {
            Some((_, total)) => *total += value,
            None => self.buckets.push((code, value)),
        }
    }

    pub fn get(&self, code: FuelCode) -> Option<u64> {
        self.buckets
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, total)| *total)
    }

    pub fn sum(&self) -> u64 {
        self.buckets.iter().map(|(_, total)| total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuelCode, u64)> + '_ {
        self.buckets.iter().copied()
    }

    pub fn into_entries(self) -> Vec<FuelEntry> {
        self.buckets
            .into_iter()
            .map(|(code, total)| FuelEntry::aggregate(code, total))
            .collect()
    }
}

impl FromIterator<(FuelCode, u64)> for FuelTotals {
    fn from_iter<T: IntoIterator<Item = (FuelCode, u64)>>(iter: T) -> Self {
        let mut totals = FuelTotals::new();
        for (code, value) in iter {
            totals.add(code, value);
        }
        totals
    }
}
