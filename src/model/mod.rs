//! Core data model: month keys, canonical fuel codes and canonical records.

pub mod fuel;
pub mod month_key;
pub mod record;

pub use fuel::FuelCode;
pub use month_key::{Locale, MonthKey, PeriodFormat};
pub use record::{CanonicalRecord, FuelEntry, FuelTotals, AGGREGATE_MARKER};
