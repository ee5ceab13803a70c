//! Named estimation strategies for figures a publisher leaves out.
//!
//! These are heuristics, not extraction: every application is logged and a
//! zone has to opt in explicitly.

use crate::model::{CanonicalRecord, FuelCode, FuelEntry};

/// Derives a `FOSSIL` bucket from the new-energy share of the market.
///
/// `nev_share` is an empirically chosen constant with no stated validity
/// window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NevRatioEstimate {
    nev_share: f64,
}

impl NevRatioEstimate {
    pub fn new(nev_share: f64) -> Option<Self> {
        (nev_share > 0.0 && nev_share < 1.0).then_some(Self { nev_share })
    }

    /// Estimated fossil count for `nev` new-energy registrations.
    pub fn fossil_for(&self, nev: u64) -> u64 {
        let total = (nev as f64 / self.nev_share).round() as u64;
        total.saturating_sub(nev)
    }

    /// Adds a `FOSSIL` entry when the record has new-energy counts and no
    /// combustion breakdown. Returns whether the record changed.
    pub fn apply(&self, record: &mut CanonicalRecord) -> bool {
        let has_combustion = [FuelCode::Diesel, FuelCode::Gasoline, FuelCode::Fossil]
            .iter()
            .any(|code| record.has_fuel(*code));
        if has_combustion {
            return false;
        }

        let nev: u64 = record
            .entries
            .iter()
            .filter(|e| e.fuel_code.is_nev())
            .map(|e| e.total)
            .sum();
        let fossil = self.fossil_for(nev);
        if fossil == 0 {
            return false;
        }

        tracing::info!(
            region = %record.region,
            year = record.year,
            month = record.month,
            nev,
            fossil,
            nev_share = self.nev_share,
            "Estimated FOSSIL from NEV ratio"
        );
        record.entries.push(FuelEntry::aggregate(FuelCode::Fossil, fossil));
        true
    }
}
