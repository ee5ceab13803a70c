//! Incremental per-country collection.
//!
//! For every zone the orchestrator asks the store which months are still
//! missing and walks them oldest first, trying the zone's adapters in order.
//! A month's failure is logged and counted; it never stops the run.

use crate::error::{CollectError, StorageError};
use crate::model::{month_key, CanonicalRecord, MonthKey};
use crate::registry::Zone;
use crate::sources::{transition, MonthState};
use crate::store::CanonicalStore;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::AddAssign;
use std::sync::Arc;

/// Month counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.persisted += other.persisted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} persisted, {} skipped, {} failed",
            self.persisted, self.skipped, self.failed
        )
    }
}

enum Persist {
    Written,
    AlreadyThere,
    Failed,
}

pub struct Orchestrator {
    store: Arc<CanonicalStore>,
    start_year: i32,
}

impl Orchestrator {
    pub fn new(store: Arc<CanonicalStore>, start_year: i32) -> Self {
        Self { store, start_year }
    }

    /// Collects every zone from January of the start year to the current month.
    ///
    /// Zones run one after another.
    pub async fn run(&self, zones: &[Zone]) -> RunSummary {
        let months = month_key::generate(self.start_year);
        let mut total = RunSummary::default();
        for zone in zones {
            let summary = self.collect_months(zone, &months).await;
            tracing::info!(country = %zone.code, %summary, "Zone done");
            total += summary;
        }
        total
    }

    /// Collects the months of `months` that are not persisted yet.
    pub async fn collect_months(&self, zone: &Zone, months: &[MonthKey]) -> RunSummary {
        let mut summary = RunSummary::default();

        let missing = match self.store.filter_missing(&zone.code, months) {
            Ok(missing) => missing,
            Err(e) => {
                tracing::error!(country = %zone.code, error = %e, "Store unavailable for zone");
                summary.failed = months.len();
                return summary;
            }
        };
        let persisted = already_persisted(months, &missing);
        for &month in &persisted {
            transition(&zone.code, month, MonthState::Skipped);
        }
        summary.skipped = persisted.len();
        if missing.is_empty() {
            return summary;
        }
        if zone.adapters.is_empty() {
            tracing::warn!(
                country = %zone.code,
                months = missing.len(),
                "No adapter to collect with"
            );
            summary.failed += missing.len();
            return summary;
        }
        tracing::info!(
            country = %zone.code,
            name = %zone.name,
            missing = missing.len(),
            first = %missing[0],
            "Collecting missing months"
        );

        // months still to visit; extra months persisted early are taken out
        let mut pending: BTreeSet<MonthKey> = missing.iter().copied().collect();

        for &month in &missing {
            if !pending.remove(&month) {
                continue;
            }
            if self.store.exists(&zone.code, month) {
                transition(&zone.code, month, MonthState::Skipped);
                summary.skipped += 1;
                continue;
            }
            transition(&zone.code, month, MonthState::Pending);

            let Some(records) = self.collect_month(zone, month).await else {
                transition(&zone.code, month, MonthState::Failed);
                summary.failed += 1;
                continue;
            };

            let mut target_done = false;
            for record in records.iter().filter(|r| !r.is_empty()) {
                let Some(key) = record.month_key() else {
                    continue;
                };
                if key == month && !target_done {
                    target_done = true;
                    let outcome = self.persist(&zone.code, month, record);
                    tally(&mut summary, outcome, &zone.code, month);
                } else if pending.remove(&key) {
                    let outcome = self.persist(&zone.code, key, record);
                    tally(&mut summary, outcome, &zone.code, key);
                }
            }
        }
        summary
    }

    /// Tries each adapter until one yields a non-empty record for `month`.
    async fn collect_month(&self, zone: &Zone, month: MonthKey) -> Option<Vec<CanonicalRecord>> {
        let mut last_error: Option<CollectError> = None;
        for adapter in &zone.adapters {
            match adapter.collect(month).await {
                Ok(records) => {
                    let covers_month = records
                        .iter()
                        .any(|r| r.month_key() == Some(month) && !r.is_empty());
                    if covers_month {
                        return Some(records);
                    }
                    tracing::debug!(
                        country = %zone.code,
                        month = %month,
                        parser = adapter.id(),
                        "Document has no data for month"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        country = %zone.code,
                        month = %month,
                        parser = adapter.id(),
                        error = %e,
                        "Adapter failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => {
                tracing::warn!(country = %zone.code, month = %month, error = %e, "Month failed")
            }
            None => {
                tracing::warn!(country = %zone.code, month = %month, "Month failed: no data published")
            }
        }
        None
    }

    fn persist(&self, country: &str, month: MonthKey, record: &CanonicalRecord) -> Persist {
        match self.store.write(country, record) {
            Ok(_) => Persist::Written,
            Err(StorageError::AlreadyExists { path }) => {
                tracing::debug!(country, month = %month, path = %path, "Record already persisted");
                Persist::AlreadyThere
            }
            Err(e) => {
                tracing::error!(
                    country,
                    month = %month,
                    error = %e,
                    "Month failed: record not persisted"
                );
                Persist::Failed
            }
        }
    }
}

/// Months of `months` the store left out of `missing`.
fn already_persisted(months: &[MonthKey], missing: &[MonthKey]) -> Vec<MonthKey> {
    let missing: BTreeSet<&MonthKey> = missing.iter().collect();
    months.iter().filter(|m| !missing.contains(m)).copied().collect()
}

fn tally(summary: &mut RunSummary, outcome: Persist, country: &str, month: MonthKey) {
    match outcome {
        Persist::Written => {
            transition(country, month, MonthState::Persisted);
            summary.persisted += 1;
        }
        Persist::AlreadyThere => {
            transition(country, month, MonthState::Skipped);
            summary.skipped += 1;
        }
        Persist::Failed => {
            transition(country, month, MonthState::Failed);
            summary.failed += 1;
        }
    }
}
