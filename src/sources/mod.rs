//! Source adapters: fetch, extract and normalize one publisher's figures.
//!
//! Each adapter is an explicit struct behind the [`SourceAdapter`] trait. The
//! zone registry picks them by parser id from [`catalog`] at startup.

pub mod catalog;
pub mod delimited;
pub mod press_release;
pub mod pxweb;
pub mod spreadsheet;
pub mod vehicle_lookup;

pub use delimited::DelimitedSource;
pub use press_release::PressReleasePdfSource;
pub use pxweb::PxWebSource;
pub use spreadsheet::{LandingPage, SpreadsheetSource};
pub use vehicle_lookup::VehicleLookupSource;

use crate::config::{CollectorConfig, SourcesConfig};
use crate::error::CollectError;
use crate::fetch::Fetcher;
use crate::model::{CanonicalRecord, FuelTotals, MonthKey};
use crate::taxonomy::{AliasTable, Taxonomy};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Per (country, month) collection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthState {
    Pending,
    Fetching,
    Extracting,
    Normalizing,
    Persisted,
    Skipped,
    Failed,
}

impl fmt::Display for MonthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MonthState::Pending => "pending",
            MonthState::Fetching => "fetching",
            MonthState::Extracting => "extracting",
            MonthState::Normalizing => "normalizing",
            MonthState::Persisted => "persisted",
            MonthState::Skipped => "skipped",
            MonthState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Logs a state transition of one month.
pub fn transition(region: &str, month: MonthKey, state: MonthState) {
    tracing::debug!(country = region, month = %month, state = %state, "Month state");
}

/// Trait for per-publisher collection pipelines.
///
/// Implementors must be thread-safe (Send + Sync) so zones can be driven from
/// any runtime worker.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Parser id the adapter was resolved from.
    fn id(&self) -> &str;

    /// Collects `month`.
    ///
    /// A document covering several months may yield records for the other
    /// months too; the orchestrator persists those that are still missing.
    /// Records without entries are never returned.
    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError>;
}

/// Shared handles every adapter is built from.
#[derive(Clone)]
pub struct SourceContext {
    pub fetcher: Arc<Fetcher>,
    pub taxonomy: Arc<Taxonomy>,
    pub collector: CollectorConfig,
    pub sources: SourcesConfig,
}

impl SourceContext {
    pub fn new(
        fetcher: Arc<Fetcher>,
        taxonomy: Arc<Taxonomy>,
        collector: CollectorConfig,
        sources: SourcesConfig,
    ) -> Self {
        Self {
            fetcher,
            taxonomy,
            collector,
            sources,
        }
    }

    /// Alias table of `namespace`, empty when none is registered.
    pub fn table(&self, namespace: &str) -> AliasTable {
        match self.taxonomy.table(namespace) {
            Some(table) => table.clone(),
            None => {
                tracing::warn!(namespace, "No alias table, every label will map to OTHER");
                AliasTable::new(namespace)
            }
        }
    }
}

/// Turns extracted periods into records, dropping periods with no entries.
pub(crate) fn records_from(region: &str, periods: Vec<(MonthKey, FuelTotals)>) -> Vec<CanonicalRecord> {
    periods
        .into_iter()
        .filter(|(_, totals)| !totals.is_empty())
        .map(|(key, totals)| CanonicalRecord::from_totals(region, key, totals))
        .collect()
}
