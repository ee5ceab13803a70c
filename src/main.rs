//! Vehicle Registrations Harmonizer
//!
//! Collects monthly new-vehicle registration statistics from national
//! publishers and writes them as canonical per-country JSON records.
//!
//! # Architecture
//!
//! Each country (zone) names one or more source adapters. For every zone the
//! orchestrator lists the months between January of the start year and the
//! current month that have no record yet, and collects them one by one:
//! - **fetch**: try the month's candidate URLs, or query the publisher's API
//! - **extract**: read the spreadsheet, PDF, delimited file or JSON-stat table
//! - **normalize**: map publisher fuel labels to canonical fuel codes
//! - **persist**: write the record once; existing records are never touched
//!
//! A month that fails is logged and retried on the next run.

mod config;
mod error;
mod estimate;
mod extract;
mod fetch;
mod model;
mod orchestrator;
mod registry;
mod sources;
mod store;
mod taxonomy;

#[cfg(test)]
mod test_utils;

use crate::fetch::Fetcher;
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::registry::Registry;
use crate::sources::SourceContext;
use crate::store::CanonicalStore;
use crate::taxonomy::Taxonomy;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser, Debug)]
#[command(version, about = "Harmonizes monthly vehicle registration statistics")]
struct Cli {
    /// Country code to collect, e.g. FR. Every configured zone when omitted.
    zone: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let app_config = match config::load_app_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(app_config.log_level())
        .init();

    match run(cli).await {
        Ok(Some(summary)) => {
            tracing::info!(
                persisted = summary.persisted,
                skipped = summary.skipped,
                failed = summary.failed,
                "Collection finished"
            );
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", anyhow::Error::new(err));
            ExitCode::FAILURE
        }
    }
}

/// Collects the selected zones.
///
/// `None` when a termination signal interrupted the run. Records already
/// written stay; the next run picks up the remaining months.
async fn run(cli: Cli) -> error::Result<Option<RunSummary>> {
    let collector_config = config::load_collector_config()?;
    collector_config.validate()?;
    let store_config = config::load_store_config()?;
    let sources_config = config::load_sources_config()?;

    let registry = Registry::builtin();
    let entries = registry.select(cli.zone.as_deref())?;

    let fetcher = Arc::new(Fetcher::new(&collector_config)?);
    let context = SourceContext::new(
        fetcher,
        Arc::new(Taxonomy::builtin()),
        collector_config.clone(),
        sources_config,
    );
    let zones = Registry::resolve(&entries, &context);

    let store = Arc::new(CanonicalStore::new(&store_config));
    tracing::info!(
        zones = zones.len(),
        root = %store.root().display(),
        start_year = collector_config.start_year,
        "Starting collection"
    );
    let orchestrator = Orchestrator::new(store, collector_config.start_year);

    let mut sig_term = signal(SignalKind::terminate()).map_err(anyhow::Error::from)?;
    tokio::select! {
        summary = orchestrator.run(&zones) => Ok(Some(summary)),
        _ = sig_term.recv() => {
            tracing::warn!("Received SIGTERM, stopping before the remaining months");
            Ok(None)
        }
        _ = ctrl_c() => {
            tracing::warn!("Received SIGINT, stopping before the remaining months");
            Ok(None)
        }
    }
}
