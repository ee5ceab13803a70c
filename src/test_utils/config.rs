//! Configurations tuned for tests: no politeness delay, short retries.

use crate::config::{CollectorConfig, SourcesConfig};
use crate::fetch::Fetcher;
use crate::sources::SourceContext;
use crate::taxonomy::Taxonomy;
use std::sync::Arc;

pub fn test_collector_config() -> CollectorConfig {
    CollectorConfig {
        start_year: 2023,
        politeness_delay_ms: 0,
        max_redirects: 3,
        request_timeout_sec: 5,
        retry_delay_ms: 10,
        max_concurrent_requests: 2,
        page_size: 100,
        lookup_batch_size: 50,
    }
}

/// Every publisher pointed at `base_url`.
pub fn test_sources_config(base_url: &str) -> SourcesConfig {
    SourcesConfig {
        fr_url: base_url.to_string(),
        dk_url: base_url.to_string(),
        se_url: format!("{}/PersBilarDrivMedel", base_url),
        no_url: base_url.to_string(),
        cn_url: base_url.to_string(),
        nl_url: base_url.to_string(),
        press_release_url: base_url.to_string(),
    }
}

pub fn test_source_context(base_url: &str) -> SourceContext {
    let collector = test_collector_config();
    let fetcher = Fetcher::new(&collector).expect("test fetcher");
    SourceContext::new(
        Arc::new(fetcher),
        Arc::new(Taxonomy::builtin()),
        collector,
        test_sources_config(base_url),
    )
}
