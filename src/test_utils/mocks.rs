//! Mock source adapters.

use crate::error::CollectError;
use crate::model::{CanonicalRecord, MonthKey};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Respond = Box<dyn Fn(MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> + Send + Sync>;

/// An adapter answering from a closure and counting its calls.
pub struct MockSourceAdapter {
    id: String,
    respond: Respond,
    calls: Arc<AtomicUsize>,
}

impl MockSourceAdapter {
    pub fn per_month<F>(id: &str, respond: F) -> Self
    where
        F: Fn(MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            respond: Box::new(respond),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, readable after the adapter moved into a zone.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceAdapter for MockSourceAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(month)
    }
}
