use super::{transition, MonthState, SourceAdapter};
use crate::error::CollectError;
use crate::extract::pdf::extract_country_from_pdf;
use crate::extract::{CountryRowQuery, SlotPolicy};
use crate::fetch::{expand_all, Fetcher, UrlTemplate};
use crate::model::{CanonicalRecord, Locale, MonthKey};
use async_trait::async_trait;
use std::sync::Arc;

/// One country's row of a monthly multi-country PDF press release.
pub struct PressReleasePdfSource {
    id: String,
    region: String,
    fetcher: Arc<Fetcher>,
    base_url: String,
    templates: Vec<UrlTemplate>,
    locale: Locale,
    query: CountryRowQuery,
    policy: SlotPolicy,
}

impl PressReleasePdfSource {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        fetcher: Arc<Fetcher>,
        base_url: impl Into<String>,
        templates: Vec<UrlTemplate>,
        locale: Locale,
        query: CountryRowQuery,
        policy: SlotPolicy,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            fetcher,
            base_url: base_url.into(),
            templates,
            locale,
            query,
            policy,
        }
    }
}

#[async_trait]
impl SourceAdapter for PressReleasePdfSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        transition(&self.region, month, MonthState::Fetching);
        let candidates = expand_all(&self.templates, &self.base_url, month, self.locale);
        let bytes = self.fetcher.fetch(&candidates).await?;

        transition(&self.region, month, MonthState::Extracting);
        let totals = extract_country_from_pdf(&bytes, &self.query, &self.policy)?;

        transition(&self.region, month, MonthState::Normalizing);
        if totals.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![CanonicalRecord::from_totals(&self.region, month, totals)])
    }
}
