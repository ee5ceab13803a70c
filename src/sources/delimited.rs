use super::{records_from, transition, MonthState, SourceAdapter};
use crate::error::CollectError;
use crate::estimate::NevRatioEstimate;
use crate::extract::delimited::extract;
use crate::extract::DelimitedLayout;
use crate::fetch::{expand_all, Fetcher, UrlTemplate};
use crate::model::{CanonicalRecord, Locale, MonthKey};
use crate::taxonomy::AliasTable;
use async_trait::async_trait;
use std::sync::Arc;

/// Delimited text export, usually covering a whole year per file.
pub struct DelimitedSource {
    id: String,
    region: String,
    fetcher: Arc<Fetcher>,
    table: AliasTable,
    base_url: String,
    templates: Vec<UrlTemplate>,
    layout: DelimitedLayout,
    estimate: Option<NevRatioEstimate>,
}

impl DelimitedSource {
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        fetcher: Arc<Fetcher>,
        table: AliasTable,
        base_url: impl Into<String>,
        templates: Vec<UrlTemplate>,
        layout: DelimitedLayout,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            fetcher,
            table,
            base_url: base_url.into(),
            templates,
            layout,
            estimate: None,
        }
    }

    /// Opts the source into the NEV-ratio estimate.
    pub fn with_estimate(mut self, estimate: NevRatioEstimate) -> Self {
        self.estimate = Some(estimate);
        self
    }
}

#[async_trait]
impl SourceAdapter for DelimitedSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        transition(&self.region, month, MonthState::Fetching);
        let candidates = expand_all(&self.templates, &self.base_url, month, Locale::En);
        let bytes = self.fetcher.fetch(&candidates).await?;

        transition(&self.region, month, MonthState::Extracting);
        let periods = extract(&bytes, &self.layout, &self.table)?;

        transition(&self.region, month, MonthState::Normalizing);
        let mut records = records_from(&self.region, periods);
        if let Some(estimate) = &self.estimate {
            for record in &mut records {
                estimate.apply(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FuelCode, PeriodFormat};
    use crate::taxonomy::Taxonomy;
    use crate::test_utils::config::test_collector_config;
    use crate::test_utils::fixtures::{norway_csv, norway_layout};

    fn fetcher() -> Arc<Fetcher> {
        Arc::new(Fetcher::new(&test_collector_config()).unwrap())
    }

    #[tokio::test]
    async fn test_yearly_file_yields_every_month() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/bilreg/2023.csv")
            .with_status(200)
            .with_body(norway_csv())
            .create_async()
            .await;

        let source = DelimitedSource::new(
            "no_ssb_delimited",
            "NO",
            fetcher(),
            Taxonomy::builtin().table("no").cloned().unwrap(),
            server.url(),
            vec![UrlTemplate::new("{base}/bilreg/{year}.csv")],
            norway_layout(),
        );

        let records = source.collect(MonthKey::new(2023, 5).unwrap()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].month, 5);
        assert!(!records[1].has_fuel(FuelCode::Fossil));
    }

    #[tokio::test]
    async fn test_estimate_applies_when_opted_in() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/nev/202305.csv")
            .with_status(200)
            .with_body("period,fuel,count\n202305,纯电动,700\n202305,插电式混合动力,300\n")
            .create_async()
            .await;

        let layout = DelimitedLayout {
            delimiter: b',',
            period_field: "period".to_string(),
            period_format: PeriodFormat::Compact,
            fuel_field: "fuel".to_string(),
            value_field: "count".to_string(),
            region_field: None,
            national_values: vec![],
        };
        let source = DelimitedSource::new(
            "cn_delimited_nev",
            "CN",
            fetcher(),
            Taxonomy::builtin().table("cn").cloned().unwrap(),
            server.url(),
            vec![UrlTemplate::new("{base}/nev/{year}{month}.csv")],
            layout,
        )
        .with_estimate(NevRatioEstimate::new(0.25).unwrap());

        let records = source.collect(MonthKey::new(2023, 5).unwrap()).await.unwrap();

        assert_eq!(records[0].total_for(FuelCode::Bev), 700);
        assert_eq!(records[0].total_for(FuelCode::Phev), 300);
        assert_eq!(records[0].total_for(FuelCode::Fossil), 3000);
    }
}
