use super::{records_from, transition, MonthState, SourceAdapter};
use crate::error::CollectError;
use crate::extract::jsonstat::Member;
use crate::extract::Dataset;
use crate::fetch::Fetcher;
use crate::model::{CanonicalRecord, FuelCode, FuelTotals, MonthKey, PeriodFormat};
use crate::taxonomy::AliasTable;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Statistical table API queried with a JSON POST, answering in JSON-stat.
pub struct PxWebSource {
    id: String,
    region: String,
    fetcher: Arc<Fetcher>,
    table: AliasTable,
    url: String,
    fuel_dimension: String,
    period_dimension: String,
    /// Fixed selections of the remaining dimensions
    selections: Vec<(String, Vec<String>)>,
}

impl PxWebSource {
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        fetcher: Arc<Fetcher>,
        table: AliasTable,
        url: impl Into<String>,
        fuel_dimension: impl Into<String>,
        period_dimension: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            fetcher,
            table,
            url: url.into(),
            fuel_dimension: fuel_dimension.into(),
            period_dimension: period_dimension.into(),
            selections: Vec::new(),
        }
    }

    pub fn with_selection(mut self, dimension: impl Into<String>, values: &[&str]) -> Self {
        self.selections.push((
            dimension.into(),
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    fn query(&self, month: MonthKey) -> Value {
        let mut query: Vec<Value> = self
            .selections
            .iter()
            .map(|(code, values)| {
                json!({"code": code, "selection": {"filter": "item", "values": values}})
            })
            .collect();
        query.push(json!({
            "code": self.period_dimension,
            "selection": {"filter": "item", "values": [PeriodFormat::PxWeb.format(month)]}
        }));
        json!({"query": query, "response": {"format": "json-stat2"}})
    }

    /// Label first; a label unknown to the table falls back to the code.
    fn fuel_code(&self, member: &Member) -> FuelCode {
        let by_label = self.table.normalize(&member.label);
        if by_label.is_resolved() {
            return by_label;
        }
        let by_code = self.table.normalize(&member.code);
        if by_code.is_resolved() {
            by_code
        } else {
            by_label
        }
    }
}

#[async_trait]
impl SourceAdapter for PxWebSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        transition(&self.region, month, MonthState::Fetching);
        let body: Value = self.fetcher.post_json(&self.url, &self.query(month)).await?;

        transition(&self.region, month, MonthState::Extracting);
        let dataset: Dataset = serde_json::from_value(body)?;
        let slices = dataset.by_period(&self.fuel_dimension, &self.period_dimension)?;

        transition(&self.region, month, MonthState::Normalizing);
        let mut periods = Vec::new();
        for slice in slices {
            let Some(key) = PeriodFormat::PxWeb.parse(&slice.period.code) else {
                tracing::debug!(country = %self.region, period = %slice.period.code, "Unparseable period skipped");
                continue;
            };
            let totals: FuelTotals = slice
                .values
                .iter()
                .filter(|(_, value)| *value > 0.0)
                .map(|(member, value)| (self.fuel_code(member), value.round() as u64))
                .collect();
            periods.push((key, totals));
        }
        Ok(records_from(&self.region, periods))
    }
}
