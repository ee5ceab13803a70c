//! Record-level vehicle registry.
//!
//! Registrations of the month are paged out of one dataset; their fuel types
//! live in a second dataset keyed by licence plate and are looked up in
//! batches, a few at a time.

use super::{transition, MonthState, SourceAdapter};
use crate::error::CollectError;
use crate::fetch::{fan_out, Fetcher, PaginationConfig, Paginator};
use crate::model::{CanonicalRecord, FuelCode, FuelEntry, MonthKey, AGGREGATE_MARKER};
use crate::taxonomy::AliasTable;
use async_trait::async_trait;
use serde_derive::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
struct RegistrationRow {
    kenteken: String,
    #[serde(default)]
    merk: Option<String>,
    #[serde(default)]
    handelsbenaming: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FuelRow {
    kenteken: String,
    #[serde(default)]
    brandstof_omschrijving: Option<String>,
    #[serde(default)]
    klasse_hybride_elektrisch_voertuig: Option<String>,
}

/// Batching and concurrency knobs of the lookup.
#[derive(Debug, Clone)]
pub struct LookupLimits {
    pub pagination: PaginationConfig,
    pub batch_size: usize,
    pub concurrency: usize,
}

/// Brand/model/fuel counts aggregated from individual registrations.
pub struct VehicleLookupSource {
    id: String,
    region: String,
    fetcher: Arc<Fetcher>,
    table: AliasTable,
    base_url: String,
    registrations_resource: String,
    fuel_resource: String,
    limits: LookupLimits,
}

impl VehicleLookupSource {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        fetcher: Arc<Fetcher>,
        table: AliasTable,
        base_url: impl Into<String>,
        registrations_resource: impl Into<String>,
        fuel_resource: impl Into<String>,
        limits: LookupLimits,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            fetcher,
            table,
            base_url: base_url.into(),
            registrations_resource: registrations_resource.into(),
            fuel_resource: fuel_resource.into(),
            limits,
        }
    }

    fn resource_url(&self, resource: &str) -> String {
        format!("{}/resource/{}.json", self.base_url.trim_end_matches('/'), resource)
    }

    async fn registrations(&self, month: MonthKey) -> Result<Vec<RegistrationRow>, CollectError> {
        let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
            return Err(CollectError::structure(format!("no calendar days for {}", month)));
        };
        let url = self.resource_url(&self.registrations_resource);
        let filter = format!(
            "voertuigsoort='Personenauto' AND datum_eerste_toelating between '{}' and '{}'",
            first.format("%Y%m%d"),
            last.format("%Y%m%d")
        );

        let fetcher = self.fetcher.clone();
        let paginator = Paginator::new(self.limits.pagination.clone(), move |offset, limit| {
            let fetcher = fetcher.clone();
            let url = url.clone();
            let query = vec![
                ("$select", "kenteken,merk,handelsbenaming".to_string()),
                ("$where", filter.clone()),
                ("$order", "kenteken".to_string()),
                ("$limit", limit.to_string()),
                ("$offset", offset.to_string()),
            ];
            Box::pin(async move { fetcher.get_json::<Vec<RegistrationRow>>(&url, &query).await })
        });
        paginator.collect_all().await
    }

    async fn lookup_batch(&self, plates: Vec<String>) -> Result<Vec<FuelRow>, CollectError> {
        let list = plates
            .iter()
            .map(|p| format!("'{}'", p))
            .collect::<Vec<_>>()
            .join(",");
        self.fetcher
            .get_json(
                &self.resource_url(&self.fuel_resource),
                &[
                    (
                        "$select",
                        "kenteken,brandstof_omschrijving,klasse_hybride_elektrisch_voertuig".to_string(),
                    ),
                    ("$where", format!("kenteken in({})", list)),
                    // a plate has one row per fuel
                    ("$limit", (plates.len() * 4).to_string()),
                ],
            )
            .await
    }

    /// Fuel label per plate.
    async fn fuel_labels(&self, plates: Vec<String>) -> Result<HashMap<String, String>, CollectError> {
        let batches: Vec<Vec<String>> = plates
            .chunks(self.limits.batch_size.max(1))
            .map(<[String]>::to_vec)
            .collect();
        tracing::debug!(country = %self.region, batches = batches.len(), "Looking up fuel types");

        let results = fan_out(batches, self.limits.concurrency, |batch| self.lookup_batch(batch)).await?;

        let mut rows: HashMap<String, Vec<FuelRow>> = HashMap::new();
        for row in results.into_iter().flatten() {
            rows.entry(row.kenteken.clone()).or_default().push(row);
        }
        Ok(rows
            .into_iter()
            .map(|(plate, rows)| (plate, fuel_label(&rows)))
            .collect())
    }
}

/// Plates go into a query literal, so only letters and digits survive.
fn sanitize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_uppercase()
}

/// The hybrid class when present, else the sorted fuel descriptions.
fn fuel_label(rows: &[FuelRow]) -> String {
    if let Some(class) = rows.iter().find_map(|r| {
        r.klasse_hybride_elektrisch_voertuig
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }) {
        return class.to_string();
    }

    let mut names: Vec<String> = rows
        .iter()
        .filter_map(|r| r.brandstof_omschrijving.as_deref())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names.join(" ")
}

fn label_or_marker(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => AGGREGATE_MARKER.to_string(),
    }
}

#[async_trait]
impl SourceAdapter for VehicleLookupSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        transition(&self.region, month, MonthState::Fetching);
        let registrations = self.registrations(month).await?;
        if registrations.is_empty() {
            return Ok(Vec::new());
        }
        let mut plates: Vec<String> = registrations
            .iter()
            .map(|r| sanitize_plate(&r.kenteken))
            .filter(|p| !p.is_empty())
            .collect();
        plates.sort();
        plates.dedup();
        let labels = self.fuel_labels(plates).await?;

        transition(&self.region, month, MonthState::Normalizing);
        let mut counts: BTreeMap<(String, String, FuelCode), u64> = BTreeMap::new();
        for row in &registrations {
            let label = labels
                .get(&sanitize_plate(&row.kenteken))
                .map(String::as_str)
                .unwrap_or_default();
            let key = (
                label_or_marker(row.merk.as_deref()),
                label_or_marker(row.handelsbenaming.as_deref()),
                self.table.normalize(label),
            );
            *counts.entry(key).or_default() += 1;
        }

        let mut record = CanonicalRecord::new(&self.region, month);
        record.entries = counts
            .into_iter()
            .map(|((brand, model, fuel_code), total)| FuelEntry {
                brand,
                model,
                total,
                fuel_code,
            })
            .collect();
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use crate::test_utils::config::test_collector_config;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(base_url: String, page_size: usize, batch_size: usize) -> VehicleLookupSource {
        VehicleLookupSource::new(
            "nl_rdw_lookup",
            "NL",
            Arc::new(Fetcher::new(&test_collector_config()).unwrap()),
            Taxonomy::builtin().table("nl").cloned().unwrap(),
            base_url,
            "m9d7-ebf2",
            "8ys7-d773",
            LookupLimits {
                pagination: PaginationConfig {
                    page_size,
                    max_pages: 10,
                },
                batch_size,
                concurrency: 2,
            },
        )
    }

    fn fuel(plate: &str, description: &str, class: Option<&str>) -> FuelRow {
        FuelRow {
            kenteken: plate.to_string(),
            brandstof_omschrijving: Some(description.to_string()),
            klasse_hybride_elektrisch_voertuig: class.map(str::to_string),
        }
    }

    mod succeeds {
        use super::*;

        #[test]
        fn test_fuel_label() {
            assert_eq!(fuel_label(&[fuel("A", "Elektriciteit", None)]), "elektriciteit");
            assert_eq!(
                fuel_label(&[
                    fuel("A", "Elektriciteit", None),
                    fuel("A", "Benzine", None)
                ]),
                "benzine elektriciteit"
            );
            assert_eq!(
                fuel_label(&[
                    fuel("A", "Benzine", Some("OVC-HEV")),
                    fuel("A", "Elektriciteit", None)
                ]),
                "OVC-HEV"
            );
            assert_eq!(fuel_label(&[]), "");
        }

        #[test]
        fn test_sanitize_plate() {
            assert_eq!(sanitize_plate("ab-123-c'; drop"), "AB123CDROP");
        }

        #[tokio::test]
        async fn test_pages_and_batches_are_joined() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/resource/m9d7-ebf2.json"))
                .and(query_param("$offset", "0"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "AA01BB", "merk": "TESLA", "handelsbenaming": "MODEL Y"},
                    {"kenteken": "AA02BB", "merk": "TESLA", "handelsbenaming": "MODEL Y"}
                ])))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/m9d7-ebf2.json"))
                .and(query_param("$offset", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "AA03BB", "merk": "TOYOTA", "handelsbenaming": "YARIS"}
                ])))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/8ys7-d773.json"))
                .and(query_param("$where", "kenteken in('AA01BB','AA02BB')"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "AA01BB", "brandstof_omschrijving": "Elektriciteit"},
                    {"kenteken": "AA02BB", "brandstof_omschrijving": "Elektriciteit"}
                ])))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/8ys7-d773.json"))
                .and(query_param("$where", "kenteken in('AA03BB')"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "AA03BB", "brandstof_omschrijving": "Benzine",
                     "klasse_hybride_elektrisch_voertuig": "NOVC-HEV"},
                    {"kenteken": "AA03BB", "brandstof_omschrijving": "Elektriciteit"}
                ])))
                .expect(1)
                .mount(&server)
                .await;

            let records = source(server.uri(), 2, 2)
                .collect(MonthKey::new(2023, 5).unwrap())
                .await
                .unwrap();

            let entries = &records[0].entries;
            assert_eq!(
                entries,
                &vec![
                    FuelEntry {
                        brand: "TESLA".to_string(),
                        model: "MODEL Y".to_string(),
                        total: 2,
                        fuel_code: FuelCode::Bev,
                    },
                    FuelEntry {
                        brand: "TOYOTA".to_string(),
                        model: "YARIS".to_string(),
                        total: 1,
                        fuel_code: FuelCode::Hybrid,
                    },
                ]
            );
        }

        #[tokio::test]
        async fn test_plate_without_fuel_row_is_unknown() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/resource/m9d7-ebf2.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "ZZ99ZZ"}
                ])))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/8ys7-d773.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
                .mount(&server)
                .await;

            let records = source(server.uri(), 10, 10)
                .collect(MonthKey::new(2023, 5).unwrap())
                .await
                .unwrap();

            let entry = &records[0].entries[0];
            assert_eq!(entry.brand, AGGREGATE_MARKER);
            assert_eq!(entry.fuel_code, FuelCode::Unknown);
        }
    }

    mod fails {
        use super::*;

        #[tokio::test]
        async fn test_month_without_registrations_yields_nothing() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/resource/m9d7-ebf2.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/8ys7-d773.json"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let records = source(server.uri(), 10, 10)
                .collect(MonthKey::new(2031, 1).unwrap())
                .await
                .unwrap();

            assert!(records.is_empty());
        }

        #[tokio::test]
        async fn test_failed_lookup_batch_fails_month() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/resource/m9d7-ebf2.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    {"kenteken": "AA01BB"}
                ])))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/resource/8ys7-d773.json"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let result = source(server.uri(), 10, 10)
                .collect(MonthKey::new(2023, 5).unwrap())
                .await;

            assert!(matches!(result, Err(CollectError::NotFound { .. })));
        }
    }
}
