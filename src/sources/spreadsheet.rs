use super::{records_from, transition, MonthState, SourceAdapter};
use crate::error::CollectError;
use crate::extract::spreadsheet::{extract_grand_total, extract_period_rows, load_grid};
use crate::extract::SheetMode;
use crate::fetch::{discover_links, expand_all, Fetcher, UrlTemplate};
use crate::model::month_key::fold_accents;
use crate::model::{CanonicalRecord, Locale, MonthKey, PeriodFormat};
use crate::taxonomy::AliasTable;
use async_trait::async_trait;
use std::sync::Arc;

/// Index page listing a publisher's files.
#[derive(Debug, Clone)]
pub struct LandingPage {
    pub template: UrlTemplate,
    /// Accepted file extensions, lowercase
    pub suffixes: Vec<String>,
}

/// Spreadsheet published per month, one row per period or a grand total.
pub struct SpreadsheetSource {
    id: String,
    region: String,
    fetcher: Arc<Fetcher>,
    table: AliasTable,
    base_url: String,
    templates: Vec<UrlTemplate>,
    locale: Locale,
    landing: Option<LandingPage>,
    mode: SheetMode,
}

impl SpreadsheetSource {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        fetcher: Arc<Fetcher>,
        table: AliasTable,
        base_url: impl Into<String>,
        templates: Vec<UrlTemplate>,
        locale: Locale,
        mode: SheetMode,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            fetcher,
            table,
            base_url: base_url.into(),
            templates,
            locale,
            landing: None,
            mode,
        }
    }

    pub fn with_landing(mut self, landing: LandingPage) -> Self {
        self.landing = Some(landing);
        self
    }

    /// Discovered links first, then template expansions.
    async fn candidates(&self, month: MonthKey) -> Vec<String> {
        let mut urls = match &self.landing {
            Some(landing) => self.discover(landing, month).await,
            None => Vec::new(),
        };
        for url in expand_all(&self.templates, &self.base_url, month, self.locale) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    async fn discover(&self, landing: &LandingPage, month: MonthKey) -> Vec<String> {
        let page = landing.template.expand(&self.base_url, month, self.locale);
        let body = match self.fetcher.fetch(std::slice::from_ref(&page)).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(country = %self.region, url = %page, error = %e, "Landing page unavailable");
                return Vec::new();
            }
        };

        let suffixes: Vec<&str> = landing.suffixes.iter().map(String::as_str).collect();
        let html = String::from_utf8_lossy(&body);
        match discover_links(&html, &page, &month_needles(month, self.locale), &suffixes) {
            Ok(links) => {
                tracing::debug!(country = %self.region, month = %month, links = links.len(), "Discovered candidates");
                links
            }
            Err(e) => {
                tracing::warn!(country = %self.region, url = %page, error = %e, "Link discovery failed");
                Vec::new()
            }
        }
    }
}

/// Encodings of `month` that may appear in a file name.
fn month_needles(month: MonthKey, locale: Locale) -> Vec<String> {
    let name = fold_accents(&locale.month_name(month.month()).to_lowercase());
    vec![
        PeriodFormat::Underscore.format(month),
        PeriodFormat::Iso.format(month),
        PeriodFormat::Compact.format(month),
        format!("{}-{}", name, month.year()),
        format!("{}_{}", name, month.year()),
    ]
}

#[async_trait]
impl SourceAdapter for SpreadsheetSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn collect(&self, month: MonthKey) -> Result<Vec<CanonicalRecord>, CollectError> {
        transition(&self.region, month, MonthState::Fetching);
        let candidates = self.candidates(month).await;
        let bytes = self.fetcher.fetch(&candidates).await?;

        transition(&self.region, month, MonthState::Extracting);
        let grid = load_grid(&bytes)?;

        transition(&self.region, month, MonthState::Normalizing);
        let periods = match &self.mode {
            SheetMode::PeriodRows { period_format } => {
                extract_period_rows(&grid, &self.table, *period_format)?
            }
            SheetMode::GrandTotal {
                total_labels,
                residual,
            } => vec![(
                month,
                extract_grand_total(&grid, &self.table, total_labels, *residual)?,
            )],
        };
        Ok(records_from(&self.region, periods))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::config::test_collector_config;
    use crate::test_utils::html::landing_page;

    fn source(base_url: &str, mode: SheetMode) -> SpreadsheetSource {
        let fetcher = Arc::new(Fetcher::new(&test_collector_config()).unwrap());
        SpreadsheetSource::new(
            "fr_sdes_spreadsheet",
            "FR",
            fetcher,
            crate::taxonomy::Taxonomy::builtin().table("fr").cloned().unwrap(),
            base_url,
            vec![UrlTemplate::new("{base}/files/immat_{year}_{month}.xlsx")],
            Locale::Fr,
            mode,
        )
    }

    #[test]
    fn test_month_needles() {
        let needles = month_needles(MonthKey::new(2023, 2).unwrap(), Locale::Fr);
        assert_eq!(
            needles,
            vec!["2023_02", "2023-02", "202302", "fevrier-2023", "fevrier_2023"]
        );
    }

    #[tokio::test]
    async fn test_discovered_links_come_first() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/donnees")
            .with_status(200)
            .with_body(landing_page(&[
                "/files/immat_2023_04.xlsx",
                "/files/Immatriculations-mai-2023-v2.xlsx",
            ]))
            .create_async()
            .await;

        let source = source(
            &server.url(),
            SheetMode::PeriodRows {
                period_format: PeriodFormat::Underscore,
            },
        )
        .with_landing(LandingPage {
            template: UrlTemplate::new("{base}/donnees"),
            suffixes: vec![".xlsx".to_string()],
        });

        let candidates = source.candidates(MonthKey::new(2023, 5).unwrap()).await;

        assert_eq!(
            candidates,
            vec![
                format!("{}/files/Immatriculations-mai-2023-v2.xlsx", server.url()),
                format!("{}/files/immat_2023_05.xlsx", server.url()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_landing_page_falls_back_to_templates() {
        let mut server = mockito::Server::new_async().await;
        let _index = server
            .mock("GET", "/donnees")
            .with_status(503)
            .create_async()
            .await;

        let source = source(
            &server.url(),
            SheetMode::PeriodRows {
                period_format: PeriodFormat::Underscore,
            },
        )
        .with_landing(LandingPage {
            template: UrlTemplate::new("{base}/donnees"),
            suffixes: vec![],
        });

        let candidates = source.candidates(MonthKey::new(2023, 5).unwrap()).await;

        assert_eq!(candidates, vec![format!("{}/files/immat_2023_05.xlsx", server.url())]);
    }

    #[tokio::test]
    async fn test_unreadable_workbook_is_a_structure_error() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/files/immat_2023_05.xlsx")
            .with_status(200)
            .with_body("<html>login required</html>")
            .create_async()
            .await;

        let source = source(
            &server.url(),
            SheetMode::PeriodRows {
                period_format: PeriodFormat::Underscore,
            },
        );

        let result = source.collect(MonthKey::new(2023, 5).unwrap()).await;

        assert!(matches!(result, Err(CollectError::ParseStructure(_))));
    }

    #[tokio::test]
    async fn test_unpublished_month_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let source = source(
            &server.url(),
            SheetMode::GrandTotal {
                total_labels: vec!["I alt".to_string()],
                residual: crate::model::FuelCode::Gasoline,
            },
        );

        let result = source.collect(MonthKey::new(2023, 5).unwrap()).await;

        assert!(matches!(result, Err(CollectError::NotFound { .. })));
    }
}
