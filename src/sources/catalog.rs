//! Static catalog of parser ids.
//!
//! Zones name their parsers by id; [`build`] turns an id into a configured
//! adapter for one zone. Publisher file patterns live here.

use super::vehicle_lookup::LookupLimits;
use super::{
    DelimitedSource, LandingPage, PressReleasePdfSource, PxWebSource, SourceAdapter, SourceContext,
    SpreadsheetSource, VehicleLookupSource,
};
use crate::estimate::NevRatioEstimate;
use crate::extract::{CountryRowQuery, DelimitedLayout, SheetMode, SlotPolicy};
use crate::fetch::{PaginationConfig, UrlTemplate};
use crate::model::{FuelCode, Locale, PeriodFormat};

pub const FR_SPREADSHEET: &str = "fr_sdes_spreadsheet";
pub const DK_SPREADSHEET: &str = "dk_statbank_spreadsheet";
pub const SE_PXWEB: &str = "se_scb_pxweb";
pub const NO_DELIMITED: &str = "no_ssb_delimited";
pub const CN_DELIMITED: &str = "cn_delimited_nev";
pub const NL_LOOKUP: &str = "nl_rdw_lookup";
pub const PRESS_RELEASE: &str = "acea_press_release";

/// Every parser id the catalog can build.
pub const PARSER_IDS: &[&str] = &[
    FR_SPREADSHEET,
    DK_SPREADSHEET,
    SE_PXWEB,
    NO_DELIMITED,
    CN_DELIMITED,
    NL_LOOKUP,
    PRESS_RELEASE,
];

/// Share of new-energy vehicles in the market the CN estimate assumes.
const CN_NEV_SHARE: f64 = 0.3;

fn templates(patterns: &[&str]) -> Vec<UrlTemplate> {
    patterns.iter().map(|p| UrlTemplate::new(*p)).collect()
}

/// Spellings of a country in the press-release tables.
fn press_release_names(zone: &str) -> Option<&'static [&'static str]> {
    let names: &'static [&'static str] = match zone {
        "IT" => &["Italy", "Italia"],
        "ES" => &["Spain", "España"],
        "BE" => &["Belgium", "Belgique"],
        "AT" => &["Austria", "Österreich"],
        "PL" => &["Poland", "Polska"],
        _ => return None,
    };
    Some(names)
}

/// Builds the adapter registered as `parser` for `zone`.
///
/// `None` when the id is unknown or does not apply to the zone.
pub fn build(parser: &str, zone: &str, ctx: &SourceContext) -> Option<Box<dyn SourceAdapter>> {
    let fetcher = ctx.fetcher.clone();
    let sources = &ctx.sources;

    let adapter: Box<dyn SourceAdapter> = match parser {
        FR_SPREADSHEET => Box::new(
            SpreadsheetSource::new(
                parser,
                zone,
                fetcher,
                ctx.table("fr"),
                &sources.fr_url,
                templates(&[
                    "{base}/sites/default/files/{year}-{month}/immatriculations_{year}_{month}.xlsx",
                    "{base}/media/immatriculations-{month_slug}-{year}.xlsx",
                ]),
                Locale::Fr,
                SheetMode::PeriodRows {
                    period_format: PeriodFormat::Underscore,
                },
            )
            .with_landing(LandingPage {
                template: UrlTemplate::new("{base}/donnees-immatriculations-{year}"),
                suffixes: vec![".xlsx".to_string(), ".xls".to_string(), ".ods".to_string()],
            }),
        ),
        DK_SPREADSHEET => Box::new(SpreadsheetSource::new(
            parser,
            zone,
            fetcher,
            ctx.table("dk"),
            &sources.dk_url,
            templates(&[
                "{base}/files/nyregistreringer/{year}/personbiler_{year}{month}.xlsx",
                "{base}/files/nyregistreringer/{year}/personbiler-{month_slug}-{year}.xlsx",
            ]),
            Locale::Da,
            SheetMode::GrandTotal {
                total_labels: vec!["I alt".to_string(), "Total".to_string()],
                residual: FuelCode::Gasoline,
            },
        )),
        SE_PXWEB => Box::new(
            PxWebSource::new(
                parser,
                zone,
                fetcher,
                ctx.table("se"),
                &sources.se_url,
                "Drivmedel",
                "Tid",
            )
            .with_selection("Region", &["00"]),
        ),
        NO_DELIMITED => Box::new(DelimitedSource::new(
            parser,
            zone,
            fetcher,
            ctx.table("no"),
            &sources.no_url,
            templates(&["{base}/statbank/eksport/bilreg/personbiler_{year}.csv"]),
            DelimitedLayout {
                delimiter: b';',
                period_field: "måned".to_string(),
                period_format: PeriodFormat::PxWeb,
                fuel_field: "drivstoff".to_string(),
                value_field: "antall".to_string(),
                region_field: Some("region".to_string()),
                national_values: vec!["0".to_string(), "Hele landet".to_string()],
            },
        )),
        CN_DELIMITED => {
            let Some(estimate) = NevRatioEstimate::new(CN_NEV_SHARE) else {
                tracing::warn!(zone, nev_share = CN_NEV_SHARE, "NEV share outside (0, 1)");
                return None;
            };
            Box::new(
                DelimitedSource::new(
                    parser,
                    zone,
                    fetcher,
                    ctx.table("cn"),
                    &sources.cn_url,
                    templates(&["{base}/files/nev/{year}{month}.csv"]),
                    DelimitedLayout {
                        delimiter: b',',
                        period_field: "period".to_string(),
                        period_format: PeriodFormat::Compact,
                        fuel_field: "fuel".to_string(),
                        value_field: "count".to_string(),
                        region_field: None,
                        national_values: Vec::new(),
                    },
                )
                .with_estimate(estimate),
            )
        }
        NL_LOOKUP => Box::new(VehicleLookupSource::new(
            parser,
            zone,
            fetcher,
            ctx.table("nl"),
            &sources.nl_url,
            "m9d7-ebf2",
            "8ys7-d773",
            LookupLimits {
                pagination: PaginationConfig {
                    page_size: ctx.collector.page_size,
                    ..PaginationConfig::default()
                },
                batch_size: ctx.collector.lookup_batch_size,
                concurrency: ctx.collector.max_concurrent_requests,
            },
        )),
        PRESS_RELEASE => {
            let names = press_release_names(zone)?;
            Box::new(PressReleasePdfSource::new(
                parser,
                zone,
                fetcher,
                &sources.press_release_url,
                templates(&[
                    "{base}/wp-content/uploads/{next_year}/{next_month}/20{yy}{month}_PRPC-{month_name}-{year}.pdf",
                    "{base}/wp-content/uploads/{next_year}/{next_month}/PRPC_{month_name}_{year}.pdf",
                    "{base}/wp-content/uploads/{next_year}/{next_month}/Press_release_car_registrations_{month_name}_{year}.pdf",
                ]),
                Locale::En,
                CountryRowQuery {
                    country: zone.to_string(),
                    names: names.iter().map(|n| n.to_string()).collect(),
                    min_row_integers: 4,
                },
                SlotPolicy::press_release(),
            ))
        }
        _ => return None,
    };
    Some(adapter)
}
