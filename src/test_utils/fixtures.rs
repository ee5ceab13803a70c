//! Synthetic publisher documents.

use crate::extract::pdf::TextFragment;
use crate::extract::DelimitedLayout;
use crate::model::{CanonicalRecord, FuelCode, FuelTotals, MonthKey, PeriodFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Aggregate record with the given totals.
pub fn record(region: &str, month: MonthKey, totals: &[(FuelCode, u64)]) -> CanonicalRecord {
    let totals: FuelTotals = totals.iter().copied().collect();
    CanonicalRecord::from_totals(region, month, totals)
}

/// One visual table row: cells left to right at baseline `y`.
pub fn press_release_row(y: f64, cells: &[&str]) -> Vec<TextFragment> {
    cells
        .iter()
        .enumerate()
        .map(|(i, text)| TextFragment {
            text: text.to_string(),
            x: 40.0 + 45.0 * i as f64,
            y,
        })
        .collect()
}

/// A PDF with one page per entry, each drawing `(x, y, text)` runs.
///
/// Coordinates are rounded to whole points.
pub fn pdf_document(pages: &[Vec<(f64, f64, &str)>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for runs in pages {
        let mut operations = Vec::new();
        for (x, y, text) in runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 9.into()]));
            operations.push(Operation::new(
                "Td",
                vec![
                    Object::Integer(x.round() as i64),
                    Object::Integer(y.round() as i64),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn row_runs<'a>(y: f64, cells: &[&'a str]) -> Vec<(f64, f64, &'a str)> {
    cells
        .iter()
        .enumerate()
        .map(|(i, text)| (40.0 + 45.0 * i as f64, y, *text))
        .collect()
}

/// A two-page monthly press release.
///
/// Spain carries the full 2023 layout, Italy lost its hybrid pair. Poland is
/// only mentioned in prose.
pub fn press_release_pdf() -> Vec<u8> {
    let mut first = row_runs(780.0, &["New", "car", "registrations", "by", "market"]);
    first.extend(row_runs(
        760.0,
        &["Poland", "and", "Austria", "report", "+4.1%", "growth"],
    ));
    first.extend(row_runs(
        700.0,
        &[
            "Spain", "9,000", "8,000", "+12.5%", "4,000", "3,800", "+5.3%", "25,000", "23,000",
            "+8.7%", "2,000", "2,100", "-4.8%", "40,000", "39,000", "+2.6%", "15,000", "16,000",
            "-6.3%", "95,000", "91,900", "+3.4%",
        ],
    ));
    let second = row_runs(
        700.0,
        &[
            "Italy", "6,000", "5,000", "+20.0%", "7,000", "6,500", "+7.7%", "-", "-", "1,000",
            "900", "+11.1%", "50,000", "52,000", "-3.8%", "20,000", "21,000", "-4.8%", "84,000",
            "85,400", "-1.6%",
        ],
    );
    pdf_document(&[first, second])
}

/// Long-format registrations export with sub-national and malformed rows.
pub fn norway_csv() -> String {
    [
        "region,maaned,drivstoff,antall",
        "0,2023M04,Elektrisk,9000",
        "0,2023M04,Bensin,300",
        "03,2023M04,Elektrisk,4000",
        "0,2023M05,Gass,10",
        "0,2023M05,Parafin,5",
        "Hele landet,2023M05,Ladbar hybrid,400",
        "0,mai 2023,Diesel,77",
        "Hele landet,2023M05,Diesel,n/a",
    ]
    .join("\n")
        + "\n"
}

pub fn norway_layout() -> DelimitedLayout {
    DelimitedLayout {
        delimiter: b',',
        period_field: "maaned".to_string(),
        period_format: PeriodFormat::PxWeb,
        fuel_field: "drivstoff".to_string(),
        value_field: "antall".to_string(),
        region_field: Some("region".to_string()),
        national_values: vec!["0".to_string(), "Hele landet".to_string()],
    }
}

/// json-stat2 answer: 1 region x 2 fuels x 1 measure x 3 months.
pub fn pxweb_dataset() -> String {
    r#"{
  "version": "2.0",
  "class": "dataset",
  "label": "Nyregistrerade personbilar efter region, drivmedel och månad",
  "id": ["Region", "Drivmedel", "ContentsCode", "Tid"],
  "size": [1, 2, 1, 3],
  "dimension": {
    "Region": {
      "label": "region",
      "category": {"index": {"00": 0}, "label": {"00": "Riket"}}
    },
    "Drivmedel": {
      "label": "drivmedel",
      "category": {
        "index": {"100": 0, "110": 1},
        "label": {"100": "bensin", "110": "el"}
      }
    },
    "ContentsCode": {
      "label": "tabellinnehåll",
      "category": {"index": {"TK1001AA": 0}, "label": {"TK1001AA": "Antal"}}
    },
    "Tid": {
      "label": "månad",
      "category": {
        "index": ["2023M03", "2023M04", "2023M05"],
        "label": {"2023M03": "2023M03", "2023M04": "2023M04", "2023M05": "2023M05"}
      }
    }
  },
  "value": [10, 20, 30, 40, 50, 60]
}"#
    .to_string()
}
