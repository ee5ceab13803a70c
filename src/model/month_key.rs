//! Month identifiers and the period encodings publishers use for them.
//!
//! A [`MonthKey`] is the `(year, month)` pair every record is keyed by. Its
//! canonical string form is `YYYY-MM`; [`PeriodFormat`] covers the
//! source-native spellings (`2023_05`, `2023M05`, `mai 2023`, ...).

use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Immutable `(year, month)` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Creates a key, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Key for the month containing `date`.
    pub fn from_date(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.next().first_day().and_then(|d| d.pred_opt())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeriodFormat::Iso
            .parse(s)
            .ok_or_else(|| format!("invalid month key '{}', expected YYYY-MM", s))
    }
}

/// Generates every month from January of `start_year` through the current
/// calendar month, inclusive.
pub fn generate(start_year: i32) -> Vec<MonthKey> {
    generate_until(start_year, Local::now().date_naive())
}

/// Same as [`generate`] with an explicit "today".
///
/// A start year after `today` yields an empty sequence.
pub fn generate_until(start_year: i32, today: NaiveDate) -> Vec<MonthKey> {
    let end = MonthKey::from_date(today);
    let Some(mut current) = MonthKey::new(start_year, 1) else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    while current <= end {
        keys.push(current);
        current = current.next();
    }
    keys
}

/// Language used for month names in localized period labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Fr,
    De,
    En,
    Es,
    It,
    Da,
    Sv,
    No,
}

impl Locale {
    /// Month names as publishers print them, January first.
    pub fn month_names(&self) -> [&'static str; 12] {
        match self {
            Locale::Fr => [
                "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
                "septembre", "octobre", "novembre", "décembre",
            ],
            Locale::De => [
                "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August",
                "September", "Oktober", "November", "Dezember",
            ],
            Locale::En => [
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December",
            ],
            Locale::Es => [
                "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
                "septiembre", "octubre", "noviembre", "diciembre",
            ],
            Locale::It => [
                "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio",
                "agosto", "settembre", "ottobre", "novembre", "dicembre",
            ],
            Locale::Da => [
                "januar", "februar", "marts", "april", "maj", "juni", "juli", "august",
                "september", "oktober", "november", "december",
            ],
            Locale::Sv => [
                "januari", "februari", "mars", "april", "maj", "juni", "juli", "augusti",
                "september", "oktober", "november", "december",
            ],
            Locale::No => [
                "januar", "februar", "mars", "april", "mai", "juni", "juli", "august",
                "september", "oktober", "november", "desember",
            ],
        }
    }

    pub fn month_name(&self, month: u32) -> &'static str {
        self.month_names()[(month.clamp(1, 12) - 1) as usize]
    }

    /// Month number for a (case- and accent-insensitive) name.
    pub fn month_from_name(&self, name: &str) -> Option<u32> {
        let wanted = fold_accents(&name.to_lowercase());
        self.month_names()
            .iter()
            .position(|n| fold_accents(&n.to_lowercase()) == wanted)
            .map(|i| i as u32 + 1)
    }
}

/// Source-native spellings of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFormat {
    /// `2023-05`
    Iso,
    /// `2023_05`
    Underscore,
    /// `2023M05`
    PxWeb,
    /// `202305`
    Compact,
    /// `mai 2023`
    MonthName(Locale),
}

impl PeriodFormat {
    /// Parses `text` in this encoding. Surrounding whitespace is ignored;
    /// anything else that does not fit the grammar yields `None`.
    pub fn parse(&self, text: &str) -> Option<MonthKey> {
        let text = text.trim();
        match self {
            PeriodFormat::Iso => parse_separated(text, '-'),
            PeriodFormat::Underscore => parse_separated(text, '_'),
            PeriodFormat::PxWeb => parse_separated(text, 'M'),
            PeriodFormat::Compact => {
                if text.len() != 6 || !text.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let year = parse_digits(&text[..4], 4, 4)?;
                let month = parse_digits(&text[4..], 2, 2)?;
                MonthKey::new(year as i32, month)
            }
            PeriodFormat::MonthName(locale) => {
                let parts: Vec<&str> = text
                    .split(|c: char| c.is_whitespace() || c == '-' || c == '_' || c == '/')
                    .filter(|p| !p.is_empty())
                    .collect();
                let [first, second] = parts.as_slice() else {
                    return None;
                };
                let (name, year) = if first.chars().all(|c| c.is_ascii_digit()) {
                    (second, first)
                } else {
                    (first, second)
                };
                let month = locale.month_from_name(name)?;
                let year = parse_digits(year, 4, 4)?;
                MonthKey::new(year as i32, month)
            }
        }
    }

    pub fn format(&self, key: MonthKey) -> String {
        match self {
            PeriodFormat::Iso => key.to_string(),
            PeriodFormat::Underscore => format!("{:04}_{:02}", key.year(), key.month()),
            PeriodFormat::PxWeb => format!("{:04}M{:02}", key.year(), key.month()),
            PeriodFormat::Compact => format!("{:04}{:02}", key.year(), key.month()),
            PeriodFormat::MonthName(locale) => {
                format!("{} {}", locale.month_name(key.month()), key.year())
            }
        }
    }
}

fn parse_separated(text: &str, separator: char) -> Option<MonthKey> {
    let (year, month) = text.split_once(separator)?;
    let year = parse_digits(year, 4, 4)?;
    let month = parse_digits(month, 1, 2)?;
    MonthKey::new(year as i32, month)
}

fn parse_digits(text: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if text.len() < min_len || text.len() > max_len || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub(crate) fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'à' | 'â' | 'ä' | 'å' => 'a',
            'ô' | 'ö' | 'ø' => 'o',
            'û' | 'ü' | 'ù' => 'u',
            'î' | 'ï' => 'i',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
