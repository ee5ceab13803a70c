//! Publication URL patterns.
//!
//! Publishers rename their file patterns between periods without notice, so
//! each source carries an ordered list of templates and the fetcher tries them
//! in turn.
//!
//! Placeholders: `{base}`, `{year}`, `{yy}`, `{month}` (two digits),
//! `{month_num}` (no padding), `{month_name}` (locale name, lowercase),
//! `{month_slug}` (locale name, lowercase, accents folded), and
//! `{next_year}`/`{next_month}` for publishers that file a month's figures
//! under the month they were released in.

use crate::model::month_key::fold_accents;
use crate::model::{Locale, MonthKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn expand(&self, base: &str, key: MonthKey, locale: Locale) -> String {
        let name = locale.month_name(key.month()).to_lowercase();
        let next = key.next();
        self.0
            .replace("{base}", base.trim_end_matches('/'))
            .replace("{next_year}", &format!("{:04}", next.year()))
            .replace("{next_month}", &format!("{:02}", next.month()))
            .replace("{year}", &format!("{:04}", key.year()))
            .replace("{yy}", &format!("{:02}", key.year() % 100))
            .replace("{month}", &format!("{:02}", key.month()))
            .replace("{month_num}", &key.month().to_string())
            .replace("{month_slug}", &fold_accents(&name))
            .replace("{month_name}", &name)
    }
}

/// Expands every template, dropping duplicates while keeping order.
pub fn expand_all(
    templates: &[UrlTemplate],
    base: &str,
    key: MonthKey,
    locale: Locale,
) -> Vec<String> {
    let mut urls: Vec<String> = Vec::with_capacity(templates.len());
    for url in templates.iter().map(|t| t.expand(base, key, locale)) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}
