//! Fuel taxonomy normalization.
//!
//! Every country namespace owns an [`AliasTable`] mapping source-language
//! labels onto [`FuelCode`]s. Normalization is deterministic:
//!
//! 1. the label is lowercased and its whitespace collapsed;
//! 2. an exact alias match wins;
//! 3. otherwise the longest alias contained in the label wins, ties going to
//!    the alias registered first;
//! 4. a label matching nothing is `OTHER`, an empty label `UNKNOWN`.
//!
//! Longest-match matters because aliases nest: `"hybride"` is a substring of
//! `"hybride rechargeable"`.

mod tables;

use crate::model::FuelCode;
use std::collections::HashMap;

pub use tables::builtin_tables;

#[derive(Debug, Clone)]
struct Alias {
    text: String,
    code: FuelCode,
}

/// Alias table for one country namespace.
#[derive(Debug, Clone)]
pub struct AliasTable {
    namespace: String,
    aliases: Vec<Alias>,
}

impl AliasTable {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            aliases: Vec::new(),
        }
    }

    /// Registers `aliases` for `code`. Registration order is the tie-break.
    pub fn with(mut self, code: FuelCode, aliases: &[&str]) -> Self {
        for alias in aliases {
            let text = normalize_label(alias);
            if text.is_empty() {
                continue;
            }
            self.aliases.push(Alias { text, code });
        }
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every registered alias with its declared code, in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, FuelCode)> {
        self.aliases.iter().map(|a| (a.text.as_str(), a.code))
    }

    /// Maps a raw source label onto a canonical code.
    pub fn normalize(&self, raw: &str) -> FuelCode {
        let label = normalize_label(raw);
        if label.is_empty() {
            return FuelCode::Unknown;
        }

        if let Some(alias) = self.aliases.iter().find(|a| a.text == label) {
            return alias.code;
        }

        let mut best: Option<&Alias> = None;
        for alias in self.aliases.iter().filter(|a| label.contains(a.text.as_str())) {
            // strictly longer only, so the first registered keeps a tie
            if best.map_or(true, |b| alias.text.chars().count() > b.text.chars().count()) {
                best = Some(alias);
            }
        }

        best.map_or(FuelCode::Other, |a| a.code)
    }

    /// Like [`normalize`](Self::normalize) but `None` is treated as empty.
    pub fn normalize_opt(&self, raw: Option<&str>) -> FuelCode {
        self.normalize(raw.unwrap_or_default())
    }
}

/// Alias tables indexed by country namespace.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    tables: HashMap<String, AliasTable>,
}

impl Taxonomy {
    pub fn new(tables: impl IntoIterator<Item = AliasTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.namespace.to_lowercase(), t))
                .collect(),
        }
    }

    /// Taxonomy with every built-in country table.
    pub fn builtin() -> Self {
        Self::new(builtin_tables())
    }

    pub fn table(&self, namespace: &str) -> Option<&AliasTable> {
        self.tables.get(&namespace.to_lowercase())
    }

    /// `normalize(countryNamespace, rawLabel)`.
    ///
    /// A namespace without a table has no aliases, so any non-empty label
    /// comes back as `OTHER`.
    pub fn normalize(&self, namespace: &str, raw: &str) -> FuelCode {
        match self.table(namespace) {
            Some(table) => table.normalize(raw),
            None if normalize_label(raw).is_empty() => FuelCode::Unknown,
            None => {
                tracing::debug!(namespace, "No alias table registered");
                FuelCode::Other
            }
        }
    }
}

/// Lowercases and collapses runs of whitespace to a single space.
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
