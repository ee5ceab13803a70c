//! Zone registry.
//!
//! Maps a country code to the parser ids that collect it. Ids are resolved
//! against the static adapter catalog once at startup.

use crate::error::RegistryError;
use crate::sources::catalog::{
    self, CN_DELIMITED, DK_SPREADSHEET, FR_SPREADSHEET, NL_LOOKUP, NO_DELIMITED, PRESS_RELEASE,
    SE_PXWEB,
};
use crate::sources::{SourceAdapter, SourceContext};

/// A configured country and the parser ids it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub code: String,
    pub name: String,
    pub parsers: Vec<String>,
}

impl ZoneEntry {
    pub fn new(code: &str, name: &str, parsers: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            parsers: parsers.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A zone with its adapters resolved, tried in order for every month.
pub struct Zone {
    pub code: String,
    pub name: String,
    pub adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Zone {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            adapters: Vec::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: Box<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }
}

pub struct Registry {
    entries: Vec<ZoneEntry>,
}

impl Registry {
    pub fn new(entries: Vec<ZoneEntry>) -> Self {
        Self { entries }
    }

    /// The zones this build knows how to collect.
    pub fn builtin() -> Self {
        Self::new(vec![
            ZoneEntry::new("FR", "France", &[FR_SPREADSHEET]),
            ZoneEntry::new("DK", "Denmark", &[DK_SPREADSHEET]),
            ZoneEntry::new("SE", "Sweden", &[SE_PXWEB]),
            ZoneEntry::new("NO", "Norway", &[NO_DELIMITED]),
            ZoneEntry::new("CN", "China", &[CN_DELIMITED]),
            ZoneEntry::new("NL", "Netherlands", &[NL_LOOKUP]),
            ZoneEntry::new("IT", "Italy", &[PRESS_RELEASE]),
            ZoneEntry::new("ES", "Spain", &[PRESS_RELEASE]),
            ZoneEntry::new("BE", "Belgium", &[PRESS_RELEASE]),
            ZoneEntry::new("AT", "Austria", &[PRESS_RELEASE]),
            ZoneEntry::new("PL", "Poland", &[PRESS_RELEASE]),
        ])
    }

    pub fn codes(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.code.clone()).collect()
    }

    /// Entries to collect: every zone, or the one named by `code`.
    ///
    /// Codes compare case-insensitively.
    pub fn select(&self, code: Option<&str>) -> Result<Vec<&ZoneEntry>, RegistryError> {
        let Some(code) = code else {
            return Ok(self.entries.iter().collect());
        };
        match self
            .entries
            .iter()
            .find(|e| e.code.eq_ignore_ascii_case(code.trim()))
        {
            Some(entry) => Ok(vec![entry]),
            None => Err(RegistryError::UnknownZone {
                code: code.to_string(),
                available: self.codes(),
            }),
        }
    }

    /// Builds the adapters of `entries`.
    ///
    /// Parser ids missing from the catalog are logged and skipped.
    pub fn resolve(entries: &[&ZoneEntry], ctx: &SourceContext) -> Vec<Zone> {
        entries
            .iter()
            .map(|entry| {
                let mut zone = Zone::new(&entry.code, &entry.name);
                for parser in &entry.parsers {
                    match catalog::build(parser, &entry.code, ctx) {
                        Some(adapter) => zone.adapters.push(adapter),
                        None => tracing::warn!(
                            country = %entry.code,
                            parser = %parser,
                            known = %catalog::PARSER_IDS.join(", "),
                            "Parser implementation not found, skipping"
                        ),
                    }
                }
                if zone.adapters.is_empty() {
                    tracing::warn!(country = %entry.code, "Zone has no usable parser");
                }
                zone
            })
            .collect()
    }
}
